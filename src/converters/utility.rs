use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use qrcode::{Color, QrCode};

use crate::converters::color::parse_hex_color;
use crate::converters::images::encode_image;
use crate::error::{ConvertError, ConvertResult};
use crate::models::blob::Blob;
use crate::models::conversion::{ConversionRequest, ConversionResult};
use crate::models::options::{QrStyle, DEFAULT_QR_COLOR, DEFAULT_QR_SIZE, DEFAULT_QUALITY};

/// 四周留白的模組數
pub const QR_MARGIN_MODULES: usize = 1;
pub const QR_MIN_SIZE: u32 = 64;
pub const QR_MAX_SIZE: u32 = 2048;
const FINDER_SIZE: usize = 7;
const ROUNDED_RADIUS: f32 = 0.3;
const DOT_RADIUS: f32 = 0.45;

fn in_finder(x: usize, y: usize, width: usize) -> bool {
    let near = |v: usize| v < FINDER_SIZE;
    let far = |v: usize| v + FINDER_SIZE >= width;
    (near(x) && near(y)) || (far(x) && near(y)) || (near(x) && far(y))
}

/// 模組內的相對座標 (fx, fy) 是否落在深色形狀內
fn covers(style: QrStyle, fx: f32, fy: f32) -> bool {
    let (dx, dy) = ((fx - 0.5).abs(), (fy - 0.5).abs());
    match style {
        QrStyle::Classic => true,
        QrStyle::Dots => dx * dx + dy * dy <= DOT_RADIUS * DOT_RADIUS,
        QrStyle::Rounded => {
            let inner = 0.5 - ROUNDED_RADIUS;
            let ox = (dx - inner).max(0.0);
            let oy = (dy - inner).max(0.0);
            ox * ox + oy * oy <= ROUNDED_RADIUS * ROUNDED_RADIUS
        }
    }
}

/// 產生 size × size 的 QR Code 圖片；定位圖案一律畫成方塊以確保可掃描
pub fn render_qr(text: &str, size: u32, color: [u8; 3], style: QrStyle) -> ConvertResult<DynamicImage> {
    if text.is_empty() {
        return Err(ConvertError::InvalidInput("QR Code 內容不可為空".to_string()));
    }
    let code = QrCode::new(text.as_bytes())
        .map_err(|e| ConvertError::InvalidInput(format!("無法產生 QR Code：{}", e)))?;
    let width = code.width();
    let colors = code.to_colors();
    let total = (width + QR_MARGIN_MODULES * 2) as f32;
    let size = size.clamp(QR_MIN_SIZE, QR_MAX_SIZE);
    let scale = size as f32 / total;

    let dark = Rgba([color[0], color[1], color[2], 255]);
    let light = Rgba([255, 255, 255, 255]);
    let mut canvas = RgbaImage::from_pixel(size, size, light);

    for (px, py, pixel) in canvas.enumerate_pixels_mut() {
        let mx = (px as f32 + 0.5) / scale;
        let my = (py as f32 + 0.5) / scale;
        let (cell_x, cell_y) = (mx.floor() as usize, my.floor() as usize);
        if cell_x < QR_MARGIN_MODULES || cell_y < QR_MARGIN_MODULES {
            continue;
        }
        let (x, y) = (cell_x - QR_MARGIN_MODULES, cell_y - QR_MARGIN_MODULES);
        if x >= width || y >= width || colors[y * width + x] != Color::Dark {
            continue;
        }
        let shape = if in_finder(x, y, width) { QrStyle::Classic } else { style };
        if covers(shape, mx.fract(), my.fract()) {
            *pixel = dark;
        }
    }
    log::info!("已產生 QR Code：{} 模組，{}×{} 像素", width, size, size);
    Ok(DynamicImage::ImageRgba8(canvas))
}

pub fn handle_generate_qr(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    let options = &request.options;
    let color = parse_hex_color(options.qr_color.as_deref().unwrap_or(DEFAULT_QR_COLOR))?;
    let image = render_qr(
        &request.text_content()?,
        options.qr_size.unwrap_or(DEFAULT_QR_SIZE),
        color,
        options.qr_style.unwrap_or_default(),
    )?;
    Ok(Blob::new(encode_image(&image, ImageFormat::Png, DEFAULT_QUALITY)?, "image/png").into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qr_has_requested_size_and_quiet_zone() {
        let image = render_qr("https://example.com", 300, [0, 0, 0], QrStyle::Classic).unwrap().to_rgba8();
        assert_eq!(image.dimensions(), (300, 300));
        assert_eq!(image.get_pixel(0, 0).0, [255, 255, 255, 255]);
        let dark = image.pixels().filter(|p| p.0 == [0, 0, 0, 255]).count();
        assert!(dark > 300 * 300 / 5);
    }

    #[test]
    fn styles_draw_less_ink_than_squares() {
        let count = |style| {
            render_qr("hello", 256, [10, 20, 30], style)
                .unwrap()
                .to_rgba8()
                .pixels()
                .filter(|p| p.0 == [10, 20, 30, 255])
                .count()
        };
        let classic = count(QrStyle::Classic);
        assert!(count(QrStyle::Rounded) < classic);
        assert!(count(QrStyle::Dots) < count(QrStyle::Rounded));
    }

    #[test]
    fn empty_text_is_rejected() {
        assert!(render_qr("", 300, [0, 0, 0], QrStyle::Classic).is_err());
    }

    #[test]
    fn finder_corners() {
        assert!(in_finder(0, 0, 21));
        assert!(in_finder(20, 0, 21));
        assert!(in_finder(0, 20, 21));
        assert!(!in_finder(20, 20, 21));
        assert!(!in_finder(10, 10, 21));
    }
}
