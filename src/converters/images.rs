//! 點陣圖片的格式轉換、調整與濾鏡。輸出格式未指定時沿用輸入格式。

use std::collections::HashMap;
use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::imageops::{self, FilterType};
use image::{DynamicImage, GenericImageView, ImageFormat, Rgba, RgbaImage};

use crate::converters::color::parse_hex_color;
use crate::error::{ConvertError, ConvertResult};
use crate::models::blob::Blob;
use crate::models::conversion::{ConversionRequest, ConversionResult};
use crate::models::options::{
    FlipDirection, DEFAULT_ASCII_WIDTH, DEFAULT_BLUR, DEFAULT_BORDER_COLOR, DEFAULT_BORDER_WIDTH,
    DEFAULT_COMPRESS_QUALITY, DEFAULT_PALETTE_SIZE, DEFAULT_PERCENT, DEFAULT_PIXEL_SIZE,
    DEFAULT_QUALITY,
};

pub const COMPRESS_MAX_DIMENSION: u32 = 1920;
pub const ICON_SIZE: u32 = 32;
const PALETTE_SAMPLE_STEP: usize = 10;
const PALETTE_MAX_COLORS: usize = 10;
const COLOR_BUCKET: f64 = 10.0;
const ASCII_RAMP: &[u8] = b" .:-=+*#%@";
const SHARPEN_SIGMA: f32 = 1.0;
const SHARPEN_THRESHOLD: i32 = 0;

pub fn decode_image(bytes: &[u8]) -> ConvertResult<DynamicImage> {
    Ok(image::load_from_memory(bytes)?)
}

/// 目標副檔名對應的圖片格式
pub fn format_for_extension(extension: &str) -> ConvertResult<ImageFormat> {
    match extension.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => Ok(ImageFormat::Jpeg),
        "png" => Ok(ImageFormat::Png),
        "webp" => Ok(ImageFormat::WebP),
        "bmp" => Ok(ImageFormat::Bmp),
        "gif" => Ok(ImageFormat::Gif),
        "tif" | "tiff" => Ok(ImageFormat::Tiff),
        "ico" => Ok(ImageFormat::Ico),
        other => Err(ConvertError::Unsupported(format!("圖片格式：{}", other))),
    }
}

fn source_format(bytes: &[u8]) -> ImageFormat {
    image::guess_format(bytes).unwrap_or(ImageFormat::Png)
}

/// 依格式編碼；只有 JPEG 使用 quality（0~1）
pub fn encode_image(image: &DynamicImage, format: ImageFormat, quality: f32) -> ConvertResult<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    match format {
        ImageFormat::Jpeg => {
            let level = (quality.clamp(0.01, 1.0) * 100.0).round() as u8;
            let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
            JpegEncoder::new_with_quality(&mut buffer, level.max(1)).encode_image(&rgb)?;
        }
        ImageFormat::Png => {
            let encoder =
                PngEncoder::new_with_quality(&mut buffer, CompressionType::Best, PngFilter::Adaptive);
            DynamicImage::ImageRgba8(image.to_rgba8()).write_with_encoder(encoder)?;
        }
        other => {
            DynamicImage::ImageRgba8(image.to_rgba8()).write_to(&mut buffer, other)?;
        }
    }
    Ok(buffer.into_inner())
}

fn image_blob(image: &DynamicImage, format: ImageFormat, quality: f32) -> ConvertResult<ConversionResult> {
    let bytes = encode_image(image, format, quality)?;
    Ok(Blob::new(bytes, format.to_mime_type()).into())
}

/// 轉換格式，可選擇同時指定寬或高（未指定的維度保留原值）
pub fn convert_image(
    bytes: &[u8],
    format: ImageFormat,
    width: Option<u32>,
    height: Option<u32>,
    quality: f32,
) -> ConvertResult<Vec<u8>> {
    let image = decode_image(bytes)?;
    let (source_width, source_height) = image.dimensions();
    let target = (
        width.filter(|w| *w > 0).unwrap_or(source_width),
        height.filter(|h| *h > 0).unwrap_or(source_height),
    );
    let image = if target == (source_width, source_height) {
        image
    } else {
        image.resize_exact(target.0, target.1, FilterType::Lanczos3)
    };
    encode_image(&image, format, quality)
}

/// 最長邊縮到上限內並重新編碼；結果沒有變小時回傳原檔
pub fn compress_image(bytes: &[u8], quality: f32, max_dimension: u32) -> ConvertResult<Vec<u8>> {
    let format = source_format(bytes);
    let image = decode_image(bytes)?;
    let (width, height) = image.dimensions();
    let image = if width.max(height) > max_dimension {
        image.resize(max_dimension, max_dimension, FilterType::Lanczos3)
    } else {
        image
    };
    let compressed = encode_image(&image, format, quality)?;
    if compressed.len() >= bytes.len() && image.dimensions() == (width, height) {
        log::info!("重新編碼後沒有變小，保留原始圖片");
        return Ok(bytes.to_vec());
    }
    Ok(compressed)
}

pub fn rotate_image(image: &DynamicImage, degrees: i64) -> ConvertResult<DynamicImage> {
    match degrees.rem_euclid(360) {
        0 => Ok(image.clone()),
        90 => Ok(image.rotate90()),
        180 => Ok(image.rotate180()),
        270 => Ok(image.rotate270()),
        other => Err(ConvertError::InvalidInput(format!(
            "圖片只能旋轉 90、180 或 270 度：{}",
            other
        ))),
    }
}

pub fn flip_image(image: &DynamicImage, direction: FlipDirection) -> DynamicImage {
    match direction {
        FlipDirection::Horizontal => image.fliph(),
        FlipDirection::Vertical => image.flipv(),
    }
}

fn map_pixels(image: &DynamicImage, f: impl Fn([f64; 3]) -> [f64; 3]) -> DynamicImage {
    let mut rgba = image.to_rgba8();
    for pixel in rgba.pixels_mut() {
        let [r, g, b, a] = pixel.0;
        let [r, g, b] = f([r as f64, g as f64, b as f64]);
        *pixel = Rgba([channel(r), channel(g), channel(b), a]);
    }
    DynamicImage::ImageRgba8(rgba)
}

fn channel(value: f64) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

/// 三個通道取平均
pub fn grayscale(image: &DynamicImage) -> DynamicImage {
    map_pixels(image, |[r, g, b]| {
        let average = (r + g + b) / 3.0;
        [average, average, average]
    })
}

pub fn invert(image: &DynamicImage) -> DynamicImage {
    map_pixels(image, |[r, g, b]| [255.0 - r, 255.0 - g, 255.0 - b])
}

/// 百分比，100 為原圖
pub fn adjust_brightness(image: &DynamicImage, percent: u32) -> DynamicImage {
    let factor = percent as f64 / 100.0;
    map_pixels(image, |[r, g, b]| [r * factor, g * factor, b * factor])
}

pub fn adjust_contrast(image: &DynamicImage, percent: u32) -> DynamicImage {
    let factor = percent as f64 / 100.0;
    let stretch = |v: f64| (v - 127.5) * factor + 127.5;
    map_pixels(image, |[r, g, b]| [stretch(r), stretch(g), stretch(b)])
}

pub fn adjust_saturation(image: &DynamicImage, percent: u32) -> DynamicImage {
    let s = percent as f64 / 100.0;
    map_pixels(image, |[r, g, b]| {
        [
            (0.213 + 0.787 * s) * r + (0.715 - 0.715 * s) * g + (0.072 - 0.072 * s) * b,
            (0.213 - 0.213 * s) * r + (0.715 + 0.285 * s) * g + (0.072 - 0.072 * s) * b,
            (0.213 - 0.213 * s) * r + (0.715 - 0.715 * s) * g + (0.072 + 0.928 * s) * b,
        ]
    })
}

pub fn sepia(image: &DynamicImage) -> DynamicImage {
    map_pixels(image, |[r, g, b]| {
        [
            0.393 * r + 0.769 * g + 0.189 * b,
            0.349 * r + 0.686 * g + 0.168 * b,
            0.272 * r + 0.534 * g + 0.131 * b,
        ]
    })
}

pub fn sharpen(image: &DynamicImage) -> DynamicImage {
    image.unsharpen(SHARPEN_SIGMA, SHARPEN_THRESHOLD)
}

pub fn blur(image: &DynamicImage, amount: f32) -> DynamicImage {
    if amount <= 0.0 {
        return image.clone();
    }
    image.blur(amount)
}

pub fn add_border(image: &DynamicImage, width: u32, color: [u8; 3]) -> DynamicImage {
    let (w, h) = image.dimensions();
    let fill = Rgba([color[0], color[1], color[2], 255]);
    let mut canvas = RgbaImage::from_pixel(w + width * 2, h + width * 2, fill);
    imageops::overlay(&mut canvas, &image.to_rgba8(), width as i64, width as i64);
    DynamicImage::ImageRgba8(canvas)
}

/// 以區塊左上角像素填滿整個區塊
pub fn pixelate(image: &DynamicImage, block: u32) -> DynamicImage {
    let block = block.max(1);
    let mut rgba = image.to_rgba8();
    let (w, h) = rgba.dimensions();
    for block_y in (0..h).step_by(block as usize) {
        for block_x in (0..w).step_by(block as usize) {
            let sample = *rgba.get_pixel(block_x, block_y);
            for y in block_y..(block_y + block).min(h) {
                for x in block_x..(block_x + block).min(w) {
                    rgba.put_pixel(x, y, sample);
                }
            }
        }
    }
    DynamicImage::ImageRgba8(rgba)
}

/// 依出現次數排序的主要顏色，通道先量化到 10 的倍數
pub fn dominant_colors(image: &DynamicImage, count: usize) -> Vec<String> {
    let quantize = |v: u8| ((v as f64 / COLOR_BUCKET).round() * COLOR_BUCKET).min(255.0) as u8;
    let mut counts: HashMap<[u8; 3], (usize, usize)> = HashMap::new();
    for (order, pixel) in image.to_rgba8().pixels().enumerate() {
        let key = [quantize(pixel[0]), quantize(pixel[1]), quantize(pixel[2])];
        counts.entry(key).or_insert((0, order)).0 += 1;
    }
    let mut ranked: Vec<([u8; 3], (usize, usize))> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1 .0.cmp(&a.1 .0).then(a.1 .1.cmp(&b.1 .1)));
    ranked
        .into_iter()
        .take(count)
        .map(|([r, g, b], _)| format!("rgb({},{},{})", r, g, b))
        .collect()
}

/// 每 10 個像素取樣一次，回傳前 10 個不重複的十六進位顏色
pub fn sample_palette(image: &DynamicImage) -> Vec<String> {
    let mut colors: Vec<String> = Vec::new();
    for pixel in image.to_rgba8().pixels().step_by(PALETTE_SAMPLE_STEP) {
        let hex = format!("#{:02x}{:02x}{:02x}", pixel[0], pixel[1], pixel[2]);
        if !colors.contains(&hex) {
            colors.push(hex);
            if colors.len() == PALETTE_MAX_COLORS {
                break;
            }
        }
    }
    colors
}

pub fn image_to_ascii(image: &DynamicImage, width: u32) -> String {
    let width = width.max(1);
    let (source_width, source_height) = image.dimensions();
    let aspect = source_height as f64 / source_width.max(1) as f64;
    let height = ((width as f64 * aspect).floor() as u32).max(1);
    let scaled = image.resize_exact(width, height, FilterType::Triangle).to_rgb8();

    let mut ascii = String::with_capacity(((width + 1) * height) as usize);
    for y in 0..height {
        for x in 0..width {
            let pixel = scaled.get_pixel(x, y);
            let brightness = (pixel[0] as f64 + pixel[1] as f64 + pixel[2] as f64) / 3.0;
            let index = ((brightness / 255.0) * (ASCII_RAMP.len() - 1) as f64).floor() as usize;
            ascii.push(ASCII_RAMP[index.min(ASCII_RAMP.len() - 1)] as char);
        }
        ascii.push('\n');
    }
    ascii
}

/// 解碼、處理後以原格式輸出
fn transform(
    request: &ConversionRequest,
    f: impl FnOnce(&DynamicImage) -> ConvertResult<DynamicImage>,
) -> ConvertResult<ConversionResult> {
    let bytes = request.first_file()?.bytes();
    let format = source_format(bytes);
    let image = decode_image(bytes)?;
    image_blob(&f(&image)?, format, DEFAULT_QUALITY)
}

pub fn handle_convert(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    let format = format_for_extension(request.descriptor.to)?;
    let options = &request.options;
    let bytes = convert_image(
        request.first_file()?.bytes(),
        format,
        options.width,
        options.height,
        options.quality_or(DEFAULT_QUALITY),
    )?;
    Ok(Blob::new(bytes, format.to_mime_type()).into())
}

pub fn handle_compress(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    let options = &request.options;
    let max_dimension = options.width.or(options.height).unwrap_or(COMPRESS_MAX_DIMENSION);
    let bytes = request.first_file()?.bytes();
    let output = compress_image(bytes, options.quality_or(DEFAULT_COMPRESS_QUALITY), max_dimension)?;
    Ok(Blob::new(output, source_format(bytes).to_mime_type()).into())
}

pub fn handle_resize(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    let bytes = request.first_file()?.bytes();
    let format = source_format(bytes);
    let output = convert_image(
        bytes,
        format,
        request.options.width,
        request.options.height,
        request.options.quality_or(DEFAULT_QUALITY),
    )?;
    Ok(Blob::new(output, format.to_mime_type()).into())
}

pub fn handle_create_ico(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    let output = convert_image(
        request.first_file()?.bytes(),
        ImageFormat::Ico,
        Some(ICON_SIZE),
        Some(ICON_SIZE),
        DEFAULT_QUALITY,
    )?;
    Ok(Blob::new(output, "image/x-icon").into())
}

pub fn handle_rotate(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    let degrees = request.options.degrees.unwrap_or(90);
    transform(request, |image| rotate_image(image, degrees))
}

pub fn handle_rotate_90(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    transform(request, |image| rotate_image(image, 90))
}

pub fn handle_rotate_180(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    transform(request, |image| rotate_image(image, 180))
}

pub fn handle_rotate_270(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    transform(request, |image| rotate_image(image, 270))
}

pub fn handle_flip(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    let direction = request.options.flip.unwrap_or_default();
    transform(request, |image| Ok(flip_image(image, direction)))
}

pub fn handle_flip_horizontal(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    transform(request, |image| Ok(flip_image(image, FlipDirection::Horizontal)))
}

pub fn handle_flip_vertical(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    transform(request, |image| Ok(flip_image(image, FlipDirection::Vertical)))
}

pub fn handle_grayscale(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    transform(request, |image| Ok(grayscale(image)))
}

pub fn handle_invert(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    transform(request, |image| Ok(invert(image)))
}

pub fn handle_brightness(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    let percent = request.options.brightness.unwrap_or(DEFAULT_PERCENT);
    transform(request, |image| Ok(adjust_brightness(image, percent)))
}

pub fn handle_contrast(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    let percent = request.options.contrast.unwrap_or(DEFAULT_PERCENT);
    transform(request, |image| Ok(adjust_contrast(image, percent)))
}

pub fn handle_saturation(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    let percent = request.options.saturation.unwrap_or(DEFAULT_PERCENT);
    transform(request, |image| Ok(adjust_saturation(image, percent)))
}

pub fn handle_blur(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    let amount = request.options.blur_amount.unwrap_or(DEFAULT_BLUR);
    transform(request, |image| Ok(blur(image, amount)))
}

pub fn handle_sharpen(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    transform(request, |image| Ok(sharpen(image)))
}

pub fn handle_sepia(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    transform(request, |image| Ok(sepia(image)))
}

pub fn handle_border(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    let width = request.options.border_width.unwrap_or(DEFAULT_BORDER_WIDTH);
    let color = request
        .options
        .border_color
        .as_deref()
        .unwrap_or(DEFAULT_BORDER_COLOR);
    let color = parse_hex_color(color)?;
    transform(request, |image| Ok(add_border(image, width, color)))
}

pub fn handle_pixelate(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    let size = request.options.pixel_size.unwrap_or(DEFAULT_PIXEL_SIZE);
    transform(request, |image| Ok(pixelate(image, size)))
}

pub fn handle_color_picker(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    let image = decode_image(request.first_file()?.bytes())?;
    let count = request.options.palette_size.unwrap_or(DEFAULT_PALETTE_SIZE).max(1);
    Ok(Blob::text(dominant_colors(&image, count).join("\n")).into())
}

pub fn handle_color_palette(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    let image = decode_image(request.first_file()?.bytes())?;
    Ok(Blob::text(sample_palette(&image).join("\n")).into())
}

pub fn handle_ascii(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    let image = decode_image(request.first_file()?.bytes())?;
    let width = request.options.ascii_width.unwrap_or(DEFAULT_ASCII_WIDTH);
    Ok(Blob::text(image_to_ascii(&image, width)).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(width: u32, height: u32) -> DynamicImage {
        let mut canvas = RgbaImage::new(width, height);
        for (x, y, pixel) in canvas.enumerate_pixels_mut() {
            *pixel = Rgba([(x * 10) as u8, (y * 10) as u8, 128, 255]);
        }
        DynamicImage::ImageRgba8(canvas)
    }

    fn png(width: u32, height: u32) -> Vec<u8> {
        encode_image(&sample(width, height), ImageFormat::Png, 1.0).expect("png")
    }

    #[test]
    fn format_conversions_preserve_dimensions() {
        let source = png(17, 9);
        for extension in ["jpg", "webp", "bmp", "gif", "tiff"] {
            let format = format_for_extension(extension).expect("format");
            let converted = convert_image(&source, format, None, None, DEFAULT_QUALITY).expect("convert");
            let back = convert_image(&converted, ImageFormat::Png, None, None, 1.0).expect("back");
            assert_eq!(decode_image(&back).expect("decode").dimensions(), (17, 9), "{extension}");
        }
    }

    #[test]
    fn sharpen_boosts_contrast_across_edges() {
        let mut edge = RgbaImage::from_pixel(8, 8, Rgba([60, 60, 60, 255]));
        for y in 0..8 {
            for x in 4..8 {
                edge.put_pixel(x, y, Rgba([180, 180, 180, 255]));
            }
        }
        let sharpened = sharpen(&DynamicImage::ImageRgba8(edge)).to_rgba8();
        assert_eq!(sharpened.dimensions(), (8, 8));
        assert!(sharpened.get_pixel(4, 4)[0] > 180);
        assert!(sharpened.get_pixel(3, 4)[0] < 60);
    }

    #[test]
    fn resize_applies_requested_dimensions() {
        let resized = convert_image(&png(20, 10), ImageFormat::Png, Some(5), None, 1.0).expect("resize");
        assert_eq!(decode_image(&resized).expect("decode").dimensions(), (5, 10));
    }

    #[test]
    fn rotation_swaps_dimensions() {
        let rotated = rotate_image(&sample(4, 2), 90).expect("rotate");
        assert_eq!(rotated.dimensions(), (2, 4));
        assert!(rotate_image(&sample(4, 2), 45).is_err());
    }

    #[test]
    fn grayscale_uses_channel_average() {
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(1, 1, Rgba([30, 60, 90, 255])));
        let gray = grayscale(&image).to_rgba8();
        assert_eq!(gray.get_pixel(0, 0).0, [60, 60, 60, 255]);
    }

    #[test]
    fn border_grows_canvas() {
        let bordered = add_border(&sample(3, 3), 2, [255, 0, 0]);
        assert_eq!(bordered.dimensions(), (7, 7));
        assert_eq!(bordered.to_rgba8().get_pixel(0, 0).0, [255, 0, 0, 255]);
    }

    #[test]
    fn dominant_colors_are_ranked_by_frequency() {
        let mut canvas = RgbaImage::from_pixel(4, 1, Rgba([0, 0, 0, 255]));
        canvas.put_pixel(3, 0, Rgba([255, 255, 255, 255]));
        let colors = dominant_colors(&DynamicImage::ImageRgba8(canvas), 5);
        assert_eq!(colors, vec!["rgb(0,0,0)", "rgb(255,255,255)"]);
    }

    #[test]
    fn ascii_art_keeps_aspect_ratio() {
        let ascii = image_to_ascii(&sample(40, 20), 10);
        let lines: Vec<&str> = ascii.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines.iter().all(|line| line.chars().count() == 10));
    }
}
