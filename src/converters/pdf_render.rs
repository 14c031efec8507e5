//! PDF 頁面點陣化。需要以 `pdfium` feature 編譯並能在執行期載入 Pdfium 動態函式庫。

use image::ImageFormat;

use crate::error::ConvertResult;
use crate::models::blob::NamedBlob;
use crate::models::conversion::{ConversionRequest, ConversionResult};

/// 相對於 PDF 點（1/72 英吋）的輸出倍率
pub const RENDER_SCALE: f32 = 2.0;

fn target_format(extension: &str) -> ImageFormat {
    match extension {
        "png" => ImageFormat::Png,
        _ => ImageFormat::Jpeg,
    }
}

#[cfg(feature = "pdfium")]
mod backend {
    use image::{DynamicImage, ImageFormat, RgbaImage};
    use pdfium_render::prelude::{PdfBitmapFormat, PdfRenderConfig, Pdfium};

    use super::RENDER_SCALE;
    use crate::converters::images::encode_image;
    use crate::error::{ConvertError, ConvertResult};
    use crate::models::options::DEFAULT_QUALITY;

    /// 優先使用 `PDFIUM_LIB_PATH` 指定的目錄，否則找系統函式庫
    fn bind() -> ConvertResult<Pdfium> {
        let bindings = match std::env::var("PDFIUM_LIB_PATH") {
            Ok(dir) if !dir.trim().is_empty() => Pdfium::bind_to_library(
                Pdfium::pdfium_platform_library_name_at_path(dir.trim()),
            ),
            _ => Pdfium::bind_to_system_library(),
        }
        .map_err(|e| ConvertError::Unsupported(format!("無法載入 Pdfium 函式庫：{}", e)))?;
        Ok(Pdfium::new(bindings))
    }

    pub fn render_pages(bytes: &[u8], format: ImageFormat) -> ConvertResult<Vec<Vec<u8>>> {
        let pdfium = bind()?;
        let document = pdfium
            .load_pdf_from_byte_slice(bytes, None)
            .map_err(|e| ConvertError::Pdf(e.to_string()))?;

        let mut images = Vec::new();
        for (index, page) in document.pages().iter().enumerate() {
            let target_width = (page.width().value * RENDER_SCALE).round().max(1.0) as i32;
            let config = PdfRenderConfig::new()
                .set_target_width(target_width)
                .render_form_data(true)
                .set_reverse_byte_order(false)
                .set_format(PdfBitmapFormat::BGRA);
            let bitmap = page
                .render_with_config(&config)
                .map_err(|e| ConvertError::Pdf(format!("第 {} 頁點陣化失敗：{}", index + 1, e)))?;

            let width = bitmap.width().max(0) as u32;
            let height = bitmap.height().max(0) as u32;
            let raw = bitmap.as_raw_bytes();
            let stride = if height == 0 { 0 } else { raw.len() / height as usize };

            let mut pixels = Vec::with_capacity(width as usize * height as usize * 4);
            for y in 0..height as usize {
                let row = y * stride;
                for x in 0..width as usize {
                    let at = row + x * 4;
                    let b = raw.get(at).copied().unwrap_or(255);
                    let g = raw.get(at + 1).copied().unwrap_or(255);
                    let r = raw.get(at + 2).copied().unwrap_or(255);
                    let a = raw.get(at + 3).copied().unwrap_or(255);
                    pixels.extend_from_slice(&[r, g, b, a]);
                }
            }
            let canvas = RgbaImage::from_raw(width, height, pixels)
                .ok_or_else(|| ConvertError::Pdf("點陣資料大小不符".to_string()))?;
            images.push(encode_image(&DynamicImage::ImageRgba8(canvas), format, DEFAULT_QUALITY)?);
        }
        log::info!("已點陣化 {} 頁", images.len());
        Ok(images)
    }
}

#[cfg(feature = "pdfium")]
pub fn render_pdf_pages(bytes: &[u8], format: ImageFormat) -> ConvertResult<Vec<Vec<u8>>> {
    backend::render_pages(bytes, format)
}

#[cfg(not(feature = "pdfium"))]
pub fn render_pdf_pages(_bytes: &[u8], _format: ImageFormat) -> ConvertResult<Vec<Vec<u8>>> {
    Err(crate::error::ConvertError::Unsupported(
        "PDF 轉圖片需要以 --features pdfium 編譯".to_string(),
    ))
}

pub fn handle_pdf_to_images(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    let format = target_format(request.descriptor.to);
    let mime = format.to_mime_type();
    let pages = render_pdf_pages(request.first_file()?.bytes(), format)?;
    Ok(ConversionResult::Multiple(
        pages
            .into_iter()
            .map(|bytes| NamedBlob::unnamed(crate::models::blob::Blob::new(bytes, mime)))
            .collect(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_format_defaults_to_jpeg() {
        assert_eq!(target_format("png"), ImageFormat::Png);
        assert_eq!(target_format("jpg"), ImageFormat::Jpeg);
    }

    #[cfg(not(feature = "pdfium"))]
    #[test]
    fn rendering_without_backend_is_unsupported() {
        let err = render_pdf_pages(b"%PDF-1.5", ImageFormat::Png).unwrap_err();
        assert!(matches!(err, crate::error::ConvertError::Unsupported(_)));
    }
}
