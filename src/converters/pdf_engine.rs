use std::sync::OnceLock;

use lopdf::Document;

use crate::converters::pdf_text;
use crate::error::{ConvertError, ConvertResult};

/// 同一行文字的 Y 座標容許誤差（PDF 單位）
pub const LINE_Y_TOLERANCE: f64 = 5.0;
/// 原始 BT/ET 掃描結果至少要有的字元數才算成功
pub const RAW_SCAN_MIN_CHARS: usize = 50;

#[derive(Debug, Clone, Copy)]
pub struct ExtractionSettings {
    pub line_tolerance: f64,
    pub raw_scan_min_chars: usize,
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        ExtractionSettings {
            line_tolerance: LINE_Y_TOLERANCE,
            raw_scan_min_chars: RAW_SCAN_MIN_CHARS,
        }
    }
}

/// 行程內共用的 PDF 引擎，第一次使用時才初始化
pub struct PdfEngine {
    settings: ExtractionSettings,
}

static ENGINE: OnceLock<PdfEngine> = OnceLock::new();

pub fn pdf_engine() -> &'static PdfEngine {
    ENGINE.get_or_init(|| {
        log::debug!("初始化 PDF 引擎");
        PdfEngine {
            settings: ExtractionSettings::default(),
        }
    })
}

impl PdfEngine {
    pub fn settings(&self) -> ExtractionSettings {
        self.settings
    }

    /// 載入 PDF，加密文件直接回報錯誤
    pub fn load(&self, bytes: &[u8]) -> ConvertResult<Document> {
        let document = Document::load_mem(bytes)?;
        if document.is_encrypted() {
            return Err(ConvertError::Pdf("PDF 已加密，請先移除密碼保護".to_string()));
        }
        Ok(document)
    }

    /// 盡力擷取文字，失敗時回傳診斷訊息而非錯誤
    pub fn extract_text(&self, file_name: &str, bytes: &[u8]) -> String {
        pdf_text::extract_text_with(self.settings, file_name, bytes)
    }

    pub fn renderer_available(&self) -> bool {
        cfg!(feature = "pdfium")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_is_initialized_once() {
        let first = pdf_engine() as *const PdfEngine;
        let second = pdf_engine() as *const PdfEngine;
        assert_eq!(first, second);
        assert_eq!(pdf_engine().settings().line_tolerance, LINE_Y_TOLERANCE);
    }

    #[test]
    fn load_rejects_garbage() {
        assert!(pdf_engine().load(b"not a pdf").is_err());
    }
}
