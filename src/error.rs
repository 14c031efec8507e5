use std::io;

use thiserror::Error;

use crate::models::options::OptionKey;

// 轉換流程的錯誤分類，前端層統一轉為 io::Error
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("IO 錯誤：{0}")]
    Io(#[from] io::Error),
    #[error("PDF 處理失敗：{0}")]
    Pdf(String),
    #[error("圖片處理失敗：{0}")]
    Image(#[from] image::ImageError),
    #[error("ZIP 處理失敗：{0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("無效的 JSON：{0}")]
    Json(#[from] serde_json::Error),
    #[error("無效的 YAML：{0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("TOML 處理失敗：{0}")]
    Toml(String),
    #[error("無效的 XML：{0}")]
    Xml(#[from] quick_xml::Error),
    #[error("CSV 處理失敗：{0}")]
    Csv(#[from] csv::Error),
    #[error("試算表讀取失敗：{0}")]
    Spreadsheet(String),
    #[error("憑證解析失敗：{0}")]
    Certificate(String),
    #[error("Word 文件處理失敗：{0}")]
    Docx(String),
    #[error("無效的輸入：{0}")]
    InvalidInput(String),
    #[error("轉換 '{conversion}' 缺少必要選項：{option}")]
    MissingOption {
        conversion: &'static str,
        option: OptionKey,
    },
    #[error("轉換 \"{0}\" 尚未實作")]
    NotImplemented(String),
    #[error("此版本不支援：{0}")]
    Unsupported(String),
}

impl From<lopdf::Error> for ConvertError {
    fn from(e: lopdf::Error) -> Self {
        ConvertError::Pdf(e.to_string())
    }
}

impl From<calamine::Error> for ConvertError {
    fn from(e: calamine::Error) -> Self {
        ConvertError::Spreadsheet(e.to_string())
    }
}

impl From<toml::de::Error> for ConvertError {
    fn from(e: toml::de::Error) -> Self {
        ConvertError::Toml(e.to_string())
    }
}

impl From<toml::ser::Error> for ConvertError {
    fn from(e: toml::ser::Error) -> Self {
        ConvertError::Toml(e.to_string())
    }
}

impl From<ConvertError> for io::Error {
    fn from(e: ConvertError) -> Self {
        match e {
            ConvertError::Io(inner) => inner,
            ConvertError::InvalidInput(_) | ConvertError::MissingOption { .. } => {
                io::Error::new(io::ErrorKind::InvalidInput, e.to_string())
            }
            ConvertError::NotImplemented(_) | ConvertError::Unsupported(_) => {
                io::Error::new(io::ErrorKind::Unsupported, e.to_string())
            }
            other => io::Error::new(io::ErrorKind::InvalidData, other.to_string()),
        }
    }
}

pub type ConvertResult<T> = Result<T, ConvertError>;
