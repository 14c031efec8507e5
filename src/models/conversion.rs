use std::path::PathBuf;

use crate::error::{ConvertError, ConvertResult};
use crate::models::blob::{Blob, InputFile, NamedBlob};
use crate::models::options::ConversionOptions;
use crate::service::registry::ConversionDescriptor;

// Facade 的輸入參數
#[derive(Clone, Debug)]
pub struct ConversionInput {
    pub conversion_id: String,
    pub inputs: Vec<PathBuf>,
    pub text: Option<String>,
    pub output_dir: String,
    pub options: ConversionOptions,
    pub no_progress: bool,
}

// Facade 的輸出結果
#[derive(Debug)]
pub struct ConversionOutput {
    pub output_dir: String,
    pub written: Vec<PathBuf>,
    pub total_bytes: usize,
}

/// 交給單一轉換處理函式的請求
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    pub descriptor: &'static ConversionDescriptor,
    pub files: Vec<InputFile>,
    pub text: Option<String>,
    pub options: ConversionOptions,
}

impl ConversionRequest {
    pub fn new(descriptor: &'static ConversionDescriptor) -> Self {
        ConversionRequest {
            descriptor,
            files: Vec::new(),
            text: None,
            options: ConversionOptions::default(),
        }
    }

    pub fn first_file(&self) -> ConvertResult<&InputFile> {
        self.files
            .first()
            .ok_or_else(|| ConvertError::InvalidInput("請提供至少一個輸入檔案".to_string()))
    }

    /// 文字輸入優先，否則讀取第一個檔案內容
    pub fn text_content(&self) -> ConvertResult<String> {
        if let Some(text) = &self.text {
            return Ok(text.clone());
        }
        self.files
            .first()
            .map(InputFile::text)
            .ok_or_else(|| ConvertError::InvalidInput("請提供文字或輸入檔案".to_string()))
    }

    /// 檔案輸入優先（保留原始位元組），否則把文字當成位元組
    pub fn bytes_content(&self) -> ConvertResult<Vec<u8>> {
        if let Some(file) = self.files.first() {
            return Ok(file.bytes().to_vec());
        }
        self.text
            .as_ref()
            .map(|t| t.as_bytes().to_vec())
            .ok_or_else(|| ConvertError::InvalidInput("請提供文字或輸入檔案".to_string()))
    }

    pub fn source_name(&self) -> Option<&str> {
        self.files.first().map(|f| f.name.as_str())
    }
}

/// 轉換結果：單一輸出或多個輸出（例如分割 PDF、解壓縮）
#[derive(Debug, Clone)]
pub enum ConversionResult {
    Single(Blob),
    Multiple(Vec<NamedBlob>),
}

impl ConversionResult {
    pub fn output_count(&self) -> usize {
        match self {
            ConversionResult::Single(_) => 1,
            ConversionResult::Multiple(items) => items.len(),
        }
    }

    pub fn total_bytes(&self) -> usize {
        match self {
            ConversionResult::Single(blob) => blob.len(),
            ConversionResult::Multiple(items) => items.iter().map(|i| i.blob.len()).sum(),
        }
    }

    pub fn into_single(self) -> Option<Blob> {
        match self {
            ConversionResult::Single(blob) => Some(blob),
            ConversionResult::Multiple(_) => None,
        }
    }
}

impl From<Blob> for ConversionResult {
    fn from(blob: Blob) -> Self {
        ConversionResult::Single(blob)
    }
}
