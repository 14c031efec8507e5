use std::path::PathBuf;

use crate::models::blob::InputFile;
use crate::models::conversion::ConversionResult;
use crate::service::registry::ConversionDescriptor;

#[derive(Clone)]
pub struct FileCollectInput {
    pub inputs: Vec<PathBuf>,
    pub no_progress: bool,
}

#[derive(Debug)]
pub struct FileCollectOutput {
    pub files: Vec<InputFile>,
    pub total_size: usize,
}

pub struct OutputWriteInput {
    pub descriptor: &'static ConversionDescriptor,
    pub result: ConversionResult,
    /// 第一個輸入的檔名，用於推導輸出檔名
    pub source_name: Option<String>,
    pub output_dir: PathBuf,
    pub no_progress: bool,
}

#[derive(Debug)]
pub struct OutputWriteOutput {
    pub written: Vec<PathBuf>,
    pub total_size: usize,
}
