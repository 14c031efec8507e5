use std::io;
use std::path::PathBuf;

use crate::models::conversion::ConversionInput;
use crate::models::options::ConversionOptions;

// 應用配置結構體，封裝一次轉換所需的全部參數
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub conversion_id: String,
    pub inputs: Vec<PathBuf>,
    pub text: Option<String>,
    pub output_dir: String,
    pub options: ConversionOptions,
    pub no_progress: bool,
}

impl From<AppConfig> for ConversionInput {
    fn from(config: AppConfig) -> Self {
        ConversionInput {
            conversion_id: config.conversion_id,
            inputs: config.inputs,
            text: config.text,
            output_dir: config.output_dir,
            options: config.options,
            no_progress: config.no_progress,
        }
    }
}

// 配置來源的 Port
pub trait ConfigPort: Send + Sync {
    fn get_config(&self) -> io::Result<AppConfig>;
}
