use std::io;
use std::path::PathBuf;

use log::{error, info, warn};

use crate::config::ports::ConfigPort;
use crate::error::ConvertError;
use crate::facade::session::ConversionSession;
use crate::facade::traits::i_conversion::ConversionFacadeTrait;
use crate::models::conversion::{ConversionInput, ConversionOutput};
use crate::models::file::{FileCollectInput, OutputWriteInput};
use crate::service::config_service::ConfigService;
use crate::service::registry::{get_conversion_by_id, InputKind};
use crate::service::traits::i_service::{FileServiceTrait, OutputServiceTrait};
use crate::utils::utils::format_file_size;

pub struct ConversionFacade {
    config_service: ConfigService,
    file_service: Box<dyn FileServiceTrait>,
    output_service: Box<dyn OutputServiceTrait>,
}

impl ConversionFacade {
    pub fn new(
        config_port: Box<dyn ConfigPort>,
        file_service: Box<dyn FileServiceTrait>,
        output_service: Box<dyn OutputServiceTrait>,
    ) -> Self {
        let config_service = ConfigService::new(config_port);
        ConversionFacade {
            config_service,
            file_service,
            output_service,
        }
    }

    /// 從配置來源取得參數後執行轉換
    pub fn run(&self) -> io::Result<ConversionOutput> {
        let config = self.config_service.get_config()?;
        self.execute_conversion(config.into())
    }
}

impl ConversionFacadeTrait for ConversionFacade {
    fn execute_conversion(&self, input: ConversionInput) -> io::Result<ConversionOutput> {
        let descriptor = get_conversion_by_id(&input.conversion_id).ok_or_else(|| {
            error!("未知的轉換：{}", input.conversion_id);
            io::Error::from(ConvertError::NotImplemented(input.conversion_id.clone()))
        })?;
        info!("開始轉換 {}（{}），輸出目錄：{}", descriptor.id, descriptor.name, input.output_dir);

        if descriptor.input == InputKind::Nothing && !input.inputs.is_empty() {
            warn!("{} 不需要輸入檔案，已忽略 {} 個輸入", descriptor.id, input.inputs.len());
        }
        let mut files = if input.inputs.is_empty() || descriptor.input == InputKind::Nothing {
            Vec::new()
        } else {
            self.file_service
                .collect_files(FileCollectInput {
                    inputs: input.inputs.clone(),
                    no_progress: input.no_progress,
                })?
                .files
        };
        if let InputKind::Files { multiple: false, .. } = descriptor.input {
            if files.len() > 1 {
                warn!("{} 只處理單一檔案，將使用第一個輸入：{}", descriptor.id, files[0].name);
                files.truncate(1);
            }
        }
        let source_name = files.first().map(|f| f.name.clone());

        let mut session = ConversionSession::new(descriptor);
        session.set_options(input.options.clone());
        if let Some(text) = input.text.clone() {
            session.set_text(text);
        }
        if !files.is_empty() {
            session.add_files(files);
        }

        if let Err(e) = session.convert() {
            error!("轉換 {} 失敗：{}", descriptor.id, e);
            eprintln!("轉換錯誤：{}", e);
            return Err(e.into());
        }
        let Some(result) = session.take_result() else {
            return Err(io::Error::new(io::ErrorKind::Other, "轉換沒有產生結果"));
        };

        let written = self.output_service.write_outputs(OutputWriteInput {
            descriptor,
            result,
            source_name,
            output_dir: PathBuf::from(&input.output_dir),
            no_progress: input.no_progress,
        })?;
        info!(
            "{} 完成，寫出 {} 個檔案，共 {}",
            descriptor.id,
            written.written.len(),
            format_file_size(written.total_size)
        );

        Ok(ConversionOutput {
            output_dir: input.output_dir,
            written: written.written,
            total_bytes: written.total_size,
        })
    }
}
