use std::io;
use std::path::PathBuf;

use crate::config::ports::{AppConfig, ConfigPort};
use crate::models::options::ConversionOptions;

pub const DEFAULT_OUTPUT_DIR: &str = "output";

// 配置服務，負責選擇適當的配置適配器
pub struct ConfigService {
    config_port: Box<dyn ConfigPort>,
}

impl ConfigService {
    pub fn new(config_port: Box<dyn ConfigPort>) -> Self {
        ConfigService { config_port }
    }

    pub fn get_config(&self) -> io::Result<AppConfig> {
        self.config_port.get_config()
    }
}

// 預設配置適配器：只指定轉換與輸入，其餘使用預設值
pub struct DefaultConfigAdapter {
    conversion_id: String,
    inputs: Vec<PathBuf>,
    text: Option<String>,
    output_dir: String,
}

impl DefaultConfigAdapter {
    pub fn new(conversion_id: impl Into<String>, inputs: Vec<PathBuf>, text: Option<String>) -> Self {
        DefaultConfigAdapter {
            conversion_id: conversion_id.into(),
            inputs,
            text,
            output_dir: DEFAULT_OUTPUT_DIR.to_string(),
        }
    }

    pub fn with_output_dir(mut self, output_dir: impl Into<String>) -> Self {
        self.output_dir = output_dir.into();
        self
    }
}

impl ConfigPort for DefaultConfigAdapter {
    fn get_config(&self) -> io::Result<AppConfig> {
        Ok(AppConfig {
            conversion_id: self.conversion_id.clone(),
            inputs: self.inputs.clone(),
            text: self.text.clone(),
            output_dir: self.output_dir.clone(),
            options: ConversionOptions::default(),
            no_progress: true,
        })
    }
}
