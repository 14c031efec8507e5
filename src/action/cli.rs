use std::fs;
use std::io;

use clap::Parser;

use crate::action::interactive::process_interactive_mode;
use crate::config::config::{Cli, Command, ConvertArgs};
use crate::config::ports::{AppConfig, ConfigPort};
use crate::facade::conversion_facade::ConversionFacade;
use crate::models::conversion::ConversionOutput;
use crate::service::file_service::FileService;
use crate::service::output_service::OutputService;
use crate::service::registry::{
    categories, get_conversion_by_id, get_conversions_by_category, get_popular_conversions,
    search_conversions, Category, ConversionDescriptor, InputKind,
};
use crate::utils::file::validate_input_path;
use crate::utils::utils::setup_logging;

/// 沒有參數時進入互動模式；`list`、`search`、`info` 不產生輸出檔案
pub fn process_args(args: Vec<String>) -> io::Result<Option<ConversionOutput>> {
    if args.len() == 1 {
        process_interactive_mode().map(Some)
    } else {
        process_cli_mode(args)
    }
}

pub fn process_cli_mode(args: Vec<String>) -> io::Result<Option<ConversionOutput>> {
    let cli = Cli::parse_from(args);
    setup_logging(&cli.log_level)?;

    match cli.command {
        Command::Convert(convert) => {
            let config_port: Box<dyn ConfigPort> = Box::new(CliConfigAdapter::new(convert, cli.no_progress));
            let facade = ConversionFacade::new(
                config_port,
                Box::new(FileService::new()),
                Box::new(OutputService::new()),
            );
            facade.run().map(Some)
        }
        Command::List { category, popular } => {
            print_list(category.as_deref(), popular)?;
            Ok(None)
        }
        Command::Search { query } => {
            let hits = search_conversions(&query);
            if hits.is_empty() {
                println!("找不到符合「{}」的轉換", query);
            } else {
                println!("找到 {} 個符合「{}」的轉換：", hits.len(), query);
                hits.iter().for_each(|c| print_row(c));
            }
            Ok(None)
        }
        Command::Info { id } => {
            let descriptor = get_conversion_by_id(&id).ok_or_else(|| {
                io::Error::new(io::ErrorKind::NotFound, format!("未知的轉換：{}", id))
            })?;
            print_info(descriptor);
            Ok(None)
        }
    }
}

fn print_row(conversion: &ConversionDescriptor) {
    let mark = if conversion.popular { "★" } else { " " };
    println!(
        "  {} {:<24} {:<24} {} → {}",
        mark, conversion.id, conversion.name, conversion.from, conversion.to
    );
}

fn print_list(category: Option<&str>, popular: bool) -> io::Result<()> {
    if popular {
        println!("常用轉換：");
        get_popular_conversions().iter().for_each(|c| print_row(c));
        return Ok(());
    }
    let selected = match category {
        Some(name) => vec![Category::parse(name).ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, format!("未知的分類：{}", name))
        })?],
        None => categories(),
    };
    for category in selected {
        let conversions = get_conversions_by_category(category);
        println!("{}（{}，{} 個）", category.label(), category.id(), conversions.len());
        conversions.iter().for_each(|c| print_row(c));
    }
    Ok(())
}

pub fn describe_input(input: InputKind) -> String {
    match input {
        InputKind::Files { min, multiple: true } => format!("至少 {} 個檔案或目錄", min),
        InputKind::Files { .. } => "單一檔案".to_string(),
        InputKind::Text => "文字（--text、--text-file 或輸入檔案）".to_string(),
        InputKind::Nothing => "不需要輸入".to_string(),
    }
}

fn print_info(descriptor: &ConversionDescriptor) {
    println!("{}（{}）", descriptor.name, descriptor.id);
    println!("  說明：{}", descriptor.description);
    println!("  分類：{}", descriptor.category.label());
    println!("  格式：{} → {}", descriptor.from, descriptor.to);
    println!("  輸入：{}", describe_input(descriptor.input));
    if descriptor.required.is_empty() {
        println!("  必要選項：無");
    } else {
        let required: Vec<String> = descriptor.required.iter().map(|k| k.to_string()).collect();
        println!("  必要選項：{}", required.join("、"));
    }
}

// CLI 配置適配器
pub struct CliConfigAdapter {
    args: ConvertArgs,
    no_progress: bool,
}

impl CliConfigAdapter {
    pub fn new(args: ConvertArgs, no_progress: bool) -> Self {
        CliConfigAdapter { args, no_progress }
    }
}

impl ConfigPort for CliConfigAdapter {
    fn get_config(&self) -> io::Result<AppConfig> {
        for input in &self.args.inputs {
            validate_input_path(input)?;
        }
        let text = match (&self.args.text, &self.args.text_file) {
            (Some(text), _) => Some(text.clone()),
            (None, Some(path)) => {
                validate_input_path(path)?;
                Some(fs::read_to_string(path)?)
            }
            (None, None) => None,
        };
        let options = self.args.options.to_options()?;
        log::debug!("CLI 選項：{:?}", options);

        Ok(AppConfig {
            conversion_id: self.args.id.clone(),
            inputs: self.args.inputs.clone(),
            text,
            output_dir: self.args.output.clone(),
            options,
            no_progress: self.no_progress,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter(args: &[&str]) -> CliConfigAdapter {
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Command::Convert(convert) => CliConfigAdapter::new(convert, cli.no_progress),
            _ => panic!("預期 convert 子命令"),
        }
    }

    #[test]
    fn text_file_is_read_into_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("in.txt");
        fs::write(&path, "hello").unwrap();
        let config = adapter(&[
            "convert_anything",
            "convert",
            "case-converter-upper",
            "--text-file",
            path.to_str().unwrap(),
        ])
        .get_config()
        .unwrap();
        assert_eq!(config.text.as_deref(), Some("hello"));
        assert_eq!(config.output_dir, "output");
    }

    #[test]
    fn missing_input_is_reported() {
        let error = adapter(&["convert_anything", "convert", "png-to-jpg", "/no/such/file.png"])
            .get_config()
            .unwrap_err();
        assert_eq!(error.kind(), io::ErrorKind::NotFound);
    }
}
