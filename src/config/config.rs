use std::io;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::converters::color::parse_hex_color;
use crate::models::options::{
    parse_page_list, CompressionLevel, ConversionOptions, FlipDirection, QrStyle, SortOrder,
};

#[derive(Parser, Clone, Debug)]
#[command(
    name = "convert_anything",
    about = "多合一檔案轉換工具：圖片、PDF、文件、資料格式、壓縮檔與文字工具",
    long_about = "多合一檔案轉換工具，所有轉換都在本機完成。\n使用 `list` 查看可用的轉換，`info <ID>` 查看轉換需要的輸入與選項，`convert <ID> <檔案>...` 執行轉換。\n不帶任何參數執行時進入互動模式。\n使用 `--help` 查看詳細用法。",
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
    #[arg(long, global = true, default_value = "info", value_parser = ["info", "warn", "error", "debug"])]
    pub log_level: String,
    #[arg(long, global = true, default_value_t = false)]
    pub no_progress: bool,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Command {
    /// 執行一個轉換
    Convert(ConvertArgs),
    /// 列出可用的轉換
    List {
        /// 只列出指定分類（image、pdf、document、data、archive、utility）
        #[arg(long)]
        category: Option<String>,
        /// 只列出常用轉換
        #[arg(long, default_value_t = false)]
        popular: bool,
    },
    /// 依關鍵字搜尋轉換
    Search { query: String },
    /// 顯示單一轉換的說明
    Info { id: String },
}

#[derive(Args, Clone, Debug)]
pub struct ConvertArgs {
    /// 轉換 id，例如 png-to-jpg
    pub id: String,
    /// 輸入檔案或目錄
    pub inputs: Vec<PathBuf>,
    #[arg(short, long, default_value = "output")]
    pub output: String,
    /// 直接提供文字輸入
    #[arg(long, conflicts_with = "text_file")]
    pub text: Option<String>,
    /// 從檔案讀取文字輸入
    #[arg(long)]
    pub text_file: Option<PathBuf>,
    #[command(flatten)]
    pub options: OptionArgs,
}

#[derive(Args, Clone, Debug, Default)]
pub struct OptionArgs {
    /// 輸出品質，0 到 1 之間
    #[arg(long)]
    pub quality: Option<f32>,
    #[arg(long)]
    pub width: Option<u32>,
    #[arg(long)]
    pub height: Option<u32>,
    /// 旋轉角度，需為 90 的倍數
    #[arg(long, allow_hyphen_values = true)]
    pub degrees: Option<i64>,
    #[arg(long, conflicts_with = "vertical", default_value_t = false)]
    pub horizontal: bool,
    #[arg(long, default_value_t = false)]
    pub vertical: bool,
    /// 要刪除的頁碼，例如 1,3,5-7
    #[arg(long)]
    pub pages: Option<String>,
    /// 亮度百分比（100 為原始）
    #[arg(long)]
    pub brightness: Option<u32>,
    #[arg(long)]
    pub contrast: Option<u32>,
    #[arg(long)]
    pub saturation: Option<u32>,
    #[arg(long)]
    pub blur: Option<f32>,
    #[arg(long)]
    pub border_width: Option<u32>,
    #[arg(long)]
    pub border_color: Option<String>,
    #[arg(long)]
    pub pixel_size: Option<u32>,
    #[arg(long)]
    pub find: Option<String>,
    #[arg(long)]
    pub replace: Option<String>,
    #[arg(long, default_value_t = false)]
    pub case_insensitive: bool,
    #[arg(long, value_parser = ["asc", "desc"])]
    pub sort: Option<String>,
    #[arg(long, value_parser = ["classic", "rounded", "dots"])]
    pub qr_style: Option<String>,
    #[arg(long)]
    pub qr_size: Option<u32>,
    #[arg(long)]
    pub qr_color: Option<String>,
    #[arg(long, value_parser = ["low", "medium", "high"])]
    pub compression: Option<String>,
    #[arg(long)]
    pub watermark: Option<String>,
    /// ZIP 加密密碼（AES-256）
    #[arg(long)]
    pub password: Option<String>,
    #[arg(long)]
    pub palette_size: Option<usize>,
    #[arg(long)]
    pub ascii_width: Option<u32>,
}

fn invalid(message: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, message)
}

pub fn validate_quality(quality: f32) -> io::Result<f32> {
    if quality > 0.0 && quality <= 1.0 {
        Ok(quality)
    } else {
        Err(invalid(format!("品質需介於 0 與 1 之間：{}", quality)))
    }
}

pub fn validate_degrees(degrees: i64) -> io::Result<i64> {
    if degrees % 90 == 0 {
        Ok(degrees)
    } else {
        Err(invalid(format!("旋轉角度需為 90 的倍數：{}", degrees)))
    }
}

pub fn validate_color(color: &str) -> io::Result<String> {
    parse_hex_color(color).map_err(|_| invalid(format!("無效的顏色：{}（格式如 #1a2b3c）", color)))?;
    Ok(color.to_string())
}

fn validate_positive(name: &str, value: Option<u32>) -> io::Result<Option<u32>> {
    match value {
        Some(0) => Err(invalid(format!("{} 必須大於 0", name))),
        other => Ok(other),
    }
}

impl OptionArgs {
    /// 驗證並轉換為 `ConversionOptions`
    pub fn to_options(&self) -> io::Result<ConversionOptions> {
        let pages_to_delete = match self.pages.as_deref() {
            Some(pages) => Some(parse_page_list(pages).map_err(invalid)?),
            None => None,
        };
        let flip = if self.vertical {
            Some(FlipDirection::Vertical)
        } else if self.horizontal {
            Some(FlipDirection::Horizontal)
        } else {
            None
        };
        let sort_order = self.sort.as_deref().map(|s| match s {
            "desc" => SortOrder::Descending,
            _ => SortOrder::Ascending,
        });

        Ok(ConversionOptions {
            quality: self.quality.map(validate_quality).transpose()?,
            width: validate_positive("--width", self.width)?,
            height: validate_positive("--height", self.height)?,
            degrees: self.degrees.map(validate_degrees).transpose()?,
            flip,
            pages_to_delete,
            brightness: self.brightness,
            contrast: self.contrast,
            saturation: self.saturation,
            blur_amount: self.blur,
            border_width: self.border_width,
            border_color: self.border_color.as_deref().map(validate_color).transpose()?,
            pixel_size: validate_positive("--pixel-size", self.pixel_size)?,
            find_text: self.find.clone(),
            replace_text: self.replace.clone(),
            case_sensitive: self.case_insensitive.then_some(false),
            sort_order,
            qr_style: self.qr_style.as_deref().and_then(QrStyle::parse),
            qr_size: self.qr_size,
            qr_color: self.qr_color.as_deref().map(validate_color).transpose()?,
            compression_level: self.compression.as_deref().and_then(CompressionLevel::parse),
            watermark_text: self.watermark.clone(),
            password: self.password.clone(),
            palette_size: self.palette_size,
            ascii_width: validate_positive("--ascii-width", self.ascii_width)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn convert_subcommand_with_options() {
        let cli = parse(&[
            "convert_anything",
            "convert",
            "delete-pdf-pages",
            "a.pdf",
            "-o",
            "out",
            "--pages",
            "1,3-4",
            "--compression",
            "high",
            "--no-progress",
        ]);
        assert!(cli.no_progress);
        let Command::Convert(args) = cli.command else {
            panic!("預期 convert 子命令");
        };
        assert_eq!(args.id, "delete-pdf-pages");
        assert_eq!(args.inputs, vec![PathBuf::from("a.pdf")]);
        assert_eq!(args.output, "out");
        let options = args.options.to_options().unwrap();
        assert_eq!(options.pages_to_delete, Some(vec![1, 3, 4]));
        assert_eq!(options.compression_level, Some(CompressionLevel::High));
    }

    #[test]
    fn text_and_text_file_conflict() {
        let result = Cli::try_parse_from([
            "convert_anything",
            "convert",
            "word-counter",
            "--text",
            "hi",
            "--text-file",
            "a.txt",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn log_level_is_restricted() {
        assert!(Cli::try_parse_from(["convert_anything", "list", "--log-level", "trace"]).is_err());
        assert_eq!(parse(&["convert_anything", "list", "--log-level", "debug"]).log_level, "debug");
    }

    #[test]
    fn invalid_values_are_rejected() {
        let options = OptionArgs {
            quality: Some(1.5),
            ..OptionArgs::default()
        };
        assert!(options.to_options().is_err());

        let options = OptionArgs {
            degrees: Some(45),
            ..OptionArgs::default()
        };
        assert!(options.to_options().is_err());

        let options = OptionArgs {
            qr_color: Some("blue".to_string()),
            ..OptionArgs::default()
        };
        assert_eq!(options.to_options().unwrap_err().kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn flags_map_onto_options() {
        let options = OptionArgs {
            vertical: true,
            case_insensitive: true,
            sort: Some("desc".to_string()),
            qr_style: Some("dots".to_string()),
            degrees: Some(-90),
            ..OptionArgs::default()
        }
        .to_options()
        .unwrap();
        assert_eq!(options.flip, Some(FlipDirection::Vertical));
        assert_eq!(options.case_sensitive, Some(false));
        assert_eq!(options.sort_order, Some(SortOrder::Descending));
        assert_eq!(options.qr_style, Some(QrStyle::Dots));
        assert_eq!(options.degrees, Some(-90));
    }
}
