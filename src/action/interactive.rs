use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use dialoguer::{Confirm, Input, Password, Select};

use crate::action::cli::describe_input;
use crate::config::config::{validate_color, validate_degrees, validate_quality};
use crate::config::ports::{AppConfig, ConfigPort};
use crate::facade::conversion_facade::ConversionFacade;
use crate::models::conversion::ConversionOutput;
use crate::models::options::{
    parse_page_list, CompressionLevel, ConversionOptions, FlipDirection, OptionKey, QrStyle, SortOrder,
};
use crate::service::config_service::DEFAULT_OUTPUT_DIR;
use crate::service::file_service::FileService;
use crate::service::output_service::OutputService;
use crate::service::registry::{
    categories, get_conversions_by_category, get_popular_conversions, search_conversions,
    ConversionDescriptor, InputKind,
};
use crate::utils::utils::{generate_random_password, setup_logging};

const RANDOM_PASSWORD_LENGTH: usize = 16;

fn prompt_error(action: &str, e: dialoguer::Error) -> io::Error {
    io::Error::new(io::ErrorKind::Other, format!("{}失敗: {}", action, e))
}

pub fn process_interactive_mode() -> io::Result<ConversionOutput> {
    setup_logging("info")?;
    println!("=== 歡迎使用互動模式 ===");
    let descriptor = select_conversion()?;
    println!("{}：{}", descriptor.name, descriptor.description);
    println!("需要的輸入：{}", describe_input(descriptor.input));

    let facade = ConversionFacade::new(
        Box::new(InteractiveConfigAdapter::new(descriptor)),
        Box::new(FileService::new()),
        Box::new(OutputService::new()),
    );
    let output = facade.run()?;
    for path in &output.written {
        println!("  {}", path.display());
    }
    Ok(output)
}

pub fn select_conversion() -> io::Result<&'static ConversionDescriptor> {
    let groups = categories();
    let mut items = vec!["★ 常用轉換".to_string()];
    items.extend(groups.iter().map(|c| c.label().to_string()));
    items.push("🔍 搜尋".to_string());

    let choice = Select::new()
        .with_prompt("選擇分類（使用方向鍵選擇，按 Enter 確認）")
        .items(&items)
        .default(0)
        .interact()
        .map_err(|e| prompt_error("分類選擇", e))?;

    let candidates = if choice == 0 {
        get_popular_conversions()
    } else if choice <= groups.len() {
        get_conversions_by_category(groups[choice - 1])
    } else {
        let query: String = Input::new()
            .with_prompt("輸入關鍵字（例如：pdf、json、image）")
            .interact_text()
            .map_err(|e| prompt_error("關鍵字輸入", e))?;
        search_conversions(&query)
    };
    if candidates.is_empty() {
        return Err(io::Error::new(io::ErrorKind::NotFound, "沒有符合的轉換"));
    }

    let labels: Vec<String> = candidates
        .iter()
        .map(|c| format!("{} ({} → {})", c.name, c.from, c.to))
        .collect();
    let index = Select::new()
        .with_prompt("選擇轉換")
        .items(&labels)
        .default(0)
        .interact()
        .map_err(|e| prompt_error("轉換選擇", e))?;
    Ok(candidates[index])
}

pub fn get_input_path(prompt: &str) -> io::Result<PathBuf> {
    let input: String = Input::new()
        .with_prompt(prompt)
        .validate_with(|input: &String| -> Result<(), String> {
            if Path::new(input).exists() {
                Ok(())
            } else {
                Err(format!("路徑 '{}' 不存在", input))
            }
        })
        .interact_text()
        .map_err(|e| prompt_error("路徑輸入", e))?;
    Ok(PathBuf::from(input))
}

pub fn get_input_paths(min: usize, multiple: bool) -> io::Result<Vec<PathBuf>> {
    let mut paths = vec![get_input_path("請輸入檔案或目錄路徑（例如：./photo.png 或 ./mydir）")?];
    if !multiple {
        return Ok(paths);
    }
    loop {
        let more = paths.len() < min
            || Confirm::new()
                .with_prompt(format!("已加入 {} 個輸入，是否繼續加入？", paths.len()))
                .default(false)
                .interact()
                .map_err(|e| prompt_error("加入更多輸入", e))?;
        if !more {
            return Ok(paths);
        }
        paths.push(get_input_path("請輸入下一個檔案或目錄路徑")?);
    }
}

pub fn get_text_input() -> io::Result<String> {
    let source = Select::new()
        .with_prompt("選擇文字來源")
        .items(&["直接輸入", "從檔案讀取"])
        .default(0)
        .interact()
        .map_err(|e| prompt_error("文字來源選擇", e))?;
    if source == 1 {
        let path = get_input_path("請輸入文字檔路徑")?;
        return fs::read_to_string(path);
    }
    Input::new()
        .with_prompt("請輸入文字")
        .interact_text()
        .map_err(|e| prompt_error("文字輸入", e))
}

pub fn get_output_path() -> io::Result<String> {
    Input::new()
        .with_prompt("輸入輸出目錄（例如：./output，預設為 output）")
        .default(DEFAULT_OUTPUT_DIR.to_string())
        .interact_text()
        .map_err(|e| prompt_error("輸出目錄輸入", e))
}

fn prompt_number<T>(prompt: &str, default: Option<T>) -> io::Result<T>
where
    T: Clone + ToString + std::str::FromStr,
    <T as std::str::FromStr>::Err: ToString,
{
    let mut input = Input::<T>::new().with_prompt(prompt);
    if let Some(default) = default {
        input = input.default(default);
    }
    input.interact_text().map_err(|e| prompt_error("數值輸入", e))
}

fn prompt_text(prompt: &str, allow_empty: bool) -> io::Result<String> {
    Input::new()
        .with_prompt(prompt)
        .allow_empty(allow_empty)
        .interact_text()
        .map_err(|e| prompt_error("文字輸入", e))
}

fn prompt_select(prompt: &str, items: &[&str]) -> io::Result<usize> {
    Select::new()
        .with_prompt(prompt)
        .items(items)
        .default(0)
        .interact()
        .map_err(|e| prompt_error("選項選擇", e))
}

fn prompt_color(prompt: &str, default: &str) -> io::Result<String> {
    let color: String = Input::new()
        .with_prompt(prompt)
        .default(default.to_string())
        .validate_with(|input: &String| validate_color(input).map(|_| ()).map_err(|e| e.to_string()))
        .interact_text()
        .map_err(|e| prompt_error("顏色輸入", e))?;
    Ok(color)
}

pub fn prompt_manual_password() -> io::Result<String> {
    let pwd = Password::new()
        .with_prompt("請輸入 ZIP 加密密碼")
        .interact()
        .map_err(|e| prompt_error("密碼輸入", e))?;
    let confirm_pwd = Password::new()
        .with_prompt("請再次輸入密碼以確認")
        .interact()
        .map_err(|e| prompt_error("密碼確認", e))?;
    if pwd != confirm_pwd {
        return Err(io::Error::new(io::ErrorKind::InvalidInput, "密碼不匹配"));
    }
    Ok(pwd)
}

fn get_zip_password(creating: bool) -> io::Result<Option<String>> {
    if !creating {
        let needed = Confirm::new()
            .with_prompt("ZIP 是否有密碼保護？")
            .default(false)
            .interact()
            .map_err(|e| prompt_error("密碼選項", e))?;
        return if needed {
            Password::new()
                .with_prompt("請輸入 ZIP 密碼")
                .interact()
                .map(Some)
                .map_err(|e| prompt_error("密碼輸入", e))
        } else {
            Ok(None)
        };
    }
    match prompt_select("選擇密碼模式", &["無密碼", "手動輸入", "隨機生成（16 位）"])? {
        1 => Ok(Some(prompt_manual_password()?)),
        2 => {
            let pwd = generate_random_password(RANDOM_PASSWORD_LENGTH);
            println!("已生成隨機密碼：{}（請妥善保存）", pwd);
            log::info!("使用隨機生成的 ZIP 密碼");
            Ok(Some(pwd))
        }
        _ => Ok(None),
    }
}

/// 必要選項一定詢問，其餘只詢問與該轉換相關的選項
pub fn get_conversion_options(descriptor: &ConversionDescriptor) -> io::Result<ConversionOptions> {
    let mut options = ConversionOptions::default();

    for key in descriptor.required {
        match key {
            OptionKey::Dimensions | OptionKey::PageSize => {
                let unit = if *key == OptionKey::PageSize { "點" } else { "像素" };
                options.width = Some(prompt_number(&format!("寬度（{}）", unit), None)?);
                options.height = Some(prompt_number(&format!("高度（{}）", unit), None)?);
            }
            OptionKey::Degrees => {
                let degrees = [90, 180, 270][prompt_select("旋轉角度", &["90°", "180°", "270°"])?];
                options.degrees = Some(validate_degrees(degrees)?);
            }
            OptionKey::PagesToDelete => {
                let pages = prompt_text("要刪除的頁碼（例如：1,3,5-7）", false)?;
                options.pages_to_delete =
                    Some(parse_page_list(&pages).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?);
            }
            OptionKey::WatermarkText => {
                options.watermark_text = Some(prompt_text("浮水印文字", false)?);
            }
            OptionKey::FindText => {
                options.find_text = Some(prompt_text("要尋找的文字", false)?);
                options.replace_text = Some(prompt_text("取代為（可留空）", true)?);
                options.case_sensitive = Some(
                    Confirm::new()
                        .with_prompt("區分大小寫？")
                        .default(true)
                        .interact()
                        .map_err(|e| prompt_error("大小寫選項", e))?,
                );
            }
        }
    }

    match descriptor.id {
        "compress-image" => {
            options.quality = Some(validate_quality(prompt_number("壓縮品質（0.1 - 1.0）", Some(0.8))?)?);
        }
        id if id.ends_with("-to-jpg") || id.ends_with("-to-webp") => {
            options.quality = Some(validate_quality(prompt_number("輸出品質（0.1 - 1.0）", Some(0.92))?)?);
        }
        "flip-image" => {
            options.flip = Some(match prompt_select("翻轉方向", &["水平", "垂直"])? {
                1 => FlipDirection::Vertical,
                _ => FlipDirection::Horizontal,
            });
        }
        "image-brightness" => options.brightness = Some(prompt_number("亮度百分比", Some(100))?),
        "image-contrast" => options.contrast = Some(prompt_number("對比百分比", Some(100))?),
        "image-saturation" => options.saturation = Some(prompt_number("飽和度百分比", Some(100))?),
        "image-blur" => options.blur_amount = Some(prompt_number("模糊程度", Some(10.0))?),
        "image-pixelate" => options.pixel_size = Some(prompt_number("像素大小", Some(10))?),
        "add-image-border" => {
            options.border_width = Some(prompt_number("邊框寬度（像素）", Some(20))?);
            options.border_color = Some(prompt_color("邊框顏色", "#000000")?);
        }
        "image-to-ascii" => options.ascii_width = Some(prompt_number("字元寬度", Some(80))?),
        "color-picker" => options.palette_size = Some(prompt_number("顏色數量", Some(5))?),
        "compress-pdf" => {
            options.compression_level = Some(match prompt_select("壓縮程度", &["中（預設）", "低", "高"])? {
                1 => CompressionLevel::Low,
                2 => CompressionLevel::High,
                _ => CompressionLevel::Medium,
            });
        }
        "sort-lines" => {
            options.sort_order = Some(match prompt_select("排序方式", &["遞增", "遞減"])? {
                1 => SortOrder::Descending,
                _ => SortOrder::Ascending,
            });
        }
        "generate-qr" => {
            options.qr_style = Some(match prompt_select("QR Code 樣式", &["經典方塊", "圓角", "圓點"])? {
                1 => QrStyle::Rounded,
                2 => QrStyle::Dots,
                _ => QrStyle::Classic,
            });
            options.qr_size = Some(prompt_number("尺寸（像素）", Some(300))?);
            options.qr_color = Some(prompt_color("顏色", "#000000")?);
        }
        "create-zip" => options.password = get_zip_password(true)?,
        "extract-zip" => options.password = get_zip_password(false)?,
        _ => {}
    }
    Ok(options)
}

// 交互配置適配器
pub struct InteractiveConfigAdapter {
    descriptor: &'static ConversionDescriptor,
}

impl InteractiveConfigAdapter {
    pub fn new(descriptor: &'static ConversionDescriptor) -> Self {
        InteractiveConfigAdapter { descriptor }
    }
}

impl ConfigPort for InteractiveConfigAdapter {
    fn get_config(&self) -> io::Result<AppConfig> {
        let (inputs, text) = match self.descriptor.input {
            InputKind::Files { min, multiple } => (get_input_paths(min, multiple)?, None),
            InputKind::Text => (Vec::new(), Some(get_text_input()?)),
            InputKind::Nothing => (Vec::new(), None),
        };
        let options = get_conversion_options(self.descriptor)?;
        let output_dir = get_output_path()?;

        Ok(AppConfig {
            conversion_id: self.descriptor.id.to_string(),
            inputs,
            text,
            output_dir,
            options,
            no_progress: false,
        })
    }
}
