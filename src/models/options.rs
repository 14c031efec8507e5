use std::fmt;

pub const DEFAULT_QUALITY: f32 = 0.92;
pub const DEFAULT_COMPRESS_QUALITY: f32 = 0.8;
pub const DEFAULT_QR_SIZE: u32 = 300;
pub const DEFAULT_QR_COLOR: &str = "#000000";
pub const DEFAULT_PERCENT: u32 = 100;
pub const DEFAULT_BLUR: f32 = 10.0;
pub const DEFAULT_BORDER_WIDTH: u32 = 20;
pub const DEFAULT_BORDER_COLOR: &str = "#000000";
pub const DEFAULT_PIXEL_SIZE: u32 = 10;
pub const DEFAULT_ASCII_WIDTH: u32 = 80;
pub const DEFAULT_PALETTE_SIZE: usize = 5;
pub const DEFAULT_PDF_ROTATION: i64 = 90;

/// 各轉換可宣告為必要的選項
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKey {
    Dimensions,
    Degrees,
    PagesToDelete,
    WatermarkText,
    FindText,
    PageSize,
}

impl fmt::Display for OptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OptionKey::Dimensions => "--width/--height",
            OptionKey::Degrees => "--degrees",
            OptionKey::PagesToDelete => "--pages",
            OptionKey::WatermarkText => "--watermark",
            OptionKey::FindText => "--find",
            OptionKey::PageSize => "--width/--height (points)",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompressionLevel {
    Low,
    #[default]
    Medium,
    High,
}

impl CompressionLevel {
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlipDirection {
    #[default]
    Horizontal,
    Vertical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QrStyle {
    #[default]
    Classic,
    Rounded,
    Dots,
}

impl QrStyle {
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "classic" | "square" | "sharp" => Some(Self::Classic),
            "rounded" | "extra-rounded" | "classy-rounded" => Some(Self::Rounded),
            "dots" => Some(Self::Dots),
            _ => None,
        }
    }
}

/// 轉換參數。未設定的欄位由各轉換套用預設值，
/// 必要欄位則在分派前由 `missing_required` 檢查。
#[derive(Debug, Clone, Default)]
pub struct ConversionOptions {
    pub quality: Option<f32>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub degrees: Option<i64>,
    pub flip: Option<FlipDirection>,
    pub pages_to_delete: Option<Vec<u32>>,
    pub brightness: Option<u32>,
    pub contrast: Option<u32>,
    pub saturation: Option<u32>,
    pub blur_amount: Option<f32>,
    pub border_width: Option<u32>,
    pub border_color: Option<String>,
    pub pixel_size: Option<u32>,
    pub find_text: Option<String>,
    pub replace_text: Option<String>,
    pub case_sensitive: Option<bool>,
    pub sort_order: Option<SortOrder>,
    pub qr_style: Option<QrStyle>,
    pub qr_size: Option<u32>,
    pub qr_color: Option<String>,
    pub compression_level: Option<CompressionLevel>,
    pub watermark_text: Option<String>,
    pub password: Option<String>,
    pub palette_size: Option<usize>,
    pub ascii_width: Option<u32>,
}

impl ConversionOptions {
    pub fn has(&self, key: OptionKey) -> bool {
        match key {
            OptionKey::Dimensions | OptionKey::PageSize => {
                self.width.is_some_and(|w| w > 0) && self.height.is_some_and(|h| h > 0)
            }
            OptionKey::Degrees => self.degrees.is_some(),
            OptionKey::PagesToDelete => self.pages_to_delete.as_ref().is_some_and(|p| !p.is_empty()),
            OptionKey::WatermarkText => self
                .watermark_text
                .as_ref()
                .is_some_and(|t| !t.trim().is_empty()),
            OptionKey::FindText => self.find_text.as_ref().is_some_and(|t| !t.is_empty()),
        }
    }

    /// 回傳第一個缺少的必要選項
    pub fn missing_required(&self, required: &[OptionKey]) -> Option<OptionKey> {
        required.iter().copied().find(|key| !self.has(*key))
    }

    pub fn quality_or(&self, default: f32) -> f32 {
        self.quality.unwrap_or(default).clamp(0.01, 1.0)
    }
}

/// 解析頁碼清單，例如 `1,3,5-7`（從 1 開始）
pub fn parse_page_list(input: &str) -> Result<Vec<u32>, String> {
    let mut pages = Vec::new();
    for part in input.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        if let Some((start, end)) = part.split_once('-') {
            let start: u32 = start
                .trim()
                .parse()
                .map_err(|_| format!("無效的頁碼範圍：{}", part))?;
            let end: u32 = end
                .trim()
                .parse()
                .map_err(|_| format!("無效的頁碼範圍：{}", part))?;
            if start == 0 || end < start {
                return Err(format!("無效的頁碼範圍：{}", part));
            }
            pages.extend(start..=end);
        } else {
            let page: u32 = part.parse().map_err(|_| format!("無效的頁碼：{}", part))?;
            if page == 0 {
                return Err("頁碼從 1 開始".to_string());
            }
            pages.push(page);
        }
    }
    pages.sort_unstable();
    pages.dedup();
    Ok(pages)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ranges_and_single_pages() {
        let pages = parse_page_list("5-7, 1,3,3").expect("page list");
        assert_eq!(pages, vec![1, 3, 5, 6, 7]);
    }

    #[test]
    fn rejects_zero_and_reversed_ranges() {
        assert!(parse_page_list("0").is_err());
        assert!(parse_page_list("4-2").is_err());
        assert!(parse_page_list("a").is_err());
    }

    #[test]
    fn reports_first_missing_required_option() {
        let mut options = ConversionOptions::default();
        let required = [OptionKey::Dimensions, OptionKey::Degrees];
        assert_eq!(options.missing_required(&required), Some(OptionKey::Dimensions));
        options.width = Some(10);
        options.height = Some(20);
        assert_eq!(options.missing_required(&required), Some(OptionKey::Degrees));
        options.degrees = Some(90);
        assert_eq!(options.missing_required(&required), None);
    }

    #[test]
    fn blank_watermark_counts_as_missing() {
        let options = ConversionOptions {
            watermark_text: Some("   ".into()),
            ..Default::default()
        };
        assert!(!options.has(OptionKey::WatermarkText));
    }
}
