use std::sync::OnceLock;

use rand::Rng;
use regex::Regex;

use crate::error::{ConvertError, ConvertResult};
use crate::models::blob::Blob;
use crate::models::conversion::{ConversionRequest, ConversionResult};

pub const RANDOM_COLOR_COUNT: usize = 10;

fn rgb_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+),\s*(\d+),\s*(\d+)").expect("valid rgb regex"))
}

/// 解析 `#rrggbb` 或 `#rgb`，井號可省略
pub fn parse_hex_color(input: &str) -> ConvertResult<[u8; 3]> {
    let hex = input.trim().trim_start_matches('#');
    if !hex.is_ascii() {
        return Err(ConvertError::InvalidInput(format!("無效的十六進位顏色：{}", input.trim())));
    }
    let expanded: String = match hex.len() {
        3 => hex.chars().flat_map(|c| [c, c]).collect(),
        6 => hex.to_string(),
        _ => return Err(ConvertError::InvalidInput(format!("無效的十六進位顏色：{}", input.trim()))),
    };
    let mut rgb = [0u8; 3];
    for (slot, index) in rgb.iter_mut().zip([0, 2, 4]) {
        *slot = u8::from_str_radix(&expanded[index..index + 2], 16)
            .map_err(|_| ConvertError::InvalidInput(format!("無效的十六進位顏色：{}", input.trim())))?;
    }
    Ok(rgb)
}

pub fn hex_to_rgb(input: &str) -> ConvertResult<String> {
    let [r, g, b] = parse_hex_color(input)?;
    Ok(format!("rgb({}, {}, {})", r, g, b))
}

/// 取文字中第一組 `r, g, b` 數字
pub fn rgb_to_hex(input: &str) -> ConvertResult<String> {
    let captures = rgb_regex()
        .captures(input)
        .ok_or_else(|| ConvertError::InvalidInput(format!("找不到 RGB 數值：{}", input.trim())))?;
    let mut channels = [0u8; 3];
    for (slot, index) in channels.iter_mut().zip(1..=3) {
        let value: u32 = captures[index]
            .parse()
            .map_err(|_| ConvertError::InvalidInput(format!("無效的 RGB 數值：{}", &captures[index])))?;
        *slot = value.min(255) as u8;
    }
    Ok(format!("#{:02x}{:02x}{:02x}", channels[0], channels[1], channels[2]))
}

/// 色相為角度，飽和度與亮度為百分比，皆四捨五入為整數
pub fn rgb_to_hsl([r, g, b]: [u8; 3]) -> (u32, u32, u32) {
    let (r, g, b) = (r as f64 / 255.0, g as f64 / 255.0, b as f64 / 255.0);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let lightness = (max + min) / 2.0;

    if (max - min).abs() < f64::EPSILON {
        return (0, 0, (lightness * 100.0).round() as u32);
    }

    let delta = max - min;
    let saturation = if lightness > 0.5 {
        delta / (2.0 - max - min)
    } else {
        delta / (max + min)
    };
    let sector = if max == r {
        (g - b) / delta + if g < b { 6.0 } else { 0.0 }
    } else if max == g {
        (b - r) / delta + 2.0
    } else {
        (r - g) / delta + 4.0
    };
    let hue = sector / 6.0;

    (
        (hue * 360.0).round() as u32 % 360,
        (saturation * 100.0).round() as u32,
        (lightness * 100.0).round() as u32,
    )
}

pub fn hex_to_hsl(input: &str) -> ConvertResult<String> {
    let (h, s, l) = rgb_to_hsl(parse_hex_color(input)?);
    Ok(format!("hsl({}, {}%, {}%)", h, s, l))
}

pub fn random_color<R: Rng>(rng: &mut R) -> String {
    format!("#{:06x}", rng.random_range(0..=0xFF_FFFFu32))
}

pub fn handle_hex_to_rgb(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    Ok(Blob::text(hex_to_rgb(&request.text_content()?)?).into())
}

pub fn handle_rgb_to_hex(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    Ok(Blob::text(rgb_to_hex(&request.text_content()?)?).into())
}

pub fn handle_hex_to_hsl(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    Ok(Blob::text(hex_to_hsl(&request.text_content()?)?).into())
}

pub fn handle_random_colors(_request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    let mut rng = rand::rng();
    let colors: Vec<String> = (0..RANDOM_COLOR_COUNT).map(|_| random_color(&mut rng)).collect();
    Ok(Blob::text(colors.join("\n")).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_and_rgb_convert_both_ways() {
        assert_eq!(hex_to_rgb("#ff8000").unwrap(), "rgb(255, 128, 0)");
        assert_eq!(hex_to_rgb("0f0").unwrap(), "rgb(0, 255, 0)");
        assert_eq!(rgb_to_hex("rgb(255, 128, 0)").unwrap(), "#ff8000");
        assert!(rgb_to_hex("no numbers").is_err());
    }

    #[test]
    fn hsl_matches_known_values() {
        assert_eq!(hex_to_hsl("#ff0000").unwrap(), "hsl(0, 100%, 50%)");
        assert_eq!(hex_to_hsl("#808080").unwrap(), "hsl(0, 0%, 50%)");
        assert_eq!(hex_to_hsl("#0000ff").unwrap(), "hsl(240, 100%, 50%)");
    }

    #[test]
    fn random_colors_are_valid_hex() {
        let mut rng = rand::rng();
        for _ in 0..20 {
            let color = random_color(&mut rng);
            assert_eq!(color.len(), 7);
            assert!(parse_hex_color(&color).is_ok());
        }
    }

    #[test]
    fn rejects_malformed_hex() {
        assert!(parse_hex_color("#12345").is_err());
        assert!(parse_hex_color("#gggggg").is_err());
    }
}
