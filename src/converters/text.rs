//! 純文字工具：統計、大小寫、排序、取代、JSON 格式化、編碼與程式碼壓縮。

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::{Regex, RegexBuilder};
use serde::Serialize;

use crate::error::{ConvertError, ConvertResult};
use crate::models::blob::Blob;
use crate::models::conversion::{ConversionRequest, ConversionResult};
use crate::models::options::SortOrder;

pub const WORDS_PER_MINUTE: usize = 200;
const LOREM_PARAGRAPH: &str = "Lorem ipsum dolor sit amet, consectetur adipiscing elit. Sed do eiusmod tempor incididunt ut labore et dolore magna aliqua. Ut enim ad minim veniam, quis nostrud exercitation ullamco laboris nisi ut aliquip ex ea commodo consequat. Duis aute irure dolor in reprehenderit in voluptate velit esse cillum dolore eu fugiat nulla pariatur. Excepteur sint occaecat cupidatat non proident, sunt in culpa qui officia deserunt mollit anim id est laborum.\n\n";
const LOREM_REPEAT: usize = 5;

macro_rules! cached_regex {
    ($name:ident, $pattern:expr) => {
        fn $name() -> &'static Regex {
            static RE: OnceLock<Regex> = OnceLock::new();
            RE.get_or_init(|| Regex::new($pattern).expect("valid text regex"))
        }
    };
}

cached_regex!(sentence_split, r"[.!?]+");
cached_regex!(paragraph_split, r"\n\n+");
cached_regex!(title_word, r"\w\S*");
cached_regex!(email_pattern, r"[\w.-]+@[\w.-]+\.\w+");
cached_regex!(url_pattern, r"https?://[^\s]+");
cached_regex!(tag_pattern, r"<[^>]*>");
cached_regex!(block_comment, r"/\*[\s\S]*?\*/");
cached_regex!(line_comment, r"(?m)//.*$");
cached_regex!(whitespace_run, r"\s+");
cached_regex!(semicolon_before_brace, r";\s*\}");
cached_regex!(space_after_open_brace, r"\{\s+");
cached_regex!(space_after_semicolon, r";\s+");
cached_regex!(open_brace, r"\s*\{\s*");
cached_regex!(semicolon_any, r";\s*");
cached_regex!(close_brace, r"\s*\}\s*");
cached_regex!(comma_any, r",\s*");

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextStats {
    pub words: usize,
    pub characters: usize,
    pub characters_no_spaces: usize,
    pub sentences: usize,
    pub paragraphs: usize,
    pub lines: usize,
    pub reading_time_minutes: usize,
}

impl TextStats {
    pub fn report(&self) -> String {
        format!(
            "Words: {}\nCharacters: {}\nCharacters (no spaces): {}\nSentences: {}\nParagraphs: {}\nLines: {}\nReading Time: {} min",
            self.words,
            self.characters,
            self.characters_no_spaces,
            self.sentences,
            self.paragraphs,
            self.lines,
            self.reading_time_minutes
        )
    }
}

fn non_whitespace_count(text: &str) -> usize {
    text.chars().filter(|c| !c.is_whitespace()).count()
}

pub fn count_words(text: &str) -> TextStats {
    let words = text.split_whitespace().count();
    TextStats {
        words,
        characters: text.chars().count(),
        characters_no_spaces: non_whitespace_count(text),
        sentences: sentence_split()
            .split(text)
            .filter(|s| !s.trim().is_empty())
            .count(),
        paragraphs: paragraph_split()
            .split(text)
            .filter(|p| !p.trim().is_empty())
            .count(),
        lines: text.split('\n').count(),
        reading_time_minutes: words.div_ceil(WORDS_PER_MINUTE),
    }
}

pub fn character_report(text: &str) -> String {
    format!(
        "Total characters: {}\nCharacters (no spaces): {}",
        text.chars().count(),
        non_whitespace_count(text)
    )
}

pub fn line_report(text: &str) -> String {
    format!("Total lines: {}", text.split('\n').count())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseStyle {
    Upper,
    Lower,
    Title,
}

pub fn convert_case(text: &str, style: CaseStyle) -> String {
    match style {
        CaseStyle::Upper => text.to_uppercase(),
        CaseStyle::Lower => text.to_lowercase(),
        CaseStyle::Title => title_word()
            .replace_all(text, |caps: &regex::Captures| {
                let mut chars = caps[0].chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars.as_str().to_lowercase().chars()).collect(),
                    None => String::new(),
                }
            })
            .into_owned(),
    }
}

/// 保留第一次出現的順序
pub fn remove_duplicate_lines(text: &str) -> String {
    let mut seen = HashSet::new();
    text.split('\n')
        .filter(|line| seen.insert(*line))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn sort_lines(text: &str, order: SortOrder) -> String {
    let mut lines: Vec<&str> = text.split('\n').collect();
    lines.sort_unstable();
    if order == SortOrder::Descending {
        lines.reverse();
    }
    lines.join("\n")
}

pub fn reverse_text(text: &str) -> String {
    text.chars().rev().collect()
}

/// 以字面文字搜尋並全部取代
pub fn find_replace(text: &str, find: &str, replace: &str, case_sensitive: bool) -> ConvertResult<String> {
    if find.is_empty() {
        return Ok(text.to_string());
    }
    let pattern = RegexBuilder::new(&regex::escape(find))
        .case_insensitive(!case_sensitive)
        .build()
        .map_err(|e| ConvertError::InvalidInput(e.to_string()))?;
    Ok(pattern
        .replace_all(text, regex::NoExpand(replace))
        .into_owned())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedJson {
    pub formatted: String,
    pub is_valid: bool,
    pub error: Option<String>,
}

/// 無效的 JSON 不會回傳錯誤，而是 `is_valid = false` 並保留原文
pub fn format_json(input: &str) -> FormattedJson {
    match serde_json::from_str::<serde_json::Value>(input) {
        Ok(value) => match serde_json::to_string_pretty(&value) {
            Ok(formatted) => FormattedJson {
                formatted,
                is_valid: true,
                error: None,
            },
            Err(e) => FormattedJson {
                formatted: input.to_string(),
                is_valid: false,
                error: Some(e.to_string()),
            },
        },
        Err(e) => FormattedJson {
            formatted: input.to_string(),
            is_valid: false,
            error: Some(e.to_string()),
        },
    }
}

pub fn minify_json(input: &str) -> ConvertResult<String> {
    let value: serde_json::Value = serde_json::from_str(input)?;
    Ok(serde_json::to_string(&value)?)
}

pub fn remove_line_breaks(text: &str) -> String {
    text.replace('\n', " ")
}

pub fn add_line_numbers(text: &str) -> String {
    text.split('\n')
        .enumerate()
        .map(|(index, line)| format!("{}. {}", index + 1, line))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn text_to_binary(text: &str) -> String {
    text.chars()
        .map(|c| format!("{:08b}", c as u32))
        .collect::<Vec<_>>()
        .join(" ")
}

fn decode_code_points(input: &str, radix: u32, label: &str) -> ConvertResult<String> {
    input
        .split_whitespace()
        .map(|token| {
            u32::from_str_radix(token, radix)
                .ok()
                .and_then(char::from_u32)
                .ok_or_else(|| ConvertError::InvalidInput(format!("無效的{}數值：{}", label, token)))
        })
        .collect()
}

pub fn binary_to_text(input: &str) -> ConvertResult<String> {
    decode_code_points(input, 2, "二進位")
}

pub fn text_to_hex(text: &str) -> String {
    text.chars()
        .map(|c| format!("{:x}", c as u32))
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn hex_to_text(input: &str) -> ConvertResult<String> {
    decode_code_points(input, 16, "十六進位")
}

pub fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

pub fn html_unescape(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

pub fn strip_html_tags(html: &str) -> String {
    tag_pattern().replace_all(html, "").into_owned()
}

pub fn extract_emails(text: &str) -> Vec<&str> {
    email_pattern().find_iter(text).map(|m| m.as_str()).collect()
}

pub fn extract_urls(text: &str) -> Vec<&str> {
    url_pattern().find_iter(text).map(|m| m.as_str()).collect()
}

pub fn lorem_ipsum() -> String {
    LOREM_PARAGRAPH.repeat(LOREM_REPEAT)
}

pub fn minify_css(css: &str) -> String {
    let css = block_comment().replace_all(css, "");
    let css = whitespace_run().replace_all(&css, " ");
    let css = semicolon_before_brace().replace_all(&css, "}");
    let css = space_after_open_brace().replace_all(&css, "{");
    let css = space_after_semicolon().replace_all(&css, ";");
    css.trim().to_string()
}

pub fn minify_js(js: &str) -> String {
    let js = block_comment().replace_all(js, "");
    let js = line_comment().replace_all(&js, "");
    let js = whitespace_run().replace_all(&js, " ");
    let js = space_after_semicolon().replace_all(&js, ";");
    js.trim().to_string()
}

pub fn beautify_css(css: &str) -> String {
    let css = open_brace().replace_all(css, " {\n  ");
    let css = semicolon_any().replace_all(&css, ";\n  ");
    let css = close_brace().replace_all(&css, "\n}\n");
    let css = comma_any().replace_all(&css, ",\n  ");
    css.trim().to_string()
}

pub fn beautify_js(js: &str) -> String {
    let js = open_brace().replace_all(js, " {\n  ");
    let js = semicolon_any().replace_all(&js, ";\n");
    let js = close_brace().replace_all(&js, "\n}\n");
    let js = comma_any().replace_all(&js, ",\n  ");
    js.trim().to_string()
}

fn text_result(content: impl Into<String>) -> ConvertResult<ConversionResult> {
    Ok(Blob::text(content).into())
}

pub fn handle_word_counter(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    text_result(count_words(&request.text_content()?).report())
}

pub fn handle_character_counter(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    text_result(character_report(&request.text_content()?))
}

pub fn handle_line_counter(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    text_result(line_report(&request.text_content()?))
}

pub fn handle_upper(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    text_result(convert_case(&request.text_content()?, CaseStyle::Upper))
}

pub fn handle_lower(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    text_result(convert_case(&request.text_content()?, CaseStyle::Lower))
}

pub fn handle_title(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    text_result(convert_case(&request.text_content()?, CaseStyle::Title))
}

pub fn handle_remove_duplicates(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    text_result(remove_duplicate_lines(&request.text_content()?))
}

pub fn handle_sort_lines(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    let order = request.options.sort_order.unwrap_or_default();
    text_result(sort_lines(&request.text_content()?, order))
}

pub fn handle_reverse(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    text_result(reverse_text(&request.text_content()?))
}

pub fn handle_find_replace(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    let options = &request.options;
    text_result(find_replace(
        &request.text_content()?,
        options.find_text.as_deref().unwrap_or_default(),
        options.replace_text.as_deref().unwrap_or_default(),
        options.case_sensitive.unwrap_or(true),
    )?)
}

pub fn handle_json_formatter(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    let result = format_json(&request.text_content()?);
    if !result.is_valid {
        return Err(ConvertError::InvalidInput(format!(
            "無效的 JSON: {}",
            result.error.unwrap_or_default()
        )));
    }
    Ok(Blob::with_mime(result.formatted, "application/json").into())
}

pub fn handle_json_minify(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    Ok(Blob::with_mime(minify_json(&request.text_content()?)?, "application/json").into())
}

pub fn handle_remove_line_breaks(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    text_result(remove_line_breaks(&request.text_content()?))
}

pub fn handle_line_numbers(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    text_result(add_line_numbers(&request.text_content()?))
}

pub fn handle_text_to_binary(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    text_result(text_to_binary(&request.text_content()?))
}

pub fn handle_binary_to_text(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    text_result(binary_to_text(&request.text_content()?)?)
}

pub fn handle_text_to_hex(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    text_result(text_to_hex(&request.text_content()?))
}

pub fn handle_hex_to_text(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    text_result(hex_to_text(&request.text_content()?)?)
}

pub fn handle_html_encode(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    text_result(html_escape(&request.text_content()?))
}

pub fn handle_html_decode(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    text_result(html_unescape(&request.text_content()?))
}

pub fn handle_strip_tags(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    text_result(strip_html_tags(&request.text_content()?))
}

pub fn handle_extract_emails(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    text_result(extract_emails(&request.text_content()?).join("\n"))
}

pub fn handle_extract_urls(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    text_result(extract_urls(&request.text_content()?).join("\n"))
}

pub fn handle_lorem_ipsum(_request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    text_result(lorem_ipsum())
}

pub fn handle_minify_css(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    Ok(Blob::with_mime(minify_css(&request.text_content()?), "text/css").into())
}

pub fn handle_minify_js(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    Ok(Blob::with_mime(minify_js(&request.text_content()?), "application/javascript").into())
}

pub fn handle_beautify_css(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    Ok(Blob::with_mime(beautify_css(&request.text_content()?), "text/css").into())
}

pub fn handle_beautify_js(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    Ok(Blob::with_mime(beautify_js(&request.text_content()?), "application/javascript").into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_count_report_matches_layout() {
        let stats = count_words("Hello world. How are you?\n\nFine!");
        assert_eq!(stats.words, 6);
        assert_eq!(stats.sentences, 3);
        assert_eq!(stats.paragraphs, 2);
        assert_eq!(stats.lines, 3);
        assert_eq!(stats.reading_time_minutes, 1);
        assert!(stats.report().starts_with("Words: 6\nCharacters: 32\n"));
        assert!(stats.report().ends_with("Reading Time: 1 min"));
    }

    #[test]
    fn title_case_capitalizes_each_word() {
        assert_eq!(convert_case("hELLO wORLD-wide", CaseStyle::Title), "Hello World-wide");
    }

    #[test]
    fn find_replace_is_literal_and_respects_case() {
        assert_eq!(find_replace("a.b A.B", "a.b", "$x", true).unwrap(), "$x A.B");
        assert_eq!(find_replace("a.b A.B", "a.b", "x", false).unwrap(), "x x");
    }

    #[test]
    fn format_json_reports_invalid_input() {
        let invalid = format_json("{\"a\":");
        assert!(!invalid.is_valid);
        assert!(invalid.error.as_deref().is_some_and(|e| !e.is_empty()));
        assert_eq!(invalid.formatted, "{\"a\":");

        let valid = format_json("{\"a\":[1,2]}");
        assert!(valid.is_valid);
        let reparsed: serde_json::Value = serde_json::from_str(&valid.formatted).unwrap();
        assert_eq!(reparsed, serde_json::json!({"a": [1, 2]}));
        assert!(valid.formatted.contains("\n  \"a\""));
    }

    #[test]
    fn binary_and_hex_round_trip() {
        assert_eq!(text_to_binary("Hi"), "01001000 01101001");
        assert_eq!(binary_to_text("01001000 01101001").unwrap(), "Hi");
        assert_eq!(text_to_hex("Hi"), "48 69");
        assert_eq!(hex_to_text("48 69").unwrap(), "Hi");
        assert!(binary_to_text("2").is_err());
    }

    #[test]
    fn html_entities_round_trip() {
        let raw = "<a href=\"x\">Tom & 'Jerry'</a>";
        assert_eq!(html_unescape(&html_escape(raw)), raw);
    }

    #[test]
    fn extracts_emails_and_urls() {
        let text = "mail bob.smith@example.com or see https://example.com/a?b=1 now";
        assert_eq!(extract_emails(text), vec!["bob.smith@example.com"]);
        assert_eq!(extract_urls(text), vec!["https://example.com/a?b=1"]);
    }

    #[test]
    fn css_minify_and_beautify() {
        assert_eq!(minify_css("a {\n  color: red;\n}\n/* c */"), "a {color: red}");
        assert_eq!(beautify_css("a{color:red;}"), "a {\n  color:red;\n}");
    }

    #[test]
    fn duplicate_lines_keep_first_occurrence() {
        assert_eq!(remove_duplicate_lines("b\na\nb\nc\na"), "b\na\nc");
        assert_eq!(sort_lines("b\na\nc", SortOrder::Descending), "c\nb\na");
    }
}
