//! PDF 文字擷取。
//!
//! 依序嘗試三種方法，第一個成功者勝出：
//! 1. 以 lopdf 解析頁面內容串流，取得帶座標的文字項目，依 Y 由上而下、X 由左而右排序後
//!    以 `LINE_Y_TOLERANCE` 分行，每頁前加上 `--- Page N ---`。
//! 2. 把整個檔案以 Latin-1 解碼，掃描 `BT ... ET` 區塊中的 `(...)` 字串。
//! 3. 回傳包含檔名、大小、頁數與可能原因的診斷訊息。
//!
//! 整個流程不會回傳錯誤。

use std::collections::BTreeMap;
use std::sync::OnceLock;

use lopdf::content::Content;
use lopdf::{Document, Object, ObjectId};
use regex::Regex;

use crate::converters::pdf_engine::{pdf_engine, ExtractionSettings};
use crate::error::{ConvertError, ConvertResult};
use crate::utils::utils::format_file_size;

// 無字型寬度資訊時，以字級的一半估算每個字元的前進量
const AVG_GLYPH_WIDTH: f64 = 0.5;
// TJ 陣列中的位移超過此值（千分之一字級）視為字間空白
const TJ_SPACE_THRESHOLD: f64 = 200.0;
// 兩個文字項目之間的水平間距超過字級的此比例時插入空白
const WORD_GAP_RATIO: f64 = 0.25;

/// 頁面上一段帶座標的文字
#[derive(Debug, Clone, PartialEq)]
pub struct TextItem {
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub font_size: f64,
    pub font_name: String,
}

impl TextItem {
    pub fn is_bold(&self) -> bool {
        self.font_name.to_ascii_lowercase().contains("bold")
    }

    pub fn is_italic(&self) -> bool {
        let lower = self.font_name.to_ascii_lowercase();
        lower.contains("italic") || lower.contains("oblique")
    }
}

#[derive(Debug, Clone)]
pub struct PageText {
    pub page_number: u32,
    pub items: Vec<TextItem>,
    pub fallback_text: Option<String>,
}

pub fn extract_text_from_pdf(file_name: &str, bytes: &[u8]) -> String {
    pdf_engine().extract_text(file_name, bytes)
}

pub(crate) fn extract_text_with(settings: ExtractionSettings, file_name: &str, bytes: &[u8]) -> String {
    match extract_with_library(bytes, settings.line_tolerance) {
        Ok(text) => {
            log::info!("PDF 文字擷取成功（結構解析）：{}", file_name);
            return text;
        }
        Err(e) => log::warn!("結構解析擷取失敗，改用原始掃描：{}：{}", file_name, e),
    }

    match extract_with_raw_scan(bytes, settings.raw_scan_min_chars) {
        Some(text) => {
            log::info!("PDF 文字擷取成功（原始掃描）：{}", file_name);
            text
        }
        None => {
            log::warn!("無法從 PDF 擷取文字，回傳診斷訊息：{}", file_name);
            diagnostic_message(file_name, bytes)
        }
    }
}

fn extract_with_library(bytes: &[u8], tolerance: f64) -> ConvertResult<String> {
    let document = pdf_engine().load(bytes)?;
    let pages = positioned_pages(&document)?;

    let mut output = String::new();
    let mut has_text = false;
    for page in pages {
        output.push_str(&format!("--- Page {} ---\n", page.page_number));
        let page_text = if page.items.is_empty() {
            page.fallback_text.unwrap_or_default()
        } else {
            group_lines(page.items, tolerance)
                .iter()
                .map(|line| line_text(line))
                .filter(|line| !line.trim().is_empty())
                .collect::<Vec<_>>()
                .join("\n")
        };
        if !page_text.trim().is_empty() {
            has_text = true;
        }
        output.push_str(page_text.trim_end());
        output.push_str("\n\n");
    }

    if !has_text {
        return Err(ConvertError::Pdf("文件中沒有可擷取的文字".to_string()));
    }
    Ok(output.trim().to_string())
}

/// 逐頁取得帶座標的文字項目；內容串流無法解析的頁面改用 lopdf 內建擷取
pub fn positioned_pages(document: &Document) -> ConvertResult<Vec<PageText>> {
    let pages = document.get_pages();
    if pages.is_empty() {
        return Err(ConvertError::Pdf("PDF 沒有任何頁面".to_string()));
    }

    let mut result = Vec::with_capacity(pages.len());
    for (page_number, page_id) in pages {
        let items = match page_items(document, page_id) {
            Ok(items) => items,
            Err(e) => {
                log::debug!("第 {} 頁內容串流解析失敗：{}", page_number, e);
                Vec::new()
            }
        };
        let fallback_text = if items.iter().all(|i| i.text.trim().is_empty()) {
            document.extract_text(&[page_number]).ok()
        } else {
            None
        };
        let items = items.into_iter().filter(|i| !i.text.trim().is_empty()).collect();
        result.push(PageText {
            page_number,
            items,
            fallback_text,
        });
    }
    Ok(result)
}

fn page_font_names(document: &Document, page_id: ObjectId) -> BTreeMap<Vec<u8>, String> {
    document
        .get_page_fonts(page_id)
        .into_iter()
        .map(|(resource, font)| {
            let base = font
                .get(b"BaseFont")
                .and_then(Object::as_name)
                .map(|name| String::from_utf8_lossy(name).into_owned())
                .unwrap_or_default();
            (resource, base)
        })
        .collect()
}

type Matrix = [f64; 6];

const IDENTITY: Matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

fn translate(matrix: &Matrix, tx: f64, ty: f64) -> Matrix {
    [
        matrix[0],
        matrix[1],
        matrix[2],
        matrix[3],
        tx * matrix[0] + ty * matrix[2] + matrix[4],
        tx * matrix[1] + ty * matrix[3] + matrix[5],
    ]
}

struct TextState {
    matrix: Matrix,
    line_matrix: Matrix,
    leading: f64,
    font_size: f64,
    font_name: String,
}

impl TextState {
    fn new() -> Self {
        TextState {
            matrix: IDENTITY,
            line_matrix: IDENTITY,
            leading: 0.0,
            font_size: 12.0,
            font_name: String::new(),
        }
    }

    fn move_line(&mut self, tx: f64, ty: f64) {
        self.line_matrix = translate(&self.line_matrix, tx, ty);
        self.matrix = self.line_matrix;
    }

    fn next_line(&mut self) {
        let leading = self.leading;
        self.move_line(0.0, -leading);
    }

    fn effective_size(&self) -> f64 {
        let scale = (self.matrix[2] * self.matrix[2] + self.matrix[3] * self.matrix[3]).sqrt();
        if scale > 0.0 {
            self.font_size * scale
        } else {
            self.font_size
        }
    }

    fn show(&mut self, text: String, items: &mut Vec<TextItem>) {
        let glyphs = text.chars().count() as f64;
        let advance = glyphs * AVG_GLYPH_WIDTH * self.font_size;
        let size = self.effective_size();
        items.push(TextItem {
            x: self.matrix[4],
            y: self.matrix[5],
            width: advance * self.matrix[0].abs().max(f64::EPSILON),
            font_size: size,
            font_name: self.font_name.clone(),
            text,
        });
        self.matrix = translate(&self.matrix, advance, 0.0);
    }
}

fn page_items(document: &Document, page_id: ObjectId) -> ConvertResult<Vec<TextItem>> {
    let fonts = page_font_names(document, page_id);
    let content_data = document.get_page_content(page_id)?;
    let content = Content::decode(&content_data)?;

    let mut state = TextState::new();
    let mut items = Vec::new();

    for operation in &content.operations {
        let operands = &operation.operands;
        match operation.operator.as_str() {
            "BT" => {
                state.matrix = IDENTITY;
                state.line_matrix = IDENTITY;
            }
            "Tf" => {
                if let Some(Object::Name(resource)) = operands.first() {
                    state.font_name = fonts
                        .get(resource)
                        .cloned()
                        .unwrap_or_else(|| String::from_utf8_lossy(resource).into_owned());
                }
                if let Some(size) = operands.get(1).and_then(number) {
                    state.font_size = size;
                }
            }
            "TL" => {
                if let Some(leading) = operands.first().and_then(number) {
                    state.leading = leading;
                }
            }
            "Td" | "TD" => {
                let tx = operands.first().and_then(number).unwrap_or(0.0);
                let ty = operands.get(1).and_then(number).unwrap_or(0.0);
                if operation.operator == "TD" {
                    state.leading = -ty;
                }
                state.move_line(tx, ty);
            }
            "Tm" => {
                let values: Vec<f64> = operands.iter().filter_map(number).collect();
                if values.len() == 6 {
                    let matrix = [values[0], values[1], values[2], values[3], values[4], values[5]];
                    state.matrix = matrix;
                    state.line_matrix = matrix;
                }
            }
            "T*" => state.next_line(),
            "Tj" => {
                if let Some(text) = operands.first().and_then(string_operand) {
                    state.show(text, &mut items);
                }
            }
            "'" => {
                state.next_line();
                if let Some(text) = operands.first().and_then(string_operand) {
                    state.show(text, &mut items);
                }
            }
            "\"" => {
                state.next_line();
                if let Some(text) = operands.get(2).and_then(string_operand) {
                    state.show(text, &mut items);
                }
            }
            "TJ" => {
                if let Some(Object::Array(parts)) = operands.first() {
                    let mut text = String::new();
                    for part in parts {
                        match part {
                            Object::String(..) => {
                                if let Some(piece) = string_operand(part) {
                                    text.push_str(&piece);
                                }
                            }
                            other => {
                                if let Some(offset) = number(other) {
                                    if -offset > TJ_SPACE_THRESHOLD && !text.ends_with(' ') {
                                        text.push(' ');
                                    }
                                }
                            }
                        }
                    }
                    state.show(text, &mut items);
                }
            }
            _ => {}
        }
    }
    Ok(items)
}

fn number(object: &Object) -> Option<f64> {
    match object {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(*r as f64),
        _ => None,
    }
}

fn string_operand(object: &Object) -> Option<String> {
    match object {
        Object::String(bytes, _) => Some(decode_pdf_string(bytes)),
        _ => None,
    }
}

/// UTF-16BE（含 BOM）或單位元組編碼的 PDF 字串
pub fn decode_pdf_string(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    latin1(bytes)
}

fn latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

/// 依 Y 由上而下、X 由左而右排序後分行
pub fn group_lines(mut items: Vec<TextItem>, tolerance: f64) -> Vec<Vec<TextItem>> {
    items.sort_by(|a, b| b.y.total_cmp(&a.y).then(a.x.total_cmp(&b.x)));

    let mut lines: Vec<Vec<TextItem>> = Vec::new();
    let mut current: Vec<TextItem> = Vec::new();
    let mut line_y = items.first().map(|i| i.y).unwrap_or(0.0);

    for item in items {
        if (item.y - line_y).abs() > tolerance {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            line_y = item.y;
        }
        current.push(item);
    }
    if !current.is_empty() {
        lines.push(current);
    }

    for line in &mut lines {
        line.sort_by(|a, b| a.x.total_cmp(&b.x));
    }
    lines
}

/// 合併一行的文字項目，間距夠大時插入空白
pub fn line_text(line: &[TextItem]) -> String {
    let mut text = String::new();
    let mut previous_end: Option<f64> = None;
    for item in line {
        if let Some(end) = previous_end {
            let gap = item.x - end;
            if gap > item.font_size * WORD_GAP_RATIO
                && !text.ends_with(' ')
                && !item.text.starts_with(' ')
            {
                text.push(' ');
            }
        }
        text.push_str(&item.text);
        previous_end = Some(item.x + item.width);
    }
    text.trim().to_string()
}

fn text_block_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)\bBT\b(.*?)\bET\b").expect("valid BT/ET regex"))
}

fn literal_string_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\(((?:[^()\\]|\\.)*)\)").expect("valid literal regex"))
}

fn page_object_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"/Type\s*/Page\b").expect("valid page regex"))
}

/// 不依賴解析器，直接掃描未壓縮的文字物件
fn extract_with_raw_scan(bytes: &[u8], min_chars: usize) -> Option<String> {
    let raw = latin1(bytes);
    let mut pieces = Vec::new();
    for block in text_block_regex().captures_iter(&raw) {
        for literal in literal_string_regex().captures_iter(&block[1]) {
            let unescaped = unescape_literal(&literal[1]);
            if !unescaped.trim().is_empty() {
                pieces.push(unescaped);
            }
        }
    }
    let joined = pieces.join(" ");
    if joined.chars().count() > min_chars {
        Some(joined)
    } else {
        None
    }
}

fn unescape_literal(input: &str) -> String {
    input
        .replace("\\n", "\n")
        .replace("\\r", "\r")
        .replace("\\(", "(")
        .replace("\\)", ")")
        .replace("\\\\", "\\")
}

/// 頁數：優先以結構解析，否則計算 `/Type /Page` 物件數
pub fn count_pages(bytes: &[u8]) -> Option<usize> {
    if let Ok(document) = Document::load_mem(bytes) {
        return Some(document.get_pages().len());
    }
    let count = page_object_regex().find_iter(&latin1(bytes)).count();
    if count > 0 {
        Some(count)
    } else {
        None
    }
}

fn diagnostic_message(file_name: &str, bytes: &[u8]) -> String {
    let pages = count_pages(bytes)
        .map(|n| n.to_string())
        .unwrap_or_else(|| "unknown".to_string());
    format!(
        "PDF Text Extraction Notice\n\
         ==========================\n\
         \n\
         File: {file_name}\n\
         Size: {} ({} bytes)\n\
         Pages: {pages}\n\
         \n\
         No extractable text was found in this PDF. Likely causes:\n\
         1. The PDF is a scanned document or contains only images (no text layer).\n\
         2. The PDF is password protected or encrypted.\n\
         3. The file is corrupted or uses an unsupported structure.\n\
         \n\
         Workaround: open the PDF in a viewer, select and copy the text manually into a\n\
         text file, or run the document through an OCR tool before converting it again.\n",
        format_file_size(bytes.len()),
        bytes.len(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(text: &str, x: f64, y: f64) -> TextItem {
        TextItem {
            text: text.to_string(),
            x,
            y,
            width: text.len() as f64 * 6.0,
            font_size: 12.0,
            font_name: "Helvetica".to_string(),
        }
    }

    #[test]
    fn groups_items_into_lines_top_to_bottom() {
        let items = vec![
            item("World", 60.0, 700.0),
            item("Second", 10.0, 680.0),
            item("Hello", 10.0, 702.0),
        ];
        let lines = group_lines(items, 5.0);
        assert_eq!(lines.len(), 2);
        assert_eq!(line_text(&lines[0]), "Hello World");
        assert_eq!(line_text(&lines[1]), "Second");
    }

    #[test]
    fn decodes_utf16_strings_with_bom() {
        let bytes = [0xFE, 0xFF, 0x00, 0x48, 0x00, 0x69];
        assert_eq!(decode_pdf_string(&bytes), "Hi");
        assert_eq!(decode_pdf_string(b"caf\xe9"), "café");
    }

    #[test]
    fn raw_scan_reads_uncompressed_text_objects() {
        let body = "BT /F1 12 Tf 72 700 Td (The quick brown fox jumps over the lazy dog\\n) Tj ET \
                    BT (and keeps running far beyond the fence) Tj ET";
        let text = extract_with_raw_scan(body.as_bytes(), 50).expect("raw scan text");
        assert!(text.contains("quick brown fox"));
        assert!(text.contains("far beyond"));
    }

    #[test]
    fn unreadable_structure_falls_back_to_raw_scan() {
        let pdf = b"%PDF-1.4\n\
            1 0 obj << /Length 120 >> stream\n\
            BT /F1 12 Tf 72 700 Td (The quick brown fox jumps over the lazy dog) Tj ET\n\
            BT 72 680 Td (and keeps running far beyond the fence line) Tj ET\n\
            endstream endobj\n\
            xref\n0 2\nbroken\ntrailer << /Size 2 >>\nstartxref\n9999\n%%EOF";
        let text = extract_text_from_pdf("scan.pdf", pdf);
        assert_eq!(
            text,
            "The quick brown fox jumps over the lazy dog and keeps running far beyond the fence line"
        );
    }

    #[test]
    fn raw_scan_rejects_short_output() {
        assert!(extract_with_raw_scan(b"BT (tiny) Tj ET", 50).is_none());
    }

    #[test]
    fn diagnostic_for_garbage_mentions_name_and_causes() {
        let text = extract_text_from_pdf("broken.pdf", b"%PDF-1.4 garbage");
        assert!(text.contains("broken.pdf"));
        assert!(text.contains("Pages: unknown"));
        assert!(text.contains("password protected"));
    }

    #[test]
    fn font_flags_come_from_font_name() {
        let mut bold = item("x", 0.0, 0.0);
        bold.font_name = "Arial-BoldItalicMT".to_string();
        assert!(bold.is_bold());
        assert!(bold.is_italic());
        assert!(!item("x", 0.0, 0.0).is_bold());
    }
}
