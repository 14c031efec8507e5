//! PDF 轉 Word：依字級、字型名稱與項目符號重建段落格式。
//! 結構解析失敗時退回以擷取文字建立的簡單文件。

use std::io::Cursor;
use std::sync::OnceLock;

use docx_rs::{
    AlignmentType, BreakType, Docx, LineSpacing, PageMargin, Paragraph, Run, RunFonts,
    SpecialIndentType,
};
use regex::Regex;

use crate::converters::pdf_engine::pdf_engine;
use crate::converters::pdf_text::{extract_text_from_pdf, group_lines, line_text, positioned_pages, TextItem};
use crate::error::{ConvertError, ConvertResult};
use crate::models::blob::Blob;
use crate::models::conversion::{ConversionRequest, ConversionResult};

pub const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// 平均字級超過此值的行視為標題
pub const HEADING_FONT_SIZE: f64 = 18.0;
const FONT_FAMILY: &str = "Calibri";
// 1 英吋 = 1440 twip
const PAGE_MARGIN_TWIPS: i32 = 1440;
const BULLET_INDENT_TWIPS: i32 = 720;
const BULLET_HANGING_TWIPS: i32 = 360;
const FALLBACK_BODY_SIZE: usize = 22;
const FALLBACK_HEADING_SIZE: usize = 24;

fn bullet_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[•●○◦▪▫⦿⦾oO-]\s").expect("valid bullet regex"))
}

fn bullet_prefix_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[•●○◦▪▫⦿⦾oO-]\s*").expect("valid bullet prefix regex"))
}

fn fallback_heading_regexes() -> &'static [Regex; 3] {
    static RE: OnceLock<[Regex; 3]> = OnceLock::new();
    RE.get_or_init(|| {
        [
            Regex::new(r"^[A-Z][A-Z\s]+$").expect("valid caps regex"),
            Regex::new(r"^[A-Z][a-z]+:$").expect("valid label regex"),
            Regex::new(r"^\d+\.\s").expect("valid numbered regex"),
        ]
    })
}

/// 一行文字分析後的段落格式
#[derive(Debug, Clone, PartialEq)]
pub struct LineStyle {
    pub text: String,
    pub is_bullet: bool,
    pub is_heading: bool,
    pub bold: bool,
    pub italic: bool,
    /// Word 的字級單位為半點
    pub half_points: usize,
}

pub fn analyze_line(line: &[TextItem]) -> Option<LineStyle> {
    let text = line_text(line);
    if text.is_empty() {
        return None;
    }

    let is_bullet = bullet_regex().is_match(&text)
        || (line.len() > 1 && line.first().is_some_and(|item| item.text.trim() == "o"));
    let text = if is_bullet {
        bullet_prefix_regex().replace(&text, "").trim().to_string()
    } else {
        text
    };

    let average = line.iter().map(|item| item.font_size).sum::<f64>() / line.len() as f64;
    let is_heading = average > HEADING_FONT_SIZE;
    let bold = line.iter().any(TextItem::is_bold);
    Some(LineStyle {
        text,
        is_bullet,
        is_heading,
        bold: bold || is_heading,
        italic: line.iter().any(TextItem::is_italic),
        half_points: (average * 1.5).round().max(1.0) as usize,
    })
}

fn font() -> RunFonts {
    RunFonts::new().ascii(FONT_FAMILY).hi_ansi(FONT_FAMILY)
}

fn styled_paragraph(style: &LineStyle) -> Paragraph {
    let mut paragraph = Paragraph::new().align(AlignmentType::Left);

    if style.is_bullet {
        let mut marker = Run::new().add_text("• ").size(style.half_points);
        if style.bold {
            marker = marker.bold();
        }
        paragraph = paragraph.add_run(marker).indent(
            Some(BULLET_INDENT_TWIPS),
            Some(SpecialIndentType::Hanging(BULLET_HANGING_TWIPS)),
            None,
            None,
        );
    }

    let mut run = Run::new()
        .add_text(style.text.as_str())
        .size(style.half_points)
        .fonts(font());
    if style.bold {
        run = run.bold();
    }
    if style.italic {
        run = run.italic();
    }

    let before = if style.is_heading { 240 } else { 60 };
    let after = if style.is_bullet { 100 } else { 120 };
    paragraph
        .add_run(run)
        .line_spacing(LineSpacing::new().before(before).after(after))
}

fn page_break() -> Paragraph {
    Paragraph::new().add_run(Run::new().add_break(BreakType::Page))
}

fn new_document() -> Docx {
    Docx::new().page_margin(
        PageMargin::new()
            .top(PAGE_MARGIN_TWIPS)
            .bottom(PAGE_MARGIN_TWIPS)
            .left(PAGE_MARGIN_TWIPS)
            .right(PAGE_MARGIN_TWIPS),
    )
}

fn pack(document: Docx) -> ConvertResult<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    document
        .build()
        .pack(&mut buffer)
        .map_err(|e| ConvertError::Docx(e.to_string()))?;
    Ok(buffer.into_inner())
}

fn build_formatted(bytes: &[u8]) -> ConvertResult<Vec<u8>> {
    let document = pdf_engine().load(bytes)?;
    let pages = positioned_pages(&document)?;
    let tolerance = pdf_engine().settings().line_tolerance;
    let page_count = pages.len();

    let mut docx = new_document();
    let mut has_text = false;
    for (index, page) in pages.into_iter().enumerate() {
        if page.items.is_empty() {
            for line in page.fallback_text.unwrap_or_default().lines() {
                if let Some(paragraph) = fallback_paragraph(line) {
                    docx = docx.add_paragraph(paragraph);
                    has_text = true;
                }
            }
        } else {
            for line in group_lines(page.items, tolerance) {
                if let Some(style) = analyze_line(&line) {
                    docx = docx.add_paragraph(styled_paragraph(&style));
                    has_text = true;
                }
            }
        }
        if index + 1 < page_count {
            docx = docx.add_paragraph(page_break());
        }
    }

    if !has_text {
        return Err(ConvertError::Pdf("文件中沒有可擷取的文字".to_string()));
    }
    pack(docx)
}

fn whitespace_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[ \t]+").expect("valid whitespace regex"))
}

fn loose_bullet_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\bo\s+").expect("valid loose bullet regex"))
}

fn fallback_paragraph(line: &str) -> Option<Paragraph> {
    let text = loose_bullet_regex().replace_all(line, "• ");
    let text = whitespace_regex().replace_all(&text, " ");
    let text = text.trim();
    if text.is_empty() || text.starts_with("--- Page ") {
        return None;
    }

    let is_bullet = text.starts_with('•') || text.starts_with('-') || text.starts_with('*');
    let is_heading = fallback_heading_regexes().iter().any(|re| re.is_match(text));

    let mut run = Run::new()
        .add_text(text)
        .size(if is_heading { FALLBACK_HEADING_SIZE } else { FALLBACK_BODY_SIZE })
        .fonts(font());
    if is_heading {
        run = run.bold();
    }
    let mut paragraph = Paragraph::new()
        .add_run(run)
        .line_spacing(LineSpacing::new().after(200));
    if is_bullet {
        paragraph = paragraph.indent(
            Some(BULLET_INDENT_TWIPS),
            Some(SpecialIndentType::Hanging(BULLET_HANGING_TWIPS)),
            None,
            None,
        );
    }
    Some(paragraph)
}

fn build_simple(file_name: &str, bytes: &[u8]) -> ConvertResult<Vec<u8>> {
    let text = extract_text_from_pdf(file_name, bytes);
    let docx = text
        .lines()
        .filter_map(fallback_paragraph)
        .fold(new_document(), |docx, paragraph| docx.add_paragraph(paragraph));
    pack(docx)
}

pub fn pdf_to_word(file_name: &str, bytes: &[u8]) -> ConvertResult<Vec<u8>> {
    match build_formatted(bytes) {
        Ok(docx) => Ok(docx),
        Err(e) => {
            log::warn!("PDF 轉 Word 格式化失敗，改用簡易模式：{}", e);
            build_simple(file_name, bytes)
        }
    }
}

pub fn handle_pdf_to_word(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    let file = request.first_file()?;
    let bytes = pdf_to_word(&file.name, file.bytes())?;
    Ok(ConversionResult::Single(Blob::new(bytes, DOCX_MIME)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(text: &str, size: f64, font: &str) -> TextItem {
        TextItem {
            text: text.to_string(),
            x: 0.0,
            y: 700.0,
            width: text.len() as f64 * size * 0.5,
            font_size: size,
            font_name: font.to_string(),
        }
    }

    #[test]
    fn large_lines_become_bold_headings() {
        let style = analyze_line(&[item("Introduction", 24.0, "Helvetica")]).expect("style");
        assert!(style.is_heading);
        assert!(style.bold);
        assert_eq!(style.half_points, 36);
    }

    #[test]
    fn bullet_marker_is_stripped() {
        let style = analyze_line(&[item("• first point", 12.0, "Times-Italic")]).expect("style");
        assert!(style.is_bullet);
        assert!(style.italic);
        assert_eq!(style.text, "first point");
        assert_eq!(style.half_points, 18);
    }

    #[test]
    fn blank_lines_are_skipped() {
        assert!(analyze_line(&[item("   ", 12.0, "Helvetica")]).is_none());
    }

    #[test]
    fn converts_generated_pdf_to_docx_zip() {
        let pdf = crate::converters::pdf::text_to_pdf("Heading\nBody text").expect("pdf");
        let docx = pdf_to_word("sample.pdf", &pdf).expect("docx");
        assert_eq!(&docx[..2], b"PK");
    }
}
