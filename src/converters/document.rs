//! 文件格式：Word（docx）、RTF、HTML、Markdown 與純文字之間的轉換。

use std::io::{Cursor, Read};
use std::sync::OnceLock;

use docx_rs::{Docx, Paragraph, Run};
use pulldown_cmark::{html, Options, Parser};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use regex::Regex;

use crate::converters::pdf::{text_to_pdf, PDF_MIME};
use crate::converters::pdf_word::DOCX_MIME;
use crate::converters::text::{html_escape, html_unescape};
use crate::error::{ConvertError, ConvertResult};
use crate::models::blob::Blob;
use crate::models::conversion::{ConversionRequest, ConversionResult};

/// docx 內的一個文字片段
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocxRun {
    pub text: String,
    pub bold: bool,
    pub italic: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocxParagraph {
    pub style: Option<String>,
    pub runs: Vec<DocxRun>,
}

impl DocxParagraph {
    pub fn text(&self) -> String {
        self.runs.iter().map(|run| run.text.as_str()).collect()
    }

    /// `Heading1`、`heading 2`、`Title` 之類的段落樣式對應的標題層級
    pub fn heading_level(&self) -> Option<u8> {
        let style = self.style.as_deref()?.to_ascii_lowercase().replace(' ', "");
        if style == "title" {
            return Some(1);
        }
        let level = style.strip_prefix("heading")?.parse::<u8>().ok()?;
        Some(level.clamp(1, 6))
    }
}

fn toggle_enabled(element: &BytesStart) -> ConvertResult<bool> {
    Ok(match element.try_get_attribute("w:val")? {
        Some(value) => !matches!(value.unescape_value()?.as_ref(), "0" | "false" | "none"),
        None => true,
    })
}

/// 讀取 `word/document.xml` 的段落與文字格式
pub fn read_docx(bytes: &[u8]) -> ConvertResult<Vec<DocxParagraph>> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|_| ConvertError::Docx("找不到 word/document.xml".to_string()))?
        .read_to_string(&mut xml)?;

    let mut reader = Reader::from_str(&xml);
    let mut paragraphs = Vec::new();
    let mut paragraph: Option<DocxParagraph> = None;
    let mut run = DocxRun::default();
    let mut in_text = false;
    let mut in_run_properties = false;

    loop {
        let (element, is_empty) = match reader.read_event()? {
            Event::Start(element) => (element, false),
            Event::Empty(element) => (element, true),
            Event::Text(text) => {
                if in_text {
                    run.text.push_str(&text.unescape()?);
                }
                continue;
            }
            Event::End(element) => {
                match element.name().as_ref() {
                    b"w:t" => in_text = false,
                    b"w:rPr" => in_run_properties = false,
                    b"w:r" => {
                        if let Some(current) = paragraph.as_mut() {
                            if !run.text.is_empty() {
                                current.runs.push(std::mem::take(&mut run));
                            }
                        }
                    }
                    b"w:p" => paragraphs.extend(paragraph.take()),
                    _ => {}
                }
                continue;
            }
            Event::Eof => break,
            _ => continue,
        };

        match element.name().as_ref() {
            b"w:p" if is_empty => paragraphs.push(DocxParagraph::default()),
            b"w:p" => paragraph = Some(DocxParagraph::default()),
            b"w:r" => run = DocxRun::default(),
            b"w:rPr" => in_run_properties = !is_empty,
            b"w:b" if in_run_properties => run.bold = toggle_enabled(&element)?,
            b"w:i" if in_run_properties => run.italic = toggle_enabled(&element)?,
            b"w:pStyle" => {
                if let (Some(current), Some(value)) =
                    (paragraph.as_mut(), element.try_get_attribute("w:val")?)
                {
                    current.style = Some(value.unescape_value()?.into_owned());
                }
            }
            b"w:t" => in_text = !is_empty,
            b"w:tab" => run.text.push('\t'),
            b"w:br" | b"w:cr" => run.text.push('\n'),
            _ => {}
        }
    }
    Ok(paragraphs)
}

pub fn docx_to_text(bytes: &[u8]) -> ConvertResult<String> {
    let paragraphs = read_docx(bytes)?;
    Ok(paragraphs
        .iter()
        .map(DocxParagraph::text)
        .collect::<Vec<_>>()
        .join("\n\n")
        .trim()
        .to_string())
}

pub fn docx_to_html(bytes: &[u8]) -> ConvertResult<String> {
    let mut html = String::new();
    for paragraph in read_docx(bytes)? {
        if paragraph.runs.is_empty() {
            continue;
        }
        let mut inner = String::new();
        for run in &paragraph.runs {
            let mut piece = html_escape(&run.text).replace('\n', "<br />");
            if run.italic {
                piece = format!("<em>{}</em>", piece);
            }
            if run.bold {
                piece = format!("<strong>{}</strong>", piece);
            }
            inner.push_str(&piece);
        }
        match paragraph.heading_level() {
            Some(level) => html.push_str(&format!("<h{level}>{inner}</h{level}>")),
            None => html.push_str(&format!("<p>{}</p>", inner)),
        }
    }
    Ok(html)
}

/// 每行一個段落的 docx
pub fn text_to_docx(text: &str) -> ConvertResult<Vec<u8>> {
    let docx = text
        .lines()
        .map(|line| Paragraph::new().add_run(Run::new().add_text(line)))
        .fold(Docx::new(), |docx, paragraph| docx.add_paragraph(paragraph));
    let mut buffer = Cursor::new(Vec::new());
    docx.build()
        .pack(&mut buffer)
        .map_err(|e| ConvertError::Docx(e.to_string()))?;
    Ok(buffer.into_inner())
}

// RTF 中不含正文的目的地群組
const RTF_SKIPPED_DESTINATIONS: [&str; 8] = [
    "fonttbl", "colortbl", "stylesheet", "info", "pict", "header", "footer", "listtable",
];

/// 移除 RTF 控制字與群組，保留正文
pub fn rtf_to_text(rtf: &str) -> String {
    let chars: Vec<char> = rtf.chars().collect();
    let mut output = String::new();
    // 每層群組是否略過
    let mut skip_stack: Vec<bool> = vec![false];
    let mut pending_skip_chars = 0usize;
    let mut i = 0;

    while i < chars.len() {
        let skipping = skip_stack.last().copied().unwrap_or(false);
        match chars[i] {
            '{' => {
                skip_stack.push(skipping);
                i += 1;
            }
            '}' => {
                if skip_stack.len() > 1 {
                    skip_stack.pop();
                }
                i += 1;
            }
            '\\' => {
                i += 1;
                let Some(&next) = chars.get(i) else { break };
                if next == '\\' || next == '{' || next == '}' {
                    if !skipping {
                        output.push(next);
                    }
                    i += 1;
                } else if next == '*' {
                    if let Some(top) = skip_stack.last_mut() {
                        *top = true;
                    }
                    i += 1;
                } else if next == '\'' {
                    let hex: String = chars.iter().skip(i + 1).take(2).collect();
                    if let Ok(byte) = u8::from_str_radix(&hex, 16) {
                        if pending_skip_chars > 0 {
                            pending_skip_chars -= 1;
                        } else if !skipping {
                            output.push(byte as char);
                        }
                    }
                    i += 3;
                } else if next.is_ascii_alphabetic() {
                    let start = i;
                    while i < chars.len() && chars[i].is_ascii_alphabetic() {
                        i += 1;
                    }
                    let word: String = chars[start..i].iter().collect();
                    let number_start = i;
                    if i < chars.len() && chars[i] == '-' {
                        i += 1;
                    }
                    while i < chars.len() && chars[i].is_ascii_digit() {
                        i += 1;
                    }
                    let parameter: Option<i32> = chars[number_start..i]
                        .iter()
                        .collect::<String>()
                        .parse()
                        .ok();
                    if i < chars.len() && chars[i] == ' ' {
                        i += 1;
                    }

                    if RTF_SKIPPED_DESTINATIONS.contains(&word.as_str()) {
                        if let Some(top) = skip_stack.last_mut() {
                            *top = true;
                        }
                        continue;
                    }
                    if skipping {
                        continue;
                    }
                    match word.as_str() {
                        "par" | "line" | "sect" | "page" => output.push('\n'),
                        "tab" => output.push('\t'),
                        "u" => {
                            if let Some(code) = parameter {
                                let code = if code < 0 { code + 65536 } else { code };
                                if let Some(c) = char::from_u32(code as u32) {
                                    output.push(c);
                                }
                                pending_skip_chars = 1;
                            }
                        }
                        _ => {}
                    }
                } else {
                    // 其他控制符號，例如 \~、\-
                    if next == '~' && !skipping {
                        output.push(' ');
                    }
                    i += 1;
                }
            }
            '\r' | '\n' => i += 1,
            c => {
                if pending_skip_chars > 0 {
                    pending_skip_chars -= 1;
                } else if !skipping {
                    output.push(c);
                }
                i += 1;
            }
        }
    }
    output.trim().to_string()
}

/// 以 Times New Roman 12pt 輸出的 RTF 文件
pub fn text_to_rtf_document(text: &str) -> String {
    let mut body = String::new();
    for c in text.chars() {
        match c {
            '\\' => body.push_str("\\\\"),
            '{' => body.push_str("\\{"),
            '}' => body.push_str("\\}"),
            '\n' => body.push_str("\\par\n"),
            '\r' => {}
            '\t' => body.push_str("\\tab "),
            c if c.is_ascii() => body.push(c),
            c => {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    body.push_str(&format!("\\u{}?", *unit as i16));
                }
            }
        }
    }
    format!(
        "{{\\rtf1\\ansi\\deff0 {{\\fonttbl {{\\f0 Times New Roman;}}}}\n\\f0\\fs24 {}\n}}",
        body
    )
}

fn script_style_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?is)<(script|style)\b[^>]*>.*?</(script|style)>").expect("valid script regex")
    })
}

fn block_break_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)<br\s*/?>|</(p|div|li|tr|h[1-6]|table|blockquote|pre)>")
            .expect("valid block regex")
    })
}

fn tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]*>").expect("valid tag regex"))
}

fn blank_lines_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n[ \t]*\n(\s*\n)+").expect("valid blank line regex"))
}

/// 取出 HTML 的可見文字，區塊元素之間換行
pub fn html_to_text(html: &str) -> String {
    let text = script_style_regex().replace_all(html, "");
    let text = block_break_regex().replace_all(&text, "\n");
    let text = tag_regex().replace_all(&text, "");
    let text = html_unescape(&text);
    blank_lines_regex().replace_all(&text, "\n\n").trim().to_string()
}

pub fn markdown_to_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    let parser = Parser::new_ext(markdown, options);
    let mut output = String::new();
    html::push_html(&mut output, parser);
    output
}

fn markdown_rules() -> &'static [(Regex, &'static str)] {
    static RULES: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
    RULES.get_or_init(|| {
        [
            (r"(?i)<h1[^>]*>(.*?)</h1>", "# $1\n"),
            (r"(?i)<h2[^>]*>(.*?)</h2>", "## $1\n"),
            (r"(?i)<h3[^>]*>(.*?)</h3>", "### $1\n"),
            (r"(?i)<strong>(.*?)</strong>", "**$1**"),
            (r"(?i)<b>(.*?)</b>", "**$1**"),
            (r"(?i)<em>(.*?)</em>", "*$1*"),
            (r"(?i)<i>(.*?)</i>", "*$1*"),
            (r#"(?i)<a href="(.*?)">(.*?)</a>"#, "[$2]($1)"),
            (r"(?i)<li>(.*?)</li>", "- $1\n"),
            (r"(?i)<br\s*/?>", "\n"),
            (r"(?i)<p>(.*?)</p>", "$1\n\n"),
            (r"<[^>]*>", ""),
        ]
        .into_iter()
        .map(|(pattern, replacement)| {
            (Regex::new(pattern).expect("valid markdown rule"), replacement)
        })
        .collect()
    })
}

pub fn html_to_markdown(html: &str) -> String {
    let mut markdown = html.to_string();
    for (rule, replacement) in markdown_rules() {
        markdown = rule.replace_all(&markdown, *replacement).into_owned();
    }
    markdown.trim().to_string()
}

pub fn text_to_html_page(text: &str) -> String {
    format!(
        "<!DOCTYPE html><html><head><meta charset=\"UTF-8\"><title>Document</title></head><body><pre>{}</pre></body></html>",
        html_escape(text)
    )
}

fn docx_blob(bytes: Vec<u8>) -> ConversionResult {
    Blob::new(bytes, DOCX_MIME).into()
}

pub fn handle_docx_to_text(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    Ok(Blob::text(docx_to_text(request.first_file()?.bytes())?).into())
}

pub fn handle_docx_to_html(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    Ok(Blob::with_mime(docx_to_html(request.first_file()?.bytes())?, "text/html").into())
}

pub fn handle_docx_to_pdf(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    let text = docx_to_text(request.first_file()?.bytes())?;
    Ok(Blob::new(text_to_pdf(&text)?, PDF_MIME).into())
}

pub fn handle_docx_to_rtf(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    let text = docx_to_text(request.first_file()?.bytes())?;
    Ok(Blob::with_mime(text_to_rtf_document(&text), "application/rtf").into())
}

pub fn handle_text_to_docx(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    Ok(docx_blob(text_to_docx(&request.text_content()?)?))
}

pub fn handle_html_to_docx(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    Ok(docx_blob(text_to_docx(&html_to_text(&request.text_content()?))?))
}

pub fn handle_rtf_to_docx(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    Ok(docx_blob(text_to_docx(&rtf_to_text(&request.text_content()?))?))
}

pub fn handle_rtf_to_pdf(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    let text = rtf_to_text(&request.text_content()?);
    Ok(Blob::new(text_to_pdf(&text)?, PDF_MIME).into())
}

pub fn handle_text_to_html(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    Ok(Blob::with_mime(text_to_html_page(&request.text_content()?), "text/html").into())
}

pub fn handle_html_to_text(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    Ok(Blob::text(html_to_text(&request.text_content()?)).into())
}

pub fn handle_markdown_to_html(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    Ok(Blob::with_mime(markdown_to_html(&request.text_content()?), "text/html").into())
}

pub fn handle_html_to_markdown(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    Ok(Blob::with_mime(html_to_markdown(&request.text_content()?), "text/markdown").into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_docx_reads_back_as_text() {
        let docx = text_to_docx("First line\nSecond line").expect("docx");
        let text = docx_to_text(&docx).expect("text");
        assert_eq!(text, "First line\n\nSecond line");
        let html = docx_to_html(&docx).expect("html");
        assert_eq!(html, "<p>First line</p><p>Second line</p>");
    }

    #[test]
    fn rtf_control_words_are_removed() {
        let rtf = r"{\rtf1\ansi{\fonttbl{\f0 Arial;}}\f0\fs24 Hello {\b bold} world\par Caf\'e9 \u8364?}";
        assert_eq!(rtf_to_text(rtf), "Hello bold world\nCafé €");
    }

    #[test]
    fn rtf_document_round_trips_through_stripper() {
        let rtf = text_to_rtf_document("a {b}\nc\\d");
        assert_eq!(rtf_to_text(&rtf), "a {b}\nc\\d");
    }

    #[test]
    fn html_text_keeps_block_breaks() {
        let text = html_to_text("<style>p{}</style><h1>Title</h1><p>One &amp; two</p><p>Three</p>");
        assert_eq!(text, "Title\nOne & two\nThree");
    }

    #[test]
    fn html_to_markdown_follows_rules() {
        let markdown = html_to_markdown(r#"<h1>Title</h1><p><strong>Bold</strong> and <a href="https://x.y">link</a></p>"#);
        assert_eq!(markdown, "# Title\n**Bold** and [link](https://x.y)");
    }

    #[test]
    fn markdown_renders_headings() {
        assert_eq!(markdown_to_html("# Hi"), "<h1>Hi</h1>\n");
    }
}
