//! 以擷取出的 PDF 文字套用各種輸出格式的文字範本。

use std::sync::OnceLock;

use regex::Regex;

use crate::converters::pdf_text::extract_text_from_pdf;
use crate::converters::text::html_escape;
use crate::error::ConvertResult;
use crate::models::blob::Blob;
use crate::models::conversion::{ConversionRequest, ConversionResult};

const SLIDE_MIN_CHARS: usize = 20;
const SLIDE_TITLE_CHARS: usize = 50;
const SLIDE_RULE: &str = "=====================================";

fn paragraph_break_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n\s*\n").expect("valid paragraph regex"))
}

/// 每個非空行一列，欄位為行號與內容
pub fn text_to_line_csv(text: &str) -> String {
    let mut rows = vec!["Line,Content".to_string()];
    rows.extend(
        text.lines()
            .filter(|line| !line.trim().is_empty())
            .enumerate()
            .map(|(index, line)| format!("{},\"{}\"", index + 1, line.replace('"', "\"\""))),
    );
    rows.join("\n")
}

pub fn text_to_rtf(text: &str) -> String {
    let body = text
        .replace('\n', "\\par ")
        .replace('{', "\\{")
        .replace('}', "\\}");
    format!(
        "{{\\rtf1\\ansi\\deff0 {{\\fonttbl {{\\f0 Times New Roman;}}}} \\f0\\fs24 {} }}",
        body
    )
}

pub fn text_to_fb2(text: &str) -> String {
    let body = html_escape(text)
        .replace("\n\n", "</p><p>")
        .replace('\n', "<br/>");
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<FictionBook xmlns="http://www.gribuser.ru/xml/fictionbook/2.0">
  <description>
    <title-info>
      <book-title>PDF Content</book-title>
      <author>
        <first-name>Converted</first-name>
        <last-name>from PDF</last-name>
      </author>
    </title-info>
  </description>
  <body>
    <section>
      <p>{}</p>
    </section>
  </body>
</FictionBook>"#,
        body
    )
}

/// 每頁一個 section，每行一個段落
pub fn text_to_html_document(title: &str, text: &str) -> String {
    let mut html = format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"UTF-8\">\n<title>{}</title>\n</head>\n<body>\n",
        html_escape(title)
    );
    let mut in_section = false;
    for line in text.lines() {
        let line = line.trim();
        if line.starts_with("--- Page ") && line.ends_with("---") {
            if in_section {
                html.push_str("</section>\n");
            }
            let label = line.trim_matches('-').trim();
            html.push_str(&format!("<section>\n<h2>{}</h2>\n", html_escape(label)));
            in_section = true;
        } else if !line.is_empty() {
            html.push_str(&format!("<p>{}</p>\n", html_escape(line)));
        }
    }
    if in_section {
        html.push_str("</section>\n");
    }
    html.push_str("</body>\n</html>\n");
    html
}

/// 以段落切分投影片的文字大綱
pub fn text_to_slides(title: &str, text: &str, generated: &str) -> String {
    let slides: Vec<String> = paragraph_break_regex()
        .split(text)
        .filter(|slide| slide.trim().chars().count() > SLIDE_MIN_CHARS)
        .map(|slide| slide.trim().replace('\n', " "))
        .collect();

    let mut output = format!(
        "Presentation: {}\nGenerated: {}\nTotal Slides: {}\n\n========================================\n\n",
        title,
        generated,
        slides.len().max(1)
    );

    if slides.is_empty() {
        output.push_str(&format!(
            "SLIDE 1: PDF Content\n{rule}\n\n{}\n\n{rule}\n",
            text.replace('\n', " ").trim(),
            rule = SLIDE_RULE
        ));
        return output;
    }

    for (index, slide) in slides.iter().enumerate() {
        let heading: String = slide.chars().take(SLIDE_TITLE_CHARS).collect();
        let ellipsis = if slide.chars().count() > SLIDE_TITLE_CHARS { "..." } else { "" };
        output.push_str(&format!(
            "SLIDE {}: {}{}\n{rule}\n\n{}\n\n{rule}\n\n",
            index + 1,
            heading,
            ellipsis,
            slide,
            rule = SLIDE_RULE
        ));
    }
    output
}

fn extracted(request: &ConversionRequest) -> ConvertResult<(String, String)> {
    let file = request.first_file()?;
    Ok((file.name.clone(), extract_text_from_pdf(&file.name, file.bytes())))
}

fn stem(name: &str) -> &str {
    name.strip_suffix(".pdf")
        .or_else(|| name.strip_suffix(".PDF"))
        .unwrap_or(name)
}

pub fn handle_pdf_to_text(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    let (_, text) = extracted(request)?;
    Ok(Blob::text(text).into())
}

pub fn handle_pdf_to_csv(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    let (_, text) = extracted(request)?;
    Ok(Blob::with_mime(text_to_line_csv(&text), "text/csv").into())
}

pub fn handle_pdf_to_rtf(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    let (_, text) = extracted(request)?;
    Ok(Blob::with_mime(text_to_rtf(&text), "application/rtf").into())
}

pub fn handle_pdf_to_fb2(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    let (_, text) = extracted(request)?;
    Ok(Blob::with_mime(text_to_fb2(&text), "application/fb2+xml").into())
}

pub fn handle_pdf_to_html(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    let (name, text) = extracted(request)?;
    Ok(Blob::with_mime(text_to_html_document(stem(&name), &text), "text/html").into())
}

pub fn handle_pdf_to_powerpoint(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    let (name, text) = extracted(request)?;
    let generated = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    Ok(Blob::text(text_to_slides(stem(&name), &text, &generated)).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_quotes_lines_and_skips_blanks() {
        let csv = text_to_line_csv("first\n\nsay \"hi\"\n");
        assert_eq!(csv, "Line,Content\n1,\"first\"\n2,\"say \"\"hi\"\"\"");
    }

    #[test]
    fn rtf_escapes_braces() {
        let rtf = text_to_rtf("a{b}\nc");
        assert!(rtf.starts_with("{\\rtf1\\ansi\\deff0 {\\fonttbl {\\f0 Times New Roman;}} \\f0\\fs24 "));
        assert!(rtf.contains("a\\{b\\}\\par c"));
        assert!(rtf.ends_with(" }"));
    }

    #[test]
    fn slides_split_on_blank_lines() {
        let text = "This paragraph is long enough to be a slide.\n\nshort\n\nAnother paragraph that is long enough.";
        let slides = text_to_slides("deck", text, "now");
        assert!(slides.contains("Total Slides: 2"));
        assert!(slides.contains("SLIDE 1: This paragraph is long enough to be a slide."));
        assert!(slides.contains("SLIDE 2: Another paragraph"));
        assert!(!slides.contains("SLIDE 3"));
    }

    #[test]
    fn slides_fall_back_to_single_slide() {
        let slides = text_to_slides("deck", "tiny", "now");
        assert!(slides.contains("Total Slides: 1"));
        assert!(slides.contains("SLIDE 1: PDF Content"));
    }

    #[test]
    fn html_document_groups_pages_into_sections() {
        let html = text_to_html_document("report", "--- Page 1 ---\nHello <b>\n\n--- Page 2 ---\nBye");
        assert!(html.contains("<title>report</title>"));
        assert!(html.contains("<h2>Page 1</h2>"));
        assert!(html.contains("<p>Hello &lt;b&gt;</p>"));
        assert_eq!(html.matches("<section>").count(), 2);
    }
}
