//! 輸出檔名規則。

use std::path::Path;

use crate::service::registry::ConversionDescriptor;

const DEFAULT_BASE: &str = "converted";

/// 去掉最後一個副檔名
fn base_name(source: Option<&str>) -> String {
    let Some(source) = source else {
        return DEFAULT_BASE.to_string();
    };
    let file_name = Path::new(source)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| source.to_string());
    match file_name.rfind('.') {
        Some(dot) if dot > 0 => file_name[..dot].to_string(),
        _ => file_name,
    }
}

/// 含點號的副檔名，例如 `.png`
fn extension(source: Option<&str>) -> Option<String> {
    let file_name = Path::new(source?).file_name()?.to_string_lossy().into_owned();
    let dot = file_name.rfind('.').filter(|dot| *dot > 0)?;
    Some(file_name[dot..].to_string())
}

/// 前綴加上原始副檔名，沒有原始檔時使用預設副檔名
fn keep_extension(prefix: &str, source: Option<&str>, fallback: &str) -> String {
    format!("{}{}", prefix, extension(source).unwrap_or_else(|| fallback.to_string()))
}

/// 依轉換、原始檔名與輸出序號（多輸出時從 0 開始）決定輸出檔名
pub fn generate_filename(
    descriptor: &ConversionDescriptor,
    source: Option<&str>,
    index: Option<usize>,
) -> String {
    let base = base_name(source);
    let suffix = index.map(|i| format!("-{}", i + 1)).unwrap_or_default();

    match descriptor.id {
        "generate-qr" => "qrcode.png".to_string(),

        "compress-image" => keep_extension("compressed", source, ".jpg"),
        "resize-image" => keep_extension("resized", source, ".jpg"),
        "rotate-image" => keep_extension("rotated", source, ".jpg"),
        "flip-image" => keep_extension("flipped", source, ".jpg"),
        "create-ico" => "icon.ico".to_string(),
        "image-rotate-90" => keep_extension("rotated-90", source, ".jpg"),
        "image-rotate-180" => keep_extension("rotated-180", source, ".jpg"),
        "image-rotate-270" => keep_extension("rotated-270", source, ".jpg"),
        "image-flip-horizontal" => keep_extension("flipped-h", source, ".jpg"),
        "image-flip-vertical" => keep_extension("flipped-v", source, ".jpg"),
        "image-grayscale" => keep_extension("grayscale", source, ".jpg"),
        "image-invert" => keep_extension("inverted", source, ".jpg"),
        "image-brightness" => keep_extension("brightness", source, ".jpg"),
        "image-blur" => keep_extension("blurred", source, ".jpg"),
        "image-contrast" => keep_extension("contrast", source, ".jpg"),
        "image-saturation" => keep_extension("saturated", source, ".jpg"),
        "image-sepia" => keep_extension("sepia", source, ".jpg"),
        "image-sharpen" => keep_extension("sharpened", source, ".jpg"),
        "add-image-border" => keep_extension("bordered", source, ".jpg"),
        "image-pixelate" => keep_extension("pixelated", source, ".jpg"),
        "color-picker" => "colors.txt".to_string(),
        "image-to-ascii" => "ascii.txt".to_string(),
        "color-palette" => "color-palette.txt".to_string(),
        "tiff-to-jpg" | "tiff-to-png" | "tiff-to-webp" | "tiff-to-bmp" | "gif-to-jpg" | "gif-to-png"
        | "gif-to-webp" | "webp-to-gif" | "webp-to-tiff" => {
            format!("{}.{}", base, descriptor.to)
        }

        "merge-pdf" => "merged.pdf".to_string(),
        "split-pdf" => format!("page{}.pdf", suffix),
        "pdf-to-jpg" | "pdf-to-png" => format!("page{}.{}", suffix, descriptor.to),
        "compress-pdf" => keep_extension("compressed", source, ".pdf"),
        "rotate-pdf" => keep_extension("rotated", source, ".pdf"),
        "delete-pdf-pages" => keep_extension("edited", source, ".pdf"),
        "pdf-add-watermark" => keep_extension("watermarked", source, ".pdf"),
        "html-to-pdf" | "txt-to-pdf" | "markdown-to-pdf" if source.is_none() => "document.pdf".to_string(),
        "html-to-pdf" | "txt-to-pdf" | "markdown-to-pdf" => format!("{}.pdf", base),
        "images-to-pdf-single" => "combined.pdf".to_string(),
        "pdf-crop" => format!("{}-cropped.pdf", base),
        "pdf-resize" | "pdf-a4-to-letter" | "pdf-letter-to-a4" => format!("{}-resized.pdf", base),
        "webp-to-pdf" | "tiff-to-pdf" | "bmp-to-pdf" | "gif-to-pdf" => format!("{}.pdf", base),
        "pdf-to-text" | "pdf-to-txt" => format!("{}.txt", base),

        "docx-to-pdf" | "word-to-pdf" | "rtf-to-pdf" => format!("{}.pdf", base),
        "docx-to-html" | "txt-to-html" => format!("{}.html", base),
        "docx-to-txt" => format!("{}.txt", base),
        "docx-to-rtf" => format!("{}.rtf", base),
        "rtf-to-docx" | "txt-to-docx" | "html-to-docx" => format!("{}.docx", base),
        "markdown-to-html" => "document.html".to_string(),
        "html-to-markdown" => "document.md".to_string(),
        "html-to-txt" => "extracted-text.txt".to_string(),

        "csv-to-json" | "xlsx-to-json" | "yaml-to-json" => format!("{}.json", base),
        "json-to-csv" => "data.csv".to_string(),
        "xlsx-to-csv" | "xls-to-csv" | "ods-to-csv" | "xml-to-csv" | "tsv-to-csv" => format!("{}.csv", base),
        "csv-to-xlsx" => format!("{}.xlsx", base),
        "json-to-xlsx" => "data.xlsx".to_string(),
        "csv-to-xml" => format!("{}.xml", base),
        "json-to-xml" => "data.xml".to_string(),
        "xml-to-json" => "data.json".to_string(),
        "json-to-yaml" => "data.yaml".to_string(),
        "csv-to-tsv" => format!("{}.tsv", base),
        "html-table-to-csv" => "table-data.csv".to_string(),
        "xlsx-to-html" | "csv-to-html" => format!("{}.html", base),

        "base64-encode" | "url-encode" | "html-encode" => "encoded.txt".to_string(),
        "base64-decode" | "url-decode" | "binary-to-text" | "hex-to-text" | "html-decode" => {
            "decoded.txt".to_string()
        }

        "create-zip" => "archive.zip".to_string(),
        "extract-zip" => format!("extracted{}{}", suffix, extension(source).unwrap_or_default()),
        "gzip-compress" => format!("{}.gz", file_name(source)),
        "gzip-decompress" => gunzipped_name(source),

        "word-counter" => "word-stats.txt".to_string(),
        "case-converter-upper" => "uppercase.txt".to_string(),
        "case-converter-lower" => "lowercase.txt".to_string(),
        "case-converter-title" => "titlecase.txt".to_string(),
        "remove-duplicates" => "no-duplicates.txt".to_string(),
        "sort-lines" => "sorted.txt".to_string(),
        "reverse-text" => "reversed.txt".to_string(),
        "find-replace" => "replaced.txt".to_string(),
        "json-formatter" => "formatted.json".to_string(),
        "json-minify" => "minified.json".to_string(),
        "character-counter" | "line-counter" => "analysis.txt".to_string(),
        "remove-line-breaks" => "no-breaks.txt".to_string(),
        "add-line-numbers" => "numbered.txt".to_string(),
        "text-to-binary" => "binary.txt".to_string(),
        "text-to-hex" => "hexadecimal.txt".to_string(),
        "remove-html-tags" => "plain-text.txt".to_string(),
        "extract-emails" => "email-addresses.txt".to_string(),
        "extract-urls" => "urls.txt".to_string(),
        "lorem-ipsum" => "lorem-ipsum.txt".to_string(),
        "minify-css" => keep_extension("minified", source, ".css"),
        "minify-js" => keep_extension("minified", source, ".js"),
        "beautify-css" => keep_extension("beautified", source, ".css"),
        "beautify-js" => keep_extension("beautified", source, ".js"),

        "hex-to-rgb" => "rgb-color.txt".to_string(),
        "rgb-to-hex" => "hex-color.txt".to_string(),
        "hex-to-hsl" => "hsl-color.txt".to_string(),
        "random-color-generator" => "random-colors.txt".to_string(),

        _ => format!("{}{}.{}", DEFAULT_BASE, suffix, descriptor.to),
    }
}

fn file_name(source: Option<&str>) -> String {
    source
        .and_then(|s| Path::new(s).file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| DEFAULT_BASE.to_string())
}

fn gunzipped_name(source: Option<&str>) -> String {
    let name = file_name(source);
    match name.strip_suffix(".gz") {
        Some(inner) if !inner.is_empty() => inner.to_string(),
        _ => base_name(Some(&name)),
    }
}

/// 多輸出時使用的檔名：解壓縮得到的原始路徑優先，否則套用一般規則
pub fn output_filename(
    descriptor: &ConversionDescriptor,
    source: Option<&str>,
    index: Option<usize>,
    known_name: Option<&str>,
) -> String {
    match known_name.filter(|n| !n.is_empty()) {
        Some(name) => name.to_string(),
        None => generate_filename(descriptor, source, index),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::registry::get_conversion_by_id;

    fn name(id: &str, source: Option<&str>, index: Option<usize>) -> String {
        generate_filename(get_conversion_by_id(id).unwrap(), source, index)
    }

    #[test]
    fn prefixed_names_keep_the_extension() {
        assert_eq!(name("image-rotate-90", Some("cat.png"), None), "rotated-90.png");
        assert_eq!(name("image-blur", None, None), "blurred.jpg");
        assert_eq!(name("image-sharpen", Some("cat.webp"), None), "sharpened.webp");
        assert_eq!(name("compress-pdf", Some("report.pdf"), None), "compressed.pdf");
        assert_eq!(name("minify-js", Some("app.min.js"), None), "minified.js");
    }

    #[test]
    fn base_name_replaces_extension() {
        assert_eq!(name("csv-to-json", Some("dir/people.csv"), None), "people.json");
        assert_eq!(name("pdf-crop", Some("a.b.pdf"), None), "a.b-cropped.pdf");
        assert_eq!(name("gif-to-png", Some("anim.gif"), None), "anim.png");
        assert_eq!(name("webp-to-tiff", Some("shot.webp"), None), "shot.tiff");
        assert_eq!(name("tiff-to-bmp", Some("scan.tif"), None), "scan.bmp");
        assert_eq!(name("ods-to-csv", Some("budget.ods"), None), "budget.csv");
        assert_eq!(name("xls-to-csv", Some("old.xls"), None), "old.csv");
        assert_eq!(name("csv-to-json", None, None), "converted.json");
    }

    #[test]
    fn indexed_outputs() {
        assert_eq!(name("split-pdf", Some("x.pdf"), Some(0)), "page-1.pdf");
        assert_eq!(name("split-pdf", Some("x.pdf"), Some(2)), "page-3.pdf");
        assert_eq!(name("pdf-to-png", Some("x.pdf"), Some(1)), "page-2.png");
        assert_eq!(name("extract-zip", Some("bundle.zip"), Some(0)), "extracted-1.zip");
    }

    #[test]
    fn gzip_names() {
        assert_eq!(name("gzip-compress", Some("notes.txt"), None), "notes.txt.gz");
        assert_eq!(name("gzip-decompress", Some("notes.txt.gz"), None), "notes.txt");
        assert_eq!(name("gzip-decompress", Some("blob.tgz"), None), "blob");
    }

    #[test]
    fn fixed_and_default_names() {
        assert_eq!(name("generate-qr", None, None), "qrcode.png");
        assert_eq!(name("merge-pdf", Some("a.pdf"), None), "merged.pdf");
        assert_eq!(name("txt-to-pdf", None, None), "document.pdf");
        assert_eq!(name("txt-to-pdf", Some("notes.txt"), None), "notes.pdf");
        assert_eq!(name("pem-to-der", Some("cert.pem"), None), "converted.der");
        assert_eq!(name("xlsx-to-html", Some("book.xlsx"), None), "book.html");
    }

    #[test]
    fn known_names_win() {
        let descriptor = get_conversion_by_id("extract-zip").unwrap();
        assert_eq!(output_filename(descriptor, Some("a.zip"), Some(0), Some("docs/b.json")), "docs/b.json");
        assert_eq!(output_filename(descriptor, Some("a.zip"), Some(0), None), "extracted-1.zip");
    }
}
