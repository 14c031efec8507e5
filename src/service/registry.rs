//! 轉換目錄：每個轉換的描述與其處理函式放在同一張靜態表中。

use std::fmt;

use log::{debug, info};

use crate::converters::{
    archive, certificate, color, data, document, images, pdf, pdf_export, pdf_render, pdf_word,
    spreadsheet, text, utility,
};
use crate::error::{ConvertError, ConvertResult};
use crate::models::conversion::{ConversionRequest, ConversionResult};
use crate::models::options::OptionKey;

pub type Handler = fn(&ConversionRequest) -> ConvertResult<ConversionResult>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Image,
    Pdf,
    Document,
    Data,
    Archive,
    Utility,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Image,
        Category::Pdf,
        Category::Document,
        Category::Data,
        Category::Archive,
        Category::Utility,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            Category::Image => "image",
            Category::Pdf => "pdf",
            Category::Document => "document",
            Category::Data => "data",
            Category::Archive => "archive",
            Category::Utility => "utility",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::Image => "圖片工具",
            Category::Pdf => "PDF 工具",
            Category::Document => "文件工具",
            Category::Data => "資料工具",
            Category::Archive => "壓縮檔工具",
            Category::Utility => "實用工具",
        }
    }

    pub fn parse(input: &str) -> Option<Category> {
        let input = input.trim().to_ascii_lowercase();
        Category::ALL.into_iter().find(|c| c.id() == input)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// 轉換需要的輸入形式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// 一或多個檔案；`multiple` 為 false 時只使用第一個
    Files { min: usize, multiple: bool },
    /// 文字，可由 `--text` 直接提供或讀取檔案內容
    Text,
    /// 不需要輸入
    Nothing,
}

#[derive(Clone, Copy)]
pub struct ConversionDescriptor {
    pub id: &'static str,
    pub name: &'static str,
    pub from: &'static str,
    pub to: &'static str,
    pub category: Category,
    pub description: &'static str,
    pub popular: bool,
    pub input: InputKind,
    pub required: &'static [OptionKey],
    pub handler: Handler,
}

impl fmt::Debug for ConversionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionDescriptor")
            .field("id", &self.id)
            .field("category", &self.category)
            .field("input", &self.input)
            .field("required", &self.required)
            .finish_non_exhaustive()
    }
}

impl ConversionDescriptor {
    const fn popular(mut self) -> Self {
        self.popular = true;
        self
    }

    const fn input(mut self, input: InputKind) -> Self {
        self.input = input;
        self
    }

    const fn text(self) -> Self {
        self.input(InputKind::Text)
    }

    const fn requires(mut self, required: &'static [OptionKey]) -> Self {
        self.required = required;
        self
    }

    pub fn accepts_multiple(&self) -> bool {
        matches!(self.input, InputKind::Files { multiple: true, .. })
    }

    fn matches(&self, query: &str) -> bool {
        [self.id, self.name, self.description, self.from, self.to]
            .iter()
            .any(|field| field.to_lowercase().contains(query))
    }
}

const SINGLE_FILE: InputKind = InputKind::Files { min: 1, multiple: false };
const MANY_FILES: InputKind = InputKind::Files { min: 1, multiple: true };
const AT_LEAST_TWO: InputKind = InputKind::Files { min: 2, multiple: true };

const fn conv(
    id: &'static str,
    name: &'static str,
    from: &'static str,
    to: &'static str,
    category: Category,
    description: &'static str,
    handler: Handler,
) -> ConversionDescriptor {
    ConversionDescriptor {
        id,
        name,
        from,
        to,
        category,
        description,
        popular: false,
        input: SINGLE_FILE,
        required: &[],
        handler,
    }
}

use Category::{Archive, Data, Document, Image, Pdf, Utility};

pub static CONVERSIONS: &[ConversionDescriptor] = &[
    // 圖片格式
    conv("png-to-jpg", "PNG to JPG", "png", "jpg", Image, "Convert PNG images to JPG format", images::handle_convert).popular(),
    conv("jpg-to-png", "JPG to PNG", "jpg", "png", Image, "Convert JPG images to PNG format", images::handle_convert).popular(),
    conv("png-to-webp", "PNG to WEBP", "png", "webp", Image, "Convert PNG to WEBP format", images::handle_convert),
    conv("jpg-to-webp", "JPG to WEBP", "jpg", "webp", Image, "Convert JPG to WEBP format", images::handle_convert),
    conv("webp-to-png", "WEBP to PNG", "webp", "png", Image, "Convert WEBP to PNG format", images::handle_convert),
    conv("webp-to-jpg", "WEBP to JPG", "webp", "jpg", Image, "Convert WEBP to JPG format", images::handle_convert),
    conv("png-to-bmp", "PNG to BMP", "png", "bmp", Image, "Convert PNG to BMP format", images::handle_convert),
    conv("jpg-to-bmp", "JPG to BMP", "jpg", "bmp", Image, "Convert JPG to BMP format", images::handle_convert),
    conv("bmp-to-png", "BMP to PNG", "bmp", "png", Image, "Convert BMP to PNG format", images::handle_convert),
    conv("bmp-to-jpg", "BMP to JPG", "bmp", "jpg", Image, "Convert BMP to JPG format", images::handle_convert),
    conv("tiff-to-jpg", "TIFF to JPG", "tiff", "jpg", Image, "Convert TIFF to JPG format", images::handle_convert),
    conv("tiff-to-png", "TIFF to PNG", "tiff", "png", Image, "Convert TIFF to PNG format", images::handle_convert),
    conv("gif-to-jpg", "GIF to JPG", "gif", "jpg", Image, "Convert the first GIF frame to JPG", images::handle_convert),
    conv("gif-to-png", "GIF to PNG", "gif", "png", Image, "Convert the first GIF frame to PNG", images::handle_convert),
    conv("jpg-to-gif", "JPG to GIF", "jpg", "gif", Image, "Convert JPG to GIF format", images::handle_convert),
    conv("png-to-gif", "PNG to GIF", "png", "gif", Image, "Convert PNG to GIF format", images::handle_convert),
    conv("png-to-tiff", "PNG to TIFF", "png", "tiff", Image, "Convert PNG to TIFF format", images::handle_convert),
    conv("jpg-to-tiff", "JPG to TIFF", "jpg", "tiff", Image, "Convert JPG to TIFF format", images::handle_convert),
    conv("bmp-to-webp", "BMP to WEBP", "bmp", "webp", Image, "Convert BMP to WEBP format", images::handle_convert),
    conv("webp-to-bmp", "WEBP to BMP", "webp", "bmp", Image, "Convert WEBP to BMP format", images::handle_convert),
    conv("tiff-to-webp", "TIFF to WEBP", "tiff", "webp", Image, "Convert TIFF to WEBP format", images::handle_convert),
    conv("tiff-to-bmp", "TIFF to BMP", "tiff", "bmp", Image, "Convert TIFF to BMP format", images::handle_convert),
    conv("gif-to-webp", "GIF to WEBP", "gif", "webp", Image, "Convert the first GIF frame to WEBP", images::handle_convert),
    conv("webp-to-gif", "WEBP to GIF", "webp", "gif", Image, "Convert WEBP to GIF format", images::handle_convert),
    conv("webp-to-tiff", "WEBP to TIFF", "webp", "tiff", Image, "Convert WEBP to TIFF format", images::handle_convert),
    // 圖片處理
    conv("compress-image", "Compress Image", "image", "image", Image, "Compress images to reduce file size", images::handle_compress).popular(),
    conv("resize-image", "Resize Image", "image", "image", Image, "Resize images to specific dimensions", images::handle_resize)
        .requires(&[OptionKey::Dimensions]),
    conv("create-ico", "Create ICO", "image", "ico", Image, "Create ICO icon from image", images::handle_create_ico),
    conv("rotate-image", "Rotate Image", "image", "image", Image, "Rotate images by 90, 180, or 270 degrees", images::handle_rotate)
        .requires(&[OptionKey::Degrees]),
    conv("flip-image", "Flip Image", "image", "image", Image, "Flip images horizontally or vertically", images::handle_flip),
    conv("image-rotate-90", "Rotate 90°", "image", "image", Image, "Rotate images 90 degrees clockwise", images::handle_rotate_90),
    conv("image-rotate-180", "Rotate 180°", "image", "image", Image, "Rotate images 180 degrees", images::handle_rotate_180),
    conv("image-rotate-270", "Rotate 270°", "image", "image", Image, "Rotate images 270 degrees clockwise", images::handle_rotate_270),
    conv("image-flip-horizontal", "Flip Horizontal", "image", "image", Image, "Mirror images left to right", images::handle_flip_horizontal),
    conv("image-flip-vertical", "Flip Vertical", "image", "image", Image, "Mirror images top to bottom", images::handle_flip_vertical),
    conv("image-grayscale", "Grayscale", "image", "image", Image, "Convert images to grayscale", images::handle_grayscale),
    conv("image-invert", "Invert Colors", "image", "image", Image, "Invert image colors", images::handle_invert),
    conv("image-brightness", "Adjust Brightness", "image", "image", Image, "Change image brightness", images::handle_brightness),
    conv("image-contrast", "Adjust Contrast", "image", "image", Image, "Change image contrast", images::handle_contrast),
    conv("image-saturation", "Adjust Saturation", "image", "image", Image, "Change image color saturation", images::handle_saturation),
    conv("image-blur", "Blur Image", "image", "image", Image, "Apply a gaussian blur", images::handle_blur),
    conv("image-sharpen", "Sharpen Image", "image", "image", Image, "Sharpen images with an unsharp mask", images::handle_sharpen),
    conv("image-sepia", "Sepia", "image", "image", Image, "Apply a sepia tone", images::handle_sepia),
    conv("add-image-border", "Add Border", "image", "image", Image, "Add a solid border around images", images::handle_border),
    conv("image-pixelate", "Pixelate", "image", "image", Image, "Pixelate images", images::handle_pixelate),
    conv("color-picker", "Color Picker", "image", "color", Image, "Extract dominant colors from images", images::handle_color_picker),
    conv("color-palette", "Color Palette", "image", "color", Image, "Sample a color palette from images", images::handle_color_palette),
    conv("image-to-ascii", "Image to ASCII", "image", "text", Image, "Convert images to ASCII art", images::handle_ascii),
    // PDF 編輯
    conv("merge-pdf", "Merge PDF", "pdf", "pdf", Pdf, "Combine multiple PDFs into one", pdf::handle_merge)
        .popular()
        .input(AT_LEAST_TWO),
    conv("split-pdf", "Split PDF", "pdf", "pdf", Pdf, "Split PDF into separate pages", pdf::handle_split).popular(),
    conv("compress-pdf", "Compress PDF", "pdf", "pdf", Pdf, "Reduce PDF file size", pdf::handle_compress).popular(),
    conv("rotate-pdf", "Rotate PDF", "pdf", "pdf", Pdf, "Rotate PDF pages", pdf::handle_rotate)
        .requires(&[OptionKey::Degrees]),
    conv("delete-pdf-pages", "Delete PDF Pages", "pdf", "pdf", Pdf, "Remove specific pages from PDF", pdf::handle_delete_pages)
        .requires(&[OptionKey::PagesToDelete]),
    conv("pdf-add-watermark", "Add Watermark", "pdf", "pdf", Pdf, "Stamp a text watermark on every page", pdf::handle_watermark)
        .requires(&[OptionKey::WatermarkText]),
    conv("pdf-crop", "Crop PDF", "pdf", "pdf", Pdf, "Trim the margins of every page", pdf::handle_crop),
    conv("pdf-resize", "Resize PDF", "pdf", "pdf", Pdf, "Scale pages to a custom size in points", pdf::handle_resize)
        .requires(&[OptionKey::PageSize]),
    conv("pdf-a4-to-letter", "A4 to Letter", "pdf", "pdf", Pdf, "Scale A4 pages to US Letter", pdf::handle_a4_to_letter),
    conv("pdf-letter-to-a4", "Letter to A4", "pdf", "pdf", Pdf, "Scale US Letter pages to A4", pdf::handle_letter_to_a4),
    // 建立 PDF
    conv("jpg-to-pdf", "JPG to PDF", "jpg", "pdf", Pdf, "Convert JPG images to PDF", pdf::handle_images_to_pdf)
        .popular()
        .input(MANY_FILES),
    conv("png-to-pdf", "PNG to PDF", "png", "pdf", Pdf, "Convert PNG images to PDF", pdf::handle_images_to_pdf)
        .input(MANY_FILES),
    conv("images-to-pdf-single", "Images to PDF", "image", "pdf", Pdf, "Combine several images into one PDF", pdf::handle_images_to_pdf)
        .input(MANY_FILES),
    conv("webp-to-pdf", "WEBP to PDF", "webp", "pdf", Pdf, "Convert WEBP images to PDF", pdf::handle_image_to_pdf),
    conv("bmp-to-pdf", "BMP to PDF", "bmp", "pdf", Pdf, "Convert BMP images to PDF", pdf::handle_image_to_pdf),
    conv("gif-to-pdf", "GIF to PDF", "gif", "pdf", Pdf, "Convert GIF images to PDF", pdf::handle_image_to_pdf),
    conv("tiff-to-pdf", "TIFF to PDF", "tiff", "pdf", Pdf, "Convert TIFF images to PDF", pdf::handle_image_to_pdf),
    conv("txt-to-pdf", "TXT to PDF", "txt", "pdf", Document, "Convert text files to PDF", pdf::handle_text_to_pdf).text(),
    conv("html-to-pdf", "HTML to PDF", "html", "pdf", Pdf, "Convert HTML to PDF", pdf::handle_html_to_pdf).text(),
    conv("markdown-to-pdf", "Markdown to PDF", "md", "pdf", Document, "Convert Markdown to PDF", pdf::handle_markdown_to_pdf).text(),
    // 從 PDF 匯出
    conv("pdf-to-text", "PDF to Text", "pdf", "txt", Pdf, "Extract text from PDF", pdf_export::handle_pdf_to_text),
    conv("pdf-to-txt", "PDF to TXT", "pdf", "txt", Pdf, "Extract text from PDF as a .txt file", pdf_export::handle_pdf_to_text),
    conv("pdf-to-word", "PDF to Word", "pdf", "docx", Pdf, "Convert PDF to Word document", pdf_word::handle_pdf_to_word),
    conv("pdf-to-csv", "PDF to CSV", "pdf", "csv", Pdf, "Extract tables from PDF to CSV", pdf_export::handle_pdf_to_csv),
    conv("pdf-to-html", "PDF to HTML", "pdf", "html", Pdf, "Convert PDF to HTML", pdf_export::handle_pdf_to_html),
    conv("pdf-to-rtf", "PDF to RTF", "pdf", "rtf", Pdf, "Convert PDF to RTF document", pdf_export::handle_pdf_to_rtf),
    conv("pdf-to-fb2", "PDF to FB2", "pdf", "fb2", Pdf, "Convert PDF to FB2 ebook", pdf_export::handle_pdf_to_fb2),
    conv("pdf-to-powerpoint", "PDF to PowerPoint", "pdf", "pptx", Pdf, "Convert PDF to a plain-text slide outline", pdf_export::handle_pdf_to_powerpoint),
    conv("pdf-to-jpg", "PDF to JPG", "pdf", "jpg", Pdf, "Convert PDF pages to JPG images", pdf_render::handle_pdf_to_images).popular(),
    conv("pdf-to-png", "PDF to PNG", "pdf", "png", Pdf, "Convert PDF pages to PNG images", pdf_render::handle_pdf_to_images),
    // 文件
    conv("docx-to-txt", "DOCX to TXT", "docx", "txt", Document, "Convert Word to plain text", document::handle_docx_to_text),
    conv("docx-to-html", "DOCX to HTML", "docx", "html", Document, "Convert Word to HTML", document::handle_docx_to_html),
    conv("docx-to-pdf", "DOCX to PDF", "docx", "pdf", Document, "Convert Word documents to PDF", document::handle_docx_to_pdf).popular(),
    conv("word-to-pdf", "Word to PDF", "docx", "pdf", Pdf, "Convert Word document to PDF", document::handle_docx_to_pdf).popular(),
    conv("txt-to-docx", "TXT to DOCX", "txt", "docx", Document, "Convert text files to Word", document::handle_text_to_docx).text(),
    conv("html-to-docx", "HTML to DOCX", "html", "docx", Document, "Convert HTML to Word", document::handle_html_to_docx).text(),
    conv("rtf-to-docx", "RTF to DOCX", "rtf", "docx", Document, "Convert RTF to Word", document::handle_rtf_to_docx).text(),
    conv("docx-to-rtf", "DOCX to RTF", "docx", "rtf", Document, "Convert Word to RTF", document::handle_docx_to_rtf),
    conv("txt-to-html", "TXT to HTML", "txt", "html", Document, "Wrap plain text in an HTML page", document::handle_text_to_html).text(),
    conv("html-to-txt", "HTML to TXT", "html", "txt", Document, "Strip HTML down to plain text", document::handle_html_to_text).text(),
    conv("markdown-to-html", "Markdown to HTML", "md", "html", Document, "Convert Markdown to HTML", document::handle_markdown_to_html).text(),
    conv("html-to-markdown", "HTML to Markdown", "html", "md", Utility, "Convert HTML to Markdown", document::handle_html_to_markdown).text(),
    conv("rtf-to-pdf", "RTF to PDF", "rtf", "pdf", Document, "Convert RTF to PDF", document::handle_rtf_to_pdf).text(),
    // 資料格式
    conv("csv-to-json", "CSV to JSON", "csv", "json", Data, "Convert CSV to JSON format", data::handle_csv_to_json).text(),
    conv("json-to-csv", "JSON to CSV", "json", "csv", Data, "Convert JSON to CSV format", data::handle_json_to_csv).text(),
    conv("csv-to-xml", "CSV to XML", "csv", "xml", Data, "Convert CSV to XML format", data::handle_csv_to_xml).text(),
    conv("json-to-xml", "JSON to XML", "json", "xml", Data, "Convert JSON to XML format", data::handle_json_to_xml).text(),
    conv("xml-to-json", "XML to JSON", "xml", "json", Data, "Convert XML to JSON format", data::handle_xml_to_json).text(),
    conv("xml-to-csv", "XML to CSV", "xml", "csv", Data, "Convert XML to CSV format", data::handle_xml_to_csv).text(),
    conv("yaml-to-json", "YAML to JSON", "yaml", "json", Data, "Convert YAML to JSON format", data::handle_yaml_to_json).text(),
    conv("json-to-yaml", "JSON to YAML", "json", "yaml", Data, "Convert JSON to YAML format", data::handle_json_to_yaml).text(),
    conv("toml-to-json", "TOML to JSON", "toml", "json", Data, "Convert TOML to JSON format", data::handle_toml_to_json).text(),
    conv("json-to-toml", "JSON to TOML", "json", "toml", Data, "Convert JSON to TOML format", data::handle_json_to_toml).text(),
    conv("ini-to-json", "INI to JSON", "ini", "json", Data, "Convert INI to JSON format", data::handle_ini_to_json).text(),
    conv("json-to-ini", "JSON to INI", "json", "ini", Data, "Convert JSON to INI format", data::handle_json_to_ini).text(),
    conv("tsv-to-csv", "TSV to CSV", "tsv", "csv", Data, "Convert tab-separated values to CSV", data::handle_tsv_to_csv).text(),
    conv("csv-to-tsv", "CSV to TSV", "csv", "tsv", Data, "Convert CSV to tab-separated values", data::handle_csv_to_tsv).text(),
    conv("html-table-to-csv", "HTML Table to CSV", "html", "csv", Data, "Extract the first HTML table as CSV", data::handle_html_table_to_csv).text(),
    conv("xlsx-to-csv", "XLSX to CSV", "xlsx", "csv", Data, "Convert Excel to CSV", spreadsheet::handle_sheet_to_csv).popular(),
    conv("xlsx-to-json", "XLSX to JSON", "xlsx", "json", Data, "Convert Excel to JSON", spreadsheet::handle_sheet_to_json),
    conv("csv-to-xlsx", "CSV to XLSX", "csv", "xlsx", Data, "Convert CSV to Excel", spreadsheet::handle_csv_to_xlsx).text(),
    conv("json-to-xlsx", "JSON to XLSX", "json", "xlsx", Data, "Convert JSON to Excel", spreadsheet::handle_json_to_xlsx).text(),
    conv("xls-to-csv", "XLS to CSV", "xls", "csv", Data, "Convert legacy Excel workbooks to CSV", spreadsheet::handle_sheet_to_csv),
    conv("ods-to-csv", "ODS to CSV", "ods", "csv", Data, "Convert OpenDocument spreadsheets to CSV", spreadsheet::handle_sheet_to_csv),
    conv("xlsx-to-html", "XLSX to HTML", "xlsx", "html", Data, "Render the first sheet as an HTML table", spreadsheet::handle_sheet_to_html),
    conv("csv-to-html", "CSV to HTML", "csv", "html", Data, "Render CSV as an HTML table", data::handle_csv_to_html).text(),
    conv("base64-encode", "Base64 Encode", "text", "base64", Data, "Encode text to Base64", data::handle_base64_encode).text(),
    conv("base64-decode", "Base64 Decode", "base64", "text", Data, "Decode Base64 to text", data::handle_base64_decode).text(),
    conv("url-encode", "URL Encode", "text", "url", Data, "URL encode text", data::handle_url_encode).text(),
    conv("url-decode", "URL Decode", "url", "text", Data, "URL decode text", data::handle_url_decode).text(),
    // 憑證
    conv("pem-to-der", "PEM to DER", "pem", "der", Data, "Convert a PEM certificate or key to binary DER", certificate::handle_pem_to_der),
    conv("der-to-pem", "DER to PEM", "der", "pem", Data, "Convert binary DER to PEM", certificate::handle_der_to_pem),
    conv("pem-to-crt", "PEM to CRT", "pem", "crt", Data, "Save a PEM certificate as .crt", certificate::handle_pem_to_crt),
    conv("crt-to-pem", "CRT to PEM", "crt", "pem", Data, "Convert a .crt certificate to PEM", certificate::handle_any_to_pem),
    conv("cer-to-pem", "CER to PEM", "cer", "pem", Data, "Convert a .cer certificate to PEM", certificate::handle_any_to_pem),
    conv("pem-to-cer", "PEM to CER", "pem", "cer", Data, "Convert a PEM certificate to DER-encoded .cer", certificate::handle_pem_to_cer),
    conv("extract-public-key", "Extract Public Key", "pem", "pem", Data, "Extract the public key of a certificate", certificate::handle_extract_public_key),
    conv("view-certificate-info", "View Certificate Info", "pem", "json", Data, "Show subject, issuer, validity and fingerprint", certificate::handle_view_certificate_info),
    // 壓縮檔
    conv("create-zip", "Create ZIP", "files", "zip", Archive, "Create ZIP archive from files", archive::handle_create_zip)
        .input(MANY_FILES),
    conv("extract-zip", "Extract ZIP", "zip", "files", Archive, "Extract files from ZIP", archive::handle_extract_zip),
    conv("gzip-compress", "GZIP Compress", "file", "gz", Archive, "Compress file with GZIP", archive::handle_gzip_compress),
    conv("gzip-decompress", "GZIP Decompress", "gz", "file", Archive, "Decompress GZIP file", archive::handle_gzip_decompress),
    conv("create-tar", "Create TAR", "files", "tar", Archive, "Create TAR archive from files", archive::handle_create_tar)
        .input(MANY_FILES),
    conv("extract-tar", "Extract TAR", "tar", "files", Archive, "Extract files from TAR", archive::handle_extract_tar),
    // 文字工具
    conv("word-counter", "Word Counter", "text", "txt", Utility, "Count words, sentences and reading time", text::handle_word_counter).text(),
    conv("character-counter", "Character Counter", "text", "txt", Utility, "Count characters with and without spaces", text::handle_character_counter).text(),
    conv("line-counter", "Line Counter", "text", "txt", Utility, "Count total, empty and non-empty lines", text::handle_line_counter).text(),
    conv("case-converter-upper", "UPPERCASE", "text", "txt", Utility, "Convert text to upper case", text::handle_upper).text(),
    conv("case-converter-lower", "lowercase", "text", "txt", Utility, "Convert text to lower case", text::handle_lower).text(),
    conv("case-converter-title", "Title Case", "text", "txt", Utility, "Capitalise every word", text::handle_title).text(),
    conv("remove-duplicates", "Remove Duplicate Lines", "text", "txt", Utility, "Keep the first occurrence of each line", text::handle_remove_duplicates).text(),
    conv("sort-lines", "Sort Lines", "text", "txt", Utility, "Sort lines alphabetically", text::handle_sort_lines).text(),
    conv("reverse-text", "Reverse Text", "text", "txt", Utility, "Reverse the characters of the text", text::handle_reverse).text(),
    conv("find-replace", "Find & Replace", "text", "txt", Utility, "Replace every occurrence of a string", text::handle_find_replace)
        .text()
        .requires(&[OptionKey::FindText]),
    conv("json-formatter", "JSON Formatter", "json", "json", Utility, "Pretty-print JSON with two-space indent", text::handle_json_formatter).text(),
    conv("json-minify", "JSON Minify", "json", "json", Utility, "Remove whitespace from JSON", text::handle_json_minify).text(),
    conv("remove-line-breaks", "Remove Line Breaks", "text", "txt", Utility, "Join lines with single spaces", text::handle_remove_line_breaks).text(),
    conv("add-line-numbers", "Add Line Numbers", "text", "txt", Utility, "Prefix each line with its number", text::handle_line_numbers).text(),
    conv("text-to-binary", "Text to Binary", "text", "txt", Utility, "Write each character as 8-bit binary", text::handle_text_to_binary).text(),
    conv("binary-to-text", "Binary to Text", "txt", "text", Utility, "Decode space-separated binary", text::handle_binary_to_text).text(),
    conv("text-to-hex", "Text to Hex", "text", "txt", Utility, "Write each character as hexadecimal", text::handle_text_to_hex).text(),
    conv("hex-to-text", "Hex to Text", "txt", "text", Utility, "Decode space-separated hexadecimal", text::handle_hex_to_text).text(),
    conv("html-encode", "HTML Encode", "text", "txt", Utility, "Escape HTML special characters", text::handle_html_encode).text(),
    conv("html-decode", "HTML Decode", "txt", "text", Utility, "Unescape HTML entities", text::handle_html_decode).text(),
    conv("remove-html-tags", "Remove HTML Tags", "html", "txt", Utility, "Strip tags and keep the text", text::handle_strip_tags).text(),
    conv("extract-emails", "Extract Emails", "text", "txt", Utility, "List every email address in the text", text::handle_extract_emails).text(),
    conv("extract-urls", "Extract URLs", "text", "txt", Utility, "List every URL in the text", text::handle_extract_urls).text(),
    conv("lorem-ipsum", "Lorem Ipsum", "none", "txt", Utility, "Generate placeholder paragraphs", text::handle_lorem_ipsum)
        .input(InputKind::Nothing),
    conv("minify-css", "Minify CSS", "css", "css", Utility, "Strip comments and whitespace from CSS", text::handle_minify_css).text(),
    conv("minify-js", "Minify JS", "js", "js", Utility, "Strip comments and whitespace from JavaScript", text::handle_minify_js).text(),
    conv("beautify-css", "Beautify CSS", "css", "css", Utility, "Indent CSS one declaration per line", text::handle_beautify_css).text(),
    conv("beautify-js", "Beautify JS", "js", "js", Utility, "Indent JavaScript by braces", text::handle_beautify_js).text(),
    // 色彩
    conv("hex-to-rgb", "HEX to RGB", "hex", "rgb", Utility, "Convert a hex color to rgb()", color::handle_hex_to_rgb).text(),
    conv("rgb-to-hex", "RGB to HEX", "rgb", "hex", Utility, "Convert rgb() to a hex color", color::handle_rgb_to_hex).text(),
    conv("hex-to-hsl", "HEX to HSL", "hex", "hsl", Utility, "Convert a hex color to hsl()", color::handle_hex_to_hsl).text(),
    conv("random-color-generator", "Random Colors", "none", "txt", Utility, "Generate a random color palette", color::handle_random_colors)
        .input(InputKind::Nothing),
    // 其他
    conv("generate-qr", "Generate QR Code", "text", "qr", Utility, "Generate QR code from text", utility::handle_generate_qr).text(),
];

pub fn get_conversion_by_id(id: &str) -> Option<&'static ConversionDescriptor> {
    CONVERSIONS.iter().find(|c| c.id == id)
}

pub fn get_popular_conversions() -> Vec<&'static ConversionDescriptor> {
    CONVERSIONS.iter().filter(|c| c.popular).collect()
}

pub fn get_conversions_by_category(category: Category) -> Vec<&'static ConversionDescriptor> {
    CONVERSIONS.iter().filter(|c| c.category == category).collect()
}

/// 不分大小寫比對 id、名稱、描述與來源 / 目標格式
pub fn search_conversions(query: &str) -> Vec<&'static ConversionDescriptor> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return Vec::new();
    }
    CONVERSIONS.iter().filter(|c| c.matches(&query)).collect()
}

/// 有登錄轉換的分類，依固定順序
pub fn categories() -> Vec<Category> {
    Category::ALL
        .into_iter()
        .filter(|category| CONVERSIONS.iter().any(|c| c.category == *category))
        .collect()
}

/// 檢查輸入是否齊全
pub fn validate_input(request: &ConversionRequest) -> ConvertResult<()> {
    let descriptor = request.descriptor;
    match descriptor.input {
        InputKind::Files { min, .. } if request.files.len() < min => Err(ConvertError::InvalidInput(
            format!("{} 需要至少 {} 個輸入檔案，目前為 {} 個", descriptor.id, min, request.files.len()),
        )),
        InputKind::Text if request.text.is_none() && request.files.is_empty() => Err(
            ConvertError::InvalidInput(format!("{} 需要文字輸入（--text 或輸入檔案）", descriptor.id)),
        ),
        _ => Ok(()),
    }
}

/// 驗證輸入與必要選項後執行處理函式
pub fn dispatch(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    let descriptor = request.descriptor;
    validate_input(request)?;
    if let Some(option) = request.options.missing_required(descriptor.required) {
        return Err(ConvertError::MissingOption {
            conversion: descriptor.id,
            option,
        });
    }

    let names: Vec<&str> = request.files.iter().map(|f| f.name.as_str()).collect();
    info!("執行轉換：{}，輸入：{:?}", descriptor.id, names);
    debug!("轉換選項：{:?}", request.options);
    let result = (descriptor.handler)(request)?;
    info!(
        "轉換 {} 完成：{} 個輸出，共 {} 位元組",
        descriptor.id,
        result.output_count(),
        result.total_bytes()
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::models::blob::InputFile;

    #[test]
    fn ids_are_unique() {
        let mut seen = HashSet::new();
        for conversion in CONVERSIONS {
            assert!(seen.insert(conversion.id), "重複的轉換 id：{}", conversion.id);
        }
    }

    #[test]
    fn every_entry_is_complete() {
        for conversion in CONVERSIONS {
            assert!(!conversion.name.is_empty(), "{} 缺少名稱", conversion.id);
            assert!(!conversion.description.is_empty(), "{} 缺少描述", conversion.id);
            assert!(!conversion.from.is_empty() && !conversion.to.is_empty());
            if let InputKind::Files { min, .. } = conversion.input {
                assert!(min >= 1);
            }
        }
    }

    #[test]
    fn extra_image_pairs_and_workbooks_are_registered() {
        for id in ["gif-to-webp", "webp-to-gif", "tiff-to-bmp", "tiff-to-webp", "webp-to-tiff"] {
            let conversion = get_conversion_by_id(id).unwrap();
            assert_eq!(conversion.category, Category::Image);
            assert_eq!(format!("{}-to-{}", conversion.from, conversion.to), id);
        }
        for id in ["xls-to-csv", "ods-to-csv"] {
            let conversion = get_conversion_by_id(id).unwrap();
            assert_eq!(conversion.to, "csv");
            assert_eq!(conversion.category, Category::Data);
        }
        assert!(get_conversion_by_id("image-sharpen").is_some());
    }

    #[test]
    fn webp_to_gif_dispatches_through_image_encoder() {
        let mut webp = Vec::new();
        image::DynamicImage::ImageRgb8(image::RgbImage::from_pixel(3, 2, image::Rgb([200, 10, 10])))
            .write_to(&mut std::io::Cursor::new(&mut webp), image::ImageFormat::WebP)
            .unwrap();
        let mut request = ConversionRequest::new(get_conversion_by_id("webp-to-gif").unwrap());
        request.files.push(InputFile::new("red.webp", webp));
        let blob = dispatch(&request).unwrap().into_single().unwrap();
        assert_eq!(image::guess_format(&blob.bytes).unwrap(), image::ImageFormat::Gif);
    }

    #[test]
    fn lookup_and_filters() {
        let merge = get_conversion_by_id("merge-pdf").unwrap();
        assert_eq!(merge.category, Category::Pdf);
        assert!(merge.accepts_multiple());
        assert!(get_conversion_by_id("mp3-to-wav").is_none());

        let popular = get_popular_conversions();
        assert!(popular.iter().all(|c| c.popular));
        assert!(popular.iter().any(|c| c.id == "png-to-jpg"));

        let data = get_conversions_by_category(Category::Data);
        assert!(data.iter().any(|c| c.id == "csv-to-json"));
        assert!(data.iter().all(|c| c.category == Category::Data));
        assert_eq!(categories(), Category::ALL.to_vec());
    }

    #[test]
    fn search_is_case_insensitive() {
        let hits = search_conversions("YAML");
        let ids: Vec<_> = hits.iter().map(|c| c.id).collect();
        assert!(ids.contains(&"yaml-to-json"));
        assert!(ids.contains(&"json-to-yaml"));
        assert!(search_conversions("   ").is_empty());
        assert!(search_conversions("no-such-format").is_empty());
    }

    #[test]
    fn dispatch_checks_required_options() {
        let descriptor = get_conversion_by_id("find-replace").unwrap();
        let mut request = ConversionRequest::new(descriptor);
        request.text = Some("hello world".to_string());
        match dispatch(&request) {
            Err(ConvertError::MissingOption { conversion, option }) => {
                assert_eq!(conversion, "find-replace");
                assert_eq!(option, OptionKey::FindText);
            }
            other => panic!("預期缺少選項錯誤，得到 {:?}", other),
        }

        request.options.find_text = Some("world".to_string());
        request.options.replace_text = Some("there".to_string());
        let blob = dispatch(&request).unwrap().into_single().unwrap();
        assert_eq!(blob.bytes, b"hello there");
    }

    #[test]
    fn dispatch_checks_input_count() {
        let descriptor = get_conversion_by_id("merge-pdf").unwrap();
        let mut request = ConversionRequest::new(descriptor);
        request.files.push(InputFile::new("a.pdf", Vec::new()));
        assert!(matches!(dispatch(&request), Err(ConvertError::InvalidInput(_))));

        let text = ConversionRequest::new(get_conversion_by_id("word-counter").unwrap());
        assert!(matches!(dispatch(&text), Err(ConvertError::InvalidInput(_))));

        let nothing = ConversionRequest::new(get_conversion_by_id("lorem-ipsum").unwrap());
        assert!(dispatch(&nothing).unwrap().total_bytes() > 0);
    }
}
