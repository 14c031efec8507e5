use std::path::Path;

/// 記憶體中的檔案內容與其 MIME 類型
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    pub bytes: Vec<u8>,
    pub mime: String,
}

impl Blob {
    pub fn new(bytes: Vec<u8>, mime: impl Into<String>) -> Self {
        Blob {
            bytes,
            mime: mime.into(),
        }
    }

    pub fn text(content: impl Into<String>) -> Self {
        Blob::new(content.into().into_bytes(), "text/plain")
    }

    pub fn with_mime(content: impl Into<String>, mime: &str) -> Self {
        Blob::new(content.into().into_bytes(), mime)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// 使用者提供的輸入檔案
#[derive(Debug, Clone)]
pub struct InputFile {
    pub name: String,
    pub blob: Blob,
}

impl InputFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let name = name.into();
        let mime = mime_from_name(&name).to_string();
        InputFile {
            name,
            blob: Blob::new(bytes, mime),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.blob.bytes
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.blob.bytes).into_owned()
    }

    pub fn extension(&self) -> Option<String> {
        Path::new(&self.name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
    }
}

/// 多檔輸出的單一項目，name 為來源已知的檔名（例如 ZIP 內的項目）
#[derive(Debug, Clone)]
pub struct NamedBlob {
    pub name: Option<String>,
    pub blob: Blob,
}

impl NamedBlob {
    pub fn unnamed(blob: Blob) -> Self {
        NamedBlob { name: None, blob }
    }

    pub fn named(name: impl Into<String>, blob: Blob) -> Self {
        NamedBlob {
            name: Some(name.into()),
            blob,
        }
    }
}

pub fn mime_from_name(name: &str) -> &'static str {
    let ext = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "gif" => "image/gif",
        "tif" | "tiff" => "image/tiff",
        "ico" => "image/x-icon",
        "pdf" => "application/pdf",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "xls" => "application/vnd.ms-excel",
        "ods" => "application/vnd.oasis.opendocument.spreadsheet",
        "csv" => "text/csv",
        "tsv" => "text/tab-separated-values",
        "json" => "application/json",
        "xml" => "application/xml",
        "yaml" | "yml" => "text/yaml",
        "toml" => "application/toml",
        "html" | "htm" => "text/html",
        "md" | "markdown" => "text/markdown",
        "rtf" => "application/rtf",
        "css" => "text/css",
        "js" => "application/javascript",
        "zip" => "application/zip",
        "gz" => "application/gzip",
        "tar" => "application/x-tar",
        "pem" | "crt" | "cer" => "application/x-pem-file",
        "der" => "application/x-x509-ca-cert",
        "txt" | "ini" => "text/plain",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_file_guesses_mime_from_extension() {
        let file = InputFile::new("photo.JPG", vec![1, 2, 3]);
        assert_eq!(file.blob.mime, "image/jpeg");
        assert_eq!(file.extension().as_deref(), Some("jpg"));
    }

    #[test]
    fn unknown_extension_is_octet_stream() {
        assert_eq!(mime_from_name("archive.xyz"), "application/octet-stream");
        assert_eq!(mime_from_name("README"), "application/octet-stream");
    }
}
