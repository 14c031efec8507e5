use std::io::{Cursor, Read, Write};
use std::path::{Component, Path};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use log::{info, warn};
use zip::write::{FileOptions, ZipWriter};
use zip::{AesMode, CompressionMethod, ZipArchive};

use crate::error::{ConvertError, ConvertResult};
use crate::models::blob::{mime_from_name, Blob, InputFile, NamedBlob};
use crate::models::conversion::{ConversionRequest, ConversionResult};

pub const ZIP_MIME: &str = "application/zip";
pub const GZIP_MIME: &str = "application/gzip";
pub const TAR_MIME: &str = "application/x-tar";
const TAR_FILE_MODE: u32 = 0o644;

/// 只接受由一般路徑片段組成的相對路徑，統一以 `/` 分隔
pub fn safe_entry_name(path: &Path) -> Option<String> {
    let mut parts = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::CurDir => {}
            _ => return None,
        }
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

fn entry_options(password: Option<&str>) -> FileOptions<'_, ()> {
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
    match password {
        Some(pwd) => options.with_aes_encryption(AesMode::Aes256, pwd),
        None => options,
    }
}

/// 每個輸入成為一個項目，項目名稱沿用輸入的相對路徑；有密碼時使用 AES-256
pub fn create_zip(files: &[InputFile], password: Option<&str>) -> ConvertResult<Vec<u8>> {
    let mut buffer = Vec::new();
    let mut zip = ZipWriter::new(Cursor::new(&mut buffer));
    for file in files {
        let name = safe_entry_name(Path::new(&file.name))
            .ok_or_else(|| ConvertError::InvalidInput(format!("無效的項目名稱：{}", file.name)))?;
        zip.start_file(name, entry_options(password))?;
        zip.write_all(file.bytes())?;
    }
    zip.finish()?;
    match password {
        Some(_) => info!("生成加密 ZIP，共 {} 個項目，大小：{} 位元組", files.len(), buffer.len()),
        None => info!("生成 ZIP，共 {} 個項目，大小：{} 位元組", files.len(), buffer.len()),
    }
    Ok(buffer)
}

/// 解出所有檔案項目，略過目錄與不安全的路徑
pub fn extract_zip(bytes: &[u8], password: Option<&str>) -> ConvertResult<Vec<NamedBlob>> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let mut entries = Vec::new();
    for index in 0..archive.len() {
        let mut entry = match password {
            Some(pwd) => archive.by_index_decrypt(index, pwd.as_bytes())?,
            None => archive.by_index(index)?,
        };
        if entry.is_dir() {
            continue;
        }
        let Some(name) = entry.enclosed_name().as_deref().and_then(safe_entry_name) else {
            warn!("略過不安全的 ZIP 項目：{}", entry.name());
            continue;
        };
        let mut data = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut data)?;
        let mime = mime_from_name(&name);
        entries.push(NamedBlob::named(name, Blob::new(data, mime)));
    }
    info!("已解壓縮 {} 個檔案", entries.len());
    Ok(entries)
}

pub fn gzip_compress(bytes: &[u8]) -> ConvertResult<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes)?;
    Ok(encoder.finish()?)
}

pub fn gzip_decompress(bytes: &[u8]) -> ConvertResult<Vec<u8>> {
    let mut decoder = GzDecoder::new(bytes);
    let mut output = Vec::new();
    decoder
        .read_to_end(&mut output)
        .map_err(|e| ConvertError::InvalidInput(format!("無效的 gzip 資料：{}", e)))?;
    Ok(output)
}

pub fn create_tar(files: &[InputFile]) -> ConvertResult<Vec<u8>> {
    let mtime = chrono::Utc::now().timestamp().max(0) as u64;
    let mut builder = tar::Builder::new(Vec::new());
    for file in files {
        let name = safe_entry_name(Path::new(&file.name))
            .ok_or_else(|| ConvertError::InvalidInput(format!("無效的項目名稱：{}", file.name)))?;
        let mut header = tar::Header::new_gnu();
        header.set_size(file.bytes().len() as u64);
        header.set_mode(TAR_FILE_MODE);
        header.set_mtime(mtime);
        header.set_cksum();
        builder.append_data(&mut header, &name, file.bytes())?;
    }
    let buffer = builder.into_inner()?;
    info!("生成 TAR，共 {} 個項目，大小：{} 位元組", files.len(), buffer.len());
    Ok(buffer)
}

pub fn extract_tar(bytes: &[u8]) -> ConvertResult<Vec<NamedBlob>> {
    let mut archive = tar::Archive::new(Cursor::new(bytes));
    let mut entries = Vec::new();
    for entry in archive.entries()? {
        let mut entry = entry?;
        if !entry.header().entry_type().is_file() {
            continue;
        }
        let path = entry.path()?.into_owned();
        let Some(name) = safe_entry_name(&path) else {
            warn!("略過不安全的 TAR 項目：{}", path.display());
            continue;
        };
        let mut data = Vec::new();
        entry.read_to_end(&mut data)?;
        let mime = mime_from_name(&name);
        entries.push(NamedBlob::named(name, Blob::new(data, mime)));
    }
    info!("已解開 {} 個檔案", entries.len());
    Ok(entries)
}

fn require_files(request: &ConversionRequest) -> ConvertResult<&[InputFile]> {
    if request.files.is_empty() {
        return Err(ConvertError::InvalidInput("請提供至少一個輸入檔案".to_string()));
    }
    Ok(&request.files)
}

pub fn handle_create_zip(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    let files = require_files(request)?;
    let password = request.options.password.as_deref().filter(|p| !p.is_empty());
    Ok(Blob::new(create_zip(files, password)?, ZIP_MIME).into())
}

pub fn handle_extract_zip(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    let password = request.options.password.as_deref().filter(|p| !p.is_empty());
    Ok(ConversionResult::Multiple(extract_zip(request.first_file()?.bytes(), password)?))
}

pub fn handle_gzip_compress(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    Ok(Blob::new(gzip_compress(request.first_file()?.bytes())?, GZIP_MIME).into())
}

pub fn handle_gzip_decompress(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    let file = request.first_file()?;
    let inner_name = file.name.strip_suffix(".gz").unwrap_or(&file.name);
    Ok(Blob::new(gzip_decompress(file.bytes())?, mime_from_name(inner_name)).into())
}

pub fn handle_create_tar(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    Ok(Blob::new(create_tar(require_files(request)?)?, TAR_MIME).into())
}

pub fn handle_extract_tar(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    Ok(ConversionResult::Multiple(extract_tar(request.first_file()?.bytes())?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs() -> Vec<InputFile> {
        vec![
            InputFile::new("a.txt", b"alpha".to_vec()),
            InputFile::new("docs/b.json", b"{\"b\":1}".to_vec()),
        ]
    }

    #[test]
    fn zip_round_trip_keeps_relative_names() {
        let archive = create_zip(&inputs(), None).unwrap();
        let entries = extract_zip(&archive, None).unwrap();
        let names: Vec<_> = entries.iter().filter_map(|e| e.name.as_deref()).collect();
        assert_eq!(names, vec!["a.txt", "docs/b.json"]);
        assert_eq!(entries[0].blob.bytes, b"alpha");
        assert_eq!(entries[1].blob.mime, "application/json");
    }

    #[test]
    fn encrypted_zip_needs_the_password() {
        let archive = create_zip(&inputs(), Some("s3cret")).unwrap();
        assert!(extract_zip(&archive, None).is_err());
        assert!(extract_zip(&archive, Some("wrong")).is_err());
        let entries = extract_zip(&archive, Some("s3cret")).unwrap();
        assert_eq!(entries[0].blob.bytes, b"alpha");
    }

    #[test]
    fn gzip_round_trip() {
        let data = b"hello hello hello hello".repeat(20);
        let packed = gzip_compress(&data).unwrap();
        assert!(packed.len() < data.len());
        assert_eq!(gzip_decompress(&packed).unwrap(), data);
        assert!(gzip_decompress(b"plain").is_err());
    }

    #[test]
    fn tar_round_trip() {
        let archive = create_tar(&inputs()).unwrap();
        let entries = extract_tar(&archive).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].name.as_deref(), Some("docs/b.json"));
        assert_eq!(entries[1].blob.bytes, b"{\"b\":1}");
    }

    #[test]
    fn unsafe_names_are_rejected() {
        assert_eq!(safe_entry_name(Path::new("../etc/passwd")), None);
        assert_eq!(safe_entry_name(Path::new("/abs")), None);
        assert_eq!(safe_entry_name(Path::new("./x/y.txt")).as_deref(), Some("x/y.txt"));
    }
}
