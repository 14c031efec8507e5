use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Component, Path, PathBuf};

use log::warn;

pub fn read_file_content(file_path: &Path) -> io::Result<(Vec<u8>, usize)> {
    let mut file = File::open(file_path)?;
    let mut buffer = Vec::new();
    file.read_to_end(&mut buffer)?;
    let file_size = buffer.len();
    Ok((buffer, file_size))
}

pub fn validate_input_path(input: &Path) -> io::Result<()> {
    if !input.exists() {
        log::error!("輸入路徑不存在：{}", input.display());
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("輸入路徑 '{}' 不存在", input.display()),
        ));
    }
    Ok(())
}

/// 把輸出名稱限制在輸出目錄之內，`a/../b` 之類的片段會被丟棄
pub fn sanitize_relative(name: &str) -> PathBuf {
    let normalized = name.replace('\\', "/");
    let mut clean = PathBuf::new();
    for component in Path::new(&normalized).components() {
        match component {
            Component::Normal(part) => clean.push(part),
            Component::ParentDir => {
                warn!("輸出名稱含有上層目錄，已忽略：{}", name);
            }
            _ => {}
        }
    }
    if clean.as_os_str().is_empty() {
        clean.push("output");
    }
    clean
}

/// 檔案已存在時加上 ` (n)` 避免覆蓋
pub fn unique_output_path(dir: &Path, name: &str) -> PathBuf {
    let candidate = dir.join(sanitize_relative(name));
    if !candidate.exists() {
        return candidate;
    }
    let stem = candidate
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = candidate
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    let parent = candidate.parent().map(Path::to_path_buf).unwrap_or_else(|| dir.to_path_buf());
    (1..)
        .map(|n| parent.join(format!("{} ({}){}", stem, n, ext)))
        .find(|path| !path.exists())
        .unwrap_or(candidate)
}

pub fn write_output(path: &Path, data: &[u8]) -> io::Result<usize> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    file.write_all(data)?;
    Ok(data.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_drops_escapes() {
        assert_eq!(sanitize_relative("../../etc/passwd"), PathBuf::from("etc/passwd"));
        assert_eq!(sanitize_relative("/abs/x.txt"), PathBuf::from("abs/x.txt"));
        assert_eq!(sanitize_relative("docs\\a.txt"), PathBuf::from("docs/a.txt"));
        assert_eq!(sanitize_relative(".."), PathBuf::from("output"));
    }

    #[test]
    fn unique_path_adds_counter() {
        let dir = tempfile::tempdir().unwrap();
        let first = unique_output_path(dir.path(), "a.txt");
        assert_eq!(first, dir.path().join("a.txt"));
        write_output(&first, b"1").unwrap();
        let second = unique_output_path(dir.path(), "a.txt");
        assert_eq!(second, dir.path().join("a (1).txt"));
        write_output(&second, b"2").unwrap();
        assert_eq!(unique_output_path(dir.path(), "a.txt"), dir.path().join("a (2).txt"));
    }

    #[test]
    fn write_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deep/out.bin");
        assert_eq!(write_output(&path, b"abc").unwrap(), 3);
        assert_eq!(read_file_content(&path).unwrap().0, b"abc");
    }
}
