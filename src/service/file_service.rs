use std::io;
use std::path::Path;

use log::{debug, info, warn};
use pathdiff::diff_paths;
use walkdir::WalkDir;

use crate::models::blob::InputFile;
use crate::models::file::{FileCollectInput, FileCollectOutput};
use crate::service::traits::i_service::FileServiceTrait;
use crate::utils::file::{read_file_content, validate_input_path};
use crate::utils::utils::{create_progress_bar, format_file_size};

pub struct FileService;

impl FileService {
    pub fn new() -> Self {
        FileService
    }
}

impl Default for FileService {
    fn default() -> Self {
        Self::new()
    }
}

/// 目錄內的檔案以相對於目錄上一層的路徑命名，保留目錄名稱本身
fn relative_name(file_path: &Path, root: &Path) -> String {
    let base = root.parent().unwrap_or(root);
    diff_paths(file_path, base)
        .map(|p| p.to_string_lossy().replace('\\', "/").trim_start_matches("./").to_string())
        .unwrap_or_else(|| file_path.to_string_lossy().into_owned())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

impl FileServiceTrait for FileService {
    fn collect_files(&self, input: FileCollectInput) -> io::Result<FileCollectOutput> {
        let mut entries = Vec::new();
        for path in &input.inputs {
            validate_input_path(path)?;
            if path.is_dir() {
                let mut found = 0;
                for entry in WalkDir::new(path).sort_by_file_name() {
                    let entry = entry.map_err(|e| {
                        io::Error::new(io::ErrorKind::Other, format!("讀取目錄失敗: {}", e))
                    })?;
                    if entry.file_type().is_file() {
                        entries.push((entry.path().to_path_buf(), relative_name(entry.path(), path)));
                        found += 1;
                    }
                }
                if found == 0 {
                    warn!("目錄 {} 內沒有檔案", path.display());
                }
            } else {
                entries.push((path.clone(), file_name(path)));
            }
        }

        let pm = create_progress_bar(entries.len() as u64, input.no_progress);
        let mut files = Vec::with_capacity(entries.len());
        let mut total_size = 0;
        for (index, (path, name)) in entries.into_iter().enumerate() {
            let (data, size) = read_file_content(&path)?;
            debug!("讀取輸入：{}（{}）", name, format_file_size(size));
            total_size += size;
            files.push(InputFile::new(name, data));
            pm.update(index as u64 + 1, Some(total_size), "讀取中");
        }
        pm.finish(files.len() as u64, total_size);

        info!("已讀取 {} 個輸入檔案，總大小：{}", files.len(), format_file_size(total_size));
        Ok(FileCollectOutput { files, total_size })
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn directories_keep_relative_names() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("bundle");
        fs::create_dir_all(root.join("sub")).unwrap();
        fs::write(root.join("a.txt"), "alpha").unwrap();
        fs::write(root.join("sub/b.txt"), "beta").unwrap();
        let single = dir.path().join("c.csv");
        fs::write(&single, "x,y").unwrap();

        let output = FileService::new()
            .collect_files(FileCollectInput {
                inputs: vec![root, single],
                no_progress: true,
            })
            .unwrap();
        let names: Vec<_> = output.files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["bundle/a.txt", "bundle/sub/b.txt", "c.csv"]);
        assert_eq!(output.total_size, 12);
    }

    #[test]
    fn missing_input_is_not_found() {
        let error = FileService::new()
            .collect_files(FileCollectInput {
                inputs: vec!["/definitely/not/here.txt".into()],
                no_progress: true,
            })
            .unwrap_err();
        assert_eq!(error.kind(), io::ErrorKind::NotFound);
    }
}
