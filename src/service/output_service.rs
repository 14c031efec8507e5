use std::fs;
use std::io;

use log::info;

use crate::models::conversion::ConversionResult;
use crate::models::file::{OutputWriteInput, OutputWriteOutput};
use crate::service::traits::i_service::OutputServiceTrait;
use crate::utils::file::{unique_output_path, write_output};
use crate::utils::naming::{generate_filename, output_filename};
use crate::utils::utils::{create_progress_bar, format_file_size};

pub struct OutputService;

impl OutputService {
    pub fn new() -> Self {
        OutputService
    }
}

impl Default for OutputService {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputServiceTrait for OutputService {
    fn write_outputs(&self, input: OutputWriteInput) -> io::Result<OutputWriteOutput> {
        fs::create_dir_all(&input.output_dir)?;
        let descriptor = input.descriptor;
        let source = input.source_name.as_deref();

        let named: Vec<(String, Vec<u8>)> = match input.result {
            ConversionResult::Single(blob) => {
                vec![(generate_filename(descriptor, source, None), blob.bytes)]
            }
            ConversionResult::Multiple(items) => items
                .into_iter()
                .enumerate()
                .map(|(index, item)| {
                    let name = output_filename(descriptor, source, Some(index), item.name.as_deref());
                    (name, item.blob.bytes)
                })
                .collect(),
        };

        let pm = create_progress_bar(named.len() as u64, input.no_progress);
        let mut written = Vec::with_capacity(named.len());
        let mut total_size = 0;
        for (index, (name, data)) in named.into_iter().enumerate() {
            let path = unique_output_path(&input.output_dir, &name);
            let size = write_output(&path, &data)?;
            info!("輸出檔案：{}，大小：{}", path.display(), format_file_size(size));
            total_size += size;
            written.push(path);
            pm.update(index as u64 + 1, Some(total_size), "寫入中");
        }
        pm.finish(written.len() as u64, total_size);

        Ok(OutputWriteOutput { written, total_size })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::blob::{Blob, NamedBlob};
    use crate::service::registry::get_conversion_by_id;

    #[test]
    fn multiple_outputs_use_indexed_and_known_names() {
        let dir = tempfile::tempdir().unwrap();
        let output = OutputService::new()
            .write_outputs(OutputWriteInput {
                descriptor: get_conversion_by_id("extract-zip").unwrap(),
                result: ConversionResult::Multiple(vec![
                    NamedBlob::named("docs/a.txt", Blob::text("a")),
                    NamedBlob::unnamed(Blob::text("b")),
                ]),
                source_name: Some("bundle.zip".to_string()),
                output_dir: dir.path().to_path_buf(),
                no_progress: true,
            })
            .unwrap();
        assert_eq!(
            output.written,
            vec![dir.path().join("docs/a.txt"), dir.path().join("extracted-2.zip")]
        );
        assert_eq!(output.total_size, 2);
    }

    #[test]
    fn existing_files_are_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let write = || {
            OutputService::new()
                .write_outputs(OutputWriteInput {
                    descriptor: get_conversion_by_id("case-converter-upper").unwrap(),
                    result: Blob::text("HELLO").into(),
                    source_name: None,
                    output_dir: dir.path().to_path_buf(),
                    no_progress: true,
                })
                .unwrap()
        };
        assert_eq!(write().written, vec![dir.path().join("uppercase.txt")]);
        assert_eq!(write().written, vec![dir.path().join("uppercase (1).txt")]);
    }
}
