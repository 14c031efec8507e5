use std::fs;
use std::io::{self, Cursor};
use std::path::{Path, PathBuf};

use convert_anything::config::ports::ConfigPort;
use convert_anything::converters::pdf::{page_count, text_to_pdf};
use convert_anything::facade::conversion_facade::ConversionFacade;
use convert_anything::facade::traits::i_conversion::ConversionFacadeTrait;
use convert_anything::models::conversion::{ConversionInput, ConversionOutput};
use convert_anything::models::options::ConversionOptions;
use convert_anything::service::config_service::DefaultConfigAdapter;
use convert_anything::service::file_service::FileService;
use convert_anything::service::output_service::OutputService;
use tempfile::TempDir;

fn facade(config_port: Box<dyn ConfigPort>) -> ConversionFacade {
    ConversionFacade::new(
        config_port,
        Box::new(FileService::new()),
        Box::new(OutputService::new()),
    )
}

fn run(id: &str, inputs: Vec<PathBuf>, text: Option<&str>, out: &Path) -> io::Result<ConversionOutput> {
    let adapter = DefaultConfigAdapter::new(id, inputs, text.map(str::to_string))
        .with_output_dir(out.to_string_lossy().into_owned());
    facade(Box::new(adapter)).run()
}

fn execute(id: &str, inputs: Vec<PathBuf>, options: ConversionOptions, out: &Path) -> io::Result<ConversionOutput> {
    let input = ConversionInput {
        conversion_id: id.to_string(),
        inputs,
        text: None,
        output_dir: out.to_string_lossy().into_owned(),
        options,
        no_progress: true,
    };
    facade(Box::new(DefaultConfigAdapter::new(id, Vec::new(), None))).execute_conversion(input)
}

fn write_file(dir: &TempDir, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, bytes).unwrap();
    path
}

fn single_output(output: &ConversionOutput) -> String {
    assert_eq!(output.written.len(), 1);
    fs::read_to_string(&output.written[0]).unwrap()
}

#[test]
fn csv_file_becomes_pretty_json() {
    let dir = tempfile::tempdir().unwrap();
    let csv = write_file(&dir, "people.csv", b"name,age\nAlice,30\n");
    let out = dir.path().join("out");

    let output = run("csv-to-json", vec![csv], None, &out).unwrap();
    let json: serde_json::Value = serde_json::from_str(&single_output(&output)).unwrap();
    assert_eq!(json, serde_json::json!([{ "name": "Alice", "age": "30" }]));
    assert!(output.written[0].starts_with(&out));
}

#[test]
fn text_input_round_trips_through_base64_and_url_encoding() {
    let dir = tempfile::tempdir().unwrap();
    let encoded = single_output(&run("base64-encode", Vec::new(), Some("hello 世界"), &dir.path().join("b64")).unwrap());
    let decoded = fs::read(
        &run("base64-decode", Vec::new(), Some(&encoded), &dir.path().join("plain")).unwrap().written[0],
    )
    .unwrap();
    assert_eq!(decoded, "hello 世界".as_bytes());

    let url = single_output(&run("url-encode", Vec::new(), Some("a b&c"), &dir.path().join("url")).unwrap());
    assert_eq!(url, "a%20b%26c");
    let back = single_output(&run("url-decode", Vec::new(), Some(&url), &dir.path().join("url-back")).unwrap());
    assert_eq!(back, "a b&c");
}

#[test]
fn json_formatter_pretty_prints_and_rejects_invalid_input() {
    let dir = tempfile::tempdir().unwrap();
    let pretty = single_output(&run("json-formatter", Vec::new(), Some(r#"{"a":1}"#), &dir.path().join("ok")).unwrap());
    assert_eq!(pretty, "{\n  \"a\": 1\n}");

    let bad = dir.path().join("bad");
    let error = run("json-formatter", Vec::new(), Some("{oops"), &bad).unwrap_err();
    assert_eq!(error.kind(), io::ErrorKind::InvalidInput);
    assert!(!bad.exists());
}

#[test]
fn merged_pdf_splits_back_into_single_pages() {
    let dir = tempfile::tempdir().unwrap();
    let first = write_file(&dir, "one.pdf", &text_to_pdf("Page one").unwrap());
    let second = write_file(&dir, "two.pdf", &text_to_pdf("Page two").unwrap());

    let merged = run("merge-pdf", vec![first, second], None, &dir.path().join("merged")).unwrap();
    assert_eq!(merged.written.len(), 1);
    let merged_path = merged.written[0].clone();
    assert_eq!(page_count(&fs::read(&merged_path).unwrap()).unwrap(), 2);

    let split = run("split-pdf", vec![merged_path], None, &dir.path().join("split")).unwrap();
    let names: Vec<String> = split
        .written
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["page-1.pdf", "page-2.pdf"]);
    for path in &split.written {
        assert_eq!(page_count(&fs::read(path).unwrap()).unwrap(), 1);
    }
}

#[test]
fn image_only_pdf_yields_extraction_notice() {
    let dir = tempfile::tempdir().unwrap();
    let mut png = Vec::new();
    image::DynamicImage::ImageRgb8(image::RgbImage::new(8, 8))
        .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
        .unwrap();
    let png_path = write_file(&dir, "dot.png", &png);

    let pdf = run("png-to-pdf", vec![png_path], None, &dir.path().join("pdf")).unwrap();
    let text = single_output(&run("pdf-to-text", pdf.written.clone(), None, &dir.path().join("txt")).unwrap());
    assert!(text.contains("No extractable text"));
    assert!(text.contains("Pages: 1"));
}

#[test]
fn directory_input_is_zipped_and_extracted_with_relative_names() {
    let dir = tempfile::tempdir().unwrap();
    let bundle = dir.path().join("bundle");
    fs::create_dir_all(bundle.join("sub")).unwrap();
    fs::write(bundle.join("a.txt"), "alpha").unwrap();
    fs::write(bundle.join("sub").join("b.txt"), "beta").unwrap();

    let zipped = run("create-zip", vec![bundle], None, &dir.path().join("zip")).unwrap();
    let extracted = run("extract-zip", zipped.written.clone(), None, &dir.path().join("unzipped")).unwrap();
    let root = dir.path().join("unzipped");
    assert_eq!(fs::read_to_string(root.join("bundle").join("a.txt")).unwrap(), "alpha");
    assert_eq!(fs::read_to_string(root.join("bundle").join("sub").join("b.txt")).unwrap(), "beta");
    assert_eq!(extracted.written.len(), 2);
}

#[test]
fn unknown_conversion_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let error = run("png-to-mp3", Vec::new(), Some("x"), dir.path()).unwrap_err();
    assert!(error.to_string().contains("png-to-mp3"));
    assert!(fs::read_dir(dir.path()).unwrap().next().is_none());
}

#[test]
fn missing_required_option_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = write_file(&dir, "doc.pdf", &text_to_pdf("Hello").unwrap());
    let out = dir.path().join("out");

    let error = execute("delete-pdf-pages", vec![pdf.clone()], ConversionOptions::default(), &out).unwrap_err();
    assert!(error.to_string().contains("--pages"));
    assert!(!out.exists());

    let options = ConversionOptions {
        watermark_text: Some("DRAFT".to_string()),
        ..ConversionOptions::default()
    };
    let output = execute("pdf-add-watermark", vec![pdf], options, &out).unwrap();
    assert_eq!(page_count(&fs::read(&output.written[0]).unwrap()).unwrap(), 1);
}

#[test]
fn conversions_without_input_still_produce_output() {
    let dir = tempfile::tempdir().unwrap();
    let output = run("lorem-ipsum", Vec::new(), None, dir.path()).unwrap();
    assert!(single_output(&output).starts_with("Lorem ipsum"));

    let error = run("word-counter", Vec::new(), None, &dir.path().join("empty")).unwrap_err();
    assert_eq!(error.kind(), io::ErrorKind::InvalidInput);
}
