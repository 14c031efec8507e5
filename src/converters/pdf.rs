//! PDF 結構操作：合併、分割、壓縮、旋轉、刪頁、浮水印、裁切與縮放，
//! 以及由圖片或純文字產生 PDF。

use std::collections::BTreeMap;
use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use image::{DynamicImage, GenericImageView, ImageFormat};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};

use crate::converters::document::{html_to_text, markdown_to_html};
use crate::converters::images::decode_image;
use crate::converters::pdf_engine::pdf_engine;
use crate::error::{ConvertError, ConvertResult};
use crate::models::blob::Blob;
use crate::models::conversion::{ConversionRequest, ConversionResult};
use crate::models::blob::NamedBlob;
use crate::models::options::{CompressionLevel, DEFAULT_PDF_ROTATION};

pub const PDF_MIME: &str = "application/pdf";

pub const A4_SIZE: (f64, f64) = (595.0, 842.0);
pub const LETTER_SIZE: (f64, f64) = (612.0, 792.0);
pub const CROP_INSET: f64 = 20.0;

const TEXT_FONT_SIZE: f64 = 12.0;
const TEXT_LEADING: f64 = 14.0;
const TEXT_MARGIN: f64 = 40.0;
const TEXT_LINE_CHARS: usize = 90;
const WATERMARK_FONT_SIZE: f64 = 48.0;
const WATERMARK_GRAY: f64 = 0.75;
const WATERMARK_FONT: &str = "FWatermark";
// 頁面可繼承自上層 Pages 節點的屬性
const INHERITABLE_KEYS: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

pub(crate) fn save_document(document: &mut Document) -> ConvertResult<Vec<u8>> {
    let mut buffer = Vec::new();
    document.save_to(&mut buffer)?;
    Ok(buffer)
}

fn pdf_blob(bytes: Vec<u8>) -> ConversionResult {
    ConversionResult::Single(Blob::new(bytes, PDF_MIME))
}

/// 依輸入順序合併多份 PDF
pub fn merge_pdfs(sources: &[&[u8]]) -> ConvertResult<Vec<u8>> {
    if sources.is_empty() {
        return Err(ConvertError::InvalidInput("請提供至少一個 PDF 檔案".to_string()));
    }

    let mut max_id = 1;
    let mut ordered_pages: Vec<(ObjectId, Dictionary)> = Vec::new();
    let mut objects: BTreeMap<ObjectId, Object> = BTreeMap::new();

    for bytes in sources {
        let mut source = pdf_engine().load(bytes)?;
        source.renumber_objects_with(max_id);
        max_id = source.max_id + 1;

        for (_, page_id) in source.get_pages() {
            ordered_pages.push((page_id, materialize_page(&source, page_id)?));
        }
        objects.extend(source.objects);
    }

    let mut merged = Document::with_version("1.5");
    let mut catalog: Option<(ObjectId, Dictionary)> = None;
    let mut pages_id: Option<ObjectId> = None;

    for (object_id, object) in objects {
        match object.type_name().unwrap_or("") {
            "Catalog" => {
                if catalog.is_none() {
                    catalog = Some((object_id, object.as_dict()?.clone()));
                }
            }
            "Pages" => {
                if pages_id.is_none() {
                    pages_id = Some(object_id);
                }
            }
            "Page" | "Outlines" | "Outline" => {}
            _ => {
                merged.objects.insert(object_id, object);
            }
        }
    }

    let (catalog_id, mut catalog) =
        catalog.ok_or_else(|| ConvertError::Pdf("找不到文件目錄（Catalog）".to_string()))?;
    let pages_id = pages_id.ok_or_else(|| ConvertError::Pdf("找不到頁面樹（Pages）".to_string()))?;

    let mut kids = Vec::with_capacity(ordered_pages.len());
    for (page_id, mut page) in ordered_pages {
        page.set("Parent", pages_id);
        merged.objects.insert(page_id, Object::Dictionary(page));
        kids.push(Object::Reference(page_id));
    }

    let page_count = kids.len() as i64;
    merged.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Count" => Object::Integer(page_count),
            "Kids" => kids,
        }),
    );

    catalog.set("Pages", pages_id);
    catalog.remove(b"Outlines");
    merged.objects.insert(catalog_id, Object::Dictionary(catalog));
    merged.trailer.set("Root", catalog_id);

    merged.max_id = merged.objects.len() as u32;
    merged.renumber_objects();
    merged.adjust_zero_pages();
    merged.compress();

    log::info!("已合併 {} 份 PDF，共 {} 頁", sources.len(), page_count);
    save_document(&mut merged)
}

/// 複製頁面字典並補上從上層繼承的屬性，讓頁面可以移到新的頁面樹下
fn materialize_page(document: &Document, page_id: ObjectId) -> ConvertResult<Dictionary> {
    let mut page = document.get_dictionary(page_id)?.clone();
    for key in INHERITABLE_KEYS {
        if page.has(key) {
            continue;
        }
        if let Some(value) = inherited_attribute(document, page_id, key) {
            page.set(key.to_vec(), value);
        }
    }
    Ok(page)
}

fn inherited_attribute(document: &Document, page_id: ObjectId, key: &[u8]) -> Option<Object> {
    let mut current = document.get_dictionary(page_id).ok()?;
    // 頁面樹深度有限，避免循環參照造成無窮迴圈
    for _ in 0..64 {
        if let Ok(value) = current.get(key) {
            return Some(value.clone());
        }
        let parent = current.get(b"Parent").and_then(Object::as_reference).ok()?;
        current = document.get_dictionary(parent).ok()?;
    }
    None
}

/// 每頁輸出為一份獨立 PDF
pub fn split_pdf(bytes: &[u8]) -> ConvertResult<Vec<Vec<u8>>> {
    let document = pdf_engine().load(bytes)?;
    let total = document.get_pages().len() as u32;
    if total == 0 {
        return Err(ConvertError::Pdf("PDF 沒有任何頁面".to_string()));
    }

    let mut parts = Vec::with_capacity(total as usize);
    for keep in 1..=total {
        let mut part = document.clone();
        let others: Vec<u32> = (1..=total).filter(|page| *page != keep).collect();
        part.delete_pages(&others);
        part.prune_objects();
        part.renumber_objects();
        part.compress();
        parts.push(save_document(&mut part)?);
    }
    log::info!("已分割 PDF 為 {} 份", parts.len());
    Ok(parts)
}

pub fn compress_pdf(bytes: &[u8], level: CompressionLevel) -> ConvertResult<Vec<u8>> {
    let mut document = pdf_engine().load(bytes)?;
    if level != CompressionLevel::Low {
        document.prune_objects();
        document.delete_zero_length_streams();
    }
    if level == CompressionLevel::High {
        document.trailer.remove(b"Info");
        if let Ok(catalog_id) = document.trailer.get(b"Root").and_then(Object::as_reference) {
            if let Ok(catalog) = document.get_dictionary_mut(catalog_id) {
                catalog.remove(b"Metadata");
            }
        }
        for (_, page_id) in document.get_pages() {
            if let Ok(page) = document.get_dictionary_mut(page_id) {
                page.remove(b"Thumb");
            }
        }
        document.prune_objects();
    }
    document.renumber_objects();
    document.compress();
    let output = save_document(&mut document)?;
    log::info!(
        "PDF 壓縮完成（{:?}）：{} → {} 位元組",
        level,
        bytes.len(),
        output.len()
    );
    Ok(output)
}

pub fn rotate_pdf(bytes: &[u8], degrees: i64) -> ConvertResult<Vec<u8>> {
    if degrees % 90 != 0 {
        return Err(ConvertError::InvalidInput(format!(
            "旋轉角度必須是 90 的倍數：{}",
            degrees
        )));
    }
    let angle = degrees.rem_euclid(360);
    let mut document = pdf_engine().load(bytes)?;
    for (_, page_id) in document.get_pages() {
        document.get_dictionary_mut(page_id)?.set("Rotate", Object::Integer(angle));
    }
    save_document(&mut document)
}

/// 刪除指定頁面（頁碼從 1 開始），超出範圍的頁碼會被忽略
pub fn delete_pdf_pages(bytes: &[u8], pages: &[u32]) -> ConvertResult<Vec<u8>> {
    let mut document = pdf_engine().load(bytes)?;
    let total = document.get_pages().len() as u32;
    let (valid, ignored): (Vec<u32>, Vec<u32>) =
        pages.iter().copied().partition(|page| *page >= 1 && *page <= total);
    if !ignored.is_empty() {
        log::warn!("忽略超出範圍的頁碼（共 {} 頁）：{:?}", total, ignored);
    }
    if valid.is_empty() {
        return Err(ConvertError::InvalidInput(format!(
            "沒有可刪除的頁面，文件共 {} 頁",
            total
        )));
    }
    if valid.len() as u32 == total {
        log::warn!("所有頁面都將被刪除，輸出為空白文件");
    }
    document.delete_pages(&valid);
    document.prune_objects();
    document.renumber_objects();
    save_document(&mut document)
}

fn box_values(object: &Object) -> Option<[f64; 4]> {
    let array = object.as_array().ok()?;
    if array.len() != 4 {
        return None;
    }
    let mut values = [0.0; 4];
    for (slot, value) in values.iter_mut().zip(array) {
        *slot = match value {
            Object::Integer(i) => *i as f64,
            Object::Real(r) => *r as f64,
            _ => return None,
        };
    }
    Some(values)
}

fn page_media_box(document: &Document, page_id: ObjectId) -> [f64; 4] {
    inherited_attribute(document, page_id, b"MediaBox")
        .and_then(|object| match object {
            Object::Reference(id) => document.get_object(id).ok().and_then(box_values),
            other => box_values(&other),
        })
        .unwrap_or([0.0, 0.0, A4_SIZE.0, A4_SIZE.1])
}

fn box_object(values: [f64; 4]) -> Object {
    Object::Array(values.iter().map(|v| Object::Real(*v as f32)).collect())
}

/// 在頁面原有內容前後各加一段內容串流
fn wrap_page_content(
    document: &mut Document,
    page_id: ObjectId,
    prefix: Vec<u8>,
    suffix: Vec<u8>,
) -> ConvertResult<()> {
    let prefix_id = document.add_object(Stream::new(dictionary! {}, prefix));
    let suffix_id = document.add_object(Stream::new(dictionary! {}, suffix));

    let page = document.get_dictionary_mut(page_id)?;
    let mut contents = vec![Object::Reference(prefix_id)];
    match page.get(b"Contents") {
        Ok(Object::Reference(id)) => contents.push(Object::Reference(*id)),
        Ok(Object::Array(existing)) => contents.extend(existing.iter().cloned()),
        _ => {}
    }
    contents.push(Object::Reference(suffix_id));
    page.set("Contents", Object::Array(contents));
    Ok(())
}

/// 把字型加入頁面資源；頁面沒有自己的資源字典時先複製繼承來的內容
fn add_page_font(
    document: &mut Document,
    page_id: ObjectId,
    resource_name: &str,
    font_id: ObjectId,
) -> ConvertResult<()> {
    let mut resources = match inherited_attribute(document, page_id, b"Resources") {
        Some(Object::Reference(id)) => document.get_dictionary(id)?.clone(),
        Some(Object::Dictionary(dict)) => dict,
        _ => Dictionary::new(),
    };
    let mut fonts = match resources.get(b"Font") {
        Ok(Object::Reference(id)) => document.get_dictionary(*id)?.clone(),
        Ok(Object::Dictionary(dict)) => dict.clone(),
        _ => Dictionary::new(),
    };
    fonts.set(resource_name, Object::Reference(font_id));
    resources.set("Font", Object::Dictionary(fonts));
    document
        .get_dictionary_mut(page_id)?
        .set("Resources", Object::Dictionary(resources));
    Ok(())
}

fn helvetica(document: &mut Document) -> ObjectId {
    document.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    })
}

/// 在每頁中央加上 45 度灰色文字
pub fn add_watermark(bytes: &[u8], text: &str) -> ConvertResult<Vec<u8>> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ConvertError::InvalidInput("請輸入浮水印文字".to_string()));
    }
    let mut document = pdf_engine().load(bytes)?;
    let font_id = helvetica(&mut document);
    let (cos, sin) = (std::f64::consts::FRAC_1_SQRT_2, std::f64::consts::FRAC_1_SQRT_2);
    let text_width = text.chars().count() as f64 * WATERMARK_FONT_SIZE * 0.5;

    for (_, page_id) in document.get_pages() {
        let [x0, y0, x1, y1] = page_media_box(&document, page_id);
        let center_x = (x0 + x1) / 2.0;
        let center_y = (y0 + y1) / 2.0;
        let start_x = center_x - cos * text_width / 2.0;
        let start_y = center_y - sin * text_width / 2.0;

        let stamp = Content {
            operations: vec![
                Operation::new("Q", vec![]),
                Operation::new("q", vec![]),
                Operation::new("g", vec![Object::Real(WATERMARK_GRAY as f32)]),
                Operation::new("BT", vec![]),
                Operation::new(
                    "Tf",
                    vec![
                        Object::Name(WATERMARK_FONT.as_bytes().to_vec()),
                        Object::Real(WATERMARK_FONT_SIZE as f32),
                    ],
                ),
                Operation::new(
                    "Tm",
                    vec![
                        Object::Real(cos as f32),
                        Object::Real(sin as f32),
                        Object::Real(-sin as f32),
                        Object::Real(cos as f32),
                        Object::Real(start_x as f32),
                        Object::Real(start_y as f32),
                    ],
                ),
                Operation::new("Tj", vec![pdf_text_object(text)]),
                Operation::new("ET", vec![]),
                Operation::new("Q", vec![]),
            ],
        };
        add_page_font(&mut document, page_id, WATERMARK_FONT, font_id)?;
        wrap_page_content(&mut document, page_id, b"q\n".to_vec(), stamp.encode()?)?;
    }
    document.compress();
    save_document(&mut document)
}

/// 每頁四邊各內縮 `CROP_INSET` 點
pub fn crop_pdf(bytes: &[u8], inset: f64) -> ConvertResult<Vec<u8>> {
    let mut document = pdf_engine().load(bytes)?;
    for (page_number, page_id) in document.get_pages() {
        let [x0, y0, x1, y1] = page_media_box(&document, page_id);
        if x1 - x0 <= inset * 2.0 || y1 - y0 <= inset * 2.0 {
            log::warn!("第 {} 頁太小，略過裁切", page_number);
            continue;
        }
        let crop = [x0 + inset, y0 + inset, x1 - inset, y1 - inset];
        document.get_dictionary_mut(page_id)?.set("CropBox", box_object(crop));
    }
    save_document(&mut document)
}

/// 將每頁內容等比例縮放並置中到指定尺寸（單位：點）
pub fn resize_pdf(bytes: &[u8], width: f64, height: f64) -> ConvertResult<Vec<u8>> {
    if width <= 0.0 || height <= 0.0 {
        return Err(ConvertError::InvalidInput("頁面尺寸必須大於 0".to_string()));
    }
    let mut document = pdf_engine().load(bytes)?;
    for (_, page_id) in document.get_pages() {
        let [x0, y0, x1, y1] = page_media_box(&document, page_id);
        let (source_width, source_height) = (x1 - x0, y1 - y0);
        if source_width <= 0.0 || source_height <= 0.0 {
            continue;
        }
        let scale = (width / source_width).min(height / source_height);
        let tx = (width - source_width * scale) / 2.0 - x0 * scale;
        let ty = (height - source_height * scale) / 2.0 - y0 * scale;
        let prefix = format!("q {:.4} 0 0 {:.4} {:.4} {:.4} cm\n", scale, scale, tx, ty);

        wrap_page_content(&mut document, page_id, prefix.into_bytes(), b"\nQ".to_vec())?;
        let page = document.get_dictionary_mut(page_id)?;
        page.set("MediaBox", box_object([0.0, 0.0, width, height]));
        page.remove(b"CropBox");
    }
    save_document(&mut document)
}

/// 以 WinAnsi 編碼輸出，無法表示的字元以 `?` 代替
fn pdf_text_object(text: &str) -> Object {
    let bytes: Vec<u8> = text
        .chars()
        .map(|c| if (c as u32) < 256 { c as u8 } else { b'?' })
        .collect();
    Object::String(bytes, StringFormat::Literal)
}

fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for raw_line in text.replace("\r\n", "\n").replace('\t', "    ").split('\n') {
        let mut current = String::new();
        for word in raw_line.split(' ') {
            let mut word = word.to_string();
            while word.chars().count() > width {
                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                }
                let head: String = word.chars().take(width).collect();
                word = word.chars().skip(width).collect();
                lines.push(head);
            }
            let needed = current.chars().count() + word.chars().count() + usize::from(!current.is_empty());
            if needed > width && !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(&word);
        }
        lines.push(current);
    }
    lines
}

/// 產生 A4、Helvetica 12pt 的純文字 PDF，自動換行與分頁
pub fn text_to_pdf(text: &str) -> ConvertResult<Vec<u8>> {
    let lines = wrap_text(text, TEXT_LINE_CHARS);
    let lines_per_page = ((A4_SIZE.1 - TEXT_MARGIN * 2.0) / TEXT_LEADING).floor().max(1.0) as usize;

    let mut document = Document::with_version("1.5");
    let pages_id = document.new_object_id();
    let font_id = helvetica(&mut document);
    let resources_id = document.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids = Vec::new();
    let chunks: Vec<&[String]> = if lines.is_empty() {
        vec![&[]]
    } else {
        lines.chunks(lines_per_page).collect()
    };
    for chunk in chunks {
        let mut operations = vec![
            Operation::new("BT", vec![]),
            Operation::new(
                "Tf",
                vec![Object::Name(b"F1".to_vec()), Object::Real(TEXT_FONT_SIZE as f32)],
            ),
            Operation::new("TL", vec![Object::Real(TEXT_LEADING as f32)]),
            Operation::new(
                "Td",
                vec![
                    Object::Real(TEXT_MARGIN as f32),
                    Object::Real((A4_SIZE.1 - TEXT_MARGIN) as f32),
                ],
            ),
        ];
        for line in chunk {
            operations.push(Operation::new("Tj", vec![pdf_text_object(line)]));
            operations.push(Operation::new("T*", vec![]));
        }
        operations.push(Operation::new("ET", vec![]));

        let content = Content { operations };
        let content_id = document.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id = document.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    document.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => Object::Integer(count),
            "Resources" => resources_id,
            "MediaBox" => box_object([0.0, 0.0, A4_SIZE.0, A4_SIZE.1]),
        }),
    );
    let catalog_id = document.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    document.trailer.set("Root", catalog_id);
    document.compress();
    save_document(&mut document)
}

fn image_xobject(bytes: &[u8], image: &DynamicImage) -> ConvertResult<Stream> {
    let (width, height) = image.dimensions();
    let is_jpeg = image::guess_format(bytes).ok() == Some(ImageFormat::Jpeg);
    let color = image.color();

    if is_jpeg && matches!(color, image::ColorType::Rgb8 | image::ColorType::L8) {
        let color_space = if color == image::ColorType::L8 { "DeviceGray" } else { "DeviceRGB" };
        let mut stream = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => Object::Integer(width as i64),
                "Height" => Object::Integer(height as i64),
                "ColorSpace" => color_space,
                "BitsPerComponent" => Object::Integer(8),
                "Filter" => "DCTDecode",
            },
            bytes.to_vec(),
        );
        stream.allows_compression = false;
        return Ok(stream);
    }

    let rgb = image.to_rgb8();
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(rgb.as_raw())?;
    let compressed = encoder.finish()?;
    let mut stream = Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => Object::Integer(width as i64),
            "Height" => Object::Integer(height as i64),
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => Object::Integer(8),
            "Filter" => "FlateDecode",
        },
        compressed,
    );
    stream.allows_compression = false;
    Ok(stream)
}

/// 每張圖片一頁，頁面尺寸等於圖片像素尺寸
pub fn images_to_pdf(images: &[&[u8]]) -> ConvertResult<Vec<u8>> {
    if images.is_empty() {
        return Err(ConvertError::InvalidInput("請提供至少一張圖片".to_string()));
    }
    let mut document = Document::with_version("1.5");
    let pages_id = document.new_object_id();
    let mut kids = Vec::with_capacity(images.len());

    for bytes in images {
        let image = decode_image(bytes)?;
        let (width, height) = image.dimensions();
        let image_id = document.add_object(image_xobject(bytes, &image)?);
        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        Object::Integer(width as i64),
                        Object::Integer(0),
                        Object::Integer(0),
                        Object::Integer(height as i64),
                        Object::Integer(0),
                        Object::Integer(0),
                    ],
                ),
                Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
                Operation::new("Q", vec![]),
            ],
        };
        let content_id = document.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id = document.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => box_object([0.0, 0.0, width as f64, height as f64]),
            "Contents" => content_id,
            "Resources" => dictionary! {
                "XObject" => dictionary! { "Im0" => image_id },
            },
        });
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    document.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => Object::Integer(count),
        }),
    );
    let catalog_id = document.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    document.trailer.set("Root", catalog_id);
    save_document(&mut document)
}

pub fn page_count(bytes: &[u8]) -> ConvertResult<usize> {
    Ok(pdf_engine().load(bytes)?.get_pages().len())
}

pub fn handle_merge(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    let sources: Vec<&[u8]> = request.files.iter().map(|f| f.bytes()).collect();
    Ok(pdf_blob(merge_pdfs(&sources)?))
}

pub fn handle_split(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    let parts = split_pdf(request.first_file()?.bytes())?;
    Ok(ConversionResult::Multiple(
        parts
            .into_iter()
            .map(|bytes| NamedBlob::unnamed(Blob::new(bytes, PDF_MIME)))
            .collect(),
    ))
}

pub fn handle_compress(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    let level = request.options.compression_level.unwrap_or_default();
    Ok(pdf_blob(compress_pdf(request.first_file()?.bytes(), level)?))
}

pub fn handle_rotate(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    let degrees = request.options.degrees.unwrap_or(DEFAULT_PDF_ROTATION);
    Ok(pdf_blob(rotate_pdf(request.first_file()?.bytes(), degrees)?))
}

pub fn handle_delete_pages(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    let pages = request.options.pages_to_delete.clone().unwrap_or_default();
    Ok(pdf_blob(delete_pdf_pages(request.first_file()?.bytes(), &pages)?))
}

pub fn handle_watermark(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    let text = request.options.watermark_text.clone().unwrap_or_default();
    Ok(pdf_blob(add_watermark(request.first_file()?.bytes(), &text)?))
}

pub fn handle_crop(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    Ok(pdf_blob(crop_pdf(request.first_file()?.bytes(), CROP_INSET)?))
}

pub fn handle_resize(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    let width = request.options.width.unwrap_or(A4_SIZE.0 as u32) as f64;
    let height = request.options.height.unwrap_or(A4_SIZE.1 as u32) as f64;
    Ok(pdf_blob(resize_pdf(request.first_file()?.bytes(), width, height)?))
}

pub fn handle_a4_to_letter(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    Ok(pdf_blob(resize_pdf(request.first_file()?.bytes(), LETTER_SIZE.0, LETTER_SIZE.1)?))
}

pub fn handle_letter_to_a4(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    Ok(pdf_blob(resize_pdf(request.first_file()?.bytes(), A4_SIZE.0, A4_SIZE.1)?))
}

pub fn handle_images_to_pdf(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    let images: Vec<&[u8]> = request.files.iter().map(|f| f.bytes()).collect();
    Ok(pdf_blob(images_to_pdf(&images)?))
}

pub fn handle_image_to_pdf(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    Ok(pdf_blob(images_to_pdf(&[request.first_file()?.bytes()])?))
}

pub fn handle_text_to_pdf(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    Ok(pdf_blob(text_to_pdf(&request.text_content()?)?))
}

pub fn handle_html_to_pdf(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    let text = html_to_text(&request.text_content()?);
    Ok(pdf_blob(text_to_pdf(&text)?))
}

pub fn handle_markdown_to_pdf(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    let html = markdown_to_html(&request.text_content()?);
    Ok(pdf_blob(text_to_pdf(&html_to_text(&html))?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converters::pdf_text::extract_text_from_pdf;

    fn single_page(text: &str) -> Vec<u8> {
        text_to_pdf(text).expect("text pdf")
    }

    #[test]
    fn text_pdf_round_trips_through_extraction() {
        let pdf = single_page("Hello World");
        let text = extract_text_from_pdf("hello.pdf", &pdf);
        assert!(text.contains("--- Page 1 ---"), "missing page marker: {text}");
        assert!(text.contains("Hello World"), "missing text: {text}");
    }

    #[test]
    fn merge_keeps_input_order() {
        let first = single_page("Alpha page");
        let second = single_page("Bravo page");
        let third = single_page("Charlie page");
        let merged = merge_pdfs(&[&first, &second, &third]).expect("merge");
        assert_eq!(page_count(&merged).expect("count"), 3);

        let text = extract_text_from_pdf("merged.pdf", &merged);
        let alpha = text.find("Alpha").expect("alpha");
        let bravo = text.find("Bravo").expect("bravo");
        let charlie = text.find("Charlie").expect("charlie");
        assert!(alpha < bravo && bravo < charlie, "wrong order: {text}");
    }

    #[test]
    fn split_produces_one_document_per_page() {
        let merged = merge_pdfs(&[&single_page("One"), &single_page("Two")]).expect("merge");
        let parts = split_pdf(&merged).expect("split");
        assert_eq!(parts.len(), 2);
        for (part, expected) in parts.iter().zip(["One", "Two"]) {
            assert_eq!(page_count(part).expect("count"), 1);
            assert!(extract_text_from_pdf("part.pdf", part).contains(expected));
        }
    }

    #[test]
    fn delete_pages_is_one_based() {
        let merged = merge_pdfs(&[&single_page("Keep"), &single_page("Drop"), &single_page("Also")])
            .expect("merge");
        let edited = delete_pdf_pages(&merged, &[2, 9]).expect("delete");
        assert_eq!(page_count(&edited).expect("count"), 2);
        let text = extract_text_from_pdf("edited.pdf", &edited);
        assert!(!text.contains("Drop"));
        assert!(text.contains("Also"));
    }

    #[test]
    fn rotate_rejects_odd_angles_and_sets_rotation() {
        let pdf = single_page("Turn");
        assert!(rotate_pdf(&pdf, 45).is_err());
        let rotated = rotate_pdf(&pdf, -90).expect("rotate");
        let document = Document::load_mem(&rotated).expect("load");
        let (_, page_id) = document.get_pages().into_iter().next().expect("page");
        let rotate = document
            .get_dictionary(page_id)
            .and_then(|page| page.get(b"Rotate"))
            .and_then(Object::as_i64)
            .expect("rotate entry");
        assert_eq!(rotate, 270);
    }

    #[test]
    fn watermark_text_becomes_extractable() {
        let marked = add_watermark(&single_page("Body"), "DRAFT").expect("watermark");
        let text = extract_text_from_pdf("marked.pdf", &marked);
        assert!(text.contains("DRAFT"), "{text}");
        assert!(text.contains("Body"), "{text}");
    }

    #[test]
    fn resize_sets_letter_media_box() {
        let resized = resize_pdf(&single_page("Size"), LETTER_SIZE.0, LETTER_SIZE.1).expect("resize");
        let document = Document::load_mem(&resized).expect("load");
        let (_, page_id) = document.get_pages().into_iter().next().expect("page");
        assert_eq!(page_media_box(&document, page_id), [0.0, 0.0, 612.0, 792.0]);
    }

    #[test]
    fn long_lines_wrap_and_paginate() {
        let text = "word ".repeat(5000);
        let pdf = text_to_pdf(&text).expect("pdf");
        assert!(page_count(&pdf).expect("count") > 1);
    }

    #[test]
    fn wrap_text_breaks_long_words() {
        let lines = wrap_text(&"x".repeat(25), 10);
        assert_eq!(lines, vec!["x".repeat(10), "x".repeat(10), "x".repeat(5)]);
    }
}
