use std::io::{Cursor, Write};

use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use serde_json::{Map, Number, Value};
use zip::write::{FileOptions, ZipWriter};
use zip::CompressionMethod;

use crate::converters::data::{
    csv_to_records, json_to_table, rows_to_html_table, write_csv, CSV_MIME, JSON_MIME,
};
use crate::error::{ConvertError, ConvertResult};
use crate::models::blob::Blob;
use crate::models::conversion::{ConversionRequest, ConversionResult};

pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const SHEET_NAME: &str = "Sheet1";

/// 寫入試算表的儲存格
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
    Bool(bool),
    Empty,
}

/// 讀取活頁簿（xlsx / xls / ods）的第一個工作表
pub fn read_first_sheet(bytes: &[u8]) -> ConvertResult<Range<Data>> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;
    let first = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| ConvertError::Spreadsheet("活頁簿沒有任何工作表".to_string()))?;
    log::info!("讀取工作表：{}", first);
    Ok(workbook.worksheet_range(&first)?)
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}

fn cell_json(cell: &Data) -> Option<Value> {
    match cell {
        Data::Empty => None,
        Data::Int(i) => Some(Value::from(*i)),
        Data::Float(f) => Some(Number::from_f64(*f).map(Value::Number).unwrap_or(Value::Null)),
        Data::Bool(b) => Some(Value::Bool(*b)),
        Data::String(s) => Some(Value::String(s.clone())),
        other => Some(Value::String(other.to_string())),
    }
}

pub fn sheet_to_csv(range: &Range<Data>) -> ConvertResult<String> {
    let mut rows = range.rows().map(|row| row.iter().map(cell_text).collect::<Vec<_>>());
    let headers = rows.next().unwrap_or_default();
    let body: Vec<Vec<String>> = rows.collect();
    write_csv(&headers, &body, b',')
}

/// 第一列為標題，空白儲存格不輸出該鍵
pub fn sheet_to_json(range: &Range<Data>) -> Value {
    let mut rows = range.rows();
    let headers: Vec<String> = rows
        .next()
        .map(|row| row.iter().map(cell_text).collect())
        .unwrap_or_default();

    Value::Array(
        rows.filter(|row| row.iter().any(|c| !matches!(c, Data::Empty)))
            .map(|row| {
                let object: Map<String, Value> = headers
                    .iter()
                    .zip(row)
                    .filter_map(|(key, cell)| cell_json(cell).map(|v| (key.clone(), v)))
                    .collect();
                Value::Object(object)
            })
            .collect(),
    )
}

pub fn sheet_to_html(range: &Range<Data>) -> String {
    let json = sheet_to_json(range);
    let rows: Vec<&Map<String, Value>> = json
        .as_array()
        .map(|items| items.iter().filter_map(Value::as_object).collect())
        .unwrap_or_default();
    let headers: Vec<String> = rows.first().map(|r| r.keys().cloned().collect()).unwrap_or_default();
    let body: Vec<Vec<String>> = rows
        .iter()
        .map(|row| row.values().map(crate::converters::data::value_to_plain).collect())
        .collect();
    rows_to_html_table(&headers, &body)
}

/// 欄位索引轉為 A、B、…、Z、AA
pub fn column_letter(mut index: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push((b'A' + (index % 26) as u8) as char);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    letters.iter().rev().collect()
}

fn xml_text(value: &str) -> String {
    quick_xml::escape::escape(value).into_owned()
}

fn sheet_xml(rows: &[Vec<Cell>]) -> String {
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n<worksheet xmlns=\"http://schemas.openxmlformats.org/spreadsheetml/2006/main\"><sheetData>",
    );
    for (r, row) in rows.iter().enumerate() {
        xml.push_str(&format!("<row r=\"{}\">", r + 1));
        for (c, cell) in row.iter().enumerate() {
            let reference = format!("{}{}", column_letter(c), r + 1);
            match cell {
                Cell::Text(text) => xml.push_str(&format!(
                    "<c r=\"{}\" t=\"inlineStr\"><is><t xml:space=\"preserve\">{}</t></is></c>",
                    reference,
                    xml_text(text)
                )),
                Cell::Number(n) => xml.push_str(&format!("<c r=\"{}\"><v>{}</v></c>", reference, n)),
                Cell::Bool(b) => xml.push_str(&format!(
                    "<c r=\"{}\" t=\"b\"><v>{}</v></c>",
                    reference,
                    u8::from(*b)
                )),
                Cell::Empty => {}
            }
        }
        xml.push_str("</row>");
    }
    xml.push_str("</sheetData></worksheet>");
    xml
}

/// 以最小的 SpreadsheetML 套件寫出單一工作表的 xlsx
pub fn write_xlsx(rows: &[Vec<Cell>]) -> ConvertResult<Vec<u8>> {
    let parts: [(&str, String); 5] = [
        (
            "[Content_Types].xml",
            concat!(
                "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n",
                "<Types xmlns=\"http://schemas.openxmlformats.org/package/2006/content-types\">",
                "<Default Extension=\"rels\" ContentType=\"application/vnd.openxmlformats-package.relationships+xml\"/>",
                "<Default Extension=\"xml\" ContentType=\"application/xml\"/>",
                "<Override PartName=\"/xl/workbook.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml\"/>",
                "<Override PartName=\"/xl/worksheets/sheet1.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml\"/>",
                "</Types>"
            )
            .to_string(),
        ),
        (
            "_rels/.rels",
            concat!(
                "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n",
                "<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">",
                "<Relationship Id=\"rId1\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument\" Target=\"xl/workbook.xml\"/>",
                "</Relationships>"
            )
            .to_string(),
        ),
        (
            "xl/workbook.xml",
            format!(
                concat!(
                    "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n",
                    "<workbook xmlns=\"http://schemas.openxmlformats.org/spreadsheetml/2006/main\" ",
                    "xmlns:r=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships\">",
                    "<sheets><sheet name=\"{}\" sheetId=\"1\" r:id=\"rId1\"/></sheets></workbook>"
                ),
                SHEET_NAME
            ),
        ),
        (
            "xl/_rels/workbook.xml.rels",
            concat!(
                "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n",
                "<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">",
                "<Relationship Id=\"rId1\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet\" Target=\"worksheets/sheet1.xml\"/>",
                "</Relationships>"
            )
            .to_string(),
        ),
        ("xl/worksheets/sheet1.xml", sheet_xml(rows)),
    ];

    let mut buffer = Vec::new();
    let mut zip = ZipWriter::new(Cursor::new(&mut buffer));
    let options: FileOptions<()> = FileOptions::default().compression_method(CompressionMethod::Deflated);
    for (name, content) in &parts {
        zip.start_file(*name, options)?;
        zip.write_all(content.as_bytes())?;
    }
    zip.finish()?;
    log::info!("已產生 xlsx，共 {} 列，大小：{} 位元組", rows.len(), buffer.len());
    Ok(buffer)
}

fn text_row(values: &[String]) -> Vec<Cell> {
    values.iter().map(|v| Cell::Text(v.clone())).collect()
}

fn json_cell(value: Option<&Value>) -> Cell {
    match value {
        None | Some(Value::Null) => Cell::Empty,
        Some(Value::Bool(b)) => Cell::Bool(*b),
        Some(Value::Number(n)) => n.as_f64().map(Cell::Number).unwrap_or(Cell::Empty),
        Some(Value::String(s)) => Cell::Text(s.clone()),
        Some(other) => Cell::Text(other.to_string()),
    }
}

/// CSV 的值一律寫成文字儲存格
pub fn csv_to_xlsx(text: &str) -> ConvertResult<Vec<u8>> {
    let (headers, rows) = csv_to_records(text)?;
    let mut sheet = vec![text_row(&headers)];
    sheet.extend(rows.iter().map(|r| text_row(r)));
    write_xlsx(&sheet)
}

/// 數字與布林保留型別
pub fn json_to_xlsx(text: &str) -> ConvertResult<Vec<u8>> {
    let value: Value = serde_json::from_str(text)?;
    let (headers, _) = json_to_table(&value)?;
    let items: Vec<&Value> = match &value {
        Value::Array(items) => items.iter().collect(),
        other => vec![other],
    };
    let mut sheet = vec![text_row(&headers)];
    for item in items {
        sheet.push(
            headers
                .iter()
                .map(|h| match item {
                    Value::Object(object) => json_cell(object.get(h)),
                    scalar if h == "value" => json_cell(Some(scalar)),
                    _ => Cell::Empty,
                })
                .collect(),
        );
    }
    write_xlsx(&sheet)
}

pub fn handle_sheet_to_csv(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    let range = read_first_sheet(request.first_file()?.bytes())?;
    Ok(Blob::with_mime(sheet_to_csv(&range)?, CSV_MIME).into())
}

pub fn handle_sheet_to_json(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    let range = read_first_sheet(request.first_file()?.bytes())?;
    let json = serde_json::to_string_pretty(&sheet_to_json(&range))?;
    Ok(Blob::with_mime(json, JSON_MIME).into())
}

pub fn handle_sheet_to_html(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    let range = read_first_sheet(request.first_file()?.bytes())?;
    Ok(Blob::with_mime(sheet_to_html(&range), "text/html").into())
}

pub fn handle_csv_to_xlsx(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    Ok(Blob::new(csv_to_xlsx(&request.text_content()?)?, XLSX_MIME).into())
}

pub fn handle_json_to_xlsx(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    Ok(Blob::new(json_to_xlsx(&request.text_content()?)?, XLSX_MIME).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_letters_roll_over() {
        assert_eq!(column_letter(0), "A");
        assert_eq!(column_letter(25), "Z");
        assert_eq!(column_letter(26), "AA");
        assert_eq!(column_letter(27), "AB");
        assert_eq!(column_letter(701), "ZZ");
        assert_eq!(column_letter(702), "AAA");
    }

    #[test]
    fn written_xlsx_reads_back_through_calamine() {
        let bytes = json_to_xlsx(r#"[{"name":"Alice","age":30,"ok":true},{"name":"Bob & Co"}]"#).unwrap();
        let range = read_first_sheet(&bytes).unwrap();

        assert_eq!(sheet_to_csv(&range).unwrap(), "name,age,ok\nAlice,30,true\nBob & Co,,");
        assert_eq!(
            sheet_to_json(&range),
            serde_json::json!([
                {"name": "Alice", "age": 30.0, "ok": true},
                {"name": "Bob & Co"}
            ])
        );
    }

    #[test]
    fn csv_to_xlsx_keeps_text_cells() {
        let bytes = csv_to_xlsx("id,label\n007,first\n").unwrap();
        let range = read_first_sheet(&bytes).unwrap();
        assert_eq!(sheet_to_json(&range), serde_json::json!([{"id": "007", "label": "first"}]));
        assert!(sheet_to_html(&range).contains("<th>id</th><th>label</th>"));
    }

    #[test]
    fn garbage_is_not_a_workbook() {
        assert!(read_first_sheet(b"not a spreadsheet").is_err());
    }
}
