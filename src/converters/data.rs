//! 結構化資料格式互轉：CSV、TSV、JSON、XML、YAML、TOML、INI、HTML 表格，以及 Base64 / URL 編碼。

use std::sync::OnceLock;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use quick_xml::escape::escape;
use quick_xml::events::Event;
use quick_xml::Reader;
use regex::{Regex, RegexBuilder};
use serde_json::{Map, Value};

use crate::converters::text::{html_escape, html_unescape, strip_html_tags};
use crate::error::{ConvertError, ConvertResult};
use crate::models::blob::Blob;
use crate::models::conversion::{ConversionRequest, ConversionResult};

pub const JSON_MIME: &str = "application/json";
pub const XML_MIME: &str = "application/xml";
pub const CSV_MIME: &str = "text/csv";
const XML_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>";
const XML_ATTRIBUTES_KEY: &str = "@attributes";
const XML_TEXT_KEY: &str = "#text";

fn table_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        RegexBuilder::new(r"<table[^>]*>([\s\S]*?)</table>")
            .case_insensitive(true)
            .build()
            .expect("valid table regex")
    })
}

fn row_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        RegexBuilder::new(r"<tr[^>]*>([\s\S]*?)</tr>")
            .case_insensitive(true)
            .build()
            .expect("valid row regex")
    })
}

fn cell_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        RegexBuilder::new(r"<t[dh][^>]*>([\s\S]*?)</t[dh]>")
            .case_insensitive(true)
            .build()
            .expect("valid cell regex")
    })
}

/// 純量轉為輸出用字串，null 為空字串，巢狀值保留 JSON 形式
pub fn value_to_plain(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

/// XML 元素名稱只允許英數字、`_`、`-`、`.`，且不能以數字開頭
pub fn xml_element_name(raw: &str) -> String {
    let mut name: String = raw
        .trim()
        .chars()
        .map(|c| if c.is_alphanumeric() || matches!(c, '_' | '-' | '.') { c } else { '_' })
        .collect();
    if name.is_empty() || name.starts_with(|c: char| c.is_ascii_digit() || c == '-' || c == '.') {
        name.insert(0, '_');
    }
    name
}

fn csv_reader(text: &str, has_headers: bool) -> csv::Reader<&[u8]> {
    delimited_reader(text, has_headers, b',')
}

fn delimited_reader(text: &str, has_headers: bool, delimiter: u8) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new()
        .has_headers(has_headers)
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(text.as_bytes())
}

/// 以標題列為鍵，所有值皆為字串
pub fn csv_to_records(text: &str) -> ConvertResult<(Vec<String>, Vec<Vec<String>>)> {
    let mut reader = csv_reader(text, true);
    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }
        rows.push(
            (0..headers.len())
                .map(|i| record.get(i).unwrap_or_default().to_string())
                .collect(),
        );
    }
    Ok((headers, rows))
}

pub fn records_to_json(headers: &[String], rows: &[Vec<String>]) -> Value {
    Value::Array(
        rows.iter()
            .map(|row| {
                let object: Map<String, Value> = headers
                    .iter()
                    .zip(row)
                    .map(|(key, value)| (key.clone(), Value::String(value.clone())))
                    .collect();
                Value::Object(object)
            })
            .collect(),
    )
}

pub fn csv_to_json(text: &str) -> ConvertResult<String> {
    let (headers, rows) = csv_to_records(text)?;
    Ok(serde_json::to_string_pretty(&records_to_json(&headers, &rows))?)
}

/// 物件陣列攤平成表格，欄位為所有鍵的聯集（依首次出現順序）
pub fn json_to_table(value: &Value) -> ConvertResult<(Vec<String>, Vec<Vec<String>>)> {
    let items: Vec<&Value> = match value {
        Value::Array(items) => items.iter().collect(),
        Value::Object(_) => vec![value],
        _ => {
            return Err(ConvertError::InvalidInput(
                "JSON 必須是物件或物件陣列".to_string(),
            ))
        }
    };

    let mut headers: Vec<String> = Vec::new();
    for item in &items {
        match item {
            Value::Object(object) => {
                for key in object.keys() {
                    if !headers.contains(key) {
                        headers.push(key.clone());
                    }
                }
            }
            _ if !headers.iter().any(|h| h == "value") => headers.push("value".to_string()),
            _ => {}
        }
    }

    let rows = items
        .iter()
        .map(|item| match item {
            Value::Object(object) => headers
                .iter()
                .map(|h| object.get(h).map(value_to_plain).unwrap_or_default())
                .collect(),
            scalar => headers
                .iter()
                .map(|h| if h == "value" { value_to_plain(scalar) } else { String::new() })
                .collect(),
        })
        .collect();
    Ok((headers, rows))
}

pub fn write_csv(headers: &[String], rows: &[Vec<String>], delimiter: u8) -> ConvertResult<String> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(Vec::new());
    writer.write_record(headers)?;
    for row in rows {
        writer.write_record(row)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| ConvertError::Io(e.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).trim_end().to_string())
}

pub fn json_to_csv(text: &str) -> ConvertResult<String> {
    let value: Value = serde_json::from_str(text)?;
    let (headers, rows) = json_to_table(&value)?;
    write_csv(&headers, &rows, b',')
}

pub fn csv_to_xml(text: &str) -> ConvertResult<String> {
    let (headers, rows) = csv_to_records(text)?;
    let names: Vec<String> = headers.iter().map(|h| xml_element_name(h)).collect();
    let mut xml = format!("{}\n<root>\n", XML_DECLARATION);
    for row in &rows {
        xml.push_str("  <row>\n");
        for (name, value) in names.iter().zip(row) {
            xml.push_str(&format!("    <{0}>{1}</{0}>\n", name, escape(value.trim())));
        }
        xml.push_str("  </row>\n");
    }
    xml.push_str("</root>");
    Ok(xml)
}

fn push_xml_value(xml: &mut String, key: &str, value: &Value, indent: &str) {
    let name = xml_element_name(key);
    match value {
        Value::Object(object) => {
            xml.push_str(&format!("{}<{}>\n", indent, name));
            let inner = format!("{}  ", indent);
            for (child_key, child) in object {
                push_xml_value(xml, child_key, child, &inner);
            }
            xml.push_str(&format!("{}</{}>\n", indent, name));
        }
        Value::Array(items) => {
            for item in items {
                push_xml_value(xml, key, item, indent);
            }
        }
        scalar => {
            xml.push_str(&format!(
                "{0}<{1}>{2}</{1}>\n",
                indent,
                name,
                escape(&value_to_plain(scalar))
            ));
        }
    }
}

/// 陣列以重複的同名元素表示，根為 `<root>`
pub fn json_to_xml(text: &str) -> ConvertResult<String> {
    let value: Value = serde_json::from_str(text)?;
    let mut xml = format!("{}\n<root>\n", XML_DECLARATION);
    match &value {
        Value::Object(object) => {
            for (key, child) in object {
                push_xml_value(&mut xml, key, child, "  ");
            }
        }
        Value::Array(items) => {
            for item in items {
                push_xml_value(&mut xml, "item", item, "  ");
            }
        }
        scalar => xml.push_str(&format!("  {}\n", escape(&value_to_plain(scalar)))),
    }
    xml.push_str("</root>");
    Ok(xml)
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct XmlNode {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
    pub text: String,
}

impl XmlNode {
    fn from_start(element: &quick_xml::events::BytesStart<'_>) -> ConvertResult<Self> {
        let mut node = XmlNode {
            name: String::from_utf8_lossy(element.name().as_ref()).into_owned(),
            ..Default::default()
        };
        for attribute in element.attributes() {
            let attribute = attribute.map_err(quick_xml::Error::from)?;
            node.attributes.push((
                String::from_utf8_lossy(attribute.key.as_ref()).into_owned(),
                attribute.unescape_value()?.into_owned(),
            ));
        }
        Ok(node)
    }

    pub fn to_json(&self) -> Value {
        if self.children.is_empty() && self.attributes.is_empty() {
            return Value::String(self.text.trim().to_string());
        }

        let mut object = Map::new();
        if !self.attributes.is_empty() {
            let attributes: Map<String, Value> = self
                .attributes
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect();
            object.insert(XML_ATTRIBUTES_KEY.to_string(), Value::Object(attributes));
        }
        for child in &self.children {
            let value = child.to_json();
            match object.get_mut(&child.name) {
                Some(Value::Array(items)) => items.push(value),
                Some(existing) => {
                    let first = existing.take();
                    *existing = Value::Array(vec![first, value]);
                }
                None => {
                    object.insert(child.name.clone(), value);
                }
            }
        }
        if !self.text.trim().is_empty() {
            object.insert(XML_TEXT_KEY.to_string(), Value::String(self.text.trim().to_string()));
        }
        Value::Object(object)
    }
}

/// 解析成元素樹並回傳根元素
pub fn parse_xml(xml: &str) -> ConvertResult<XmlNode> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<XmlNode> = Vec::new();
    let mut root: Option<XmlNode> = None;

    loop {
        match reader.read_event()? {
            Event::Start(element) => stack.push(XmlNode::from_start(&element)?),
            Event::Empty(element) => {
                let node = XmlNode::from_start(&element)?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(node),
                    None => root = Some(node),
                }
            }
            Event::Text(text) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&text.unescape()?);
                }
            }
            Event::CData(data) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Event::End(_) => {
                let node = stack
                    .pop()
                    .ok_or_else(|| ConvertError::InvalidInput("XML 結束標籤不成對".to_string()))?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(node),
                    None => root = Some(node),
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(ConvertError::InvalidInput("XML 有未關閉的元素".to_string()));
    }
    root.ok_or_else(|| ConvertError::InvalidInput("XML 沒有根元素".to_string()))
}

pub fn xml_to_json(xml: &str) -> ConvertResult<String> {
    Ok(serde_json::to_string_pretty(&parse_xml(xml)?.to_json())?)
}

/// 根元素的每個子元素為一列，其子元素為欄位
pub fn xml_to_csv(xml: &str) -> ConvertResult<String> {
    let root = parse_xml(xml)?;
    let mut headers: Vec<String> = Vec::new();
    for row in &root.children {
        if row.children.is_empty() {
            if !headers.contains(&row.name) {
                headers.push(row.name.clone());
            }
            continue;
        }
        for cell in &row.children {
            if !headers.contains(&cell.name) {
                headers.push(cell.name.clone());
            }
        }
    }

    let rows: Vec<Vec<String>> = root
        .children
        .iter()
        .map(|row| {
            headers
                .iter()
                .map(|header| {
                    if row.children.is_empty() {
                        return if &row.name == header { row.text.trim().to_string() } else { String::new() };
                    }
                    row.children
                        .iter()
                        .find(|cell| &cell.name == header)
                        .map(|cell| value_to_plain(&cell.to_json()))
                        .unwrap_or_default()
                })
                .collect()
        })
        .collect();
    write_csv(&headers, &rows, b',')
}

pub fn yaml_to_json(text: &str) -> ConvertResult<String> {
    let value: Value = serde_yaml::from_str(text)?;
    Ok(serde_json::to_string_pretty(&value)?)
}

pub fn json_to_yaml(text: &str) -> ConvertResult<String> {
    let value: Value = serde_json::from_str(text)?;
    Ok(serde_yaml::to_string(&value)?)
}

pub fn toml_to_json(text: &str) -> ConvertResult<String> {
    let table: toml::Table = toml::from_str(text)?;
    Ok(serde_json::to_string_pretty(&table)?)
}

fn strip_nulls(value: Value) -> Value {
    match value {
        Value::Object(object) => Value::Object(
            object
                .into_iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k, strip_nulls(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .filter(|v| !v.is_null())
                .map(strip_nulls)
                .collect(),
        ),
        other => other,
    }
}

/// TOML 沒有 null，轉換前會移除 null 欄位
pub fn json_to_toml(text: &str) -> ConvertResult<String> {
    let value: Value = serde_json::from_str(text)?;
    if !value.is_object() {
        return Err(ConvertError::InvalidInput("TOML 的最上層必須是物件".to_string()));
    }
    Ok(toml::to_string_pretty(&strip_nulls(value))?)
}

fn unquote(value: &str) -> &str {
    let value = value.trim();
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

/// 區段成為巢狀物件，區段前的鍵放在最上層；值一律為字串
pub fn ini_to_json(text: &str) -> ConvertResult<String> {
    let mut root = Map::new();
    let mut section: Option<String> = None;

    for (index, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
            continue;
        }
        if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            let name = name.trim().to_string();
            root.entry(name.clone())
                .or_insert_with(|| Value::Object(Map::new()));
            section = Some(name);
            continue;
        }
        let (key, value) = line
            .split_once('=')
            .or_else(|| line.split_once(':'))
            .ok_or_else(|| ConvertError::InvalidInput(format!("INI 第 {} 行格式錯誤：{}", index + 1, line)))?;
        let entry = (key.trim().to_string(), Value::String(unquote(value).to_string()));

        let target = match &section {
            Some(name) => root.get_mut(name).and_then(Value::as_object_mut),
            None => Some(&mut root),
        };
        if let Some(target) = target {
            target.insert(entry.0, entry.1);
        }
    }
    Ok(serde_json::to_string_pretty(&Value::Object(root))?)
}

/// 最上層純量先輸出，物件成為 `[區段]`
pub fn json_to_ini(text: &str) -> ConvertResult<String> {
    let value: Value = serde_json::from_str(text)?;
    let object = value
        .as_object()
        .ok_or_else(|| ConvertError::InvalidInput("INI 的最上層必須是物件".to_string()))?;

    let mut lines = Vec::new();
    for (key, value) in object.iter().filter(|(_, v)| !v.is_object()) {
        lines.push(format!("{}={}", key, value_to_plain(value)));
    }
    for (name, value) in object.iter().filter(|(_, v)| v.is_object()) {
        if !lines.is_empty() {
            lines.push(String::new());
        }
        lines.push(format!("[{}]", name));
        if let Some(entries) = value.as_object() {
            for (key, value) in entries {
                lines.push(format!("{}={}", key, value_to_plain(value)));
            }
        }
    }
    Ok(lines.join("\n"))
}

/// 逐列重新輸出，欄位內容依目標分隔符號重新加引號
fn change_delimiter(text: &str, from: u8, to: u8) -> ConvertResult<String> {
    let mut reader = delimited_reader(text, false, from);
    let mut writer = csv::WriterBuilder::new()
        .delimiter(to)
        .flexible(true)
        .from_writer(Vec::new());
    for record in reader.records() {
        writer.write_record(&record?)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| ConvertError::Io(e.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).trim_end().to_string())
}

pub fn tsv_to_csv(text: &str) -> ConvertResult<String> {
    change_delimiter(text, b'\t', b',')
}

pub fn csv_to_tsv(text: &str) -> ConvertResult<String> {
    change_delimiter(text, b',', b'\t')
}

/// 取第一個 `<table>`，含逗號的儲存格加上引號
pub fn html_table_to_csv(html: &str) -> ConvertResult<String> {
    let table = table_regex()
        .captures(html)
        .and_then(|c| c.get(1))
        .ok_or_else(|| ConvertError::InvalidInput("HTML 中找不到 <table>".to_string()))?;

    let rows: Vec<String> = row_regex()
        .captures_iter(table.as_str())
        .map(|row| {
            cell_regex()
                .captures_iter(&row[1])
                .map(|cell| {
                    let text = html_unescape(strip_html_tags(&cell[1]).trim());
                    if text.contains(',') {
                        format!("\"{}\"", text.replace('"', "\"\""))
                    } else {
                        text
                    }
                })
                .collect::<Vec<_>>()
                .join(",")
        })
        .collect();
    Ok(rows.join("\n"))
}

/// 第一列為標題
pub fn rows_to_html_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut html = String::from("<table border=\"1\"><thead><tr>");
    for header in headers {
        html.push_str(&format!("<th>{}</th>", html_escape(header)));
    }
    html.push_str("</tr></thead><tbody>");
    for row in rows {
        html.push_str("<tr>");
        for cell in row {
            html.push_str(&format!("<td>{}</td>", html_escape(cell)));
        }
        html.push_str("</tr>");
    }
    html.push_str("</tbody></table>");
    html
}

pub fn csv_to_html(text: &str) -> ConvertResult<String> {
    let mut reader = csv_reader(text, false);
    let mut html = String::from("<table border=\"1\">");
    let mut first = true;
    for record in reader.records() {
        let record = record?;
        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }
        let tag = if first { "th" } else { "td" };
        html.push_str("<tr>");
        for cell in record.iter() {
            html.push_str(&format!("<{0}>{1}</{0}>", tag, html_escape(cell)));
        }
        html.push_str("</tr>");
        first = false;
    }
    html.push_str("</table>");
    Ok(html)
}

pub fn base64_encode(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// 忽略輸入中的空白與換行
pub fn base64_decode(input: &str) -> ConvertResult<Vec<u8>> {
    let compact: String = input.chars().filter(|c| !c.is_whitespace()).collect();
    STANDARD
        .decode(compact)
        .map_err(|e| ConvertError::InvalidInput(format!("無效的 Base64：{}", e)))
}

pub fn url_encode(text: &str) -> String {
    urlencoding::encode(text).into_owned()
}

pub fn url_decode(text: &str) -> ConvertResult<String> {
    urlencoding::decode(text)
        .map(|decoded| decoded.into_owned())
        .map_err(|e| ConvertError::InvalidInput(format!("無效的 URL 編碼：{}", e)))
}

fn output(content: String, mime: &str) -> ConvertResult<ConversionResult> {
    Ok(Blob::with_mime(content, mime).into())
}

pub fn handle_csv_to_json(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    output(csv_to_json(&request.text_content()?)?, JSON_MIME)
}

pub fn handle_json_to_csv(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    output(json_to_csv(&request.text_content()?)?, CSV_MIME)
}

pub fn handle_csv_to_xml(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    output(csv_to_xml(&request.text_content()?)?, XML_MIME)
}

pub fn handle_json_to_xml(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    output(json_to_xml(&request.text_content()?)?, XML_MIME)
}

pub fn handle_xml_to_json(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    output(xml_to_json(&request.text_content()?)?, JSON_MIME)
}

pub fn handle_xml_to_csv(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    output(xml_to_csv(&request.text_content()?)?, CSV_MIME)
}

pub fn handle_yaml_to_json(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    output(yaml_to_json(&request.text_content()?)?, JSON_MIME)
}

pub fn handle_json_to_yaml(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    output(json_to_yaml(&request.text_content()?)?, "text/yaml")
}

pub fn handle_toml_to_json(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    output(toml_to_json(&request.text_content()?)?, JSON_MIME)
}

pub fn handle_json_to_toml(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    output(json_to_toml(&request.text_content()?)?, "application/toml")
}

pub fn handle_ini_to_json(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    output(ini_to_json(&request.text_content()?)?, JSON_MIME)
}

pub fn handle_json_to_ini(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    output(json_to_ini(&request.text_content()?)?, "text/plain")
}

pub fn handle_tsv_to_csv(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    output(tsv_to_csv(&request.text_content()?)?, CSV_MIME)
}

pub fn handle_csv_to_tsv(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    output(csv_to_tsv(&request.text_content()?)?, "text/tab-separated-values")
}

pub fn handle_html_table_to_csv(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    output(html_table_to_csv(&request.text_content()?)?, CSV_MIME)
}

pub fn handle_csv_to_html(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    output(csv_to_html(&request.text_content()?)?, "text/html")
}

pub fn handle_base64_encode(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    output(base64_encode(&request.bytes_content()?), "text/plain")
}

/// 解碼結果不是 UTF-8 時以二進位輸出
pub fn handle_base64_decode(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    let bytes = base64_decode(&request.text_content()?)?;
    let mime = if std::str::from_utf8(&bytes).is_ok() {
        "text/plain"
    } else {
        "application/octet-stream"
    };
    Ok(Blob::new(bytes, mime).into())
}

pub fn handle_url_encode(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    output(url_encode(&request.text_content()?), "text/plain")
}

pub fn handle_url_decode(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    output(url_decode(&request.text_content()?)?, "text/plain")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_to_json_keeps_values_as_strings() {
        let json = csv_to_json("name,age\nAlice,30\n\n").unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value, serde_json::json!([{"name": "Alice", "age": "30"}]));
        assert!(json.contains("\n  {\n    \"name\": \"Alice\""));
    }

    #[test]
    fn json_to_csv_unions_keys() {
        let csv = json_to_csv(r#"[{"a":1,"b":"x,y"},{"c":true}]"#).unwrap();
        assert_eq!(csv, "a,b,c\n1,\"x,y\",\n,,true");
    }

    #[test]
    fn csv_to_xml_wraps_rows() {
        let xml = csv_to_xml("name,note\nAlice,a&b\n").unwrap();
        assert_eq!(
            xml,
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<root>\n  <row>\n    <name>Alice</name>\n    <note>a&amp;b</note>\n  </row>\n</root>"
        );
    }

    #[test]
    fn json_to_xml_repeats_array_items() {
        let xml = json_to_xml(r#"{"tag":["a","b"],"meta":{"v":1}}"#).unwrap();
        assert!(xml.contains("  <tag>a</tag>\n  <tag>b</tag>\n"));
        assert!(xml.contains("  <meta>\n    <v>1</v>\n  </meta>\n"));
    }

    #[test]
    fn xml_to_json_groups_repeated_children() {
        let json = xml_to_json("<root><item id=\"1\">a</item><item>b</item><name>x</name></root>").unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "item": [{"@attributes": {"id": "1"}, "#text": "a"}, "b"],
                "name": "x"
            })
        );
    }

    #[test]
    fn xml_to_csv_uses_child_elements_as_columns() {
        let csv = xml_to_csv("<root><row><a>1</a><b>2</b></row><row><a>3</a></row></root>").unwrap();
        assert_eq!(csv, "a,b\n1,2\n3,");
    }

    #[test]
    fn malformed_xml_is_rejected() {
        assert!(xml_to_json("<root><a></root>").is_err());
        assert!(xml_to_json("").is_err());
    }

    #[test]
    fn yaml_and_toml_convert_to_json() {
        let yaml: Value = serde_json::from_str(&yaml_to_json("a: 1\nb:\n  - x\n").unwrap()).unwrap();
        assert_eq!(yaml, serde_json::json!({"a": 1, "b": ["x"]}));
        let toml: Value =
            serde_json::from_str(&toml_to_json("title = \"t\"\n[owner]\nname = \"n\"\n").unwrap()).unwrap();
        assert_eq!(toml, serde_json::json!({"title": "t", "owner": {"name": "n"}}));
        assert!(json_to_toml("[1,2]").is_err());
        assert!(json_to_toml(r#"{"a":null,"b":{"c":1}}"#).unwrap().contains("[b]"));
    }

    #[test]
    fn ini_round_trip_shape() {
        let json = ini_to_json("; comment\nroot=1\n[server]\nhost = \"localhost\"\nport: 80\n").unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"root": "1", "server": {"host": "localhost", "port": "80"}})
        );
        assert_eq!(json_to_ini(&json).unwrap(), "root=1\n\n[server]\nhost=localhost\nport=80");
    }

    #[test]
    fn html_table_extracts_first_table() {
        let html = "<p>x</p><table><tr><th>Name</th><th>City</th></tr><tr><td>Bob</td><td>Paris, FR</td></tr></table>";
        assert_eq!(html_table_to_csv(html).unwrap(), "Name,City\nBob,\"Paris, FR\"");
        assert!(html_table_to_csv("<p>none</p>").is_err());
    }

    #[test]
    fn csv_to_html_marks_header_row() {
        assert_eq!(
            csv_to_html("a,b\n1,<2>\n").unwrap(),
            "<table border=\"1\"><tr><th>a</th><th>b</th></tr><tr><td>1</td><td>&lt;2&gt;</td></tr></table>"
        );
    }

    #[test]
    fn base64_and_url_round_trip() {
        let encoded = base64_encode("héllo wörld".as_bytes());
        assert_eq!(base64_decode(&encoded).unwrap(), "héllo wörld".as_bytes());
        assert!(base64_decode("***").is_err());

        let encoded = url_encode("a b&c=d/é");
        assert_eq!(encoded, "a%20b%26c%3Dd%2F%C3%A9");
        assert_eq!(url_decode(&encoded).unwrap(), "a b&c=d/é");
    }

    #[test]
    fn tsv_and_csv_swap_delimiters() {
        assert_eq!(tsv_to_csv("a\tb\n1\t2").unwrap(), "a,b\n1,2");
        assert_eq!(csv_to_tsv("a,b").unwrap(), "a\tb");
    }

    #[test]
    fn quoted_csv_cell_stays_one_tsv_field() {
        let tsv = csv_to_tsv("name,note\nAlice,\"x, y\"").unwrap();
        assert_eq!(tsv, "name\tnote\nAlice\tx, y");
    }

    #[test]
    fn tsv_cell_with_comma_is_quoted_in_csv() {
        let csv = tsv_to_csv("name\tnote\nBob\tred, blue").unwrap();
        assert_eq!(csv, "name,note\nBob,\"red, blue\"");
        let (_, rows) = csv_to_records(&csv).unwrap();
        assert_eq!(rows, vec![vec!["Bob".to_string(), "red, blue".to_string()]]);
    }
}
