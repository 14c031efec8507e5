//! X.509 憑證與金鑰的 PEM / DER 互轉與資訊檢視。

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::Serialize;
use sha2::{Digest, Sha256};
use x509_parser::objects::{oid2abbrev, oid2sn, oid_registry};
use x509_parser::prelude::*;
use x509_parser::public_key::PublicKey;

use crate::error::{ConvertError, ConvertResult};
use crate::models::blob::Blob;
use crate::models::conversion::{ConversionRequest, ConversionResult};

pub const PEM_MIME: &str = "application/x-pem-file";
pub const DER_CERT_MIME: &str = "application/x-x509-ca-cert";
pub const CER_MIME: &str = "application/pkix-cert";
const PEM_LINE_WIDTH: usize = 64;
const LABEL_CERTIFICATE: &str = "CERTIFICATE";
const LABEL_PUBLIC_KEY: &str = "PUBLIC KEY";

fn certificate_error(context: &str, detail: impl std::fmt::Display) -> ConvertError {
    ConvertError::Certificate(format!("{}：{}", context, detail))
}

pub fn looks_like_pem(bytes: &[u8]) -> bool {
    String::from_utf8_lossy(bytes).contains("-----BEGIN ")
}

/// 讀取第一個 PEM 區塊，回傳標籤與內容
pub fn first_pem_block(bytes: &[u8]) -> ConvertResult<(String, Vec<u8>)> {
    let pem = Pem::iter_from_buffer(bytes)
        .next()
        .ok_or_else(|| ConvertError::InvalidInput("找不到 PEM 區塊".to_string()))?
        .map_err(|e| certificate_error("PEM 解析失敗", e))?;
    Ok((pem.label, pem.contents))
}

pub fn encode_pem(label: &str, der: &[u8]) -> String {
    let encoded = STANDARD.encode(der);
    let mut pem = format!("-----BEGIN {}-----\n", label);
    for chunk in encoded.as_bytes().chunks(PEM_LINE_WIDTH) {
        pem.push_str(&String::from_utf8_lossy(chunk));
        pem.push('\n');
    }
    pem.push_str(&format!("-----END {}-----\n", label));
    pem
}

fn parse_certificate(der: &[u8]) -> ConvertResult<X509Certificate<'_>> {
    let (_, certificate) =
        parse_x509_certificate(der).map_err(|e| certificate_error("無效的 X.509 憑證", e))?;
    Ok(certificate)
}

/// 憑證 PEM 的 DER 內容，並確認可被解析
pub fn certificate_der_from_pem(bytes: &[u8]) -> ConvertResult<Vec<u8>> {
    let (label, der) = first_pem_block(bytes)?;
    if label != LABEL_CERTIFICATE {
        return Err(ConvertError::InvalidInput(format!("不是憑證 PEM（標籤為 {}）", label)));
    }
    parse_certificate(&der)?;
    Ok(der)
}

/// PEM 轉 DER，依標籤決定輸出類型
pub fn pem_to_der(bytes: &[u8]) -> ConvertResult<Blob> {
    let (label, der) = first_pem_block(bytes)?;
    let mime = match label.as_str() {
        LABEL_CERTIFICATE => {
            parse_certificate(&der)?;
            DER_CERT_MIME
        }
        "PRIVATE KEY" | "RSA PRIVATE KEY" | "EC PRIVATE KEY" => "application/pkcs8",
        LABEL_PUBLIC_KEY => "application/x-spki",
        other => {
            return Err(ConvertError::Unsupported(format!("不支援的 PEM 類型：{}", other)));
        }
    };
    Ok(Blob::new(der, mime))
}

/// 先嘗試當作憑證，再嘗試當作公鑰
pub fn der_to_pem(der: &[u8]) -> ConvertResult<String> {
    if parse_x509_certificate(der).is_ok() {
        return Ok(encode_pem(LABEL_CERTIFICATE, der));
    }
    if SubjectPublicKeyInfo::from_der(der).is_ok() {
        return Ok(encode_pem(LABEL_PUBLIC_KEY, der));
    }
    Err(ConvertError::InvalidInput("無法解析 DER 檔案".to_string()))
}

/// 已是 PEM 則原樣保留，否則視為 DER
pub fn any_to_pem(bytes: &[u8]) -> ConvertResult<String> {
    if looks_like_pem(bytes) {
        certificate_der_from_pem(bytes)?;
        return Ok(String::from_utf8_lossy(bytes).into_owned());
    }
    der_to_pem(bytes)
}

pub fn extract_public_key(bytes: &[u8]) -> ConvertResult<String> {
    let der = if looks_like_pem(bytes) {
        certificate_der_from_pem(bytes)?
    } else {
        bytes.to_vec()
    };
    let certificate = parse_certificate(&der)?;
    Ok(encode_pem(LABEL_PUBLIC_KEY, certificate.public_key().raw))
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NameAttribute {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ValidityPeriod {
    pub not_before: String,
    pub not_after: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PublicKeySummary {
    pub algorithm: String,
    pub bit_size: Option<usize>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CertificateInfo {
    pub version: u32,
    pub serial_number: String,
    pub subject: Vec<NameAttribute>,
    pub issuer: Vec<NameAttribute>,
    pub validity: ValidityPeriod,
    pub signature_algorithm: String,
    pub public_key: PublicKeySummary,
    pub sha256_fingerprint: String,
}

fn name_attributes(name: &X509Name<'_>) -> Vec<NameAttribute> {
    let registry = oid_registry();
    name.iter_attributes()
        .map(|attribute| NameAttribute {
            name: oid2abbrev(attribute.attr_type(), registry)
                .map(str::to_string)
                .unwrap_or_else(|_| attribute.attr_type().to_id_string()),
            value: attribute
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|_| STANDARD.encode(attribute.attr_value().data)),
        })
        .collect()
}

fn oid_name(oid: &x509_parser::der_parser::oid::Oid<'_>) -> String {
    oid2sn(oid, oid_registry())
        .map(str::to_string)
        .unwrap_or_else(|_| oid.to_id_string())
}

fn fingerprint(der: &[u8]) -> String {
    Sha256::digest(der)
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(":")
}

pub fn certificate_info(bytes: &[u8]) -> ConvertResult<CertificateInfo> {
    let der = if looks_like_pem(bytes) {
        certificate_der_from_pem(bytes)?
    } else {
        bytes.to_vec()
    };
    let certificate = parse_certificate(&der)?;
    let public_key = certificate.public_key();
    let bit_size = match public_key.parsed() {
        Ok(PublicKey::RSA(rsa)) => Some(rsa.key_size()),
        Ok(PublicKey::EC(point)) => Some(point.key_size()),
        _ => None,
    };

    Ok(CertificateInfo {
        version: certificate.version().0 + 1,
        serial_number: certificate.raw_serial_as_string(),
        subject: name_attributes(certificate.subject()),
        issuer: name_attributes(certificate.issuer()),
        validity: ValidityPeriod {
            not_before: certificate.validity().not_before.to_string(),
            not_after: certificate.validity().not_after.to_string(),
        },
        signature_algorithm: oid_name(&certificate.signature_algorithm.algorithm),
        public_key: PublicKeySummary {
            algorithm: oid_name(&public_key.algorithm.algorithm),
            bit_size,
        },
        sha256_fingerprint: fingerprint(&der),
    })
}

pub fn handle_pem_to_der(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    Ok(pem_to_der(request.first_file()?.bytes())?.into())
}

pub fn handle_der_to_pem(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    Ok(Blob::with_mime(der_to_pem(request.first_file()?.bytes())?, PEM_MIME).into())
}

/// `.crt` 與 PEM 內容相同，只換副檔名
pub fn handle_pem_to_crt(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    let bytes = request.first_file()?.bytes();
    certificate_der_from_pem(bytes)?;
    Ok(Blob::new(bytes.to_vec(), DER_CERT_MIME).into())
}

pub fn handle_any_to_pem(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    Ok(Blob::with_mime(any_to_pem(request.first_file()?.bytes())?, PEM_MIME).into())
}

pub fn handle_pem_to_cer(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    Ok(Blob::new(certificate_der_from_pem(request.first_file()?.bytes())?, CER_MIME).into())
}

pub fn handle_extract_public_key(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    Ok(Blob::with_mime(extract_public_key(request.first_file()?.bytes())?, PEM_MIME).into())
}

pub fn handle_view_certificate_info(request: &ConversionRequest) -> ConvertResult<ConversionResult> {
    let info = certificate_info(request.first_file()?.bytes())?;
    Ok(Blob::with_mime(serde_json::to_string_pretty(&info)?, "application/json").into())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = include_str!("../../tests/fixtures/sample-cert.pem");

    #[test]
    fn pem_and_der_round_trip() {
        let der = pem_to_der(SAMPLE.as_bytes()).unwrap();
        assert_eq!(der.mime, DER_CERT_MIME);
        assert_eq!(der.bytes[0], 0x30);
        let pem = der_to_pem(&der.bytes).unwrap();
        assert_eq!(pem.trim(), SAMPLE.trim());
    }

    #[test]
    fn cer_input_may_be_der_or_pem() {
        let der = certificate_der_from_pem(SAMPLE.as_bytes()).unwrap();
        assert_eq!(any_to_pem(&der).unwrap().trim(), SAMPLE.trim());
        assert_eq!(any_to_pem(SAMPLE.as_bytes()).unwrap(), SAMPLE);
    }

    #[test]
    fn info_describes_the_sample() {
        let info = certificate_info(SAMPLE.as_bytes()).unwrap();
        assert_eq!(info.version, 3);
        assert!(info.serial_number.starts_with("3d:b0:25"));
        assert!(info
            .subject
            .contains(&NameAttribute { name: "CN".to_string(), value: "convert.example".to_string() }));
        assert_eq!(info.subject, info.issuer);
        assert_eq!(info.public_key.bit_size, Some(256));
        assert!(info.sha256_fingerprint.starts_with("DB:30:0E:96"));
    }

    #[test]
    fn public_key_is_wrapped_as_pem() {
        let pem = extract_public_key(SAMPLE.as_bytes()).unwrap();
        assert!(pem.starts_with("-----BEGIN PUBLIC KEY-----\n"));
        let (label, der) = first_pem_block(pem.as_bytes()).unwrap();
        assert_eq!(label, "PUBLIC KEY");
        assert_eq!(der_to_pem(&der).unwrap(), pem);
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(pem_to_der(b"hello").is_err());
        assert!(der_to_pem(b"\x01\x02\x03").is_err());
    }
}
