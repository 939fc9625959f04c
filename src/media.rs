use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;

use crate::error::{AppError, AppResult};

pub const DEFAULT_IMAGE_MIME: &str = "image/jpeg";

pub fn encode(bytes: &[u8]) -> String {
    BASE64_STANDARD.encode(bytes)
}

pub fn encode_opt(bytes: Option<&[u8]>) -> Option<String> {
    bytes.filter(|b| !b.is_empty()).map(encode)
}

pub fn data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", encode(bytes))
}

/// Decoded binary upload with the MIME type it should be served with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub bytes: Vec<u8>,
    pub mime: Option<String>,
}

/// Accepts plain base64 or a `data:<mime>;base64,<payload>` URL. An explicit
/// `declared_mime` wins over the one embedded in the URL.
pub fn decode_upload(payload: &str, declared_mime: Option<&str>) -> AppResult<Upload> {
    let payload = payload.trim();
    let (embedded_mime, encoded) = match payload.strip_prefix("data:") {
        Some(rest) => {
            let (header, body) = rest
                .split_once(',')
                .ok_or_else(|| AppError::Validation("Malformed data URL".into()))?;
            let mime = header.strip_suffix(";base64").ok_or_else(|| {
                AppError::Validation("Only base64 data URLs are supported".into())
            })?;
            (Some(mime.to_string()).filter(|m| !m.is_empty()), body)
        }
        None => (None, payload),
    };

    let bytes = BASE64_STANDARD
        .decode(encoded.trim())
        .map_err(|_| AppError::Validation("Upload is not valid base64".into()))?;
    if bytes.is_empty() {
        return Err(AppError::Validation("Upload is empty".into()));
    }

    let mime = declared_mime
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .or(embedded_mime);

    Ok(Upload { bytes, mime })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_base64_keeps_declared_mime() {
        let upload = decode_upload("aGVsbG8=", Some("image/png")).unwrap();
        assert_eq!(upload.bytes, b"hello");
        assert_eq!(upload.mime.as_deref(), Some("image/png"));
    }

    #[test]
    fn data_url_supplies_mime_when_none_declared() {
        let upload = decode_upload("data:image/webp;base64,aGVsbG8=", None).unwrap();
        assert_eq!(upload.bytes, b"hello");
        assert_eq!(upload.mime.as_deref(), Some("image/webp"));

        let upload = decode_upload("data:image/webp;base64,aGVsbG8=", Some("image/png")).unwrap();
        assert_eq!(upload.mime.as_deref(), Some("image/png"));
    }

    #[test]
    fn garbage_is_a_validation_error() {
        assert!(matches!(
            decode_upload("not base64!!", None),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            decode_upload("data:image/png,plain", None),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(decode_upload("", None), Err(AppError::Validation(_))));
    }

    #[test]
    fn data_url_embeds_mime() {
        assert_eq!(data_url("image/png", b"hello"), "data:image/png;base64,aGVsbG8=");
        assert_eq!(encode_opt(Some(b"")), None);
    }
}
