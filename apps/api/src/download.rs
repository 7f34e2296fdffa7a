use axum::{
    http::{header, HeaderMap, HeaderName, HeaderValue},
    response::{IntoResponse, Response},
};
use bytes::Bytes;

use crate::errors::AppError;

pub const ZIP_CONTENT_TYPE: &str = "application/zip";

/// Builds a file download response. `extra` headers are appended as-is.
pub fn attachment(
    filename: &str,
    content_type: &str,
    body: impl Into<Bytes>,
    extra: &[(&'static str, String)],
) -> Result<Response, AppError> {
    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, header_value(content_type)?);
    headers.insert(
        header::CONTENT_DISPOSITION,
        header_value(&content_disposition(filename))?,
    );
    for (name, value) in extra {
        headers.insert(HeaderName::from_static(*name), header_value(value)?);
    }
    Ok((headers, body.into()).into_response())
}

fn header_value(value: &str) -> Result<HeaderValue, AppError> {
    HeaderValue::from_str(value)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("invalid header value {value:?}: {e}")))
}

fn is_plain(c: char) -> bool {
    c.is_ascii_graphic() && c != '"' && c != '\\'
}

/// Quoted ASCII `filename` with every other character replaced by `_`. Falls back to
/// `download` when no printable ASCII character of the name is left.
fn header_safe_filename(filename: &str) -> String {
    if !filename.chars().any(is_plain) {
        return "download".to_string();
    }
    filename
        .chars()
        .map(|c| if c == ' ' || is_plain(c) { c } else { '_' })
        .collect()
}

/// `attachment` disposition. Names that are not plain ASCII also get an RFC 6266
/// `filename*` carrying the UTF-8 name.
fn content_disposition(filename: &str) -> String {
    let fallback = header_safe_filename(filename);
    if fallback == filename {
        format!("attachment; filename=\"{fallback}\"")
    } else {
        format!(
            "attachment; filename=\"{fallback}\"; filename*=UTF-8''{}",
            urlencoding::encode(filename)
        )
    }
}
