//! Content type resolution for uploads
//!
//! Resolution order, first hit wins:
//! 1. the type declared by the transport
//! 2. the filename extension
//! 3. magic bytes of the payload, then a printable UTF-8 check
//!
//! Falls back to `application/octet-stream`; resolution never fails.

use crate::config::{FALLBACK_CONTENT_TYPE, TEXT_CONTENT_TYPE};
use std::path::Path;

pub fn resolve(filename: &str, declared: Option<&str>, data: &[u8]) -> String {
    if let Some(declared) = declared.map(str::trim).filter(|d| is_valid_mime_type(d)) {
        return declared.to_string();
    }

    if let Some(mime) = from_extension(filename) {
        return mime.to_string();
    }

    sniff(data).unwrap_or_else(|| FALLBACK_CONTENT_TYPE.to_string())
}

/// Look the filename extension up in the extension table
pub fn from_extension(filename: &str) -> Option<&'static str> {
    let ext = Path::new(filename).extension()?.to_str()?.to_ascii_lowercase();

    let mime = match ext.as_str() {
        // Documents
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "ppt" => "application/vnd.ms-powerpoint",
        "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        "odt" => "application/vnd.oasis.opendocument.text",
        "ods" => "application/vnd.oasis.opendocument.spreadsheet",
        "odp" => "application/vnd.oasis.opendocument.presentation",
        "rtf" => "application/rtf",
        "epub" => "application/epub+zip",
        // Text and markup
        "txt" | "log" => "text/plain; charset=utf-8",
        "md" | "markdown" => "text/markdown; charset=utf-8",
        "csv" => "text/csv; charset=utf-8",
        "tsv" => "text/tab-separated-values",
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "js" | "mjs" => "text/javascript; charset=utf-8",
        "json" => "application/json",
        "xml" => "application/xml",
        "yaml" | "yml" => "application/yaml",
        "toml" => "application/toml",
        // Images
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "bmp" => "image/bmp",
        "ico" => "image/vnd.microsoft.icon",
        "tif" | "tiff" => "image/tiff",
        "avif" => "image/avif",
        "heic" => "image/heic",
        // Audio
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "ogg" | "oga" => "audio/ogg",
        "flac" => "audio/flac",
        "m4a" => "audio/mp4",
        "aac" => "audio/aac",
        "opus" => "audio/opus",
        // Video
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        "avi" => "video/x-msvideo",
        "mkv" => "video/x-matroska",
        // Archives
        "zip" => "application/zip",
        "gz" => "application/gzip",
        "tar" => "application/x-tar",
        "7z" => "application/x-7z-compressed",
        "rar" => "application/vnd.rar",
        // Fonts
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "otf" => "font/otf",
        _ => return None,
    };

    Some(mime)
}

/// Detect a type from the payload itself
fn sniff(data: &[u8]) -> Option<String> {
    if let Some(kind) = infer::get(data) {
        return Some(kind.mime_type().to_string());
    }

    if !data.is_empty() && is_printable_text(data) {
        return Some(TEXT_CONTENT_TYPE.to_string());
    }

    None
}

fn is_printable_text(data: &[u8]) -> bool {
    match std::str::from_utf8(data) {
        Ok(text) => text
            .chars()
            .all(|c| !c.is_control() || matches!(c, '\n' | '\r' | '\t' | '\u{c}')),
        Err(_) => false,
    }
}

/// `type/subtype` with token characters only, parameters allowed after `;`
fn is_valid_mime_type(mime: &str) -> bool {
    let essence = mime.split(';').next().unwrap_or_default().trim();
    let Some((media_type, subtype)) = essence.split_once('/') else {
        return false;
    };

    let is_token_char = |c: char| {
        c.is_ascii_alphanumeric() || matches!(c, '!' | '#' | '$' | '&' | '-' | '^' | '_' | '.' | '+')
    };

    !media_type.is_empty()
        && !subtype.is_empty()
        && media_type.chars().all(is_token_char)
        && subtype.chars().all(is_token_char)
}
