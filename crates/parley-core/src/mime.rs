//! Path normalization + MIME helpers for attachments.

use std::path::{Path, PathBuf};

/// Fallback MIME type for bytes nobody could identify.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Turns a dropped or typed attachment path into a filesystem path.
///
/// Accepts what terminals paste on drag-and-drop: surrounding quotes,
/// `file://` URLs, and shell escapes (`\ `, `\(`, `\)`). A leading `~/`
/// expands to the home directory when one is known.
#[must_use]
pub fn normalize_input_path(input: &str) -> PathBuf {
    let trimmed = input.trim();
    let unquoted = ['\'', '"']
        .into_iter()
        .find_map(|q| trimmed.strip_prefix(q).and_then(|s| s.strip_suffix(q)))
        .unwrap_or(trimmed);

    if unquoted.starts_with("file://")
        && let Some(path) = url::Url::parse(unquoted)
            .ok()
            .and_then(|u| u.to_file_path().ok())
    {
        return path;
    }

    let unescaped = unquoted
        .replace("\\ ", " ")
        .replace("\\(", "(")
        .replace("\\)", ")");

    match unescaped.strip_prefix("~/").zip(dirs::home_dir()) {
        Some((rest, home)) => home.join(rest),
        None => PathBuf::from(unescaped),
    }
}

/// Lowercased extension of a file name, without the dot.
#[must_use]
pub fn extension(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
}

/// Returns the MIME type implied by a file name's extension.
#[must_use]
pub fn mime_type_for_extension(file_name: &str) -> Option<&'static str> {
    let ext = extension(file_name)?;

    let mime = match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "csv" => "text/csv",
        "txt" => "text/plain",
        "json" => "application/json",
        _ => return None,
    };
    Some(mime)
}

/// Best-effort MIME type for a file: extension first, then magic bytes.
#[must_use]
pub fn detect_mime_type(file_name: &str, bytes: &[u8]) -> &'static str {
    mime_type_for_extension(file_name)
        .or_else(|| infer::get(bytes).map(|kind| kind.mime_type()))
        .unwrap_or(OCTET_STREAM)
}
