use std::path::Path;

const MIME_TYPES: &[(&str, &str)] = &[
    (".html", "text/html"),
    (".txt", "text/plain"),
    (".css", "text/css"),
    (".js", "application/javascript"),
    (".jpg", "image/jpeg"),
    (".jpeg", "image/jpeg"),
    (".png", "image/png"),
    (".gif", "image/gif"),
];

pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// Content type for a file, by case-sensitive suffix match on its name.
pub fn mime_type(path: &Path) -> &'static str {
    let name = path.to_string_lossy();
    MIME_TYPES
        .iter()
        .find(|(ext, _)| name.ends_with(ext))
        .map(|(_, mime)| *mime)
        .unwrap_or(DEFAULT_MIME_TYPE)
}
