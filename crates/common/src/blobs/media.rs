use mime::Mime;

/// Extensions whose registered type differs from what download clients of
/// the store have always been sent.
const OVERRIDES: &[(&str, &str)] = &[
    ("iso", "application/x-iso9660-image"),
    ("img", "application/octet-stream"),
    ("c", "text/x-csrc"),
    ("h", "text/x-chdr"),
    ("cc", "text/x-c++src"),
    ("cpp", "text/x-c++src"),
    ("cxx", "text/x-c++src"),
    ("hh", "text/x-c++hdr"),
    ("hpp", "text/x-c++hdr"),
    ("doc", "application/msword"),
    ("diff", "text/x-diff"),
    ("patch", "text/x-diff"),
    ("log", "text/plain"),
    ("py", "text/x-python"),
    ("sh", "application/x-sh"),
];

/// Content type for an artifact, guessed from the extension of its key.
///
/// Unknown or missing extensions give `application/octet-stream`.
pub fn content_type(key: &str) -> Mime {
    let name = key.rsplit('/').next().unwrap_or(key);
    let Some((stem, ext)) = name.rsplit_once('.') else {
        return mime::APPLICATION_OCTET_STREAM;
    };
    if stem.is_empty() {
        return mime::APPLICATION_OCTET_STREAM;
    }

    let ext = ext.to_ascii_lowercase();
    OVERRIDES
        .iter()
        .find(|(known, _)| *known == ext)
        .and_then(|(_, value)| value.parse::<Mime>().ok())
        .unwrap_or_else(|| mime_guess::from_ext(&ext).first_or_octet_stream())
}
