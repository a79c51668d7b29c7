//! MIME type detection utilities

/// Fallback content type for binary data of unknown kind.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Guess MIME by inspecting bytes (magic numbers)
pub fn guess_mime_from_bytes(bytes: &[u8]) -> Option<String> {
    infer::get(bytes).map(|k| k.mime_type().to_string())
}

/// Guess MIME by file path (extension-based)
pub fn guess_mime_from_path(path: &std::path::Path) -> Option<String> {
    mime_guess::from_path(path).first_raw().map(|s| s.to_string())
}

/// Combined guess: prefer bytes, fall back to extension, otherwise octet-stream
pub fn guess_mime(bytes: Option<&[u8]>, path: Option<&std::path::Path>) -> String {
    if let Some(b) = bytes
        && let Some(m) = guess_mime_from_bytes(b)
    {
        return m;
    }
    if let Some(p) = path
        && let Some(m) = guess_mime_from_path(p)
    {
        return m;
    }
    OCTET_STREAM.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn guesses_from_magic_bytes_first() {
        let png = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
        assert_eq!(guess_mime(Some(&png), Some(Path::new("a.txt"))), "image/png");
    }

    #[test]
    fn falls_back_to_extension_then_octet_stream() {
        assert_eq!(guess_mime(None, Some(Path::new("notes.txt"))), "text/plain");
        assert_eq!(guess_mime(Some(b"??"), None), OCTET_STREAM);
    }
}
