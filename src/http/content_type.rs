use std::path::Path;

/// Resolves the Content-Type of a file from its extension.
///
/// Unknown or missing extensions resolve to `application/octet-stream`.
/// Textual types carry an explicit UTF-8 charset.
///
/// # Examples
///
/// ```
/// use tunfixture::content_type_for;
///
/// assert_eq!(content_type_for("data/foo/bar.zip"), "application/zip");
/// assert_eq!(content_type_for("index.html"), "text/html; charset=utf-8");
/// assert_eq!(content_type_for("blob"), "application/octet-stream");
/// ```
pub fn content_type_for(path: impl AsRef<Path>) -> String {
    let guessed = new_mime_guess::from_path(path).first_or_octet_stream();

    if guessed.type_() == mime::TEXT && guessed.get_param(mime::CHARSET).is_none() {
        format!("{}; charset=utf-8", guessed.essence_str())
    } else {
        guessed.to_string()
    }
}
