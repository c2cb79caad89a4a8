use crate::{UrlError, UrlResult};
use std::path::{Path, PathBuf};

/// Punctuation (except `.`) and whitespace
///
/// A path segment is dropped when it is a substring of this string, which
/// covers empty segments (doubled or trailing slashes) and stray separator
/// runs such as `-` or `_`.
const ILLEGAL_PATH_CHARS: &str = "!\"#$%&'()*+,-/:;<=>?@[\\]^_`{|}~ \t\n\r\u{0b}\u{0c}";

/// Extension appended to pages whose URL does not carry one
const HTML_EXTENSION: &str = ".html";

/// Splits a tracked URL into the segments that survive path normalization
///
/// `.` and `..` are dropped too, so the derived path never leaves the root.
pub fn path_segments(url: &str) -> Vec<&str> {
    url.split('/')
        .filter(|segment| !ILLEGAL_PATH_CHARS.contains(segment))
        .filter(|segment| !matches!(*segment, "." | ".."))
        .collect()
}

/// Derives the output file path for a tracked URL
///
/// The URL is split on `/`, illegal segments are dropped, and the rest is
/// joined under `root`. `.html` is appended when the last segment has no `.`
/// or when the URL is a bare domain.
///
/// # Arguments
///
/// * `root` - The output root directory
/// * `url` - The scheme-less tracked URL
///
/// # Returns
///
/// * `Ok(PathBuf)` - The file to write
/// * `Err(UrlError::Empty)` - No segment survived normalization
///
/// # Examples
///
/// ```
/// use std::path::{Path, PathBuf};
/// use sumi_mirror::url::derive_output_path;
///
/// let root = Path::new("data");
/// assert_eq!(
///     derive_output_path(root, "example.com").unwrap(),
///     PathBuf::from("data/example.com.html")
/// );
/// assert_eq!(
///     derive_output_path(root, "example.com/a/b").unwrap(),
///     PathBuf::from("data/example.com/a/b.html")
/// );
/// assert_eq!(
///     derive_output_path(root, "example.com/a/b.json").unwrap(),
///     PathBuf::from("data/example.com/a/b.json")
/// );
/// ```
pub fn derive_output_path(root: &Path, url: &str) -> UrlResult<PathBuf> {
    let segments = path_segments(url);

    let (last, parents) = segments
        .split_last()
        .ok_or_else(|| UrlError::Empty(url.to_string()))?;

    let mut path = root.to_path_buf();
    for segment in parents {
        path.push(segment);
    }

    if !last.contains('.') || segments.len() == 1 {
        path.push(format!("{}{}", last, HTML_EXTENSION));
    } else {
        path.push(last);
    }

    Ok(path)
}
