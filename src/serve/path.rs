//! URL to filesystem path resolution.

use std::path::{Path, PathBuf};

use percent_encoding::percent_decode_str;

/// Resolve a request URL to a file under the serve root.
///
/// Directories resolve to their `index.html`. Anything that decodes to a
/// location outside the root is rejected.
pub fn resolve_path(url: &str, serve_root: &Path) -> Option<PathBuf> {
    let clean = normalize_url(url)?;
    let local = serve_root.join(&clean);

    // Canonicalize so neither symlinks nor encoded sequences can step
    // outside the output root
    let canonical = local.canonicalize().ok()?;
    let root_canonical = serve_root.canonicalize().ok()?;
    if !canonical.starts_with(&root_canonical) {
        return None;
    }

    if canonical.is_file() {
        return Some(canonical);
    }

    if canonical.is_dir() {
        let index = canonical.join("index.html");
        if index.is_file() {
            return Some(index);
        }
    }

    None
}

/// Percent-decode, strip the query string and surrounding slashes.
///
/// Returns `None` for URLs that still look like traversal after decoding.
fn normalize_url(url: &str) -> Option<String> {
    let decoded = percent_decode_str(url).decode_utf8().ok()?;
    let path = decoded.split('?').next().unwrap_or(&decoded);
    let path = path.trim_matches('/');

    if path.contains("..") {
        return None;
    }

    Some(path.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn site() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("blog")).unwrap();
        fs::write(dir.path().join("index.html"), "<html></html>").unwrap();
        fs::write(dir.path().join("blog/index.html"), "<html></html>").unwrap();
        fs::write(dir.path().join("style.css"), "body{}").unwrap();
        dir
    }

    #[test]
    fn test_resolves_files_and_directory_indexes() {
        let dir = site();
        let root = dir.path();

        assert!(resolve_path("/", root).unwrap().ends_with("index.html"));
        assert!(
            resolve_path("/blog/", root)
                .unwrap()
                .ends_with("blog/index.html")
        );
        assert!(
            resolve_path("/style.css", root)
                .unwrap()
                .ends_with("style.css")
        );
    }

    #[test]
    fn test_query_string_is_ignored() {
        let dir = site();
        let resolved = resolve_path("/style.css?t=1234", dir.path()).unwrap();
        assert!(resolved.ends_with("style.css"));
    }

    #[test]
    fn test_rejects_traversal() {
        let dir = site();
        let root = dir.path();

        assert!(resolve_path("/../secret", root).is_none());
        assert!(resolve_path("/%2e%2e/secret", root).is_none());
    }

    #[test]
    fn test_missing_file_is_none() {
        let dir = site();
        assert!(resolve_path("/missing.html", dir.path()).is_none());
    }
}
