//! URL prefix allow-list for the public fetch proxy.

/// Set of URL prefixes permitted as proxy targets.
///
/// Matching is a plain prefix test on the raw URL string, so entries should
/// end with a path separator to avoid `http://host.evil` slipping past a
/// `http://host` entry.
#[derive(Debug, Clone, Default)]
pub struct UrlAllowList {
    prefixes: Vec<String>,
}

impl UrlAllowList {
    /// Build an allow-list from configured prefixes.
    pub fn new(prefixes: Vec<String>) -> Self {
        Self { prefixes }
    }

    /// Whether the URL starts with any allowed prefix.
    ///
    /// An empty allow-list permits nothing.
    pub fn permits(&self, url: &str) -> bool {
        self.prefixes.iter().any(|prefix| url.starts_with(prefix))
    }
}
