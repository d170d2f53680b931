//! Template Loading - resource name → fetched document → template fragment.
//!
//! ```text
//! resource ──resolve──► url ──fetch──► Document ──find <template>──► Template
//!                                │                  │
//!                          DocumentLoad     FragmentMissing / Import
//! ```
//!
//! Every failure names the URL and the module that asked for the template.
//! Nothing is retried.

use std::fmt;

use futures::future::LocalBoxFuture;
use tracing::debug;

use crate::error::TemplateError;
use super::loader::LoaderConfig;

// =============================================================================
// Documents
// =============================================================================

/// A fetched, importable markup document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    url: String,
    markup: String,
}

impl Document {
    pub fn new(url: impl Into<String>, markup: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            markup: markup.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn markup(&self) -> &str {
        &self.markup
    }

    /// Content of the first `<template>` element, nested templates included.
    ///
    /// Tag names match ASCII case-insensitively.
    fn template_fragment(&self) -> Result<&str, FragmentError> {
        let markup = self.markup.as_str();
        // ASCII lowering keeps every byte offset valid for `markup`
        let lower = markup.to_ascii_lowercase();

        let open = find_tag(&lower, 0, OPEN_TAG).ok_or(FragmentError::Missing)?;
        let body_start = after_tag(&lower, open).ok_or(FragmentError::Unterminated)?;

        let mut depth = 1usize;
        let mut from = body_start;
        loop {
            let close = find_tag(&lower, from, CLOSE_TAG).ok_or(FragmentError::Unterminated)?;
            match find_tag(&lower, from, OPEN_TAG) {
                Some(nested) if nested < close => {
                    depth += 1;
                    from = after_tag(&lower, nested).ok_or(FragmentError::Unterminated)?;
                }
                _ => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(&markup[body_start..close]);
                    }
                    from = after_tag(&lower, close).ok_or(FragmentError::Unterminated)?;
                }
            }
        }
    }
}

const OPEN_TAG: &str = "<template";
const CLOSE_TAG: &str = "</template";

/// Why a document's first `<template>` could not be cut out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FragmentError {
    Missing,
    Unterminated,
}

/// Position of the first `tag` at or after `from` that ends the tag name.
///
/// `<templates>` and friends are other elements.
fn find_tag(lower: &str, from: usize, tag: &str) -> Option<usize> {
    let mut from = from;
    loop {
        let start = from + lower[from..].find(tag)?;
        let after = start + tag.len();
        match lower[after..].chars().next() {
            Some(c) if c == '>' || c == '/' || c.is_ascii_whitespace() => return Some(start),
            _ => from = after,
        }
    }
}

/// Byte just past the `>` closing the tag that starts at `start`.
fn after_tag(lower: &str, start: usize) -> Option<usize> {
    lower[start..].find('>').map(|len| start + len + 1)
}

/// Fetches importable documents by URL.
///
/// Any error is reported as [`TemplateError::DocumentLoad`].
pub trait DocumentSource {
    fn fetch(&self, url: &str) -> LocalBoxFuture<'static, anyhow::Result<Document>>;
}

// =============================================================================
// Template
// =============================================================================

/// An imported template fragment, ready to be mounted into instances.
#[derive(Clone, PartialEq, Eq)]
pub struct Template {
    source_url: String,
    content: String,
}

impl Template {
    pub fn new(source_url: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into(),
            content: content.into(),
        }
    }

    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Template")
            .field("source_url", &self.source_url)
            .field("len", &self.content.len())
            .finish()
    }
}

// =============================================================================
// Resource Names
// =============================================================================

/// Split `resource` into path and `?query` / `#fragment` suffix.
pub(crate) fn split_suffix(resource: &str) -> (&str, &str) {
    match resource.find(['?', '#']) {
        Some(idx) => resource.split_at(idx),
        None => (resource, ""),
    }
}

/// Whether the last path segment of `resource` carries an extension.
pub fn has_extension(resource: &str) -> bool {
    let (path, _) = split_suffix(resource);
    let segment = path.rsplit('/').next().unwrap_or(path);
    segment
        .rfind('.')
        .is_some_and(|idx| idx > 0 && idx + 1 < segment.len())
}

/// Join a relative resource onto `base`. Absolute URLs and rooted paths pass
/// through.
pub fn resolve_url(base: &str, resource: &str) -> String {
    if base.is_empty() || resource.starts_with('/') || resource.contains("://") {
        return resource.to_string();
    }
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        resource.trim_start_matches("./")
    )
}

/// URL the template for `resource` is fetched from.
///
/// A bare name gets the configured extension, inserted before any query or
/// fragment.
pub fn template_url(config: &LoaderConfig, resource: &str) -> String {
    let named = if has_extension(resource) {
        resource.to_string()
    } else {
        let (path, suffix) = split_suffix(resource);
        format!("{path}.{}{suffix}", config.template_extension)
    };
    resolve_url(&config.base_url, &named)
}

// =============================================================================
// Load
// =============================================================================

/// Load the template for `resource` on behalf of module `requester`.
pub async fn load_template(
    documents: &dyn DocumentSource,
    config: &LoaderConfig,
    resource: &str,
    requester: &str,
) -> Result<Template, TemplateError> {
    let url = template_url(config, resource);
    debug!(url = %url, module = requester, "loading template");

    let document = documents
        .fetch(&url)
        .await
        .map_err(|reason| TemplateError::DocumentLoad {
            url: url.clone(),
            module: requester.to_string(),
            reason,
        })?;

    match document.template_fragment() {
        Ok(content) => {
            debug!(url = %url, module = requester, "template loaded");
            Ok(Template::new(document.url(), content))
        }
        Err(FragmentError::Missing) => Err(TemplateError::FragmentMissing {
            url,
            module: requester.to_string(),
        }),
        Err(FragmentError::Unterminated) => Err(TemplateError::Import {
            url,
            module: requester.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;
    use futures::future::FutureExt;

    use super::*;

    struct OneDocument(&'static str, &'static str);

    impl DocumentSource for OneDocument {
        fn fetch(&self, url: &str) -> LocalBoxFuture<'static, anyhow::Result<Document>> {
            let result = if url == self.0 {
                Ok(Document::new(url, self.1))
            } else {
                Err(anyhow::anyhow!("404 {url}"))
            };
            async move { result }.boxed_local()
        }
    }

    fn config() -> LoaderConfig {
        LoaderConfig::default()
    }

    #[test]
    fn test_has_extension() {
        assert!(has_extension("a/b.html"));
        assert!(has_extension("b.js?x=1"));
        assert!(!has_extension("a.d/b"));
        assert!(!has_extension("b?x=a.b"));
        assert!(!has_extension(".hidden"));
    }

    #[test]
    fn test_template_url() {
        let cfg = config();
        assert_eq!(template_url(&cfg, "Widgets/Bar"), "Widgets/Bar.html");
        assert_eq!(template_url(&cfg, "Widgets/Bar.tpl"), "Widgets/Bar.tpl");
        assert_eq!(template_url(&cfg, "Bar?v=2"), "Bar.html?v=2");

        let cfg = config().with_base_url("https://x.test/c/");
        assert_eq!(template_url(&cfg, "./Bar"), "https://x.test/c/Bar.html");
        assert_eq!(template_url(&cfg, "/abs/Bar"), "/abs/Bar.html");
    }

    #[test]
    fn test_load_template_success() {
        let docs = OneDocument("Bar.html", "<p>x</p><template id=\"t\"><div></div></template>");
        let tpl = block_on(load_template(&docs, &config(), "Bar", "Bar.js")).unwrap();

        assert_eq!(tpl.content(), "<div></div>");
        assert_eq!(tpl.source_url(), "Bar.html");
    }

    #[test]
    fn test_load_template_fetch_failure() {
        let docs = OneDocument("Other.html", "");
        let err = block_on(load_template(&docs, &config(), "Bar", "Bar.js")).unwrap_err();

        match err {
            TemplateError::DocumentLoad { url, module, .. } => {
                assert_eq!(url, "Bar.html");
                assert_eq!(module, "Bar.js");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_load_template_missing_fragment() {
        let docs = OneDocument("Bar.html", "<templates></templates><div></div>");
        let err = block_on(load_template(&docs, &config(), "Bar", "Bar.js")).unwrap_err();

        assert!(matches!(err, TemplateError::FragmentMissing { .. }));
        assert!(err.to_string().contains("\"Bar.js\""));
    }

    #[test]
    fn test_load_template_unterminated_fragment() {
        let docs = OneDocument("Bar.html", "<template><div>");
        let err = block_on(load_template(&docs, &config(), "Bar", "Bar.js")).unwrap_err();

        assert!(matches!(err, TemplateError::Import { .. }));
    }

    #[test]
    fn test_nested_template_kept_whole() {
        let docs = OneDocument(
            "List.html",
            "<template><ul><template><li></li></template></ul></template><p>after</p>",
        );
        let tpl = block_on(load_template(&docs, &config(), "List", "List.js")).unwrap();

        assert_eq!(tpl.content(), "<ul><template><li></li></template></ul>");
    }

    #[test]
    fn test_nested_template_unclosed_outer() {
        let docs = OneDocument("List.html", "<template><template></template>");
        let err = block_on(load_template(&docs, &config(), "List", "List.js")).unwrap_err();

        assert!(matches!(err, TemplateError::Import { .. }));
    }

    #[test]
    fn test_uppercase_template_tag() {
        let docs = OneDocument("Bar.html", "<TEMPLATE class=\"T\"><DIV>Hi</DIV></Template >");
        let tpl = block_on(load_template(&docs, &config(), "Bar", "Bar.js")).unwrap();

        assert_eq!(tpl.content(), "<DIV>Hi</DIV>");
    }
}
