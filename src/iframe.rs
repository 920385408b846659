//! Iframe embeds for articles.
//!
//! An article can embed either a stored document or an external URL:
//!
//! - `iframe_document` wins when set; documents are served from the site's
//!   own media directory and are always allowed.
//! - `iframe_src` is `"<url>"` or `"<url> <css height>"`. The URL must start
//!   with one of `iframe.allowed_sources`; anything else is dropped.
//!
//! Height comes from the first non-empty of `iframe_height`, the height in
//! `iframe_src`, and `iframe.default_height`.

use crate::config::{IframeConfig, SiteConfig};
use crate::model::{Article, Document};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IframeEmbed {
    /// Site-relative for documents, absolute for external sources.
    pub src: String,
    pub height: String,
    /// Served from the site's media directory.
    pub local: bool,
}

impl IframeEmbed {
    /// The `src` attribute to render, with `base_url` applied to local documents.
    pub fn href(&self, config: &SiteConfig) -> String {
        if self.local {
            config.url(&self.src)
        } else {
            self.src.clone()
        }
    }
}

/// Split `"<url> <height>"` into its parts. The height is optional.
pub fn split_iframe_src(value: &str) -> (&str, Option<&str>) {
    let mut parts = value.split_whitespace();
    let src = parts.next().unwrap_or("");
    (src, parts.next())
}

pub fn is_allowed(src: &str, allowed: &[String]) -> bool {
    allowed.iter().any(|prefix| src.starts_with(prefix.as_str()))
}

/// Work out what, if anything, an article embeds.
pub fn resolve_iframe(
    article: &Article,
    document: Option<&Document>,
    config: &IframeConfig,
) -> Option<IframeEmbed> {
    let (src, src_height) = split_iframe_src(&article.iframe_src);

    let local = document.is_some();
    let src = match document {
        Some(doc) => doc.url(),
        None if src.is_empty() => return None,
        None if is_allowed(src, &config.allowed_sources) => src.to_string(),
        None => {
            tracing::warn!(
                article = %article.slug,
                src,
                "iframe source not in allowed_sources, skipping embed"
            );
            return None;
        }
    };

    let height = [article.iframe_height.trim(), src_height.unwrap_or("")]
        .into_iter()
        .find(|h| !h.is_empty())
        .unwrap_or(config.default_height.as_str())
        .to_string();

    Some(IframeEmbed { src, height, local })
}
