use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use scraper::{Html, Selector};
use serde::Deserialize;
use tokio::task::spawn_blocking;

use super::Engine;
use crate::{Error, Result};

/// Google embeds full size results as `["https://...",height,width]`.
static GOOGLE_IMAGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\["(https?://[^"]+?)",(\d+),(\d+)\]"#).expect("valid regex")
});
static UNICODE_ESCAPE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\u([0-9a-fA-F]{4})").expect("valid regex"));

/// Metadata Bing stores as JSON in the `m` attribute of each result anchor.
#[derive(Debug, Deserialize)]
struct BingResultMeta {
    murl: String,
}

/// Extracts full size image URLs from a results page, in page order.
/// Parsing runs on the blocking pool since `Html` is not `Send`.
pub(crate) async fn parse_image_urls(engine: Engine, html: String) -> Result<Vec<String>> {
    let urls = spawn_blocking(move || -> Result<Vec<String>> {
        match engine {
            Engine::Bing => parse_bing(&html),
            Engine::Google => Ok(parse_google(&html)),
        }
    })
    .await??;

    Ok(urls)
}

fn parse_bing(html: &str) -> Result<Vec<String>> {
    let doc = Html::parse_document(html);
    let anchor_selector = create_selector("a.iusc")?;

    let urls = doc
        .select(&anchor_selector)
        .filter_map(|anchor| anchor.value().attr("m"))
        .filter_map(|meta| serde_json::from_str::<BingResultMeta>(meta).ok())
        .map(|meta| meta.murl)
        .filter(|url| is_http_url(url))
        .collect();
    Ok(urls)
}

fn parse_google(html: &str) -> Vec<String> {
    GOOGLE_IMAGE_RE
        .captures_iter(html)
        .map(|caps| unescape_unicode(&caps[1]))
        // Thumbnails served by google itself, never the original.
        .filter(|url| is_http_url(url) && !url.contains("gstatic.com"))
        .collect()
}

#[inline]
fn create_selector(sel_str: &str) -> Result<Selector> {
    Selector::parse(sel_str).map_err(|_| Error::ParseMissingSelector(sel_str.into()))
}

#[inline]
fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Replaces `\u003d` style escapes found in inline scripts.
fn unescape_unicode(s: &str) -> String {
    UNICODE_ESCAPE_RE
        .replace_all(s, |caps: &Captures| {
            u32::from_str_radix(&caps[1], 16)
                .ok()
                .and_then(char::from_u32)
                .map(String::from)
                .unwrap_or_default()
        })
        .into_owned()
}
