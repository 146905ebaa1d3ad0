use reqwest::Client;

use super::{Engine, SizeFilter};
use crate::{info_time, Error, Result};

const BING_URL: &str = "https://www.bing.com/images/async";
const GOOGLE_URL: &str = "https://www.google.com/search";
/// Bing hands out at most 35 results per async page.
const BING_PAGE_SIZE: usize = 35;
const GOOGLE_PAGE_SIZE: usize = 100;

impl SizeFilter {
    fn bing_filter(&self) -> &'static str {
        match self {
            SizeFilter::Large => "+filterui:imagesize-large",
        }
    }

    fn google_filter(&self) -> &'static str {
        match self {
            SizeFilter::Large => "isz:l",
        }
    }
}

/// Returns the endpoint and query parameters for result page `page` (0 based).
pub(crate) fn results_page_query(
    engine: Engine,
    keyword: &str,
    size: SizeFilter,
    page: usize,
) -> (&'static str, Vec<(&'static str, String)>) {
    match engine {
        Engine::Bing => (
            BING_URL,
            vec![
                ("q", keyword.to_string()),
                ("first", (page * BING_PAGE_SIZE).to_string()),
                ("count", BING_PAGE_SIZE.to_string()),
                ("qft", size.bing_filter().to_string()),
                ("adlt", "off".to_string()),
            ],
        ),
        Engine::Google => (
            GOOGLE_URL,
            vec![
                ("q", keyword.to_string()),
                ("tbm", "isch".to_string()),
                ("tbs", size.google_filter().to_string()),
                ("ijn", page.to_string()),
                ("start", (page * GOOGLE_PAGE_SIZE).to_string()),
            ],
        ),
    }
}

/// Requests a results page and returns a `Result<String>` containing the HTML.
pub(crate) async fn request_results_page(
    client: &Client,
    engine: Engine,
    keyword: &str,
    size: SizeFilter,
    page: usize,
) -> Result<String> {
    let (url, params) = results_page_query(engine, keyword, size, page);
    info_time!("Requesting {} results page: {}", engine, page);

    let res = client.get(url).query(&params).send().await?;
    let status = res.status();
    if !status.is_success() {
        return Err(Error::UnexpectedStatus {
            url: res.url().to_string(),
            status,
        });
    }
    let html = res.text().await?;
    Ok(html)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn param<'a>(params: &'a [(&'static str, String)], key: &str) -> &'a str {
        params
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
            .unwrap()
    }

    #[test]
    fn bing_pages_by_offset_with_size_filter() {
        let (url, params) = results_page_query(Engine::Bing, "Zion", SizeFilter::Large, 2);
        assert_eq!(url, BING_URL);
        assert_eq!(param(&params, "q"), "Zion");
        assert_eq!(param(&params, "first"), "70");
        assert_eq!(param(&params, "qft"), "+filterui:imagesize-large");
    }

    #[test]
    fn google_pages_by_index_with_size_filter() {
        let (url, params) = results_page_query(Engine::Google, "Zion", SizeFilter::Large, 1);
        assert_eq!(url, GOOGLE_URL);
        assert_eq!(param(&params, "tbm"), "isch");
        assert_eq!(param(&params, "tbs"), "isz:l");
        assert_eq!(param(&params, "ijn"), "1");
        assert_eq!(param(&params, "start"), "100");
    }
}
