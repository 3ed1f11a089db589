//! Archive link discovery
//!
//! Operators publish their archives as links on an index page. Two kinds of
//! index are supported:
//!
//! - [`IndexKind::Html`]: a plain page whose `<a href>` elements point at the
//!   archives. The page is polled until it lists at least one link.
//! - [`IndexKind::S3Listing`]: the `index.html` viewer of a public S3 bucket.
//!   The viewer only renders links with JavaScript, so the bucket's
//!   ListObjects XML is read directly instead.
//!
//! Discovery never fails: on timeout or HTTP errors it logs a warning and
//! returns whatever links it has collected.

use crate::config::IngestConfig;
use crate::error::{IngestError, Result};
use async_trait::async_trait;
use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;
use reqwest::Client;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use url::Url;

/// How an operator's index page lists its archives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexKind {
    #[default]
    Html,
    S3Listing,
}

/// Finds archive URLs on an operator's index page
#[async_trait]
pub trait LinkDiscoverer: Send + Sync {
    /// Absolute URLs on `index_url` matching `pattern`, de-duplicated, in no
    /// particular order.
    async fn discover_links(&self, index_url: &str, pattern: &Regex, timeout: Duration)
        -> Vec<String>;
}

/// Build the discoverer for an index kind
pub fn discoverer_for(
    kind: IndexKind,
    client: Client,
    config: &IngestConfig,
) -> Box<dyn LinkDiscoverer> {
    match kind {
        IndexKind::Html => Box::new(HtmlIndexDiscoverer::new(
            client,
            config.discovery_poll_interval(),
        )),
        IndexKind::S3Listing => Box::new(S3ListingDiscoverer::new(client)),
    }
}

async fn fetch_text(client: &Client, url: Url) -> Result<String> {
    let response = client.get(url.clone()).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(IngestError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    Ok(response.text().await?)
}

// ============================================================================
// HTML Index Pages
// ============================================================================

/// Reads `<a href>` links from an HTML index page
pub struct HtmlIndexDiscoverer {
    client: Client,
    poll_interval: Duration,
}

impl HtmlIndexDiscoverer {
    pub fn new(client: Client, poll_interval: Duration) -> Self {
        Self {
            client,
            poll_interval,
        }
    }
}

#[async_trait]
impl LinkDiscoverer for HtmlIndexDiscoverer {
    async fn discover_links(
        &self,
        index_url: &str,
        pattern: &Regex,
        timeout: Duration,
    ) -> Vec<String> {
        let base = match Url::parse(index_url) {
            Ok(url) => url,
            Err(e) => {
                warn!(url = %index_url, error = %e, "Invalid index URL");
                return Vec::new();
            },
        };

        let deadline = Instant::now() + timeout;
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            match tokio::time::timeout_at(deadline, fetch_text(&self.client, base.clone())).await {
                Ok(Ok(body)) => {
                    let hrefs = extract_hrefs(&body);
                    if !hrefs.is_empty() {
                        debug!(url = %base, anchors = hrefs.len(), attempt, "Index page loaded");
                        let links = resolve_links(&base, &hrefs, pattern);
                        info!(url = %base, count = links.len(), "Discovered archive links");
                        return links;
                    }
                    debug!(url = %base, attempt, "Index page lists no links yet");
                },
                Ok(Err(e)) => {
                    debug!(url = %base, attempt, error = %e, "Index page fetch failed");
                },
                Err(_) => break,
            }

            if Instant::now() + self.poll_interval >= deadline {
                break;
            }
            tokio::time::sleep(self.poll_interval).await;
        }

        warn!(
            url = %base,
            timeout_secs = timeout.as_secs_f64(),
            "Timed out waiting for index page links"
        );
        Vec::new()
    }
}

/// Raw `href` values of every anchor in a document
pub fn extract_hrefs(body: &str) -> Vec<String> {
    let document = Html::parse_document(body);
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|anchor| anchor.value().attr("href"))
        .map(|href| href.trim().to_string())
        .filter(|href| !href.is_empty())
        .collect()
}

/// Resolve hrefs against the page URL and keep http(s) links matching `pattern`
fn resolve_links(base: &Url, hrefs: &[String], pattern: &Regex) -> Vec<String> {
    let links: BTreeSet<String> = hrefs
        .iter()
        .filter_map(|href| base.join(href).ok())
        .filter(|url| matches!(url.scheme(), "http" | "https"))
        .map(String::from)
        .filter(|url| pattern.is_match(url))
        .inspect(|url| debug!(%url, "Found archive link"))
        .collect();

    links.into_iter().collect()
}

// ============================================================================
// S3 Bucket Listings
// ============================================================================

/// Lists archives of a public S3 bucket through its ListObjects XML
pub struct S3ListingDiscoverer {
    client: Client,
}

/// One page of a ListObjects response
#[derive(Debug, Default, PartialEq)]
pub struct ListingPage {
    pub keys: Vec<String>,
    pub is_truncated: bool,
    pub next_marker: Option<String>,
}

impl S3ListingDiscoverer {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Collect every key of the bucket, following `marker` pagination
    async fn list_keys(&self, bucket_url: &Url, keys: &mut Vec<String>) -> Result<()> {
        let mut marker: Option<String> = None;

        loop {
            let mut url = bucket_url.clone();
            if let Some(ref m) = marker {
                url.query_pairs_mut().append_pair("marker", m);
            }

            let page = parse_listing(&fetch_text(&self.client, url).await?)?;
            debug!(url = %bucket_url, keys = page.keys.len(), "Fetched bucket listing page");

            let last_key = page.keys.last().cloned();
            keys.extend(page.keys);

            if !page.is_truncated {
                return Ok(());
            }

            marker = match page.next_marker.or(last_key) {
                Some(next) if marker.as_ref() != Some(&next) => Some(next),
                _ => {
                    warn!(url = %bucket_url, "Truncated bucket listing without a usable marker");
                    return Ok(());
                },
            };
        }
    }
}

#[async_trait]
impl LinkDiscoverer for S3ListingDiscoverer {
    async fn discover_links(
        &self,
        index_url: &str,
        pattern: &Regex,
        timeout: Duration,
    ) -> Vec<String> {
        // The viewer page lives at the bucket root
        let bucket_url = match Url::parse(index_url).and_then(|url| url.join("./")) {
            Ok(url) => url,
            Err(e) => {
                warn!(url = %index_url, error = %e, "Invalid index URL");
                return Vec::new();
            },
        };

        let mut keys = Vec::new();
        match tokio::time::timeout(timeout, self.list_keys(&bucket_url, &mut keys)).await {
            Ok(Ok(())) => {},
            Ok(Err(e)) => {
                warn!(url = %bucket_url, error = %e, collected = keys.len(), "Bucket listing failed");
            },
            Err(_) => {
                warn!(
                    url = %bucket_url,
                    timeout_secs = timeout.as_secs_f64(),
                    collected = keys.len(),
                    "Timed out listing bucket"
                );
            },
        }

        let links = resolve_links(&bucket_url, &keys, pattern);
        info!(url = %bucket_url, count = links.len(), "Discovered archive links");
        links
    }
}

/// Parse a ListObjects (v1) XML response
pub fn parse_listing(xml: &str) -> Result<ListingPage> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut page = ListingPage::default();
    let mut element: Option<Vec<u8>> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| IngestError::parse(format!("Bucket listing XML: {e}")))?;

        match event {
            Event::Start(e) => element = Some(e.local_name().as_ref().to_vec()),
            Event::End(_) => element = None,
            Event::Text(text) => {
                let Some(ref name) = element else { continue };
                let value = text
                    .unescape()
                    .map_err(|e| IngestError::parse(format!("Bucket listing XML: {e}")))?
                    .into_owned();

                match name.as_slice() {
                    b"Key" => page.keys.push(value),
                    b"IsTruncated" => page.is_truncated = value.eq_ignore_ascii_case("true"),
                    b"NextMarker" => page.next_marker = Some(value),
                    _ => {},
                }
            },
            Event::Eof => break,
            _ => {},
        }
    }

    Ok(page)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn zip_pattern() -> Regex {
        Regex::new(r"\.zip$").unwrap()
    }

    #[test]
    fn test_extract_hrefs() {
        let body = r#"
            <html><body>
              <a href="2021-trips.zip">2021</a>
              <a>no href</a>
              <a href=" /files/2020-trips.zip ">2020</a>
              <a href="">empty</a>
            </body></html>
        "#;

        assert_eq!(
            extract_hrefs(body),
            vec!["2021-trips.zip".to_string(), "/files/2020-trips.zip".to_string()]
        );
    }

    #[test]
    fn test_resolve_links_filters_and_dedupes() {
        let base = Url::parse("https://example.com/about/data/").unwrap();
        let hrefs = vec![
            "q1.zip".to_string(),
            "https://cdn.example.com/q2.zip".to_string(),
            "q1.zip".to_string(),
            "readme.pdf".to_string(),
            "mailto:data@example.com".to_string(),
        ];

        let links = resolve_links(&base, &hrefs, &zip_pattern());
        assert_eq!(
            links,
            vec![
                "https://cdn.example.com/q2.zip".to_string(),
                "https://example.com/about/data/q1.zip".to_string(),
            ]
        );
    }

    #[test]
    fn test_parse_listing() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
            <ListBucketResult xmlns="http://s3.amazonaws.com/doc/2006-03-01/">
              <Name>tripdata</Name>
              <IsTruncated>true</IsTruncated>
              <NextMarker>201402-citibike-tripdata.zip</NextMarker>
              <Contents><Key>201401-citibike-tripdata.zip</Key><Size>1</Size></Contents>
              <Contents><Key>201402-citibike-tripdata.zip</Key><Size>2</Size></Contents>
              <Contents><Key>index.html</Key><Size>3</Size></Contents>
            </ListBucketResult>"#;

        let page = parse_listing(xml).unwrap();
        assert_eq!(page.keys.len(), 3);
        assert_eq!(page.keys[0], "201401-citibike-tripdata.zip");
        assert!(page.is_truncated);
        assert_eq!(page.next_marker.as_deref(), Some("201402-citibike-tripdata.zip"));
    }

    #[test]
    fn test_parse_listing_unescapes_keys() {
        let xml = "<ListBucketResult><IsTruncated>false</IsTruncated>\
                   <Contents><Key>JC &amp; NJ.zip</Key></Contents></ListBucketResult>";

        let page = parse_listing(xml).unwrap();
        assert_eq!(page.keys, vec!["JC & NJ.zip".to_string()]);
        assert!(!page.is_truncated);
    }

    #[test]
    fn test_index_kind_default_is_html() {
        assert_eq!(IndexKind::default(), IndexKind::Html);
    }
}
