//! Integration tests for archive link discovery

mod common;

use common::index_page;
use opendata_ingest::discovery::{HtmlIndexDiscoverer, LinkDiscoverer, S3ListingDiscoverer};
use regex::Regex;
use std::time::{Duration, Instant};
use wiremock::{
    matchers::{method, path, query_param, query_param_is_missing},
    Mock, MockServer, ResponseTemplate,
};

fn zip_pattern() -> Regex {
    Regex::new(r"\.zip$").unwrap()
}

fn html_discoverer() -> HtmlIndexDiscoverer {
    HtmlIndexDiscoverer::new(reqwest::Client::new(), Duration::from_millis(50))
}

fn listing(keys: &[&str], next_marker: Option<&str>) -> String {
    let contents: String = keys
        .iter()
        .map(|key| format!("<Contents><Key>{key}</Key><Size>1024</Size></Contents>"))
        .collect();
    let truncation = match next_marker {
        Some(marker) => format!("<IsTruncated>true</IsTruncated><NextMarker>{marker}</NextMarker>"),
        None => "<IsTruncated>false</IsTruncated>".to_string(),
    };

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<ListBucketResult xmlns="http://s3.amazonaws.com/doc/2006-03-01/"><Name>tripdata</Name>{truncation}{contents}</ListBucketResult>"#
    )
}

#[tokio::test]
async fn test_html_index_resolves_relative_links() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/about/data/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(index_page(&[
            "indego-trips-2021-q1.zip",
            "/wp-content/uploads/indego-stations.zip",
            "https://cdn.example.com/indego-trips-2020-q4.zip",
            "indego-trips-2021-q1.zip",
            "terms.pdf",
        ])))
        .mount(&mock_server)
        .await;

    let index_url = format!("{}/about/data/", mock_server.uri());
    let mut links = html_discoverer()
        .discover_links(&index_url, &zip_pattern(), Duration::from_secs(2))
        .await;
    links.sort();

    let mut expected = vec![
        format!("{}/about/data/indego-trips-2021-q1.zip", mock_server.uri()),
        format!("{}/wp-content/uploads/indego-stations.zip", mock_server.uri()),
        "https://cdn.example.com/indego-trips-2020-q4.zip".to_string(),
    ];
    expected.sort();
    assert_eq!(links, expected);
}

#[tokio::test]
async fn test_html_index_without_links_times_out_empty() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><body>Loading...</body></html>"))
        .mount(&mock_server)
        .await;

    let started = Instant::now();
    let links = html_discoverer()
        .discover_links(
            &format!("{}/data", mock_server.uri()),
            &zip_pattern(),
            Duration::from_millis(500),
        )
        .await;

    assert!(links.is_empty());
    assert!(started.elapsed() >= Duration::from_millis(400));
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_html_index_waits_for_links() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .up_to_n_times(2)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/data"))
        .respond_with(ResponseTemplate::new(200).set_body_string(index_page(&["2022.zip"])))
        .mount(&mock_server)
        .await;

    let links = html_discoverer()
        .discover_links(
            &format!("{}/data", mock_server.uri()),
            &zip_pattern(),
            Duration::from_secs(5),
        )
        .await;

    assert_eq!(links, vec![format!("{}/2022.zip", mock_server.uri())]);
}

#[tokio::test]
async fn test_html_index_error_status_yields_no_links() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&mock_server)
        .await;

    let links = html_discoverer()
        .discover_links(
            &format!("{}/about/data/", mock_server.uri()),
            &zip_pattern(),
            Duration::from_millis(300),
        )
        .await;

    assert!(links.is_empty());
}

#[tokio::test]
async fn test_s3_listing_follows_markers() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tripdata/"))
        .and(query_param_is_missing("marker"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing(
            &["201306-citibike-tripdata.zip", "index.html"],
            Some("index.html"),
        )))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/tripdata/"))
        .and(query_param("marker", "index.html"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(listing(&["JC-201509-citibike-tripdata.csv.zip"], None)),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let links = S3ListingDiscoverer::new(reqwest::Client::new())
        .discover_links(
            &format!("{}/tripdata/index.html", mock_server.uri()),
            &zip_pattern(),
            Duration::from_secs(2),
        )
        .await;

    assert_eq!(
        links,
        vec![
            format!("{}/tripdata/201306-citibike-tripdata.zip", mock_server.uri()),
            format!("{}/tripdata/JC-201509-citibike-tripdata.csv.zip", mock_server.uri()),
        ]
    );
}

#[tokio::test]
async fn test_s3_listing_failure_keeps_collected_links() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/bucket/"))
        .and(query_param_is_missing("marker"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(listing(&["2019.zip"], Some("2019.zip"))),
        )
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/bucket/"))
        .and(query_param("marker", "2019.zip"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let links = S3ListingDiscoverer::new(reqwest::Client::new())
        .discover_links(
            &format!("{}/bucket/index.html", mock_server.uri()),
            &zip_pattern(),
            Duration::from_secs(2),
        )
        .await;

    assert_eq!(links, vec![format!("{}/bucket/2019.zip", mock_server.uri())]);
}
