//! Shared helpers for ingest integration tests

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use opendata_ingest::config::IngestConfig;
use std::io::{Cursor, Write};
use std::path::Path;

/// Build a zip archive in memory. Names ending in `/` become directories.
pub fn zip_archive(members: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default();

    for (name, content) in members {
        if name.ends_with('/') {
            writer
                .add_directory(*name, options)
                .expect("Failed to add directory");
            continue;
        }
        writer.start_file(*name, options).expect("Failed to start file");
        writer
            .write_all(content.as_bytes())
            .expect("Failed to write file");
    }

    writer.finish().expect("Failed to finish archive").into_inner()
}

/// Fast-failing configuration rooted at `data_dir`
pub fn test_config(data_dir: &Path) -> IngestConfig {
    IngestConfig::builder()
        .data_dir(data_dir)
        .concurrency(2)
        .request_timeout_secs(10)
        .max_retries(1)
        .discovery_timeout_secs(2)
        .discovery_poll_interval_ms(50)
        .build()
}

/// HTML page with one anchor per href
pub fn index_page(hrefs: &[&str]) -> String {
    let anchors: String = hrefs
        .iter()
        .map(|href| format!("<li><a href=\"{href}\">{href}</a></li>\n"))
        .collect();
    format!("<html><body><h1>System Data</h1><ul>\n{anchors}</ul></body></html>")
}
