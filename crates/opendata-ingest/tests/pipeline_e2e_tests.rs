//! End-to-end tests for a market run against a mock operator
//!
//! Each test serves an index page and zip archives from a mock server and
//! runs the whole pipeline: discovery, caching, ingestion, normalization,
//! and station enrichment.

mod common;

use chrono::NaiveDate;
use common::{index_page, test_config, zip_archive};
use opendata_ingest::discovery::IndexKind;
use opendata_ingest::markets::{MarketConfig, DEFAULT_LINK_PATTERN};
use opendata_ingest::output::{write_raw_csv, write_trips_csv};
use opendata_ingest::pipeline::MarketPipeline;
use opendata_ingest::schema::{StationColumnSources, TripColumnSources};
use std::collections::BTreeSet;
use std::num::NonZeroUsize;
use tempfile::TempDir;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

fn market(server: &MockServer, with_stations: bool) -> MarketConfig {
    MarketConfig {
        name: "mockride".to_string(),
        data_url: format!("{}/system-data/", server.uri()),
        info_url: format!("{}/system-data/", server.uri()),
        license_url: format!("{}/license", server.uri()),
        license_name: "Mock License".to_string(),
        index_kind: IndexKind::Html,
        link_pattern: DEFAULT_LINK_PATTERN.to_string(),
        trip_columns: TripColumnSources {
            ride_id: &["ride_id", "trip_id"],
            started_at: &["start_time", "started_at"],
            ended_at: &["end_time", "ended_at"],
            start_station_id: &["start_station_id"],
            end_station_id: &["end_station_id"],
            start_station_name: &["start_station_name"],
            start_lat: &["start_lat"],
            end_lat: &["end_lat"],
            user_type: &["usertype", "member_casual"],
            ..Default::default()
        }
        .into_specs(),
        station_columns: with_stations.then(|| {
            StationColumnSources {
                station_id: &["Station_ID"],
                name: &["Station_Name"],
                lat: &["Latitude"],
                lng: &["Longitude"],
                ..Default::default()
            }
            .into_specs()
        }),
        ignore_columns: ["tripduration".to_string()].into_iter().collect(),
    }
}

async fn serve(server: &MockServer, route: &str, body: Vec<u8>) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
        .mount(server)
        .await;
}

fn sample_rate(n: usize) -> NonZeroUsize {
    NonZeroUsize::new(n).unwrap()
}

#[tokio::test]
async fn test_renamed_columns_fold_into_one_table() {
    let mock_server = MockServer::start().await;

    serve(
        &mock_server,
        "/system-data/",
        index_page(&["2019.zip", "2021.zip", "missing.zip", "README.pdf"]).into_bytes(),
    )
    .await;
    serve(
        &mock_server,
        "/system-data/2019.zip",
        zip_archive(&[
            (
                "Divvy_Trips_2019_Q1.csv",
                "trip_id,start_time,end_time,usertype,tripduration\n\
                 1,2019-01-01 00:04:37,2019-01-01 00:11:07,Subscriber,390\n\
                 2,2019-01-01 00:08:13,2019-01-01 00:15:34,Customer,441\n\
                 3,,2019-01-01 00:20:00,Subscriber,10\n",
            ),
            ("__MACOSX/._Divvy_Trips_2019_Q1.csv", "junk"),
            ("README.txt", "not data"),
        ]),
    )
    .await;
    serve(
        &mock_server,
        "/system-data/2021.zip",
        zip_archive(&[
            ("202106/", ""),
            (
                "202106/202106-divvy-tripdata.csv",
                "ride_id,started_at,ended_at,member_casual,rideable_type\n\
                 ABC,2021-06-01 12:00:00,2021-06-01 12:30:00,member,docked_bike\n",
            ),
        ]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/system-data/missing.zip"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let pipeline = MarketPipeline::new(test_config(dir.path()), market(&mock_server, false));
    let output = pipeline.run(sample_rate(1)).await.unwrap();

    assert_eq!(output.stats.links_found, 3);
    assert_eq!(output.stats.archives_downloaded, 2);
    assert_eq!(output.stats.archives_unavailable, 1);
    assert_eq!(output.stats.trip_files, 2);
    assert_eq!(output.stats.trips_dropped, 1);
    assert!(output.stations.is_empty());

    let mut trips = output.trips;
    trips.sort_by_key(|t| t.started_at);
    assert_eq!(trips.len(), 3);

    let ids: Vec<Option<&str>> = trips.iter().map(|t| t.ride_id.as_deref()).collect();
    assert_eq!(ids, vec![Some("1"), Some("2"), Some("ABC")]);
    assert_eq!(
        trips[0].started_at,
        NaiveDate::from_ymd_opt(2019, 1, 1)
            .unwrap()
            .and_hms_opt(0, 4, 37)
    );
    assert_eq!(trips[0].user_type.as_deref(), Some("member"));
    assert_eq!(trips[1].user_type.as_deref(), Some("casual"));
    assert_eq!(trips[2].user_type.as_deref(), Some("member"));
    // Not part of this market's schema
    assert_eq!(trips[2].rideable_type, None);
    assert!(trips.iter().all(|t| t.started_at.is_some()));

    let out = dir.path().join("mockride.csv");
    write_trips_csv(&out, &trips).unwrap();
    let written = std::fs::read_to_string(out).unwrap();
    assert_eq!(written.lines().count(), 4);
}

#[tokio::test]
async fn test_station_table_enriches_trips() {
    let mock_server = MockServer::start().await;

    serve(
        &mock_server,
        "/system-data/",
        index_page(&["trips.zip", "stations.zip"]).into_bytes(),
    )
    .await;
    serve(
        &mock_server,
        "/system-data/trips.zip",
        zip_archive(&[(
            "indego-trips-2022-q1.csv",
            "trip_id,start_time,end_time,start_station_id,end_station_id,start_lat,end_lat\n\
             1,2022-01-01 00:00:00,2022-01-01 00:10:00,S,T,,\n\
             2,2022-01-01 01:00:00,2022-01-01 01:10:00,S,T,20,\n",
        )]),
    )
    .await;
    serve(
        &mock_server,
        "/system-data/stations.zip",
        zip_archive(&[(
            "indego-stations.csv",
            "Station_ID,Station_Name,Latitude,Longitude\n\
             S,Old Name,10,-75\n\
             T,Broad & Walnut,39.9,-75.16\n\
             S,Main St,10,-75\n",
        )]),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let pipeline = MarketPipeline::new(test_config(dir.path()), market(&mock_server, true));
    let output = pipeline.run(sample_rate(1)).await.unwrap();

    assert_eq!(output.stats.trip_files, 1);
    assert_eq!(output.stats.station_files, 1);

    let ids: BTreeSet<&str> = output
        .stations
        .iter()
        .map(|s| s.station_id.as_str())
        .collect();
    assert_eq!(ids.len(), 2);

    let mut trips = output.trips;
    trips.sort_by_key(|t| t.started_at);

    assert_eq!(trips[0].start_lat, Some(10.0));
    assert_eq!(trips[1].start_lat, Some(20.0));
    assert_eq!(trips[0].start_station_name.as_deref(), Some("Main St"));
    assert_eq!(trips[0].end_lat, Some(39.9));
    // Not in this market's schema but filled from the station table
    assert_eq!(trips[0].start_lng, Some(-75.0));
    assert_eq!(trips[0].end_station_name.as_deref(), Some("Broad & Walnut"));
}

#[tokio::test]
async fn test_sampling_and_rerun_from_cache() {
    let mock_server = MockServer::start().await;

    let rows: String = (0..10)
        .map(|i| format!("{i},2020-02-0{} 08:00:00\n", i % 9 + 1))
        .collect();
    let csv = format!("ride_id,started_at\n{rows}");
    let archive = zip_archive(&[("2020.csv", csv.as_str())]);

    serve(&mock_server, "/system-data/", index_page(&["2020.zip"]).into_bytes()).await;
    Mock::given(method("GET"))
        .and(path("/system-data/2020.zip"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(archive))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let pipeline = MarketPipeline::new(test_config(dir.path()), market(&mock_server, false));

    let first = pipeline.run(sample_rate(4)).await.unwrap();
    assert_eq!(first.stats.archives_downloaded, 1);
    let mut ids: Vec<String> = first.trips.into_iter().filter_map(|t| t.ride_id).collect();
    ids.sort();
    assert_eq!(ids, vec!["0", "4", "8"]);

    let second = pipeline.run(sample_rate(1)).await.unwrap();
    assert_eq!(second.stats.archives_cached, 1);
    assert_eq!(second.stats.archives_downloaded, 0);
    assert_eq!(second.trips.len(), 10);
}

#[tokio::test]
async fn test_raw_run_keeps_source_tables() {
    let mock_server = MockServer::start().await;

    serve(
        &mock_server,
        "/system-data/",
        index_page(&["2019.zip", "2021.zip"]).into_bytes(),
    )
    .await;
    serve(
        &mock_server,
        "/system-data/2019.zip",
        zip_archive(&[(
            "Divvy_Trips_2019_Q1.csv",
            "trip_id,start_time,usertype\n\
             1,2019-01-01 00:04:37,Subscriber\n\
             2,,Customer\n",
        )]),
    )
    .await;
    serve(
        &mock_server,
        "/system-data/2021.zip",
        zip_archive(&[(
            "202106-divvy-tripdata.csv",
            "ride_id,started_at,member_casual\n\
             ABC,2021-06-01 12:00:00,member\n",
        )]),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let pipeline = MarketPipeline::new(test_config(dir.path()), market(&mock_server, false));
    let raw = pipeline.run_raw(sample_rate(1)).await.unwrap();

    assert_eq!(raw.stats.trip_files, 2);
    assert_eq!(raw.stats.trip_rows, 3);
    assert_eq!(raw.stats.trips_dropped, 0);

    let mut tables = raw.tables.trips;
    tables.sort_by(|a, b| a.source.cmp(&b.source));
    assert_eq!(tables[0].headers, vec!["trip_id", "start_time", "usertype"]);
    // Values are as published: no remap, nothing dropped
    assert_eq!(tables[0].rows[0].get(2), Some("Subscriber"));
    assert_eq!(tables[0].rows[1].get(1), Some(""));

    let out = dir.path().join("mockride-raw.csv");
    write_raw_csv(&out, &tables).unwrap();
    let written = std::fs::read_to_string(out).unwrap();
    let lines: Vec<&str> = written.lines().collect();
    assert_eq!(
        lines[0],
        "trip_id,start_time,usertype,ride_id,started_at,member_casual"
    );
    assert_eq!(lines.len(), 4);
}
