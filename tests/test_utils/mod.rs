#![allow(dead_code)]

use chrono::NaiveDate;
use route_tracker::config::TrackerConfig;
use route_tracker::coordinate::{Coordinate, CoordinateFilter};
use route_tracker::kv_store::MemoryKvStore;
use route_tracker::location_source::{LocationSample, ReplayLocationSource};
use route_tracker::map_view::GeoJsonMapView;
use route_tracker::route_store::RouteStore;
use route_tracker::tracker::{FixedClock, Tracker};

pub type TestTracker = Tracker<MemoryKvStore, GeoJsonMapView, ReplayLocationSource, FixedClock>;

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
}

// A short walk along the Bund, Shanghai.
pub const WALK: [(f64, f64); 6] = [
    (31.2400, 121.4900),
    (31.2405, 121.4903),
    (31.2411, 121.4907),
    (31.2418, 121.4910),
    (31.2424, 121.4912),
    (31.2431, 121.4915),
];

pub fn walk() -> Vec<Coordinate> {
    WALK.iter().map(|&(lat, lon)| Coordinate::new(lat, lon)).collect()
}

pub fn walk_samples() -> Vec<LocationSample> {
    WALK.iter()
        .enumerate()
        .map(|(i, &(lat, lon))| LocationSample {
            coordinate: Coordinate::new(lat, lon),
            accuracy: Some(5.),
            timestamp_ms: Some(1709251200000 + i as i64 * 1000),
        })
        .collect()
}

pub fn route_store() -> RouteStore<MemoryKvStore> {
    RouteStore::new(MemoryKvStore::new(), CoordinateFilter::default())
}

pub fn tracker_with(store: MemoryKvStore, location_source: ReplayLocationSource) -> TestTracker {
    let config = TrackerConfig::default();
    let map_view = GeoJsonMapView::new(config.sentinel, config.initial_zoom);
    Tracker::new(
        config,
        store,
        map_view,
        location_source,
        FixedClock(today()),
    )
}
