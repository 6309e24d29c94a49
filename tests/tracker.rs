pub mod test_utils;

use route_tracker::config::TrackerConfig;
use route_tracker::coordinate::{Bounds, Coordinate, DEFAULT_SENTINEL};
use route_tracker::kv_store::{KeyValueStore, MemoryKvStore};
use route_tracker::location_source::{LocationError, LocationSample, ReplayLocationSource};
use route_tracker::map_view::{
    CircleStyle, GeoJsonMapView, Layer, LayerId, MapView, PolylineStyle, Viewport,
};
use route_tracker::route_selection::{RouteColor, RouteSelection};
use route_tracker::tracker::{Controls, FixedClock, SessionSummary, Tracker};

const TODAY: &str = "2024-03-01";

#[test]
fn track_a_walk() {
    let mut tracker = test_utils::tracker_with(
        MemoryKvStore::new(),
        ReplayLocationSource::from_samples(test_utils::walk_samples()),
    );
    tracker.startup().unwrap();
    assert_eq!(
        tracker.controls(),
        Controls {
            start_enabled: true,
            stop_enabled: false
        }
    );

    tracker.start_tracking();
    assert!(tracker.is_tracking());
    assert_eq!(
        tracker.controls(),
        Controls {
            start_enabled: false,
            stop_enabled: true
        }
    );
    assert_eq!(tracker.pump(), 6);
    assert_eq!(tracker.route_store().load(TODAY), test_utils::walk());

    // the stream ran dry but we are still subscribed
    assert!(tracker.is_tracking());
    tracker.stop_tracking();
    assert!(!tracker.is_tracking());
    assert_eq!(tracker.last_error_message(), None);

    let polylines: Vec<_> = tracker.map_view().polylines().collect();
    assert_eq!(polylines.len(), 1);
    assert_eq!(polylines[0].0, test_utils::walk().as_slice());
    assert_eq!(polylines[0].1.color, RouteColor::Blue);
    assert_eq!(polylines[0].1.weight, 4);
    assert!(matches!(tracker.map_view().viewport(), Viewport::Fitted(_)));

    // one marker and one accuracy circle, at the last position
    let last = *test_utils::walk().last().unwrap();
    let markers: Vec<_> = tracker
        .map_view()
        .layers()
        .filter(|l| matches!(l, Layer::Marker(_) | Layer::Circle(..)))
        .collect();
    assert_eq!(markers.len(), 2);
    for layer in markers {
        match layer {
            Layer::Marker(c) => assert_eq!(*c, last),
            Layer::Circle(c, style) => {
                assert_eq!(*c, last);
                assert_eq!(style.radius_in_m, 5.);
            }
            Layer::Polyline(..) => unreachable!(),
        }
    }
}

#[test]
fn invalid_samples_move_the_marker_but_are_not_stored() {
    let mut tracker =
        test_utils::tracker_with(MemoryKvStore::new(), ReplayLocationSource::empty());
    for position in [
        Coordinate::new(0., 0.),
        DEFAULT_SENTINEL,
        Coordinate::new(31.24, 121.49),
    ] {
        tracker.on_position(LocationSample {
            coordinate: position,
            accuracy: None,
            timestamp_ms: None,
        });
        let markers: Vec<Coordinate> = tracker
            .map_view()
            .layers()
            .filter_map(|l| match l {
                Layer::Marker(c) => Some(*c),
                _ => None,
            })
            .collect();
        assert_eq!(markers, vec![position]);
    }
    assert_eq!(
        tracker.route_store().load(TODAY),
        vec![Coordinate::new(31.24, 121.49)]
    );
    // missing accuracy falls back to 10m
    let radius = tracker
        .map_view()
        .layers()
        .find_map(|l| match l {
            Layer::Circle(_, style) => Some(style.radius_in_m),
            _ => None,
        })
        .unwrap();
    assert_eq!(radius, 10.);
}

#[derive(Default)]
struct RecordingMapView {
    inner: Option<GeoJsonMapView>,
    set_view_calls: Vec<(Coordinate, u8)>,
}

impl RecordingMapView {
    fn inner(&mut self) -> &mut GeoJsonMapView {
        self.inner
            .get_or_insert_with(|| GeoJsonMapView::new(DEFAULT_SENTINEL, 13))
    }
}

impl MapView for RecordingMapView {
    fn add_marker(&mut self, position: Coordinate) -> LayerId {
        self.inner().add_marker(position)
    }

    fn add_circle(&mut self, center: Coordinate, style: CircleStyle) -> LayerId {
        self.inner().add_circle(center, style)
    }

    fn add_polyline(&mut self, points: &[Coordinate], style: PolylineStyle) -> LayerId {
        self.inner().add_polyline(points, style)
    }

    fn remove_layer(&mut self, layer_id: LayerId) {
        self.inner().remove_layer(layer_id)
    }

    fn fit_bounds(&mut self, bounds: Bounds) {
        self.inner().fit_bounds(bounds)
    }

    fn set_view(&mut self, center: Coordinate, zoom: u8) {
        self.set_view_calls.push((center, zoom));
        self.inner().set_view(center, zoom)
    }
}

#[test]
fn first_fix_centers_the_map() {
    let samples = vec![
        LocationSample::new(0., 0.),
        LocationSample::new(31.24, 121.49),
        LocationSample::new(31.25, 121.50),
    ];
    let mut tracker = Tracker::new(
        TrackerConfig::default(),
        MemoryKvStore::new(),
        RecordingMapView::default(),
        ReplayLocationSource::from_samples(samples),
        FixedClock(test_utils::today()),
    );
    tracker.start_tracking();
    assert_eq!(tracker.pump(), 3);
    // the invalid sample does not count as a fix
    assert_eq!(
        tracker.map_view().set_view_calls,
        vec![(Coordinate::new(31.24, 121.49), 17)]
    );

    // a new tracking session zooms in again on its first fix
    tracker.stop_tracking();
    tracker.on_position(LocationSample::new(31.26, 121.51));
    tracker.start_tracking();
    tracker.on_position(LocationSample::new(31.27, 121.52));
    assert_eq!(
        tracker.map_view().set_view_calls,
        vec![
            (Coordinate::new(31.24, 121.49), 17),
            (Coordinate::new(31.27, 121.52), 17)
        ]
    );
}

#[test]
fn restart_at_the_same_position_centers_again() {
    let mut tracker = Tracker::new(
        TrackerConfig::default(),
        MemoryKvStore::new(),
        RecordingMapView::default(),
        ReplayLocationSource::empty(),
        FixedClock(test_utils::today()),
    );
    let here = Coordinate::new(31.24, 121.49);
    tracker.start_tracking();
    tracker.on_position(LocationSample::new(here.latitude, here.longitude));
    tracker.stop_tracking();

    // standing still: the fix is not stored twice but still centers the map
    tracker.start_tracking();
    tracker.on_position(LocationSample::new(here.latitude, here.longitude));
    assert_eq!(tracker.map_view().set_view_calls, vec![(here, 17), (here, 17)]);
    assert_eq!(tracker.route_store().load(TODAY), vec![here]);

    // the first fix of a session is only consumed once
    tracker.on_position(LocationSample::new(here.latitude, here.longitude));
    assert_eq!(tracker.map_view().set_view_calls.len(), 2);
}

#[test]
fn record_session_counts_stored_points() {
    let mut samples = test_utils::walk_samples();
    // invalid and duplicated fixes are handled but not stored
    samples.insert(2, LocationSample::new(0., 0.));
    let repeated = samples[3].clone();
    samples.insert(4, repeated);
    let mut store = MemoryKvStore::new();
    store.set(TODAY, "[[31.2,121.4]]").unwrap();

    let mut tracker =
        test_utils::tracker_with(store, ReplayLocationSource::from_samples(samples));
    let summary = tracker.record_session().unwrap();
    assert_eq!(
        summary,
        SessionSummary {
            handled: 8,
            stored: 6
        }
    );
    assert!(!tracker.is_tracking());
    assert_eq!(tracker.route_store().load(TODAY).len(), 7);
}

#[test]
fn record_session_reports_location_errors() {
    let mut tracker = test_utils::tracker_with(
        MemoryKvStore::new(),
        ReplayLocationSource::empty().fail_watch_with(LocationError::PermissionDenied),
    );
    let error = tracker.record_session().unwrap_err();
    assert_eq!(
        error.to_string(),
        "Please allow location access in your settings."
    );
}

#[test]
fn stop_cancels_pending_events() {
    let mut tracker = test_utils::tracker_with(
        MemoryKvStore::new(),
        ReplayLocationSource::from_samples(test_utils::walk_samples()),
    );
    tracker.start_tracking();
    tracker.stop_tracking();
    assert_eq!(tracker.pump(), 0);
    assert!(tracker.route_store().load(TODAY).is_empty());
    assert_eq!(tracker.location_source().active_watch(), None);
    assert_eq!(tracker.location_source().remaining(), 6);

    // stopping twice is fine
    tracker.stop_tracking();
}

#[test]
fn error_stops_tracking() {
    let events = vec![
        Ok(LocationSample::new(31.24, 121.49)),
        Err(LocationError::Timeout),
        Ok(LocationSample::new(31.25, 121.50)),
    ];
    let mut tracker =
        test_utils::tracker_with(MemoryKvStore::new(), ReplayLocationSource::new(events));
    tracker.start_tracking();
    assert_eq!(tracker.pump(), 2);
    assert!(!tracker.is_tracking());
    assert_eq!(
        tracker.last_error_message(),
        Some("Location request timed out. Please try again.")
    );
    assert_eq!(
        tracker.route_store().load(TODAY),
        vec![Coordinate::new(31.24, 121.49)]
    );

    // starting again picks up where the stream left off
    tracker.start_tracking();
    assert_eq!(tracker.last_error_message(), None);
    assert_eq!(tracker.pump(), 1);
    assert_eq!(tracker.route_store().load(TODAY).len(), 2);
}

#[test]
fn denied_permission() {
    let mut tracker = test_utils::tracker_with(
        MemoryKvStore::new(),
        ReplayLocationSource::from_samples(test_utils::walk_samples())
            .fail_watch_with(LocationError::PermissionDenied),
    );
    tracker.start_tracking();
    assert!(!tracker.is_tracking());
    assert_eq!(
        tracker.last_error_message(),
        Some("Please allow location access in your settings.")
    );
    assert!(tracker.controls().start_enabled);
}

#[test]
fn startup_wipes_corrupted_data() {
    let mut store = MemoryKvStore::new();
    store
        .set("2024-02-29", "[[31.24,121.49],[12.2958,76.6394]]")
        .unwrap();
    store.set("2024-03-01", "[[31.25,121.50]]").unwrap();
    let mut tracker = test_utils::tracker_with(store, ReplayLocationSource::empty());
    tracker.startup().unwrap();
    assert!(tracker.route_store().date_keys().unwrap().is_empty());
    assert_eq!(tracker.map_view().polylines().count(), 0);
    // no position available, the map stays at the default view
    assert_eq!(
        tracker.map_view().viewport(),
        &Viewport::Centered {
            center: DEFAULT_SENTINEL,
            zoom: 13
        }
    );
}

#[test]
fn startup_centers_on_current_position() {
    let mut tracker = test_utils::tracker_with(
        MemoryKvStore::new(),
        ReplayLocationSource::from_samples(test_utils::walk_samples()),
    );
    tracker.startup().unwrap();
    assert_eq!(
        tracker.map_view().viewport(),
        &Viewport::Centered {
            center: test_utils::walk()[0],
            zoom: 15
        }
    );
    // the current position is only displayed
    assert!(tracker.route_store().load(TODAY).is_empty());
}

#[test]
fn selection_is_persisted_and_redraws() {
    let mut store = MemoryKvStore::new();
    store.set("2024-03-01", "[[31.24,121.49],[31.25,121.5]]").unwrap();
    store.set("2024-02-27", "[[31.26,121.51],[31.27,121.52]]").unwrap();
    let mut tracker = test_utils::tracker_with(store, ReplayLocationSource::empty());
    assert_eq!(tracker.selection(), RouteSelection::Today);
    tracker.startup().unwrap();
    assert_eq!(tracker.map_view().polylines().count(), 1);

    tracker.set_selection(RouteSelection::All).unwrap();
    let colors: Vec<RouteColor> = tracker
        .map_view()
        .polylines()
        .map(|(_, style)| style.color)
        .collect();
    assert_eq!(colors, vec![RouteColor::Blue, RouteColor::Gray]);

    tracker.set_selection(RouteSelection::Day3).unwrap();
    assert_eq!(tracker.map_view().polylines().count(), 1);

    // a new tracker over the same store remembers the selection
    let store = tracker_into_store(tracker);
    let tracker = test_utils::tracker_with(store, ReplayLocationSource::empty());
    assert_eq!(tracker.selection(), RouteSelection::Day3);
}

fn tracker_into_store(tracker: test_utils::TestTracker) -> MemoryKvStore {
    let mut store = MemoryKvStore::new();
    let kv = tracker.route_store().kv_store();
    for key in kv.keys().unwrap() {
        store.set(&key, &kv.get(&key).unwrap().unwrap()).unwrap();
    }
    store
}

#[test]
fn reset_all_data() {
    let mut tracker = test_utils::tracker_with(
        MemoryKvStore::new(),
        ReplayLocationSource::from_samples(test_utils::walk_samples()),
    );
    tracker.start_tracking();
    tracker.pump();
    assert!(tracker.map_view().layers().count() > 0);

    assert!(!tracker.reset_all_data(false).unwrap());
    assert_eq!(tracker.route_store().load(TODAY).len(), 6);

    assert!(tracker.reset_all_data(true).unwrap());
    assert!(tracker.route_store().load(TODAY).is_empty());
    assert_eq!(tracker.map_view().layers().count(), 0);

    tracker.shutdown().unwrap();
    assert!(!tracker.is_tracking());
}
