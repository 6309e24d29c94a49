use anyhow::Result;
use chrono::{Local, NaiveDate};

use crate::config::{self, Setting, TrackerConfig};
use crate::date_key;
use crate::kv_store::KeyValueStore;
use crate::location_source::{LocationError, LocationSample, LocationSource, WatchId};
use crate::map_view::{CircleStyle, LayerId, MapView, PolylineStyle};
use crate::route_selection::{self, RenderPlan, RouteSelection, POLYLINE_WEIGHT};
use crate::route_store::{AppendOutcome, RouteStore};

pub trait Clock {
    fn today(&self) -> NaiveDate;
}

/// Local calendar date.
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Controls {
    pub start_enabled: bool,
    pub stop_enabled: bool,
}

struct PositionLayers {
    marker: LayerId,
    accuracy_circle: LayerId,
}

/* Everything that changes while the tracker runs lives here: the store, the
map, the location subscription and the layers we drew. All of it is driven
from one control flow path (`pump` and the public methods), so there is no
locking.
*/
/// What one recording session did to today's route.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SessionSummary {
    pub handled: usize,
    pub stored: usize,
}

pub struct Tracker<S: KeyValueStore, M: MapView, L: LocationSource, C: Clock = SystemClock> {
    config: TrackerConfig,
    route_store: RouteStore<S>,
    map_view: M,
    location_source: L,
    clock: C,
    watch_id: Option<WatchId>,
    waiting_for_first_fix: bool,
    polyline_layers: Vec<LayerId>,
    position_layers: Option<PositionLayers>,
    selection: RouteSelection,
    last_error_message: Option<String>,
}

impl<S: KeyValueStore, M: MapView, L: LocationSource, C: Clock> Tracker<S, M, L, C> {
    pub fn new(
        config: TrackerConfig,
        store: S,
        map_view: M,
        location_source: L,
        clock: C,
    ) -> Self {
        let selection =
            config::get_setting_with_default(&store, Setting::RouteSelection, RouteSelection::Today);
        let route_store = RouteStore::new(store, config.coordinate_filter());
        Tracker {
            config,
            route_store,
            map_view,
            location_source,
            clock,
            watch_id: None,
            waiting_for_first_fix: false,
            polyline_layers: Vec::new(),
            position_layers: None,
            selection,
            last_error_message: None,
        }
    }

    /// Cleans up corrupted data, centers the map on the current position when
    /// we can get one and draws the selected routes.
    pub fn startup(&mut self) -> Result<()> {
        if self.route_store.cleanup_corrupted_routes()? {
            info!("[tracker] corrupted routes removed on startup");
        }
        match self
            .location_source
            .current_position(self.config.current_position_options)
        {
            Ok(sample) => {
                self.update_position_layers(&sample);
                self.map_view
                    .set_view(sample.coordinate, self.config.current_position_zoom);
            }
            Err(error) => {
                info!("[tracker] could not get current location: {:?}", error);
            }
        }
        self.draw_all_routes();
        Ok(())
    }

    pub fn shutdown(&mut self) -> Result<()> {
        self.stop_tracking();
        self.route_store.flush()
    }

    pub fn is_tracking(&self) -> bool {
        self.watch_id.is_some()
    }

    pub fn controls(&self) -> Controls {
        Controls {
            start_enabled: !self.is_tracking(),
            stop_enabled: self.is_tracking(),
        }
    }

    pub fn start_tracking(&mut self) {
        if self.watch_id.is_some() {
            return;
        }
        match self
            .location_source
            .watch_position(self.config.watch_options)
        {
            Ok(watch_id) => {
                info!("[tracker] tracking started");
                self.watch_id = Some(watch_id);
                self.waiting_for_first_fix = true;
                self.last_error_message = None;
            }
            Err(error) => self.on_error(error),
        }
    }

    pub fn stop_tracking(&mut self) {
        if let Some(watch_id) = self.watch_id.take() {
            self.location_source.clear_watch(watch_id);
            info!("[tracker] tracking stopped");
        }
    }

    /// Handles pending location events until the stream runs dry or tracking
    /// stops. Returns how many events were handled.
    pub fn pump(&mut self) -> usize {
        let mut handled = 0;
        while let Some(watch_id) = self.watch_id {
            let event = match self.location_source.next_event(watch_id) {
                None => break,
                Some(event) => event,
            };
            handled += 1;
            match event {
                Ok(sample) => self.on_position(sample),
                Err(error) => self.on_error(error),
            }
        }
        handled
    }

    pub fn on_position(&mut self, sample: LocationSample) {
        self.update_position_layers(&sample);

        let today = date_key::to_date_key(self.clock.today());
        let outcome = match self.route_store.append(&today, sample.coordinate) {
            Ok(outcome) => outcome,
            Err(error) => {
                error!("[tracker] failed to save location: {:?}", error);
                return;
            }
        };
        if !outcome.is_accepted() {
            return;
        }
        if self.waiting_for_first_fix {
            self.map_view
                .set_view(sample.coordinate, self.config.first_fix_zoom);
            self.waiting_for_first_fix = false;
        }
        if outcome == AppendOutcome::Stored {
            self.draw_all_routes();
        }
    }

    /// Starts tracking, handles every pending event and stops again. Fails
    /// with the user-facing message when the location source reported an
    /// error.
    pub fn record_session(&mut self) -> Result<SessionSummary> {
        let today = self.today_key();
        let before = self.route_store.load(&today).len();
        self.start_tracking();
        let handled = self.pump();
        self.stop_tracking();
        if let Some(message) = &self.last_error_message {
            bail!("{}", message);
        }
        let after = self.route_store.load(&today).len();
        Ok(SessionSummary {
            handled,
            stored: after.saturating_sub(before),
        })
    }

    pub fn on_error(&mut self, error: LocationError) {
        warn!("[tracker] location error: {:?}", error);
        self.last_error_message = Some(error.to_string());
        self.stop_tracking();
    }

    pub fn last_error_message(&self) -> Option<&str> {
        self.last_error_message.as_deref()
    }

    fn update_position_layers(&mut self, sample: &LocationSample) {
        self.remove_position_layers();
        let accuracy = sample
            .accuracy
            .filter(|a| *a > 0.)
            .unwrap_or(self.config.default_accuracy_in_m);
        let marker = self.map_view.add_marker(sample.coordinate);
        let accuracy_circle = self
            .map_view
            .add_circle(sample.coordinate, CircleStyle::accuracy(accuracy));
        self.position_layers = Some(PositionLayers {
            marker,
            accuracy_circle,
        });
    }

    fn remove_position_layers(&mut self) {
        if let Some(layers) = self.position_layers.take() {
            self.map_view.remove_layer(layers.marker);
            self.map_view.remove_layer(layers.accuracy_circle);
        }
    }

    fn clear_routes(&mut self) {
        for layer_id in self.polyline_layers.drain(..) {
            self.map_view.remove_layer(layer_id);
        }
    }

    pub fn selection(&self) -> RouteSelection {
        self.selection
    }

    pub fn set_selection(&mut self, selection: RouteSelection) -> Result<()> {
        self.selection = selection;
        config::set_setting(
            self.route_store.kv_store_mut(),
            Setting::RouteSelection,
            selection,
        )?;
        self.draw_all_routes();
        Ok(())
    }

    pub fn render_plan(&self) -> RenderPlan {
        route_selection::plan(&self.route_store, self.clock.today(), self.selection)
    }

    pub fn draw_all_routes(&mut self) {
        self.clear_routes();
        let plan = self.render_plan();
        for route in &plan.routes {
            let layer_id = self.map_view.add_polyline(
                &route.points,
                PolylineStyle {
                    color: route.color,
                    weight: POLYLINE_WEIGHT,
                },
            );
            self.polyline_layers.push(layer_id);
        }
        if let Some(bounds) = plan.bounds {
            self.map_view.fit_bounds(bounds);
        }
    }

    /// Deletes every stored route. Nothing happens unless `confirmed`.
    pub fn reset_all_data(&mut self, confirmed: bool) -> Result<bool> {
        if !confirmed {
            return Ok(false);
        }
        self.route_store.clear_all()?;
        self.clear_routes();
        self.remove_position_layers();
        Ok(true)
    }

    pub fn route_store(&self) -> &RouteStore<S> {
        &self.route_store
    }

    pub fn map_view(&self) -> &M {
        &self.map_view
    }

    pub fn location_source(&self) -> &L {
        &self.location_source
    }

    pub fn today_key(&self) -> String {
        date_key::to_date_key(self.clock.today())
    }
}
