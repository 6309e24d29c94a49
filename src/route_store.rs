use anyhow::Result;
use itertools::Itertools;
use serde_json::Value;

use crate::coordinate::{Coordinate, CoordinateFilter};
use crate::date_key;
use crate::kv_store::KeyValueStore;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AppendOutcome {
    Stored,
    /// Valid, but equal to the last stored point.
    Duplicate,
    /// Did not pass the coordinate filter.
    Rejected,
}

impl AppendOutcome {
    pub fn is_accepted(self) -> bool {
        self != AppendOutcome::Rejected
    }
}

/* One route per calendar day, stored as a JSON array of `[lat, lon]` pairs
under the day's date key. Reading is forgiving: anything we cannot make sense
of is treated as "no data" and every point goes through the filter again, so
bad points written by older versions never reach the map.
*/
pub struct RouteStore<S: KeyValueStore> {
    store: S,
    filter: CoordinateFilter,
}

impl<S: KeyValueStore> RouteStore<S> {
    pub fn new(store: S, filter: CoordinateFilter) -> Self {
        RouteStore { store, filter }
    }

    pub fn kv_store(&self) -> &S {
        &self.store
    }

    pub fn kv_store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    // Every point that was persisted and can be parsed, before filtering.
    fn load_raw(&self, date_key: &str) -> Vec<Coordinate> {
        let value = match self.store.get(date_key) {
            Ok(Some(value)) => value,
            Ok(None) => return Vec::new(),
            Err(error) => {
                warn!("[route_store] failed to read {}: {}", date_key, error);
                return Vec::new();
            }
        };
        match serde_json::from_str::<Value>(&value) {
            Ok(Value::Array(points)) => points
                .into_iter()
                .filter_map(|point| serde_json::from_value::<Coordinate>(point).ok())
                .collect(),
            Ok(_) => {
                warn!("[route_store] {} is not an array, ignored", date_key);
                Vec::new()
            }
            Err(error) => {
                warn!("[route_store] malformed route {}: {}", date_key, error);
                Vec::new()
            }
        }
    }

    pub fn load(&self, date_key: &str) -> Vec<Coordinate> {
        let mut points = self.load_raw(date_key);
        points.retain(|c| self.filter.accepts(c));
        points
    }

    pub fn append(&mut self, date_key: &str, coordinate: Coordinate) -> Result<AppendOutcome> {
        if !self.filter.accepts(&coordinate) {
            debug!(
                "[route_store] ignoring invalid coordinate: {:?}",
                coordinate
            );
            return Ok(AppendOutcome::Rejected);
        }
        let mut route = self.load(date_key);
        if route.last() == Some(&coordinate) {
            debug!("[route_store] skipping duplicated coordinate");
            return Ok(AppendOutcome::Duplicate);
        }
        route.push(coordinate);
        self.save(date_key, &route)?;
        Ok(AppendOutcome::Stored)
    }

    fn save(&mut self, date_key: &str, route: &[Coordinate]) -> Result<()> {
        let value = serde_json::to_string(route)?;
        self.store.set(date_key, &value)
    }

    pub fn date_keys(&self) -> Result<Vec<String>> {
        Ok(self
            .store
            .keys()?
            .into_iter()
            .filter(|key| date_key::is_date_key(key))
            .sorted()
            .collect())
    }

    pub fn clear_all(&mut self) -> Result<usize> {
        let keys = self.date_keys()?;
        for key in &keys {
            self.store.remove(key)?;
        }
        info!("[route_store] all route data cleared, {} routes", keys.len());
        Ok(keys.len())
    }

    /// Wipes every route if any of them contains the sentinel location.
    pub fn cleanup_corrupted_routes(&mut self) -> Result<bool> {
        let corrupted = self.date_keys()?.into_iter().find(|key| {
            self.load_raw(key)
                .iter()
                .any(|point| self.filter.is_sentinel(point))
        });
        match corrupted {
            None => Ok(false),
            Some(key) => {
                warn!(
                    "[route_store] route {} contains the default location, wiping all routes",
                    key
                );
                self.clear_all()?;
                Ok(true)
            }
        }
    }

    pub fn flush(&self) -> Result<()> {
        self.store.flush()
    }
}
