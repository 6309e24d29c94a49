use anyhow::Result;
use std::error::Error;
use std::str::FromStr;
use std::time::Duration;

use crate::coordinate::{Coordinate, CoordinateFilter, DEFAULT_EPSILON, DEFAULT_SENTINEL};
use crate::kv_store::KeyValueStore;
use crate::location_source::PositionOptions;

#[derive(Clone, Debug, PartialEq)]
pub struct TrackerConfig {
    /// Placeholder location. Also where the map starts before we get a fix.
    pub sentinel: Coordinate,
    pub epsilon: f64,
    pub watch_options: PositionOptions,
    pub current_position_options: PositionOptions,
    pub initial_zoom: u8,
    pub current_position_zoom: u8,
    pub first_fix_zoom: u8,
    /// Used for the accuracy circle when the sample carries none.
    pub default_accuracy_in_m: f64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        TrackerConfig {
            sentinel: DEFAULT_SENTINEL,
            epsilon: DEFAULT_EPSILON,
            watch_options: PositionOptions {
                enable_high_accuracy: true,
                maximum_age: Duration::from_secs(30),
                timeout: Duration::from_secs(15),
            },
            current_position_options: PositionOptions {
                enable_high_accuracy: true,
                maximum_age: Duration::from_secs(60),
                timeout: Duration::from_secs(10),
            },
            initial_zoom: 13,
            current_position_zoom: 15,
            first_fix_zoom: 17,
            default_accuracy_in_m: 10.,
        }
    }
}

impl TrackerConfig {
    pub fn coordinate_filter(&self) -> CoordinateFilter {
        CoordinateFilter {
            sentinel: self.sentinel,
            epsilon: self.epsilon,
        }
    }
}

// Settings share the key-value store with the routes. Their keys must never
// look like a date key, otherwise `clear_all` would remove them.
#[derive(Debug, Clone, Copy)]
pub enum Setting {
    RouteSelection,
}

impl Setting {
    fn to_db_key(self) -> &'static str {
        match self {
            Self::RouteSelection => "ROUTE_SELECTION",
        }
    }
}

fn get_setting<T: FromStr>(store: &impl KeyValueStore, setting: Setting) -> Result<Option<T>>
where
    <T as FromStr>::Err: Error + Send + Sync + 'static,
{
    match store.get(setting.to_db_key())? {
        None => Ok(None),
        Some(s) => {
            let v = FromStr::from_str(&s)?;
            Ok(Some(v))
        }
    }
}

pub fn get_setting_with_default<T: FromStr>(
    store: &impl KeyValueStore,
    setting: Setting,
    default: T,
) -> T
where
    <T as FromStr>::Err: Error + Send + Sync + 'static,
{
    match get_setting(store, setting) {
        Ok(v) => v,
        Err(error) => {
            warn!(
                "[config.get_setting_with_default] setting:{:?}, error:{}",
                setting, error
            );
            None
        }
    }
    .unwrap_or(default)
}

pub fn set_setting<T: ToString>(
    store: &mut impl KeyValueStore,
    setting: Setting,
    value: T,
) -> Result<()> {
    store.set(setting.to_db_key(), &value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::date_key::is_date_key;

    #[test]
    fn setting_keys_are_not_date_keys() {
        assert!(!is_date_key(Setting::RouteSelection.to_db_key()));
    }
}
