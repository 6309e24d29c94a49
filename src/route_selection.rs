use chrono::NaiveDate;
use strum_macros::{AsRefStr, Display, EnumString};

use crate::coordinate::{Bounds, Coordinate};
use crate::date_key;
use crate::kv_store::KeyValueStore;
use crate::route_store::RouteStore;

pub const POLYLINE_WEIGHT: u32 = 4;

/// Which recent days to show on the map.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default, EnumString, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum RouteSelection {
    #[default]
    Today,
    Yesterday,
    Day2,
    Day3,
    All,
}

impl RouteSelection {
    pub fn day_offsets(&self) -> &'static [u64] {
        match self {
            RouteSelection::Today => &[0],
            RouteSelection::Yesterday => &[1],
            RouteSelection::Day2 => &[2],
            RouteSelection::Day3 => &[3],
            RouteSelection::All => &[0, 1, 2, 3],
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Display, AsRefStr, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum RouteColor {
    Blue,
    Green,
    Red,
    Gray,
    Purple,
}

// Indexed by day offset. `Purple` is spare, no offset maps to it.
pub const PALETTE: [RouteColor; 5] = [
    RouteColor::Blue,
    RouteColor::Green,
    RouteColor::Red,
    RouteColor::Gray,
    RouteColor::Purple,
];

pub fn color_for_offset(days_ago: u64) -> RouteColor {
    PALETTE[(days_ago as usize).min(PALETTE.len() - 1)]
}

#[derive(Clone, Debug, PartialEq)]
pub struct PlannedRoute {
    pub date_key: String,
    pub days_ago: u64,
    pub color: RouteColor,
    pub points: Vec<Coordinate>,
}

#[derive(Clone, Debug, PartialEq, Default)]
pub struct RenderPlan {
    pub routes: Vec<PlannedRoute>,
    pub bounds: Option<Bounds>,
}

impl RenderPlan {
    pub fn num_of_points(&self) -> usize {
        self.routes.iter().map(|r| r.points.len()).sum()
    }
}

/// Loads the routes `selection` asks for, relative to `today`. Days without
/// data are left out of the plan.
pub fn plan<S: KeyValueStore>(
    store: &RouteStore<S>,
    today: NaiveDate,
    selection: RouteSelection,
) -> RenderPlan {
    let routes: Vec<PlannedRoute> = selection
        .day_offsets()
        .iter()
        .filter_map(|&days_ago| {
            let date_key = date_key::date_key_days_ago(today, days_ago);
            let points = store.load(&date_key);
            if points.is_empty() {
                None
            } else {
                Some(PlannedRoute {
                    date_key,
                    days_ago,
                    color: color_for_offset(days_ago),
                    points,
                })
            }
        })
        .collect();
    let bounds = Bounds::covering(routes.iter().flat_map(|r| r.points.iter()));
    debug!(
        "[route_selection] {} -> {} routes, bounds: {:?}",
        selection,
        routes.len(),
        bounds
    );
    RenderPlan { routes, bounds }
}
