use anyhow::Result;
use geo_types::Point;
use gpx::{Gpx, GpxVersion, Track, TrackSegment, Waypoint};
use std::io::Write;

use crate::coordinate::Coordinate;

pub fn route_to_gpx(date_key: &str, route: &[Coordinate]) -> Gpx {
    // GPX points are x = longitude, y = latitude
    let points = route
        .iter()
        .map(|c| Waypoint::new(Point::new(c.longitude, c.latitude)))
        .collect();
    let mut segment = TrackSegment::new();
    segment.points = points;
    let mut track = Track::new();
    track.name = Some(date_key.to_owned());
    track.segments.push(segment);
    Gpx {
        version: GpxVersion::Gpx11,
        creator: Some("route-tracker".to_owned()),
        tracks: vec![track],
        ..Default::default()
    }
}

pub fn export_gpx<W: Write>(date_key: &str, route: &[Coordinate], writer: &mut W) -> Result<()> {
    if route.is_empty() {
        bail!("no route data for {}", date_key);
    }
    gpx::write(&route_to_gpx(date_key, route), writer)?;
    Ok(())
}
