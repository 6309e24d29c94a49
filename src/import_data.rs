use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use gpx::read;
use serde::Deserialize;
use std::{fs::File, io::BufReader, path::Path};

use crate::coordinate::Coordinate;
use crate::location_source::LocationSample;

pub fn load_gpx(file_path: impl AsRef<Path>) -> Result<Vec<LocationSample>> {
    let file_path = file_path.as_ref();
    let gpx_data = read(BufReader::new(
        File::open(file_path).with_context(|| format!("failed to open {:?}", file_path))?,
    ))?;
    let mut samples = Vec::new();
    for track in &gpx_data.tracks {
        for segment in &track.segments {
            for point in &segment.points {
                let timestamp = match &point.time {
                    Some(time) => Some(DateTime::<Utc>::from(DateTime::parse_from_rfc3339(
                        &time.format()?,
                    )?)),
                    None => None,
                };
                // hdop is not a radius in meters
                samples.push(LocationSample {
                    coordinate: Coordinate::new(point.point().y(), point.point().x()),
                    accuracy: None,
                    timestamp_ms: timestamp.map(|x| x.timestamp_millis()),
                });
            }
        }
    }
    info!(
        "[import_data] loaded {} samples from {:?}",
        samples.len(),
        file_path
    );
    Ok(samples)
}

#[derive(Deserialize)]
struct CsvRecord {
    #[serde(default)]
    timestamp_ms: Option<i64>,
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    accuracy: Option<f64>,
}

/// Reads `timestamp_ms,latitude,longitude,accuracy` rows. Only the two
/// coordinate columns are required, other columns are ignored.
pub fn load_csv(file_path: impl AsRef<Path>) -> Result<Vec<LocationSample>> {
    let file_path = file_path.as_ref();
    let mut reader = csv::Reader::from_path(file_path)
        .with_context(|| format!("failed to open {:?}", file_path))?;
    let mut samples = Vec::new();
    for (i, record) in reader.deserialize::<CsvRecord>().enumerate() {
        let record = record.with_context(|| format!("bad csv record at row {}", i + 1))?;
        samples.push(LocationSample {
            coordinate: Coordinate::new(record.latitude, record.longitude),
            accuracy: record.accuracy,
            timestamp_ms: record.timestamp_ms,
        });
    }
    info!(
        "[import_data] loaded {} samples from {:?}",
        samples.len(),
        file_path
    );
    Ok(samples)
}

/// Picks the loader by file extension.
pub fn load_samples(file_path: impl AsRef<Path>) -> Result<Vec<LocationSample>> {
    let file_path = file_path.as_ref();
    let extension = file_path
        .extension()
        .and_then(|x| x.to_str())
        .map(|x| x.to_lowercase());
    match extension.as_deref() {
        Some("gpx") => load_gpx(file_path),
        Some("csv") => load_csv(file_path),
        _ => Err(anyhow!("unsupported file type: {:?}", file_path)),
    }
}
