use serde_json::{json, Value};
use std::collections::BTreeMap;

use crate::coordinate::{Bounds, Coordinate};
use crate::route_selection::RouteColor;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId(pub u64);

#[derive(Clone, Debug, PartialEq)]
pub struct CircleStyle {
    pub color: String,
    pub fill_color: String,
    pub fill_opacity: f64,
    pub radius_in_m: f64,
    pub weight: u32,
}

impl CircleStyle {
    pub fn accuracy(radius_in_m: f64) -> Self {
        CircleStyle {
            color: "#4285f4".to_owned(),
            fill_color: "#4285f4".to_owned(),
            fill_opacity: 0.15,
            radius_in_m,
            weight: 2,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PolylineStyle {
    pub color: RouteColor,
    pub weight: u32,
}

/// The drawing surface. Layers stay on the map until removed.
pub trait MapView {
    fn add_marker(&mut self, position: Coordinate) -> LayerId;
    fn add_circle(&mut self, center: Coordinate, style: CircleStyle) -> LayerId;
    fn add_polyline(&mut self, points: &[Coordinate], style: PolylineStyle) -> LayerId;
    fn remove_layer(&mut self, layer_id: LayerId);
    fn fit_bounds(&mut self, bounds: Bounds);
    fn set_view(&mut self, center: Coordinate, zoom: u8);
}

#[derive(Clone, Debug, PartialEq)]
pub enum Layer {
    Marker(Coordinate),
    Circle(Coordinate, CircleStyle),
    Polyline(Vec<Coordinate>, PolylineStyle),
}

#[derive(Clone, Debug, PartialEq)]
pub enum Viewport {
    Centered { center: Coordinate, zoom: u8 },
    Fitted(Bounds),
}

/// Keeps layers in memory and renders them as a GeoJSON `FeatureCollection`.
pub struct GeoJsonMapView {
    layers: BTreeMap<LayerId, Layer>,
    next_layer_id: u64,
    viewport: Viewport,
}

impl GeoJsonMapView {
    pub fn new(center: Coordinate, zoom: u8) -> Self {
        GeoJsonMapView {
            layers: BTreeMap::new(),
            next_layer_id: 0,
            viewport: Viewport::Centered { center, zoom },
        }
    }

    fn insert(&mut self, layer: Layer) -> LayerId {
        let layer_id = LayerId(self.next_layer_id);
        self.next_layer_id += 1;
        self.layers.insert(layer_id, layer);
        layer_id
    }

    pub fn layer(&self, layer_id: LayerId) -> Option<&Layer> {
        self.layers.get(&layer_id)
    }

    pub fn layers(&self) -> impl Iterator<Item = &Layer> {
        self.layers.values()
    }

    pub fn polylines(&self) -> impl Iterator<Item = (&[Coordinate], &PolylineStyle)> {
        self.layers.values().filter_map(|layer| match layer {
            Layer::Polyline(points, style) => Some((points.as_slice(), style)),
            _ => None,
        })
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn to_geojson(&self) -> Value {
        // GeoJSON positions are `[lon, lat]`
        let position = |c: &Coordinate| json!([c.longitude, c.latitude]);
        let features: Vec<Value> = self
            .layers
            .values()
            .map(|layer| match layer {
                Layer::Marker(c) => json!({
                    "type": "Feature",
                    "geometry": { "type": "Point", "coordinates": position(c) },
                    "properties": { "kind": "marker" },
                }),
                Layer::Circle(c, style) => json!({
                    "type": "Feature",
                    "geometry": { "type": "Point", "coordinates": position(c) },
                    "properties": {
                        "kind": "circle",
                        "radius": style.radius_in_m,
                        "color": style.color,
                        "fillColor": style.fill_color,
                        "fillOpacity": style.fill_opacity,
                        "weight": style.weight,
                    },
                }),
                Layer::Polyline(points, style) => json!({
                    "type": "Feature",
                    "geometry": {
                        "type": "LineString",
                        "coordinates": points.iter().map(position).collect::<Vec<_>>(),
                    },
                    "properties": {
                        "kind": "polyline",
                        "color": style.color.as_ref(),
                        "weight": style.weight,
                    },
                }),
            })
            .collect();

        let mut collection = json!({
            "type": "FeatureCollection",
            "features": features,
        });
        if let Viewport::Fitted(b) = &self.viewport {
            collection["bbox"] = json!([b.west, b.south, b.east, b.north]);
        }
        collection
    }
}

impl MapView for GeoJsonMapView {
    fn add_marker(&mut self, position: Coordinate) -> LayerId {
        self.insert(Layer::Marker(position))
    }

    fn add_circle(&mut self, center: Coordinate, style: CircleStyle) -> LayerId {
        self.insert(Layer::Circle(center, style))
    }

    fn add_polyline(&mut self, points: &[Coordinate], style: PolylineStyle) -> LayerId {
        self.insert(Layer::Polyline(points.to_vec(), style))
    }

    fn remove_layer(&mut self, layer_id: LayerId) {
        self.layers.remove(&layer_id);
    }

    fn fit_bounds(&mut self, bounds: Bounds) {
        self.viewport = Viewport::Fitted(bounds);
    }

    fn set_view(&mut self, center: Coordinate, zoom: u8) {
        self.viewport = Viewport::Centered { center, zoom };
    }
}
