#![allow(clippy::new_without_default)]

#[macro_use]
extern crate log;
#[macro_use]
extern crate anyhow;

pub mod config;
pub mod coordinate;
pub mod date_key;
pub mod export_data;
pub mod import_data;
pub mod kv_store;
pub mod location_source;
pub mod logs;
pub mod map_view;
pub mod route_selection;
pub mod route_store;
pub mod tracker;
