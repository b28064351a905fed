//! The feature-load pipeline: fetch a GeoJSON feature collection from a WFS
//! endpoint (or stream a local file through ogr2ogr), reproject, and
//! bulk-load it into PostGIS, fully replacing the target table.

pub mod config;
pub mod db;
pub mod error;
pub mod fetcher;
pub mod ogr;
pub mod pipeline;
pub mod transcoder;

pub use config::{Dataset, DbConfig, GeometryKind, Source};
pub use error::LoadError;
pub use pipeline::{run_dataset, LoadPipeline, LoadReport};
