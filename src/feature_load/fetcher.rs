use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use geojson::{FeatureCollection, GeoJson};
use tracing::info;

use crate::feature_load::error::LoadError;

/// Produces the feature collection to load. Behind a trait so the pipeline
/// can be driven by a canned collection in tests.
pub trait FeatureSource {
    fn fetch(&self) -> Result<FeatureCollection, LoadError>;
}

/// Synchronous GET against a WFS endpoint that serves GeoJSON. Any
/// non-success status is fatal; there are no retries.
pub struct WfsSource {
    url: String,
    client: reqwest::blocking::Client,
}

impl WfsSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: reqwest::blocking::Client::new(),
        }
    }
}

impl FeatureSource for WfsSource {
    fn fetch(&self) -> Result<FeatureCollection, LoadError> {
        info!(url = %self.url, "fetching feature collection");
        let response = self
            .client
            .get(&self.url)
            .send()
            .map_err(|source| LoadError::Fetch {
                url: self.url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(LoadError::FetchStatus {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }

        let body = response.text().map_err(|source| LoadError::Fetch {
            url: self.url.clone(),
            source,
        })?;
        let collection = parse_collection(&body)?;
        info!(features = collection.features.len(), "fetched feature collection");
        Ok(collection)
    }
}

/// Local GeoJSON file, parsed in-process and loaded through the regular
/// pipeline rather than handed to ogr2ogr.
pub struct GeoJsonFileSource {
    path: PathBuf,
}

impl GeoJsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl FeatureSource for GeoJsonFileSource {
    fn fetch(&self) -> Result<FeatureCollection, LoadError> {
        info!(file = %self.path.display(), "reading feature collection");
        let body = std::fs::read_to_string(&self.path).map_err(|source| LoadError::FileRead {
            path: self.path.clone(),
            source,
        })?;
        parse_collection(&body)
    }
}

fn parse_collection(body: &str) -> Result<FeatureCollection, LoadError> {
    let geojson: GeoJson = body.parse()?;
    Ok(FeatureCollection::try_from(geojson)?)
}

/// How a local file should reach the database.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum FileKind {
    /// Parsed in-process and loaded feature by feature.
    GeoJson,
    /// Anything else (shapefiles, geopackages) is streamed into PostGIS
    /// wholesale by ogr2ogr.
    Ogr,
}

/// Sniff the start of the file to decide the load path.
pub fn detect_file_kind(path: &Path) -> Result<FileKind, LoadError> {
    let mut file = File::open(path).map_err(|source| LoadError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let mut buffer = [0u8; 4096];
    let read = file.read(&mut buffer).map_err(|source| LoadError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let header = &buffer[..read];

    if let Ok(text) = std::str::from_utf8(header) {
        let text = text.trim_start();
        if text.starts_with('{')
            && text.contains("\"type\"")
            && (text.contains("FeatureCollection") || text.contains("\"features\""))
        {
            return Ok(FileKind::GeoJson);
        }
    }
    Ok(FileKind::Ogr)
}
