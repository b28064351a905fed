use std::env;
use std::path::PathBuf;

use crate::feature_load::error::LoadError;

/// Connection parameters for the target PostGIS database, read once at
/// process start. The CLI loads a `.env` file before calling
/// [`DbConfig::from_env`].
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub dbname: String,
    pub user: String,
    pub password: String,
}

impl DbConfig {
    pub fn from_env() -> Result<Self, LoadError> {
        let port = require("DB_PORT")?;
        Ok(Self {
            host: require("DB_HOST")?,
            port: port
                .parse()
                .map_err(|_| LoadError::Config(format!("DB_PORT '{port}' is not a port number")))?,
            dbname: require("DB_NAME")?,
            user: require("DB_USER")?,
            password: require("DB_PASSWORD")?,
        })
    }

    /// Key/value connection string as understood by both libpq and the
    /// `PG:` driver of ogr2ogr.
    pub fn connection_string(&self) -> String {
        format!(
            "host={} port={} dbname={} user={} password={}",
            self.host, self.port, self.dbname, self.user, self.password
        )
    }
}

fn require(key: &str) -> Result<String, LoadError> {
    env::var(key).map_err(|_| LoadError::Config(format!("{key} is not set")))
}

/// Where the features come from.
#[derive(Debug, Clone)]
pub enum Source {
    /// WFS endpoint serving a GeoJSON feature collection over HTTP.
    Wfs { url: String },
    /// Local geospatial file. GeoJSON files go through the regular pipeline;
    /// anything else is streamed into PostGIS by ogr2ogr.
    File { path: PathBuf },
}

/// Geometry column typing for the target table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryKind {
    /// Loosely typed column for datasets mixing geometry types.
    Generic,
    /// Tightly typed column for sources known to be homogeneous.
    MultiPolygon,
}

impl GeometryKind {
    pub fn sql_type(self) -> &'static str {
        match self {
            Self::Generic => "Geometry",
            Self::MultiPolygon => "MultiPolygon",
        }
    }
}

/// Everything that distinguishes one dataset load from another. The old
/// per-dataset scripts collapse into one pipeline parameterized by this.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// Destination table, created in the public schema.
    pub table: String,
    pub source: Source,
    pub geometry: GeometryKind,
    /// Feature property holding the display name, e.g. "woonplaats".
    pub name_property: String,
    /// SRID the source geometries are expressed in.
    pub source_srid: u32,
    /// SRID of the geom column. WGS84 unless overridden.
    pub target_srid: u32,
}
