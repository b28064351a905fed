use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

use crate::feature_load::db::DbError;

/// Fatal pipeline failures. A single row failing to insert is deliberately
/// not represented here: those are caught inside the Loader, logged, and
/// counted in the [`LoadReport`](crate::feature_load::LoadReport) instead of
/// aborting the run.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("fetching {url}: {source}")]
    Fetch {
        url: String,
        source: reqwest::Error,
    },

    #[error("unexpected HTTP status {status} from {url}")]
    FetchStatus { url: String, status: u16 },

    #[error("decoding feature collection: {0}")]
    Decode(#[from] geojson::Error),

    #[error("reading {}: {source}", path.display())]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid table name '{0}'")]
    TableName(String),

    #[error("provisioning table '{table}': {source}")]
    Schema { table: String, source: DbError },

    #[error("database error: {0}")]
    Db(#[from] DbError),

    #[error("launching ogr2ogr: {0}")]
    Ogr2OgrSpawn(std::io::Error),

    #[error("ogr2ogr exited with {0}")]
    Ogr2Ogr(ExitStatus),
}
