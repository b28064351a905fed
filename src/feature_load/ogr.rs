use std::path::Path;
use std::process::Command;

use tracing::info;

use crate::feature_load::config::{Dataset, DbConfig, GeometryKind};
use crate::feature_load::error::LoadError;

/// Argument list for the ogr2ogr invocation that streams a local file
/// straight into PostGIS. Fetch and load are fused in the external process;
/// the Transcoder and Loader are bypassed on this path.
pub fn ogr2ogr_args(path: &Path, dataset: &Dataset, db: &DbConfig) -> Vec<String> {
    let mut args = vec![
        "-f".to_string(),
        "PostgreSQL".to_string(),
        format!("PG:{}", db.connection_string()),
        path.display().to_string(),
        "-nln".to_string(),
        dataset.table.clone(),
        "-t_srs".to_string(),
        format!("EPSG:{}", dataset.target_srid),
        "-lco".to_string(),
        "GEOMETRY_NAME=geom".to_string(),
        "-lco".to_string(),
        "OVERWRITE=YES".to_string(),
    ];
    if dataset.geometry == GeometryKind::MultiPolygon {
        args.push("-nlt".to_string());
        args.push("MULTIPOLYGON".to_string());
    }
    args
}

pub fn run_ogr2ogr(path: &Path, dataset: &Dataset, db: &DbConfig) -> Result<(), LoadError> {
    info!(file = %path.display(), table = %dataset.table, "loading file via ogr2ogr");
    let status = Command::new("ogr2ogr")
        .args(ogr2ogr_args(path, dataset, db))
        .status()
        .map_err(LoadError::Ogr2OgrSpawn)?;
    if !status.success() {
        return Err(LoadError::Ogr2Ogr(status));
    }
    Ok(())
}
