use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use tracing::{error, info};

use wfs_postgis::{run_dataset, Dataset, DbConfig, GeometryKind, Source};

/// Fetch a geospatial dataset and load it into PostGIS, replacing the
/// target table. Connection parameters come from DB_HOST, DB_PORT, DB_NAME,
/// DB_USER and DB_PASSWORD (a .env file is honored).
#[derive(Debug, Parser)]
#[command(name = "wfs-postgis")]
struct Args {
    /// WFS endpoint returning a GeoJSON feature collection
    #[arg(long, conflicts_with = "file", required_unless_present = "file")]
    url: Option<String>,

    /// Local geospatial file; non-GeoJSON formats are streamed via ogr2ogr
    #[arg(long)]
    file: Option<PathBuf>,

    /// Destination table (in the public schema)
    #[arg(long)]
    table: String,

    /// Feature property to use for the name column
    #[arg(long, default_value = "name")]
    name_property: String,

    /// SRID the source geometries are expressed in
    #[arg(long, default_value_t = 4326)]
    source_srid: u32,

    /// SRID of the geometry column
    #[arg(long, default_value_t = 4326)]
    target_srid: u32,

    /// Geometry column type
    #[arg(long, value_enum, default_value = "generic")]
    geometry_type: GeometryType,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum GeometryType {
    /// Loosely typed column for datasets mixing geometry types
    Generic,
    /// Tightly typed column for homogeneous polygon datasets
    Multipolygon,
}

impl From<GeometryType> for GeometryKind {
    fn from(value: GeometryType) -> Self {
        match value {
            GeometryType::Generic => GeometryKind::Generic,
            GeometryType::Multipolygon => GeometryKind::MultiPolygon,
        }
    }
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let source = match (args.url, args.file) {
        (Some(url), None) => Source::Wfs { url },
        (None, Some(path)) => Source::File { path },
        _ => {
            error!("exactly one of --url or --file must be given");
            return ExitCode::FAILURE;
        }
    };
    let dataset = Dataset {
        table: args.table,
        source,
        geometry: args.geometry_type.into(),
        name_property: args.name_property,
        source_srid: args.source_srid,
        target_srid: args.target_srid,
    };

    let db_config = match DbConfig::from_env() {
        Ok(config) => config,
        Err(error) => {
            error!("{error}");
            return ExitCode::FAILURE;
        }
    };

    match run_dataset(&dataset, &db_config) {
        Ok(report) => {
            info!(
                fetched = report.fetched,
                inserted = report.inserted,
                skipped = report.skipped_no_geometry,
                failed = report.failed_rows,
                "load finished"
            );
            ExitCode::SUCCESS
        }
        Err(error) => {
            error!("{error}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_source_is_required() {
        assert!(Args::try_parse_from(["wfs-postgis", "--table", "woonplaats"]).is_err());
    }

    #[test]
    fn url_and_file_are_mutually_exclusive() {
        let result = Args::try_parse_from([
            "wfs-postgis",
            "--table",
            "woonplaats",
            "--url",
            "http://wfs.invalid/collection",
            "--file",
            "woonplaats.geojson",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn url_alone_is_accepted() {
        let args = Args::try_parse_from([
            "wfs-postgis",
            "--table",
            "woonplaats",
            "--url",
            "http://wfs.invalid/collection",
        ])
        .unwrap();
        assert!(args.url.is_some());
        assert!(args.file.is_none());
    }
}
