use std::path::Path;

use tracing::{info, warn};

use crate::feature_load::config::{Dataset, DbConfig, Source};
use crate::feature_load::db::{self, SqlSession};
use crate::feature_load::error::LoadError;
use crate::feature_load::fetcher::{self, FeatureSource, FileKind, GeoJsonFileSource, WfsSource};
use crate::feature_load::ogr;
use crate::feature_load::transcoder::{self, FeatureRow};

/// Outcome of one run, for callers that want more than the logs. On the
/// ogr2ogr path only `verified_count` is populated; the external process
/// does not report per-feature figures.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LoadReport {
    pub fetched: usize,
    pub skipped_no_geometry: usize,
    pub inserted: usize,
    pub failed_rows: usize,
    /// Row count reported by the Verifier; `None` when verification failed.
    pub verified_count: Option<i64>,
}

/// One dataset load against one database session. Constructed per run;
/// nothing survives between runs except the target table itself.
pub struct LoadPipeline<'a, S: SqlSession> {
    dataset: &'a Dataset,
    session: S,
}

impl<'a, S: SqlSession> LoadPipeline<'a, S> {
    pub fn new(dataset: &'a Dataset, session: S) -> Self {
        Self { dataset, session }
    }

    /// Fetch, transcode, provision, load, verify. The fetch happens before
    /// any DDL so an unreachable endpoint leaves the previous table intact.
    pub fn run_features(&mut self, source: &dyn FeatureSource) -> Result<LoadReport, LoadError> {
        let collection = source.fetch()?;
        let fetched = collection.features.len();
        let rows = transcoder::transcode(&collection, &self.dataset.name_property);
        let skipped_no_geometry = fetched - rows.len();

        self.provision()?;
        let (inserted, failed_rows) = self.load(&rows)?;
        let verified_count = self.verify();

        Ok(LoadReport {
            fetched,
            skipped_no_geometry,
            inserted,
            failed_rows,
            verified_count,
        })
    }

    /// File variant: provision the table, then let ogr2ogr stream the file
    /// into it in one external invocation.
    pub fn run_file(&mut self, path: &Path, db_config: &DbConfig) -> Result<LoadReport, LoadError> {
        self.provision()?;
        ogr::run_ogr2ogr(path, self.dataset, db_config)?;
        Ok(LoadReport {
            verified_count: self.verify(),
            ..LoadReport::default()
        })
    }

    /// Drop and recreate the target table. Destructive by design: every run
    /// fully replaces the table contents.
    fn provision(&mut self) -> Result<(), LoadError> {
        let table = checked_table_name(&self.dataset.table)?;
        info!(table, "provisioning table");
        let ddl = format!(
            "DROP TABLE IF EXISTS public.{table};\n\
             CREATE TABLE public.{table} (\n\
                 id SERIAL PRIMARY KEY,\n\
                 name TEXT,\n\
                 geom GEOMETRY({geometry_type}, {srid})\n\
             );",
            geometry_type = self.dataset.geometry.sql_type(),
            srid = self.dataset.target_srid,
        );
        self.session
            .batch_execute(&ddl)
            .map_err(|source| LoadError::Schema {
                table: table.to_string(),
                source,
            })
    }

    /// Insert all rows inside one transaction, with a savepoint around each
    /// insert so one bad geometry cannot take down its siblings. Savepoint
    /// bookkeeping failures are fatal; row insert failures are not.
    fn load(&mut self, rows: &[FeatureRow]) -> Result<(usize, usize), LoadError> {
        let insert_sql = self.insert_sql();
        let mut inserted = 0;
        let mut failed = 0;

        self.session.batch_execute("BEGIN")?;
        for row in rows {
            self.session.batch_execute("SAVEPOINT feature_insert")?;
            match self.session.insert_row(&insert_sql, &row.name, &row.geometry) {
                Ok(_) => {
                    self.session.batch_execute("RELEASE SAVEPOINT feature_insert")?;
                    inserted += 1;
                }
                Err(error) => {
                    warn!(name = %row.name, %error, "row insert failed, skipping feature");
                    self.session
                        .batch_execute("ROLLBACK TO SAVEPOINT feature_insert")?;
                    failed += 1;
                }
            }
        }
        self.session.batch_execute("COMMIT")?;
        info!(inserted, failed, "load committed");
        Ok((inserted, failed))
    }

    fn insert_sql(&self) -> String {
        // ST_SetSRID runs before ST_Transform: the raw coordinates are
        // interpreted under the source SRID first, then reprojected.
        format!(
            "INSERT INTO public.{table} (name, geom) \
             VALUES ($1, ST_Transform(ST_SetSRID(ST_GeomFromGeoJSON($2), {source_srid}), {target_srid}))",
            table = self.dataset.table,
            source_srid = self.dataset.source_srid,
            target_srid = self.dataset.target_srid,
        )
    }

    /// Count rows post-load. Observational only: a failure here is reported
    /// but the committed data stands.
    fn verify(&mut self) -> Option<i64> {
        let sql = format!("SELECT COUNT(*) FROM public.{}", self.dataset.table);
        match self.session.count(&sql) {
            Ok(count) => {
                info!(table = %self.dataset.table, rows = count, "verified row count");
                Some(count)
            }
            Err(error) => {
                warn!(%error, "row count verification failed");
                None
            }
        }
    }
}

/// Run one dataset load end to end against a fresh database session. This
/// is the entry point the CLI calls.
pub fn run_dataset(dataset: &Dataset, db_config: &DbConfig) -> Result<LoadReport, LoadError> {
    let session = db::connect(db_config)?;
    let mut pipeline = LoadPipeline::new(dataset, session);
    match &dataset.source {
        Source::Wfs { url } => pipeline.run_features(&WfsSource::new(url.clone())),
        Source::File { path } => match fetcher::detect_file_kind(path)? {
            FileKind::GeoJson => pipeline.run_features(&GeoJsonFileSource::new(path.clone())),
            FileKind::Ogr => pipeline.run_file(path, db_config),
        },
    }
}

/// Table names are interpolated into DDL, so hold them to a conservative
/// identifier charset instead of trusting the caller.
fn checked_table_name(name: &str) -> Result<&str, LoadError> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_lowercase() || first == '_')
                && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        }
        None => false,
    };
    if valid {
        Ok(name)
    } else {
        Err(LoadError::TableName(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use crate::feature_load::config::{GeometryKind, Source};
    use crate::feature_load::db::DbError;

    use super::*;

    struct NoopSession;

    impl SqlSession for NoopSession {
        fn batch_execute(&mut self, _sql: &str) -> Result<(), DbError> {
            Ok(())
        }

        fn insert_row(&mut self, _sql: &str, _name: &str, _geometry: &str) -> Result<u64, DbError> {
            Ok(1)
        }

        fn count(&mut self, _sql: &str) -> Result<i64, DbError> {
            Ok(0)
        }
    }

    fn dataset() -> Dataset {
        Dataset {
            table: "woonplaats".to_string(),
            source: Source::File {
                path: PathBuf::from("unused"),
            },
            geometry: GeometryKind::Generic,
            name_property: "woonplaats".to_string(),
            source_srid: 28992,
            target_srid: 4326,
        }
    }

    #[test]
    fn insert_interprets_source_srid_before_transforming() {
        let dataset = dataset();
        let pipeline = LoadPipeline::new(&dataset, NoopSession);
        let sql = pipeline.insert_sql();

        let set_srid = sql.find("ST_SetSRID").unwrap();
        let transform = sql.find("ST_Transform").unwrap();
        assert!(transform < set_srid, "geometry must be tagged with its source SRID inside the transform");
        assert!(sql.contains("ST_GeomFromGeoJSON($2), 28992"));
        assert!(sql.contains(", 4326)"));
    }

    #[test]
    fn table_names_are_validated() {
        assert!(checked_table_name("woonplaats").is_ok());
        assert!(checked_table_name("stedin_hoogspanningsstations").is_ok());
        assert!(checked_table_name("table2").is_ok());

        assert!(checked_table_name("").is_err());
        assert!(checked_table_name("2fast").is_err());
        assert!(checked_table_name("drop table; --").is_err());
        assert!(checked_table_name("Woonplaats").is_err());
    }
}
