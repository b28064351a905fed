pub mod feature_load;

pub use feature_load::{
    run_dataset, Dataset, DbConfig, GeometryKind, LoadError, LoadReport, Source,
};
