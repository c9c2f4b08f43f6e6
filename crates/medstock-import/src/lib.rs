//! File-based ingestion of supplier catalog exports and historical order
//! logs into the medstock store.
//!
//! Two pipelines with deliberately different failure postures:
//!
//! - [`catalog::import_products`] stages every usable row first and writes
//!   them in one all-or-nothing bulk upsert. A store failure rolls the whole
//!   catalog batch back, because a half-merged catalog would poison every
//!   later order lookup.
//! - [`orders::import_orders`] wraps each row in its own savepoint so one
//!   malformed row rolls back alone and the rest of the batch commits.

use std::path::PathBuf;

use medstock_db::DbError;
use thiserror::Error;

pub mod catalog;
pub mod columns;
pub mod orders;
mod reader;

pub use catalog::{import_products, CatalogImportReport};
pub use columns::{ColumnMap, HeaderIndex};
pub use orders::{import_orders, OrderImportReport};

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("cannot open {path:?}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("column map {path:?}: {reason}")]
    ColumnMap { path: PathBuf, reason: String },

    #[error("{path:?} has no \"{column}\" column")]
    MissingColumn { path: PathBuf, column: String },

    #[error("catalog batch rolled back: {attempted} rows attempted, 0 committed")]
    BulkUpsert {
        attempted: usize,
        #[source]
        source: DbError,
    },

    #[error(transparent)]
    Db(#[from] DbError),
}
