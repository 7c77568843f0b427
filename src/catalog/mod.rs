//! Similarity store: the medicine catalog and its precomputed similarity matrix.
//!
//! Both artifacts are produced by an external pipeline and loaded once at
//! startup. Row/column `i` of the matrix corresponds to catalog entry `i`;
//! the store is immutable after load and shared read-only.

pub mod loader;
pub mod types;

pub use loader::{load_similarity_store, parse_catalog, parse_matrix};
pub use types::{Medicine, MedicineCatalog, SimilarityMatrix, SimilarityStore};

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Cannot read artifact {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed artifact {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Catalog has no Drug_Name column")]
    MissingNameColumn,

    #[error("Catalog row label is not an index: {0}")]
    InvalidRowLabel(String),

    #[error("Catalog is missing row {0}")]
    MissingRow(usize),

    #[error("Similarity matrix is not square: row {row} has {len} columns, expected {expected}")]
    NotSquare { row: usize, len: usize, expected: usize },

    #[error("Similarity matrix has {matrix} rows but catalog has {catalog} medicines")]
    Misaligned { matrix: usize, catalog: usize },

    #[error("Similarity score at ({row}, {col}) is not finite")]
    NonFinite { row: usize, col: usize },
}
