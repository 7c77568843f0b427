//! Artifact loading for the similarity store.
//!
//! The catalog is accepted in three JSON shapes:
//! - pandas column layout: `{"Drug_Name": {"0": "Paracetamol", "1": ...}, ...}`
//! - column of arrays: `{"Drug_Name": ["Paracetamol", ...]}`
//! - a bare array of names: `["Paracetamol", ...]`
//!
//! The similarity matrix is a JSON array of equal-length numeric rows.

use std::path::Path;

use serde_json::Value;

use super::types::{MedicineCatalog, SimilarityMatrix, SimilarityStore};
use super::CatalogError;

/// Column holding the display names.
pub const NAME_COLUMN: &str = "Drug_Name";

/// Load both artifacts from disk and validate their alignment.
pub fn load_similarity_store(
    catalog_path: &Path,
    similarity_path: &Path,
) -> Result<SimilarityStore, CatalogError> {
    let catalog_json = read_json(catalog_path)?;
    let catalog = parse_catalog(&catalog_json)?;

    let matrix_json = read_json(similarity_path)?;
    let matrix = parse_matrix(matrix_json, similarity_path)?;

    let store = SimilarityStore::new(catalog, matrix)?;
    tracing::info!(
        medicines = store.len(),
        catalog = %catalog_path.display(),
        similarity = %similarity_path.display(),
        "Similarity store loaded"
    );
    Ok(store)
}

fn read_json(path: &Path) -> Result<Value, CatalogError> {
    let bytes = std::fs::read(path).map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|source| CatalogError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Parse a catalog from any of the accepted JSON shapes.
pub fn parse_catalog(value: &Value) -> Result<MedicineCatalog, CatalogError> {
    match value {
        Value::Array(items) => names_from_array(items).map(MedicineCatalog::from_names),
        Value::Object(columns) => match columns.get(NAME_COLUMN) {
            Some(Value::Array(items)) => names_from_array(items).map(MedicineCatalog::from_names),
            Some(Value::Object(rows)) => {
                let mut labelled = Vec::with_capacity(rows.len());
                for (label, name) in rows {
                    let index: usize = label
                        .parse()
                        .map_err(|_| CatalogError::InvalidRowLabel(label.clone()))?;
                    labelled.push((index, display_name(name)));
                }
                labelled.sort_by_key(|(index, _)| *index);

                // Row labels must be exactly 0..n so positions match the matrix.
                for (expected, (index, _)) in labelled.iter().enumerate() {
                    if *index != expected {
                        return Err(CatalogError::MissingRow(expected));
                    }
                }
                Ok(MedicineCatalog::from_names(
                    labelled.into_iter().map(|(_, name)| name),
                ))
            }
            _ => Err(CatalogError::MissingNameColumn),
        },
        _ => Err(CatalogError::MissingNameColumn),
    }
}

fn names_from_array(items: &[Value]) -> Result<Vec<String>, CatalogError> {
    Ok(items.iter().map(display_name).collect())
}

/// Strings are taken verbatim; anything else uses its JSON rendering.
fn display_name(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Parse the similarity matrix.
pub fn parse_matrix(value: Value, path: &Path) -> Result<SimilarityMatrix, CatalogError> {
    let rows: Vec<Vec<f64>> =
        serde_json::from_value(value).map_err(|source| CatalogError::Json {
            path: path.to_path_buf(),
            source,
        })?;
    SimilarityMatrix::from_rows(rows)
}
