use super::CatalogError;

/// One catalog entry. `index` is the entry's position and its row in the
/// similarity matrix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Medicine {
    pub index: usize,
    pub name: String,
}

/// Ordered medicine catalog. Display names are not required to be unique.
#[derive(Debug, Clone, Default)]
pub struct MedicineCatalog {
    medicines: Vec<Medicine>,
}

impl MedicineCatalog {
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let medicines = names
            .into_iter()
            .enumerate()
            .map(|(index, name)| Medicine {
                index,
                name: name.into(),
            })
            .collect();
        Self { medicines }
    }

    pub fn len(&self) -> usize {
        self.medicines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.medicines.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Medicine> {
        self.medicines.get(index)
    }

    /// Index of the first entry whose display name equals `name` exactly.
    pub fn position_of(&self, name: &str) -> Option<usize> {
        self.medicines.iter().position(|m| m.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Medicine> {
        self.medicines.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.medicines.iter().map(|m| m.name.as_str())
    }
}

/// Square similarity matrix stored row-major.
#[derive(Debug, Clone)]
pub struct SimilarityMatrix {
    dimension: usize,
    scores: Vec<f64>,
}

impl SimilarityMatrix {
    /// Build from nested rows, rejecting ragged rows and non-finite scores.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self, CatalogError> {
        let dimension = rows.len();
        let mut scores = Vec::with_capacity(dimension * dimension);

        for (row, values) in rows.into_iter().enumerate() {
            if values.len() != dimension {
                return Err(CatalogError::NotSquare {
                    row,
                    len: values.len(),
                    expected: dimension,
                });
            }
            if let Some(col) = values.iter().position(|v| !v.is_finite()) {
                return Err(CatalogError::NonFinite { row, col });
            }
            scores.extend(values);
        }

        Ok(Self { dimension, scores })
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn row(&self, index: usize) -> Option<&[f64]> {
        if index >= self.dimension {
            return None;
        }
        let start = index * self.dimension;
        Some(&self.scores[start..start + self.dimension])
    }
}

/// Catalog plus matrix, validated to be positionally aligned.
#[derive(Debug, Clone)]
pub struct SimilarityStore {
    catalog: MedicineCatalog,
    matrix: SimilarityMatrix,
}

impl SimilarityStore {
    pub fn new(catalog: MedicineCatalog, matrix: SimilarityMatrix) -> Result<Self, CatalogError> {
        if catalog.len() != matrix.dimension() {
            return Err(CatalogError::Misaligned {
                matrix: matrix.dimension(),
                catalog: catalog.len(),
            });
        }
        Ok(Self { catalog, matrix })
    }

    pub fn catalog(&self) -> &MedicineCatalog {
        &self.catalog
    }

    pub fn matrix(&self) -> &SimilarityMatrix {
        &self.matrix
    }

    pub fn len(&self) -> usize {
        self.catalog.len()
    }

    pub fn is_empty(&self) -> bool {
        self.catalog.is_empty()
    }
}
