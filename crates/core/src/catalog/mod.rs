pub mod filter;

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::warn;

use crate::domain::product::ProductRecord;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("could not read catalog file `{path}`: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("could not parse catalog file `{path}`: {source}")]
    Parse { path: PathBuf, source: serde_json::Error },
}

/// Products held for the duration of one request.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    products: Vec<ProductRecord>,
}

impl Catalog {
    pub fn new(products: Vec<ProductRecord>) -> Self {
        Self { products }
    }

    /// Looks up a record by its position. Negative or out-of-range
    /// indexes yield `None`.
    pub fn get(&self, index: i64) -> Option<&ProductRecord> {
        usize::try_from(index).ok().and_then(|index| self.products.get(index))
    }

    pub fn products(&self) -> &[ProductRecord] {
        &self.products
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

/// Static JSON catalog read from disk on every call.
#[derive(Clone, Debug)]
pub struct JsonFileCatalog {
    path: PathBuf,
}

impl JsonFileCatalog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn try_load(&self) -> Result<Catalog, CatalogError> {
        let raw = fs::read_to_string(&self.path)
            .map_err(|source| CatalogError::Read { path: self.path.clone(), source })?;
        let products = serde_json::from_str::<Vec<ProductRecord>>(&raw)
            .map_err(|source| CatalogError::Parse { path: self.path.clone(), source })?;
        Ok(Catalog::new(products))
    }

    /// Loads the catalog, degrading any failure to an empty catalog.
    pub fn load(&self) -> Catalog {
        match self.try_load() {
            Ok(catalog) => catalog,
            Err(error) => {
                warn!(
                    event_name = "catalog.load_failed",
                    path = %self.path.display(),
                    error = %error,
                    "catalog could not be loaded, serving an empty catalog"
                );
                Catalog::default()
            }
        }
    }
}
