mod loader;
mod model;

use std::{collections::BTreeMap, path::PathBuf};

use once_cell::sync::Lazy;
use thiserror::Error;

pub use loader::load_descriptors;
pub use model::{ApiDescriptor, AuthType};

static BUILTIN: Lazy<Catalog> = Lazy::new(|| {
    let descriptors: Vec<ApiDescriptor> =
        serde_json::from_str(include_str!("builtin.json")).expect("embedded catalog parses");
    Catalog::from_descriptors(descriptors).expect("embedded catalog is consistent")
});

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("duplicate API id: {0}")]
    DuplicateId(String),
    #[error("API {0} requires auth but has no mockResponse")]
    MissingMock(String),
    #[error("reading catalog {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing catalog {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Read-only mapping from descriptor id to descriptor.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    apis: BTreeMap<String, ApiDescriptor>,
}

impl Catalog {
    pub fn from_descriptors(
        descriptors: impl IntoIterator<Item = ApiDescriptor>,
    ) -> Result<Self, CatalogError> {
        let mut apis = BTreeMap::new();
        for descriptor in descriptors {
            validate(&descriptor)?;
            if apis.contains_key(&descriptor.id) {
                return Err(CatalogError::DuplicateId(descriptor.id));
            }
            apis.insert(descriptor.id.clone(), descriptor);
        }
        Ok(Self { apis })
    }

    pub fn builtin() -> Self {
        BUILTIN.clone()
    }

    pub fn load(path: &std::path::Path) -> Result<Self, CatalogError> {
        Self::from_descriptors(load_descriptors(path)?)
    }

    /// Overlays `other` on top of this catalog; ids present in both take `other`'s descriptor.
    pub fn merge(&mut self, other: Catalog) {
        self.apis.extend(other.apis);
    }

    pub fn get(&self, id: &str) -> Option<&ApiDescriptor> {
        self.apis.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.apis.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ApiDescriptor> {
        self.apis.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.apis.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.apis.len()
    }

    pub fn is_empty(&self) -> bool {
        self.apis.is_empty()
    }
}

fn validate(descriptor: &ApiDescriptor) -> Result<(), CatalogError> {
    if descriptor.auth_required && descriptor.mock_response.is_null() {
        return Err(CatalogError::MissingMock(descriptor.id.clone()));
    }
    Ok(())
}
