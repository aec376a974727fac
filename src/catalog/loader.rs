use std::{fs, path::Path};

use walkdir::WalkDir;

use super::{ApiDescriptor, CatalogError};

/// Reads descriptors from a JSON file, or from every `.json` file below a directory.
///
/// A file may hold either a single descriptor object or an array of them.
pub fn load_descriptors(path: &Path) -> Result<Vec<ApiDescriptor>, CatalogError> {
    if !path.is_dir() {
        return read_file(path);
    }

    let mut files: Vec<_> = WalkDir::new(path)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "json"))
        .map(|entry| entry.into_path())
        .collect();
    files.sort();

    let mut descriptors = Vec::new();
    for file in files {
        descriptors.extend(read_file(&file)?);
    }
    Ok(descriptors)
}

fn read_file(path: &Path) -> Result<Vec<ApiDescriptor>, CatalogError> {
    let contents = fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let parse_error = |source| CatalogError::Parse {
        path: path.to_path_buf(),
        source,
    };

    if contents.trim_start().starts_with('[') {
        serde_json::from_str(&contents).map_err(parse_error)
    } else {
        serde_json::from_str::<ApiDescriptor>(&contents)
            .map(|descriptor| vec![descriptor])
            .map_err(parse_error)
    }
}
