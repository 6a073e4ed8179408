// src/loader.rs

//! Reading snapshot documents from strings, readers and files.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::core::catalog::DemoCatalog;
use crate::core::snapshot::SnapshotDocument;
use crate::error::{ReplayError, Result};

/// Parses the JSON text of a snapshot document without validating scenarios.
pub fn parse_document(json: &str) -> Result<SnapshotDocument> {
    Ok(serde_json::from_str(json)?)
}

pub fn load_from_str(json: &str) -> Result<DemoCatalog> {
    DemoCatalog::load(parse_document(json)?)
}

pub fn load_from_reader<R: Read>(reader: R) -> Result<DemoCatalog> {
    let document: SnapshotDocument = serde_json::from_reader(BufReader::new(reader))?;
    DemoCatalog::load(document)
}

/// Opens and loads a snapshot file.
///
/// # Errors
///
/// [`ReplayError::NotFound`] if the file does not exist, otherwise any I/O,
/// JSON or [`DataError::NoScenarios`](crate::core::scenario::DataError)
/// failure.
pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<DemoCatalog> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => {
            ReplayError::not_found(format!("snapshot file {}", path.display()))
        }
        _ => ReplayError::Io(e),
    })?;
    log::info!("Loading snapshot from {}", path.display());
    load_from_reader(file)
}
