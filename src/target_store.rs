//! Persistence of the navigation target.
//!
//! On disk the target is a pair of floats. A value at or above
//! [`ABSENT_SENTINEL`] in either field means "no target"; in memory absence is
//! always `None`.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use toml_edit::{value, DocumentMut, Item, Table};
use tracing::{debug, warn};

use crate::config::StoreConfig;
use crate::error::PersistenceError;
use crate::gnss::Coordinate;

/// Stored values at or above this mark an absent target.
pub const ABSENT_SENTINEL: f64 = 400.0;

pub trait TargetStore {
    /// Reads the persisted target, `None` when no valid record exists.
    fn load(&self) -> Result<Option<Coordinate>, PersistenceError>;

    /// Replaces the whole record with `coordinate`.
    fn save(&mut self, coordinate: Coordinate) -> Result<(), PersistenceError>;

    /// Removes the record.
    fn clear(&mut self) -> Result<(), PersistenceError>;
}

/// Maps a raw stored pair onto an optional target.
fn decode(latitude: f64, longitude: f64) -> Option<Coordinate> {
    if latitude >= ABSENT_SENTINEL || longitude >= ABSENT_SENTINEL {
        return None;
    }
    let coordinate = Coordinate::new(latitude, longitude);
    if !coordinate.is_valid() {
        warn!("Ignoring stored target outside coordinate range: {:?}", coordinate);
        return None;
    }
    Some(coordinate)
}

/// In-memory store holding the raw float pair.
#[derive(Debug, Clone, Default)]
pub struct MemoryTargetStore {
    record: Option<(f64, f64)>,
}

impl MemoryTargetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-filled with a raw record, sentinel values included.
    pub fn with_record(latitude: f64, longitude: f64) -> Self {
        MemoryTargetStore {
            record: Some((latitude, longitude)),
        }
    }
}

impl TargetStore for MemoryTargetStore {
    fn load(&self) -> Result<Option<Coordinate>, PersistenceError> {
        Ok(self.record.and_then(|(lat, lon)| decode(lat, lon)))
    }

    fn save(&mut self, coordinate: Coordinate) -> Result<(), PersistenceError> {
        self.record = Some((coordinate.latitude, coordinate.longitude));
        Ok(())
    }

    fn clear(&mut self) -> Result<(), PersistenceError> {
        self.record = None;
        Ok(())
    }
}

/// File-backed store keeping the target in one table of a TOML document.
///
/// Other tables in the same file are left untouched. Every write goes to a
/// sibling temp file that is renamed into place, so a reader never sees one
/// field updated without the other.
#[derive(Debug, Clone)]
pub struct TomlTargetStore {
    path: PathBuf,
    table: String,
    latitude_key: String,
    longitude_key: String,
}

impl TomlTargetStore {
    pub fn new(config: &StoreConfig) -> Self {
        TomlTargetStore {
            path: config.path.clone(),
            table: config.table.clone(),
            latitude_key: config.latitude_key.clone(),
            longitude_key: config.longitude_key.clone(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn read_float(table: &Table, key: &str) -> Option<f64> {
        let item = table.get(key)?;
        item.as_float()
            .or_else(|| item.as_integer().map(|i| i as f64))
    }

    /// Reads the whole document, `None` when the file does not exist.
    fn read_document(&self) -> Result<Option<DocumentMut>, PersistenceError> {
        match fs::read_to_string(&self.path) {
            Ok(text) => Ok(Some(text.parse()?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write_document(&self, doc: &DocumentMut) -> Result<(), PersistenceError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let temp = self.temp_path();
        {
            let mut file = fs::File::create(&temp)?;
            file.write_all(doc.to_string().as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&temp, &self.path)?;
        Ok(())
    }
}

impl TargetStore for TomlTargetStore {
    fn load(&self) -> Result<Option<Coordinate>, PersistenceError> {
        let Some(doc) = self.read_document()? else {
            debug!("No target store at {}", self.path.display());
            return Ok(None);
        };
        let Some(table) = doc.get(&self.table).and_then(Item::as_table) else {
            return Ok(None);
        };
        let latitude = Self::read_float(table, &self.latitude_key);
        let longitude = Self::read_float(table, &self.longitude_key);
        Ok(match (latitude, longitude) {
            (Some(lat), Some(lon)) => decode(lat, lon),
            _ => None,
        })
    }

    /// Replaces only the session table; other tables in the file are kept.
    fn save(&mut self, coordinate: Coordinate) -> Result<(), PersistenceError> {
        let mut doc = self.read_document()?.unwrap_or_default();

        let mut table = Table::new();
        table.insert(&self.latitude_key, value(coordinate.latitude));
        table.insert(&self.longitude_key, value(coordinate.longitude));
        doc.insert(&self.table, Item::Table(table));

        self.write_document(&doc)?;
        debug!("Saved target {:?} to {}", coordinate, self.path.display());
        Ok(())
    }

    /// Drops the session table. The file goes away once nothing else is left.
    fn clear(&mut self) -> Result<(), PersistenceError> {
        let Some(mut doc) = self.read_document()? else {
            return Ok(());
        };
        if doc.remove(&self.table).is_none() {
            return Ok(());
        }
        if doc.is_empty() {
            match fs::remove_file(&self.path) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
                Err(e) => Err(e.into()),
            }
        } else {
            self.write_document(&doc)
        }
    }
}
