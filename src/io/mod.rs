//! JSON file I/O.
//!
//! Skeletons, surfaces, mapping tables and options are exchanged with the
//! host application as JSON documents:
//!
//! | Document | Shape |
//! |----------|-------|
//! | Skeleton | array of joint records, parents before children |
//! | Surface | `positions`, `polygons` (vertices, corner UVs, material), `materials`, optional `world` |
//! | Tables | object with `prune`, `correspondence`, `relative`, `roll`, `params`, `landmarks`, `anatomy` |
//! | Options | [`RetargetOptions`] fields, all optional |
//!
//! ```no_run
//! use metarig::io;
//!
//! let source = io::load_skeleton("character.json").unwrap();
//! let template = io::load_skeleton("metarig.json").unwrap();
//! io::save_skeleton(&template, "copy.json").unwrap();
//! ```

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Result, RigError};
use crate::retarget::{MappingTables, RetargetOptions};
use crate::skeleton::Skeleton;
use crate::surface::MeshSurface;

/// Read and deserialize a JSON document.
///
/// Parse and validation failures are reported as [`RigError::LoadError`]
/// with the offending path.
pub fn load_json<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<T> {
    let path = path.as_ref();
    let file = File::open(path)?;
    serde_json::from_reader(BufReader::new(file)).map_err(|e| RigError::LoadError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Serialize a value as pretty-printed JSON.
pub fn save_json<T: Serialize, P: AsRef<Path>>(value: &T, path: P) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path.as_ref())?);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// Load a skeleton.
pub fn load_skeleton<P: AsRef<Path>>(path: P) -> Result<Skeleton> {
    load_json(path)
}

/// Save a skeleton.
pub fn save_skeleton<P: AsRef<Path>>(skeleton: &Skeleton, path: P) -> Result<()> {
    save_json(skeleton, path)
}

/// Load and triangulate a mesh surface.
pub fn load_surface<P: AsRef<Path>>(path: P) -> Result<MeshSurface> {
    load_json(path)
}

/// Save a mesh surface (as triangles).
pub fn save_surface<P: AsRef<Path>>(surface: &MeshSurface, path: P) -> Result<()> {
    save_json(&surface.to_record(), path)
}

/// Load mapping tables and check them.
pub fn load_tables<P: AsRef<Path>>(path: P) -> Result<MappingTables> {
    let path = path.as_ref();
    let tables: MappingTables = load_json(path)?;
    tables.validate().map_err(|e| RigError::LoadError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    Ok(tables)
}

/// Save mapping tables.
pub fn save_tables<P: AsRef<Path>>(tables: &MappingTables, path: P) -> Result<()> {
    save_json(tables, path)
}

/// Load retarget options and check them.
pub fn load_options<P: AsRef<Path>>(path: P) -> Result<RetargetOptions> {
    let path = path.as_ref();
    let options: RetargetOptions = load_json(path)?;
    options.validate().map_err(|e| RigError::LoadError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    Ok(options)
}
