//! On-disk snapshot persistence for the flat vector index.
//!
//! Layout: one binary vector file plus one JSON sidecar holding the id
//! list, the embedding dimension, the encoder model identity, the last
//! update time, and a CRC32 of the vector file. The two files are written
//! together and read together; any disagreement between them is treated as
//! a corrupt snapshot and the caller starts from an empty index.
//!
//! Tombstoned entries are not persisted: a snapshot written after a soft
//! delete is already compacted on disk.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{MercatoError, Result};
use crate::index::FlatVectorIndex;
use crate::vector::Vector;

/// File name of the binary vector collection.
pub const VECTORS_FILE: &str = "vectors.bin";

/// File name of the JSON sidecar.
pub const SIDECAR_FILE: &str = "index_meta.json";

/// Sidecar contents, kept alongside the binary vector file.
#[derive(Debug, Serialize, Deserialize)]
struct SnapshotMeta {
    product_ids: Vec<u64>,
    embedding_dim: usize,
    model_name: String,
    last_updated: String,
    checksum: u32,
}

/// Write a snapshot of the index into `dir`.
///
/// Both files go through a temp-file-then-rename so a crashed writer never
/// leaves a half-written snapshot behind.
pub fn save(index: &FlatVectorIndex, dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)?;

    let mut product_ids = Vec::with_capacity(index.len());
    let mut vectors: Vec<&Vector> = Vec::with_capacity(index.len());
    for (product_id, vector) in index.live_entries() {
        product_ids.push(product_id);
        vectors.push(vector);
    }

    let vector_bytes = bincode::serialize(&vectors)
        .map_err(|e| MercatoError::storage(format!("Failed to encode vectors: {e}")))?;
    let checksum = crc32fast::hash(&vector_bytes);

    let meta = SnapshotMeta {
        product_ids,
        embedding_dim: index.dimension(),
        model_name: index.model_name().to_string(),
        last_updated: index.last_updated().to_rfc3339(),
        checksum,
    };
    let meta_bytes = serde_json::to_vec_pretty(&meta)?;

    write_atomic(dir, VECTORS_FILE, &vector_bytes)?;
    write_atomic(dir, SIDECAR_FILE, &meta_bytes)?;
    Ok(())
}

fn write_atomic(dir: &Path, name: &str, bytes: &[u8]) -> Result<()> {
    let tmp_path = dir.join(format!("{name}.tmp"));
    let final_path = dir.join(name);
    fs::write(&tmp_path, bytes)?;
    fs::rename(&tmp_path, &final_path)?;
    Ok(())
}

/// Load a snapshot from `dir`.
///
/// Returns `Ok(None)` when no snapshot exists. A snapshot that fails
/// validation (checksum, id/vector count, dimension) is an
/// [`MercatoError::IndexCorrupt`] — the caller decides whether to degrade
/// to an empty index.
pub fn load(dir: &Path) -> Result<Option<FlatVectorIndex>> {
    let vectors_path = dir.join(VECTORS_FILE);
    let sidecar_path = dir.join(SIDECAR_FILE);

    if !vectors_path.exists() && !sidecar_path.exists() {
        return Ok(None);
    }
    if !vectors_path.exists() || !sidecar_path.exists() {
        return Err(MercatoError::corrupt(
            "snapshot is missing one of its two files",
        ));
    }

    let meta_bytes = fs::read(&sidecar_path)?;
    let meta: SnapshotMeta = serde_json::from_slice(&meta_bytes)
        .map_err(|e| MercatoError::corrupt(format!("unreadable sidecar: {e}")))?;

    let vector_bytes = fs::read(&vectors_path)?;
    if crc32fast::hash(&vector_bytes) != meta.checksum {
        return Err(MercatoError::corrupt("vector file checksum mismatch"));
    }

    let vectors: Vec<Vector> = bincode::deserialize(&vector_bytes)
        .map_err(|e| MercatoError::corrupt(format!("unreadable vector file: {e}")))?;

    if vectors.len() != meta.product_ids.len() {
        return Err(MercatoError::corrupt(format!(
            "id list has {} entries but vector file has {}",
            meta.product_ids.len(),
            vectors.len()
        )));
    }
    if vectors
        .iter()
        .any(|vector| vector.dimension() != meta.embedding_dim)
    {
        return Err(MercatoError::corrupt("vector dimension mismatch"));
    }

    let last_updated: DateTime<Utc> = DateTime::parse_from_rfc3339(&meta.last_updated)
        .map_err(|e| MercatoError::corrupt(format!("bad last_updated timestamp: {e}")))?
        .with_timezone(&Utc);

    Ok(Some(FlatVectorIndex::from_parts(
        meta.embedding_dim,
        meta.model_name,
        vectors,
        meta.product_ids,
        last_updated,
    )))
}
