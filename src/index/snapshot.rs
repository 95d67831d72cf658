//! On-disk snapshot format for the vector index.
//!
//! Two artifacts are written side by side, named after the database file so
//! several stores can share a directory:
//!
//! - `<stem>.index.bin`: `b"RCIX"`, format version (u32 LE), dimension
//!   (u32 LE), row count (u64 LE), then `count * dim` little-endian f32s in
//!   insertion order.
//! - `<stem>.index_ids.json`: JSON array of record ids in the same order.
//!
//! Both files are written via temp file + rename and must agree on row count
//! before a snapshot is trusted.

use std::path::{Path, PathBuf};

use thiserror::Error;

pub const VECTORS_SUFFIX: &str = "index.bin";
pub const IDS_SUFFIX: &str = "index_ids.json";
const DEFAULT_STEM: &str = "memory";

const MAGIC: &[u8; 4] = b"RCIX";
const FORMAT_VERSION: u32 = 1;
const HEADER_LEN: usize = 4 + 4 + 4 + 8;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("no snapshot on disk")]
    Missing,

    #[error("snapshot I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot id list is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("snapshot is corrupt: {0}")]
    Corrupt(String),
}

/// Locations of the two snapshot artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotPaths {
    pub vectors: PathBuf,
    pub ids: PathBuf,
}

impl SnapshotPaths {
    /// `<stem>.index.bin` and `<stem>.index_ids.json` inside `dir`.
    pub fn new(dir: impl AsRef<Path>, stem: &str) -> Self {
        let dir = dir.as_ref();
        Self {
            vectors: dir.join(format!("{stem}.{VECTORS_SUFFIX}")),
            ids: dir.join(format!("{stem}.{IDS_SUFFIX}")),
        }
    }

    /// Snapshot files in `dir` for the database at `db_path`, keyed by its
    /// file stem (`memory.db` -> `memory.index.bin`).
    pub fn for_database(dir: impl AsRef<Path>, db_path: &Path) -> Self {
        let stem = db_path
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_STEM);
        Self::new(dir, stem)
    }

    pub fn exists(&self) -> bool {
        self.vectors.exists() && self.ids.exists()
    }
}

/// Serialize a flat row-major vector buffer with its header.
pub fn encode_vectors(dim: usize, vectors: &[f32]) -> Vec<u8> {
    let count = if dim == 0 { 0 } else { vectors.len() / dim };
    let mut out = Vec::with_capacity(HEADER_LEN + vectors.len() * 4);
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    out.extend_from_slice(&(dim as u32).to_le_bytes());
    out.extend_from_slice(&(count as u64).to_le_bytes());
    for x in vectors {
        out.extend_from_slice(&x.to_le_bytes());
    }
    out
}

/// Parse a vectors file, checking magic, version, dimension and exact length.
/// Returns the flat buffer and the row count.
pub fn decode_vectors(bytes: &[u8], dim: usize) -> Result<(Vec<f32>, usize), SnapshotError> {
    if bytes.len() < HEADER_LEN {
        return Err(SnapshotError::Corrupt(format!(
            "header truncated ({} bytes)",
            bytes.len()
        )));
    }
    let (header, body) = bytes.split_at(HEADER_LEN);
    if &header[0..4] != MAGIC {
        return Err(SnapshotError::Corrupt("bad magic".into()));
    }

    let version = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);
    if version != FORMAT_VERSION {
        return Err(SnapshotError::Corrupt(format!("unsupported version {version}")));
    }

    let stored_dim = u32::from_le_bytes([header[8], header[9], header[10], header[11]]) as usize;
    if stored_dim != dim {
        return Err(SnapshotError::Corrupt(format!(
            "dimension {stored_dim}, expected {dim}"
        )));
    }

    let mut count_bytes = [0u8; 8];
    count_bytes.copy_from_slice(&header[12..20]);
    let count = u64::from_le_bytes(count_bytes) as usize;

    let expected_len = count
        .checked_mul(dim)
        .and_then(|n| n.checked_mul(4))
        .ok_or_else(|| SnapshotError::Corrupt(format!("row count {count} overflows")))?;
    if body.len() != expected_len {
        return Err(SnapshotError::Corrupt(format!(
            "body is {} bytes, expected {expected_len} for {count} rows",
            body.len()
        )));
    }

    let vectors: Vec<f32> = body
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect();
    if !vectors.iter().all(|x| x.is_finite()) {
        return Err(SnapshotError::Corrupt("non-finite vector component".into()));
    }
    Ok((vectors, count))
}

/// Write both artifacts atomically (each via temp file + rename).
pub fn write(paths: &SnapshotPaths, vector_bytes: &[u8], ids: &[String]) -> Result<(), SnapshotError> {
    let ids_json = serde_json::to_vec(ids)?;
    write_atomic(&paths.ids, &ids_json)?;
    write_atomic(&paths.vectors, vector_bytes)?;
    Ok(())
}

/// Read and cross-validate both artifacts.
pub fn read(paths: &SnapshotPaths, dim: usize) -> Result<(Vec<f32>, Vec<String>), SnapshotError> {
    if !paths.exists() {
        return Err(SnapshotError::Missing);
    }

    let vector_bytes = std::fs::read(&paths.vectors)?;
    let ids_bytes = std::fs::read(&paths.ids)?;

    let (vectors, count) = decode_vectors(&vector_bytes, dim)?;
    let ids: Vec<String> = serde_json::from_slice(&ids_bytes)?;

    if ids.len() != count {
        return Err(SnapshotError::Corrupt(format!(
            "{count} vectors but {} ids",
            ids.len()
        )));
    }

    Ok((vectors, ids))
}

fn write_atomic(dest: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let tmp_path = dest.with_extension("tmp");
    std::fs::write(&tmp_path, bytes)?;
    std::fs::rename(&tmp_path, dest)
}
