//! Loaders for the on-disk catalog export.
//!
//! The catalog is shipped as two files produced by the ingestion pipeline:
//! - `movies.jsonl`: one JSON movie record per line, catalog order
//! - `embeddings.bin`: little-endian header (`count: u32`, `dim: u32`)
//!   followed by `count * dim` f32 components, row-major, same order
//!
//! Rows are re-normalized on load rather than trusted, so the unit-norm
//! invariant holds regardless of how the export was produced.

use crate::error::{CatalogError, Result};
use crate::types::{CatalogStore, Embeddings, Movie};
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use tracing::info;

const MOVIES_FILE: &str = "movies.jsonl";
const EMBEDDINGS_FILE: &str = "embeddings.bin";

/// Parse the newline-delimited JSON movie file.
pub fn load_movies(path: &Path) -> Result<Vec<Movie>> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut movies = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue; // Skip empty lines
        }

        let movie: Movie =
            serde_json::from_str(trimmed).map_err(|e| CatalogError::ParseError {
                file: path.display().to_string(),
                line: idx + 1,
                reason: e.to_string(),
            })?;
        movies.push(movie);
    }

    Ok(movies)
}

/// Read the binary embedding matrix.
pub fn load_embeddings(path: &Path) -> Result<Embeddings> {
    let mut file = File::open(path)?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;

    let invalid = |reason: &str| CatalogError::InvalidEmbeddingFile {
        path: path.display().to_string(),
        reason: reason.to_string(),
    };

    if bytes.len() < 8 {
        return Err(invalid("file shorter than the 8-byte header"));
    }

    let count = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize;
    let dim = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]) as usize;

    let expected = 8 + count * dim * 4;
    if bytes.len() != expected {
        return Err(invalid(&format!(
            "expected {} bytes for {} rows of dimension {}, found {}",
            expected,
            count,
            dim,
            bytes.len()
        )));
    }

    let data: Vec<f32> = bytes[8..]
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect();

    Embeddings::from_flat(dim, data)
}

impl CatalogStore {
    /// Load a catalog from a directory holding `movies.jsonl` and
    /// `embeddings.bin`.
    pub fn load(dir: &Path) -> Result<Self> {
        let movies = load_movies(&dir.join(MOVIES_FILE))?;
        let embeddings = load_embeddings(&dir.join(EMBEDDINGS_FILE))?;
        info!(
            movies = movies.len(),
            dim = embeddings.dim(),
            "Loaded catalog from {}",
            dir.display()
        );
        Self::new(movies, embeddings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_embeddings(path: &Path, rows: &[&[f32]]) {
        let dim = rows.first().map(|r| r.len()).unwrap_or(0);
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&(rows.len() as u32).to_le_bytes());
        bytes.extend_from_slice(&(dim as u32).to_le_bytes());
        for row in rows {
            for x in *row {
                bytes.extend_from_slice(&x.to_le_bytes());
            }
        }
        std::fs::write(path, bytes).unwrap();
    }

    #[test]
    fn test_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();

        let mut jsonl = File::create(dir.path().join(MOVIES_FILE)).unwrap();
        writeln!(
            jsonl,
            r#"{{"id":1,"title":"The Matrix","genres":"Action,Sci-Fi","overview":"A hacker...","release_date":"1999-03-31","poster_path":"/matrix.jpg","vote_count":9000,"original_language":"en","adult":false}}"#
        )
        .unwrap();
        writeln!(jsonl, r#"{{"id":2,"title":"Amelie","vote_count":4000}}"#).unwrap();

        write_embeddings(
            &dir.path().join(EMBEDDINGS_FILE),
            &[&[3.0, 4.0], &[0.0, 5.0]],
        );

        let catalog = CatalogStore::load(dir.path()).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.dim(), 2);
        assert_eq!(catalog.get(1).unwrap().title, "The Matrix");

        // Defaults fill the sparse second record
        let amelie = catalog.get(2).unwrap();
        assert_eq!(amelie.genres, "");
        assert!(!amelie.adult);

        // Rows were re-normalized on load
        assert!((catalog.embedding(0)[0] - 0.6).abs() < 1e-6);
        assert_eq!(catalog.embedding(1), &[0.0, 1.0]);
    }

    #[test]
    fn test_bad_json_line_reports_position() {
        let dir = tempfile::tempdir().unwrap();
        let mut jsonl = File::create(dir.path().join("bad.jsonl")).unwrap();
        writeln!(jsonl, r#"{{"id":1,"title":"Ok"}}"#).unwrap();
        writeln!(jsonl, "not json").unwrap();

        let err = load_movies(&dir.path().join("bad.jsonl")).unwrap_err();
        assert!(matches!(err, CatalogError::ParseError { line: 2, .. }));
    }

    #[test]
    fn test_truncated_embedding_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(EMBEDDINGS_FILE);

        let mut bytes = Vec::new();
        bytes.extend_from_slice(&2u32.to_le_bytes());
        bytes.extend_from_slice(&3u32.to_le_bytes());
        bytes.extend_from_slice(&1.0f32.to_le_bytes()); // 1 of 6 floats
        std::fs::write(&path, bytes).unwrap();

        let err = load_embeddings(&path).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidEmbeddingFile { .. }));
    }
}
