//! Partitioned Parquet source files
//!
//! Shards are discovered under a data directory by filename prefix and
//! `.parquet` extension, and always enumerated in lexicographic filename
//! order so repeated runs see rows in the same order. The ordering matters
//! for reproducibility of batch boundaries, not for correctness of the end
//! state.

use crate::{IngestionError, Result};
use parquet::file::reader::SerializedFileReader;
use parquet::record::reader::RowIter;
use serde_json::Value;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A directory of partitioned Parquet shards
#[derive(Debug, Clone)]
pub struct ParquetSource {
    dir: PathBuf,
    prefix: String,
}

impl ParquetSource {
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
        }
    }

    /// List matching shard files in lexicographic filename order
    pub fn discover(&self) -> Result<Vec<PathBuf>> {
        let entries = std::fs::read_dir(&self.dir).map_err(|e| {
            IngestionError::SourceError(format!(
                "failed reading data directory {}: {}",
                self.dir.display(),
                e
            ))
        })?;

        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| name.starts_with(&self.prefix) && name.ends_with(".parquet"))
            })
            .collect();

        files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

        if files.is_empty() {
            warn!(
                "No shards matching {}*.parquet under {}",
                self.prefix,
                self.dir.display()
            );
        }

        Ok(files)
    }

    /// Start a fresh pass over all shards.
    ///
    /// Each call re-discovers and re-reads the files, so the sequence is
    /// restartable.
    pub fn rows(&self) -> Result<RowStream> {
        Ok(RowStream {
            files: self.discover()?.into_iter(),
            current: None,
        })
    }
}

/// Lazy, finite stream of raw rows across all shards of a source
pub struct RowStream {
    files: std::vec::IntoIter<PathBuf>,
    current: Option<(PathBuf, RowIter<'static>)>,
}

impl Iterator for RowStream {
    type Item = Result<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some((path, iter)) = self.current.as_mut() {
                match iter.next() {
                    Some(Ok(row)) => return Some(Ok(row.to_json_value())),
                    Some(Err(e)) => {
                        let err = IngestionError::SourceError(format!(
                            "failed reading row in {}: {}",
                            path.display(),
                            e
                        ));
                        self.current = None;
                        return Some(Err(err));
                    }
                    None => self.current = None,
                }
            }

            let path = self.files.next()?;
            debug!("Loading data from {}", path.display());
            match open_rows(&path) {
                Ok(iter) => self.current = Some((path, iter)),
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

fn open_rows(path: &Path) -> Result<RowIter<'static>> {
    let file = File::open(path).map_err(|e| {
        IngestionError::SourceError(format!("failed opening shard {}: {}", path.display(), e))
    })?;
    let reader = SerializedFileReader::new(file).map_err(|e| {
        IngestionError::SourceError(format!("failed reading shard {}: {}", path.display(), e))
    })?;
    Ok(RowIter::from_file_into(Box::new(reader)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn touch(path: &Path) {
        File::create(path).unwrap();
    }

    #[test]
    fn test_discover_sorts_lexicographically() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("movies_popular_03.parquet"));
        touch(&dir.path().join("movies_popular_01.parquet"));
        touch(&dir.path().join("movies_popular_02.parquet"));
        touch(&dir.path().join("other_dataset_01.parquet"));
        touch(&dir.path().join("movies_popular_readme.txt"));

        let source = ParquetSource::new(dir.path(), "movies_popular_");
        let names: Vec<String> = source
            .discover()
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();

        assert_eq!(
            names,
            vec![
                "movies_popular_01.parquet",
                "movies_popular_02.parquet",
                "movies_popular_03.parquet",
            ]
        );
    }

    #[test]
    fn test_empty_directory_yields_no_rows() {
        let dir = tempdir().unwrap();
        let source = ParquetSource::new(dir.path(), "movies_popular_");

        assert!(source.discover().unwrap().is_empty());
        assert_eq!(source.rows().unwrap().count(), 0);
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let source = ParquetSource::new("/definitely/not/here", "movies_popular_");
        assert!(matches!(
            source.discover(),
            Err(IngestionError::SourceError(_))
        ));
    }
}
