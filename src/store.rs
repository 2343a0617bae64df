use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::ingest::{row_to_cells, rows_from_cells, LAYOUT_VERSION};
use crate::models::{RowId, TranscriptRow};

pub const DEFAULT_CACHE_KEY: &str = "transcript-rows";

/// Durable home of the authoritative row collection.
pub trait RowStore {
    /// `Ok(None)` when nothing has been saved yet.
    fn load(&self) -> impl Future<Output = Result<Option<Vec<TranscriptRow>>, EngineError>> + Send;

    fn save(&self, rows: &[TranscriptRow]) -> impl Future<Output = Result<(), EngineError>> + Send;
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StoredTranscript {
    pub layout_version: u32,
    pub saved_at: DateTime<Utc>,
    pub rows: Vec<TranscriptRow>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Blob {
    Snapshot(StoredTranscript),
    Positional(Vec<Vec<String>>),
}

pub fn encode_blob(rows: &[TranscriptRow]) -> Result<String, EngineError> {
    let snapshot = StoredTranscript {
        layout_version: LAYOUT_VERSION,
        saved_at: Utc::now(),
        rows: rows.to_vec(),
    };
    serde_json::to_string(&snapshot).map_err(|e| EngineError::json("encode transcript blob", e))
}

/// Accepts the snapshot format and the older bare positional array.
/// Rows stored without an id get one derived from their position and
/// cells, so repeated loads of the same blob agree on ids.
pub fn decode_blob(text: &str) -> Result<Vec<TranscriptRow>, EngineError> {
    let blob: Blob =
        serde_json::from_str(text).map_err(|e| EngineError::json("decode transcript blob", e))?;
    let mut rows = match blob {
        Blob::Snapshot(snapshot) => {
            if snapshot.layout_version != LAYOUT_VERSION {
                tracing::warn!(
                    found = snapshot.layout_version,
                    expected = LAYOUT_VERSION,
                    "store: snapshot written under another layout version"
                );
            }
            snapshot.rows
        }
        Blob::Positional(cells) => {
            tracing::warn!(rows = cells.len(), "store: converting positional blob");
            let mut rows = rows_from_cells(&cells);
            for row in &mut rows {
                row.id = RowId::unassigned();
            }
            rows
        }
    };
    assign_missing_ids(&mut rows);
    Ok(rows)
}

fn assign_missing_ids(rows: &mut [TranscriptRow]) {
    for (position, row) in rows.iter_mut().enumerate() {
        if row.id.is_unassigned() {
            row.id = RowId::derived(position, &row_to_cells(row));
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    blob: Mutex<Option<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(rows: &[TranscriptRow]) -> Result<Self, EngineError> {
        Ok(Self {
            blob: Mutex::new(Some(encode_blob(rows)?)),
        })
    }

    fn read_blob(&self) -> Option<String> {
        match self.blob.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn write_blob(&self, blob: String) {
        match self.blob.lock() {
            Ok(mut guard) => *guard = Some(blob),
            Err(poisoned) => *poisoned.into_inner() = Some(blob),
        }
    }
}

impl RowStore for MemoryStore {
    async fn load(&self) -> Result<Option<Vec<TranscriptRow>>, EngineError> {
        self.read_blob().map(|blob| decode_blob(&blob)).transpose()
    }

    async fn save(&self, rows: &[TranscriptRow]) -> Result<(), EngineError> {
        self.write_blob(encode_blob(rows)?);
        Ok(())
    }
}

/// One JSON file on local disk.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RowStore for JsonFileStore {
    async fn load(&self) -> Result<Option<Vec<TranscriptRow>>, EngineError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let text = std::fs::read_to_string(&self.path)
            .map_err(|e| EngineError::io("read transcript store", e))?;
        decode_blob(&text).map(Some)
    }

    async fn save(&self, rows: &[TranscriptRow]) -> Result<(), EngineError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| EngineError::io("create transcript store directory", e))?;
            }
        }
        let blob = encode_blob(rows)?;
        std::fs::write(&self.path, blob).map_err(|e| EngineError::io("write transcript store", e))?;
        tracing::info!(path = %self.path.display(), rows = rows.len(), "store: saved transcript");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_rows() -> Vec<TranscriptRow> {
        let mut row = TranscriptRow::new("Lập trình căn bản");
        row.final_score = "-".to_string();
        row.credits = "3".to_string();
        row.manually_edited = true;
        vec![row, TranscriptRow::new("Triết học")]
    }

    #[tokio::test]
    async fn memory_store_starts_empty() {
        let store = MemoryStore::new();
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn memory_store_keeps_ids_and_markers() {
        let rows = sample_rows();
        let store = MemoryStore::new();
        store.save(&rows).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(rows));
    }

    #[tokio::test]
    async fn file_store_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested").join("transcript.json"));
        assert!(store.load().await.unwrap().is_none());

        let rows = sample_rows();
        store.save(&rows).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(rows));
    }

    #[test]
    fn decodes_positional_blob() {
        let rows = decode_blob(r#"[["2023","1","Triết học","1","","","","6","C","2","true"],["","","Mạng"]]"#)
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].final_score, "6");
        assert!(rows[0].manually_edited);
        assert_eq!(rows[1].subject_name, "Mạng");
    }

    #[test]
    fn positional_blob_ids_are_stable() {
        let blob = r#"[["2023","1","Triết học","1","","","","6","C","2"],["2023","1","Triết học","1","","","","6","C","2"]]"#;
        let first = decode_blob(blob).unwrap();
        let second = decode_blob(blob).unwrap();
        let ids: Vec<_> = first.iter().map(|row| row.id).collect();
        assert_eq!(ids, second.iter().map(|row| row.id).collect::<Vec<_>>());
        assert_ne!(ids[0], ids[1]);
        assert!(!ids[0].is_unassigned());
    }

    #[test]
    fn snapshot_rows_without_id_get_stable_ids() {
        let blob = r#"{"layout_version":1,"saved_at":"2024-01-01T00:00:00Z","rows":[{"subject_name":"Mạng máy tính","final_score":"7"}]}"#;
        let first = decode_blob(blob).unwrap();
        let second = decode_blob(blob).unwrap();
        assert_eq!(first[0].id, second[0].id);
        assert!(!first[0].id.is_unassigned());
    }

    #[tokio::test]
    async fn ids_from_a_legacy_blob_survive_an_edit_round_trip() {
        let store = MemoryStore::new();
        store.write_blob(r#"[["2023","1","Triết học","1","","","","6","C","2"]]"#.to_string());
        let id = store.load().await.unwrap().unwrap()[0].id;

        let rows = store.load().await.unwrap().unwrap();
        let committed = crate::overrides::EditSession::begin(&rows)
            .set_cell(id, crate::models::Field::FinalScore, "8")
            .unwrap()
            .commit(&store)
            .await
            .unwrap();
        assert_eq!(committed[0].id, id);
        assert_eq!(store.load().await.unwrap().unwrap()[0].id, id);
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(decode_blob("{\"rows\": 3}"), Err(EngineError::Json { .. })));
    }
}
