use crate::error::EngineError;
use crate::models::{Field, RowId, TranscriptRow};
use crate::store::RowStore;

/// Staged copy of the authoritative rows.
///
/// Every edit returns a new session; the session it was made from, and the
/// base collection, are left as they were. Nothing reaches storage until
/// [`EditSession::commit`].
#[derive(Debug, Clone, PartialEq)]
pub struct EditSession {
    buffer: Vec<TranscriptRow>,
}

impl EditSession {
    pub fn begin(base: &[TranscriptRow]) -> Self {
        Self {
            buffer: base.to_vec(),
        }
    }

    pub fn rows(&self) -> &[TranscriptRow] {
        &self.buffer
    }

    pub fn position_of(&self, id: RowId) -> Option<usize> {
        self.buffer.iter().position(|row| row.id == id)
    }

    /// Writes `value` into the row with `id` and flags it as edited.
    pub fn set_cell(
        &self,
        id: RowId,
        field: Field,
        value: impl Into<String>,
    ) -> Result<Self, EngineError> {
        let index = self.position_of(id).ok_or(EngineError::UnknownRow(id))?;
        Ok(self.edited_at(index, field, value.into()))
    }

    /// Positional form of [`EditSession::set_cell`]. Indices past the end of
    /// the buffer are rejected.
    pub fn set_cell_at(
        &self,
        index: usize,
        field: Field,
        value: impl Into<String>,
    ) -> Result<Self, EngineError> {
        if index >= self.buffer.len() {
            return Err(EngineError::RowOutOfRange {
                index,
                len: self.buffer.len(),
            });
        }
        Ok(self.edited_at(index, field, value.into()))
    }

    fn edited_at(&self, index: usize, field: Field, value: String) -> Self {
        let mut next = self.clone();
        let row = &mut next.buffer[index];
        tracing::debug!(row = %row.id, field = %field, "overrides: staged cell edit");
        row.set(field, value);
        row.manually_edited = true;
        next
    }

    /// Clears the edit flag on one row. Cell values are kept.
    pub fn reset_manual_flag(&self, id: RowId) -> Result<Self, EngineError> {
        let index = self.position_of(id).ok_or(EngineError::UnknownRow(id))?;
        let mut next = self.clone();
        next.buffer[index].manually_edited = false;
        Ok(next)
    }

    /// Hands the buffer to `store` and returns it as the new authoritative
    /// collection. On a storage error the buffer is dropped and the
    /// previous authoritative rows stay in effect.
    pub async fn commit<S: RowStore>(self, store: &S) -> Result<Vec<TranscriptRow>, EngineError> {
        store.save(&self.buffer).await?;
        let edited = self.buffer.iter().filter(|row| row.manually_edited).count();
        tracing::info!(rows = self.buffer.len(), edited, "overrides: committed edits");
        Ok(self.buffer)
    }

    pub fn discard(self) {
        tracing::debug!(rows = self.buffer.len(), "overrides: discarded edits");
    }
}
