//! Transcript line storage.

use std::sync::Arc;
use tracing::info;
use validator::Validate;

use crate::models::{MeetingId, TranscriptLine, TranscriptLineInput};
use crate::repository::TranscriptLineRepository;
use crate::{Error, Result};

#[derive(Clone)]
pub struct TranscriptLineService {
    repo: Arc<dyn TranscriptLineRepository>,
}

impl TranscriptLineService {
    pub fn new(repo: Arc<dyn TranscriptLineRepository>) -> Self {
        Self { repo }
    }

    pub async fn list(&self) -> Result<Vec<TranscriptLine>> {
        self.repo.find_all().await
    }

    pub async fn list_by_meeting(&self, meeting: MeetingId) -> Result<Vec<TranscriptLine>> {
        self.repo.find_by_meeting(meeting).await
    }

    pub async fn create(&self, line: TranscriptLineInput) -> Result<TranscriptLine> {
        line.validate()?;
        self.repo.insert(&line).await
    }

    /// Overwrite a batch of existing lines by id. Any missing id fails the whole batch.
    pub async fn update_batch(
        &self,
        lines: Vec<TranscriptLineInput>,
    ) -> Result<Vec<TranscriptLine>> {
        let mut identified = Vec::with_capacity(lines.len());
        for (index, line) in lines.into_iter().enumerate() {
            line.validate()?;
            let id = line
                .id
                .ok_or_else(|| Error::Validation(format!("Line {} has no id", index)))?;
            identified.push((id, line));
        }

        let updated = self.repo.update_batch(&identified).await?;
        info!("Updated {} transcript lines", updated.len());
        Ok(updated)
    }

    /// Returns whether the line existed.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let deleted = self.repo.delete(id).await?;
        if deleted {
            info!("Deleted transcript line {}", id);
        }
        Ok(deleted)
    }
}
