//! In-process repositories.
//!
//! Same contracts as the postgres repositories, minus foreign keys to users
//! and meetings. Services and routes are tested against these.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use crate::models::{
    DateRange, MeetingId, Schedule, ScheduleFields, TranscriptLine, TranscriptLineInput, UserId,
};
use crate::repository::{ScheduleRepository, TranscriptLineRepository};
use crate::{Error, Result};

struct Table<T> {
    rows: BTreeMap<i64, T>,
    next_id: i64,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            next_id: 1,
        }
    }
}

impl<T> Table<T> {
    fn allocate_id(&mut self) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

#[derive(Default)]
pub struct MemoryScheduleRepository {
    table: RwLock<Table<Schedule>>,
}

impl MemoryScheduleRepository {
    pub fn new() -> Self {
        Self::default()
    }

    async fn select<F>(&self, predicate: F) -> Vec<Schedule>
    where
        F: Fn(&Schedule) -> bool,
    {
        self.table
            .read()
            .await
            .rows
            .values()
            .filter(|s| predicate(s))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl ScheduleRepository for MemoryScheduleRepository {
    async fn find_all(&self) -> Result<Vec<Schedule>> {
        Ok(self.select(|_| true).await)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Schedule>> {
        Ok(self.table.read().await.rows.get(&id).cloned())
    }

    async fn insert(&self, fields: &ScheduleFields) -> Result<Schedule> {
        let mut table = self.table.write().await;
        let now = Utc::now();
        let schedule = Schedule {
            id: table.allocate_id(),
            fields: fields.clone(),
            created_at: now,
            updated_at: now,
        };
        table.rows.insert(schedule.id, schedule.clone());
        Ok(schedule)
    }

    async fn replace(&self, id: i64, fields: &ScheduleFields) -> Result<Option<Schedule>> {
        let mut table = self.table.write().await;
        Ok(table.rows.get_mut(&id).map(|schedule| {
            schedule.fields = fields.clone();
            schedule.updated_at = Utc::now();
            schedule.clone()
        }))
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let mut table = self.table.write().await;
        if table.rows.remove(&id).is_none() {
            return Ok(false);
        }

        // ON DELETE SET NULL
        for schedule in table.rows.values_mut() {
            if schedule.fields.original_todo_id == Some(id) {
                schedule.fields.original_todo_id = None;
            }
        }
        Ok(true)
    }

    async fn find_by_user(&self, user: UserId) -> Result<Vec<Schedule>> {
        Ok(self.select(|s| s.owned_by(user)).await)
    }

    async fn find_by_user_in_range(&self, user: UserId, range: DateRange) -> Result<Vec<Schedule>> {
        let mut found = self
            .select(|s| s.owned_by(user) && s.fields.falls_within(&range))
            .await;
        found.sort_by_key(|s| (s.fields.start_date, s.id));
        Ok(found)
    }

    async fn find_by_user_and_category(
        &self,
        user: UserId,
        category: &str,
    ) -> Result<Vec<Schedule>> {
        Ok(self
            .select(|s| s.owned_by(user) && s.fields.category.as_deref() == Some(category))
            .await)
    }

    async fn find_todos_by_user(&self, user: UserId) -> Result<Vec<Schedule>> {
        Ok(self.select(|s| s.owned_by(user) && s.fields.is_todo).await)
    }

    async fn assign_to_user(&self, id: i64, user: UserId) -> Result<Option<Schedule>> {
        let mut table = self.table.write().await;
        Ok(table.rows.get_mut(&id).map(|schedule| {
            schedule.fields.added_to_my_schedule = true;
            schedule.fields.user = Some(user);
            schedule.updated_at = Utc::now();
            schedule.clone()
        }))
    }

    async fn delete_by_original_todo(&self, todo_id: i64) -> Result<u64> {
        let mut table = self.table.write().await;
        let before = table.rows.len();
        table
            .rows
            .retain(|_, s| s.fields.original_todo_id != Some(todo_id));
        Ok((before - table.rows.len()) as u64)
    }
}

#[derive(Default)]
pub struct MemoryTranscriptLineRepository {
    table: RwLock<Table<TranscriptLine>>,
}

impl MemoryTranscriptLineRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TranscriptLineRepository for MemoryTranscriptLineRepository {
    async fn find_all(&self) -> Result<Vec<TranscriptLine>> {
        Ok(self.table.read().await.rows.values().cloned().collect())
    }

    async fn find_by_meeting(&self, meeting: MeetingId) -> Result<Vec<TranscriptLine>> {
        let mut lines: Vec<TranscriptLine> = self
            .table
            .read()
            .await
            .rows
            .values()
            .filter(|l| l.meeting_id == meeting.0)
            .cloned()
            .collect();
        lines.sort_by_key(|l| (l.sequence, l.id));
        Ok(lines)
    }

    async fn insert(&self, line: &TranscriptLineInput) -> Result<TranscriptLine> {
        let mut table = self.table.write().await;
        let stored = TranscriptLine {
            id: table.allocate_id(),
            meeting_id: line.meeting_id,
            speaker: line.speaker.clone(),
            text: line.text.clone(),
            sequence: line.sequence,
            created_at: Utc::now(),
        };
        table.rows.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn update_batch(
        &self,
        lines: &[(i64, TranscriptLineInput)],
    ) -> Result<Vec<TranscriptLine>> {
        let mut table = self.table.write().await;

        if let Some((missing, _)) = lines.iter().find(|(id, _)| !table.rows.contains_key(id)) {
            return Err(Error::NotFound(format!(
                "Transcript line {} not found",
                missing
            )));
        }

        let mut updated = Vec::with_capacity(lines.len());
        for (id, line) in lines {
            if let Some(stored) = table.rows.get_mut(id) {
                stored.meeting_id = line.meeting_id;
                stored.speaker = line.speaker.clone();
                stored.text = line.text.clone();
                stored.sequence = line.sequence;
                updated.push(stored.clone());
            }
        }
        Ok(updated)
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        Ok(self.table.write().await.rows.remove(&id).is_some())
    }
}
