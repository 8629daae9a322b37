//! Persistence for schedules and transcript lines.
//!
//! Services talk to the traits; `Pg*Repository` types are the production
//! implementations. Unit tests swap in the in-process ones from `memory`.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use sqlx::postgres::PgArguments;
use sqlx::query::QueryAs;
use sqlx::{PgPool, Postgres};

use crate::models::{
    DateRange, MeetingId, Schedule, ScheduleFields, ScheduleScope, TranscriptLine,
    TranscriptLineInput, UserId,
};
use crate::{Error, Result};

#[async_trait]
pub trait ScheduleRepository: Send + Sync {
    async fn find_all(&self) -> Result<Vec<Schedule>>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Schedule>>;

    async fn insert(&self, fields: &ScheduleFields) -> Result<Schedule>;

    /// Overwrite every mutable column. Returns `None` when no row has that id.
    async fn replace(&self, id: i64, fields: &ScheduleFields) -> Result<Option<Schedule>>;

    /// Returns whether a row was removed.
    async fn delete(&self, id: i64) -> Result<bool>;

    async fn find_by_user(&self, user: UserId) -> Result<Vec<Schedule>>;

    /// Schedules whose dates overlap `range`, see [`ScheduleFields::falls_within`].
    async fn find_by_user_in_range(&self, user: UserId, range: DateRange) -> Result<Vec<Schedule>>;

    async fn find_by_user_and_category(&self, user: UserId, category: &str)
        -> Result<Vec<Schedule>>;

    async fn find_todos_by_user(&self, user: UserId) -> Result<Vec<Schedule>>;

    /// Flag the schedule as added and make `user` its owner.
    async fn assign_to_user(&self, id: i64, user: UserId) -> Result<Option<Schedule>>;

    /// Returns the number of calendar copies removed.
    async fn delete_by_original_todo(&self, todo_id: i64) -> Result<u64>;
}

#[async_trait]
pub trait TranscriptLineRepository: Send + Sync {
    async fn find_all(&self) -> Result<Vec<TranscriptLine>>;

    async fn find_by_meeting(&self, meeting: MeetingId) -> Result<Vec<TranscriptLine>>;

    async fn insert(&self, line: &TranscriptLineInput) -> Result<TranscriptLine>;

    /// Overwrite each line by id, all or nothing.
    async fn update_batch(&self, lines: &[(i64, TranscriptLineInput)])
        -> Result<Vec<TranscriptLine>>;

    async fn delete(&self, id: i64) -> Result<bool>;
}

const SCHEDULE_COLUMNS: &str = r#"
    id, user_id, meeting_id, type AS schedule_type, title,
    start_date, end_date, category, display_in_calendar,
    added_to_my_schedule, is_todo, original_todo_id, scope::text AS scope,
    description, start_time, end_time, location, color,
    created_at, updated_at
"#;

/// Schedule row from database
#[derive(Debug, sqlx::FromRow)]
struct ScheduleRow {
    id: i64,
    user_id: Option<i64>,
    meeting_id: Option<i64>,
    schedule_type: Option<String>,
    title: Option<String>,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    category: Option<String>,
    display_in_calendar: bool,
    added_to_my_schedule: bool,
    is_todo: bool,
    original_todo_id: Option<i64>,
    scope: Option<String>,
    description: Option<String>,
    start_time: Option<NaiveDateTime>,
    end_time: Option<NaiveDateTime>,
    location: Option<String>,
    color: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ScheduleRow> for Schedule {
    type Error = Error;

    fn try_from(row: ScheduleRow) -> Result<Self> {
        let scope = row
            .scope
            .as_deref()
            .map(str::parse::<ScheduleScope>)
            .transpose()?;

        Ok(Self {
            id: row.id,
            fields: ScheduleFields {
                user: row.user_id.map(UserId),
                meeting: row.meeting_id.map(MeetingId),
                schedule_type: row.schedule_type,
                title: row.title,
                start_date: row.start_date,
                end_date: row.end_date,
                category: row.category,
                display_in_calendar: row.display_in_calendar,
                added_to_my_schedule: row.added_to_my_schedule,
                is_todo: row.is_todo,
                original_todo_id: row.original_todo_id,
                scope,
                description: row.description,
                start_time: row.start_time,
                end_time: row.end_time,
                location: row.location,
                color: row.color,
            },
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn into_schedules(rows: Vec<ScheduleRow>) -> Result<Vec<Schedule>> {
    rows.into_iter().map(Schedule::try_from).collect()
}

/// Bind the seventeen mutable columns in table order.
fn bind_fields<'q>(
    query: QueryAs<'q, Postgres, ScheduleRow, PgArguments>,
    fields: &'q ScheduleFields,
) -> QueryAs<'q, Postgres, ScheduleRow, PgArguments> {
    query
        .bind(fields.user.map(|u| u.0))
        .bind(fields.meeting.map(|m| m.0))
        .bind(&fields.schedule_type)
        .bind(&fields.title)
        .bind(fields.start_date)
        .bind(fields.end_date)
        .bind(&fields.category)
        .bind(fields.display_in_calendar)
        .bind(fields.added_to_my_schedule)
        .bind(fields.is_todo)
        .bind(fields.original_todo_id)
        .bind(fields.scope.map(|s| s.as_str()))
        .bind(&fields.description)
        .bind(fields.start_time)
        .bind(fields.end_time)
        .bind(&fields.location)
        .bind(&fields.color)
}

/// Postgres-backed schedule repository.
#[derive(Clone)]
pub struct PgScheduleRepository {
    pool: PgPool,
}

impl PgScheduleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ScheduleRepository for PgScheduleRepository {
    async fn find_all(&self) -> Result<Vec<Schedule>> {
        let rows: Vec<ScheduleRow> =
            sqlx::query_as(&format!("SELECT {} FROM schedules ORDER BY id", SCHEDULE_COLUMNS))
                .fetch_all(&self.pool)
                .await?;

        into_schedules(rows)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Schedule>> {
        let row: Option<ScheduleRow> =
            sqlx::query_as(&format!("SELECT {} FROM schedules WHERE id = $1", SCHEDULE_COLUMNS))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(Schedule::try_from).transpose()
    }

    async fn insert(&self, fields: &ScheduleFields) -> Result<Schedule> {
        let sql = format!(
            r#"
            INSERT INTO schedules (
                user_id, meeting_id, type, title,
                start_date, end_date, category, display_in_calendar,
                added_to_my_schedule, is_todo, original_todo_id, scope,
                description, start_time, end_time, location, color
            ) VALUES (
                $1, $2, $3, $4,
                $5, $6, $7, $8,
                $9, $10, $11, $12::schedule_scope,
                $13, $14, $15, $16, $17
            )
            RETURNING {}
            "#,
            SCHEDULE_COLUMNS
        );

        let row = bind_fields(sqlx::query_as(&sql), fields)
            .fetch_one(&self.pool)
            .await?;

        Schedule::try_from(row)
    }

    async fn replace(&self, id: i64, fields: &ScheduleFields) -> Result<Option<Schedule>> {
        let sql = format!(
            r#"
            UPDATE schedules SET
                user_id = $2, meeting_id = $3, type = $4, title = $5,
                start_date = $6, end_date = $7, category = $8,
                display_in_calendar = $9, added_to_my_schedule = $10,
                is_todo = $11, original_todo_id = $12,
                scope = $13::schedule_scope, description = $14,
                start_time = $15, end_time = $16, location = $17, color = $18,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            SCHEDULE_COLUMNS
        );

        let row = bind_fields(sqlx::query_as(&sql).bind(id), fields)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Schedule::try_from).transpose()
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM schedules WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_by_user(&self, user: UserId) -> Result<Vec<Schedule>> {
        let rows: Vec<ScheduleRow> = sqlx::query_as(&format!(
            "SELECT {} FROM schedules WHERE user_id = $1 ORDER BY id",
            SCHEDULE_COLUMNS
        ))
        .bind(user.0)
        .fetch_all(&self.pool)
        .await?;

        into_schedules(rows)
    }

    async fn find_by_user_in_range(&self, user: UserId, range: DateRange) -> Result<Vec<Schedule>> {
        let rows: Vec<ScheduleRow> = sqlx::query_as(&format!(
            r#"
            SELECT {}
            FROM schedules
            WHERE user_id = $1
              AND start_date IS NOT NULL
              AND start_date <= $3
              AND COALESCE(end_date, start_date) >= $2
            ORDER BY start_date, id
            "#,
            SCHEDULE_COLUMNS
        ))
        .bind(user.0)
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&self.pool)
        .await?;

        into_schedules(rows)
    }

    async fn find_by_user_and_category(
        &self,
        user: UserId,
        category: &str,
    ) -> Result<Vec<Schedule>> {
        let rows: Vec<ScheduleRow> = sqlx::query_as(&format!(
            "SELECT {} FROM schedules WHERE user_id = $1 AND category = $2 ORDER BY id",
            SCHEDULE_COLUMNS
        ))
        .bind(user.0)
        .bind(category)
        .fetch_all(&self.pool)
        .await?;

        into_schedules(rows)
    }

    async fn find_todos_by_user(&self, user: UserId) -> Result<Vec<Schedule>> {
        let rows: Vec<ScheduleRow> = sqlx::query_as(&format!(
            "SELECT {} FROM schedules WHERE user_id = $1 AND is_todo ORDER BY id",
            SCHEDULE_COLUMNS
        ))
        .bind(user.0)
        .fetch_all(&self.pool)
        .await?;

        into_schedules(rows)
    }

    async fn assign_to_user(&self, id: i64, user: UserId) -> Result<Option<Schedule>> {
        let row: Option<ScheduleRow> = sqlx::query_as(&format!(
            r#"
            UPDATE schedules
            SET added_to_my_schedule = TRUE, user_id = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            SCHEDULE_COLUMNS
        ))
        .bind(id)
        .bind(user.0)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Schedule::try_from).transpose()
    }

    async fn delete_by_original_todo(&self, todo_id: i64) -> Result<u64> {
        let result = sqlx::query("DELETE FROM schedules WHERE original_todo_id = $1")
            .bind(todo_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

const TRANSCRIPT_COLUMNS: &str = "id, meeting_id, speaker, text, sequence, created_at";

#[derive(Debug, sqlx::FromRow)]
struct TranscriptLineRow {
    id: i64,
    meeting_id: i64,
    speaker: Option<String>,
    text: String,
    sequence: i32,
    created_at: DateTime<Utc>,
}

impl From<TranscriptLineRow> for TranscriptLine {
    fn from(row: TranscriptLineRow) -> Self {
        Self {
            id: row.id,
            meeting_id: row.meeting_id,
            speaker: row.speaker,
            text: row.text,
            sequence: row.sequence,
            created_at: row.created_at,
        }
    }
}

/// Postgres-backed transcript line repository.
#[derive(Clone)]
pub struct PgTranscriptLineRepository {
    pool: PgPool,
}

impl PgTranscriptLineRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TranscriptLineRepository for PgTranscriptLineRepository {
    async fn find_all(&self) -> Result<Vec<TranscriptLine>> {
        let rows: Vec<TranscriptLineRow> = sqlx::query_as(&format!(
            "SELECT {} FROM transcript_lines ORDER BY id",
            TRANSCRIPT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(TranscriptLine::from).collect())
    }

    async fn find_by_meeting(&self, meeting: MeetingId) -> Result<Vec<TranscriptLine>> {
        let rows: Vec<TranscriptLineRow> = sqlx::query_as(&format!(
            "SELECT {} FROM transcript_lines WHERE meeting_id = $1 ORDER BY sequence, id",
            TRANSCRIPT_COLUMNS
        ))
        .bind(meeting.0)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(TranscriptLine::from).collect())
    }

    async fn insert(&self, line: &TranscriptLineInput) -> Result<TranscriptLine> {
        let row: TranscriptLineRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO transcript_lines (meeting_id, speaker, text, sequence)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            TRANSCRIPT_COLUMNS
        ))
        .bind(line.meeting_id)
        .bind(&line.speaker)
        .bind(&line.text)
        .bind(line.sequence)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn update_batch(
        &self,
        lines: &[(i64, TranscriptLineInput)],
    ) -> Result<Vec<TranscriptLine>> {
        let sql = format!(
            r#"
            UPDATE transcript_lines
            SET meeting_id = $2, speaker = $3, text = $4, sequence = $5
            WHERE id = $1
            RETURNING {}
            "#,
            TRANSCRIPT_COLUMNS
        );

        // Dropping the transaction on an early return rolls the batch back.
        let mut tx = self.pool.begin().await?;
        let mut updated = Vec::with_capacity(lines.len());

        for (id, line) in lines {
            let row: Option<TranscriptLineRow> = sqlx::query_as(&sql)
                .bind(*id)
                .bind(line.meeting_id)
                .bind(&line.speaker)
                .bind(&line.text)
                .bind(line.sequence)
                .fetch_optional(&mut *tx)
                .await?;

            match row {
                Some(row) => updated.push(row.into()),
                None => {
                    return Err(Error::NotFound(format!("Transcript line {} not found", id)))
                }
            }
        }

        tx.commit().await?;
        Ok(updated)
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM transcript_lines WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
