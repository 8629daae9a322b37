//! Shared data models.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

use crate::{Error, Result};

/// Id of a user owned by the accounts service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UserId(pub i64);

/// Id of a meeting owned by the meetings service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeetingId(pub i64);

/// Visibility tier of a schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScheduleScope {
    Company,
    Team,
    Personal,
}

impl ScheduleScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScheduleScope::Company => "COMPANY",
            ScheduleScope::Team => "TEAM",
            ScheduleScope::Personal => "PERSONAL",
        }
    }
}

impl fmt::Display for ScheduleScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScheduleScope {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "COMPANY" => Ok(ScheduleScope::Company),
            "TEAM" => Ok(ScheduleScope::Team),
            "PERSONAL" => Ok(ScheduleScope::Personal),
            other => Err(Error::Validation(format!(
                "Invalid scope '{}'. Must be one of: COMPANY, TEAM, PERSONAL",
                other
            ))),
        }
    }
}

/// Inclusive range of calendar days used by the date filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(Error::Validation(format!(
                "Range start {} is after end {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    pub fn single_day(date: NaiveDate) -> Self {
        Self {
            start: date,
            end: date,
        }
    }

    /// First through last day of the given calendar month.
    pub fn month(year: i32, month: u32) -> Result<Self> {
        let invalid = || Error::Validation(format!("Invalid month {}-{}", year, month));

        let start = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
        let next_month = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)
        };
        let end = next_month
            .and_then(|d| d.pred_opt())
            .ok_or_else(invalid)?;

        Ok(Self { start, end })
    }
}

/// Every field of a schedule the caller may set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScheduleFields {
    pub user: Option<UserId>,
    pub meeting: Option<MeetingId>,
    pub schedule_type: Option<String>,
    pub title: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub category: Option<String>,
    pub display_in_calendar: bool,
    pub added_to_my_schedule: bool,
    pub is_todo: bool,
    pub original_todo_id: Option<i64>,
    pub scope: Option<ScheduleScope>,
    pub description: Option<String>,
    pub start_time: Option<NaiveDateTime>,
    pub end_time: Option<NaiveDateTime>,
    pub location: Option<String>,
    pub color: Option<String>,
}

impl ScheduleFields {
    /// A schedule matches a range when it has a start date, starts on or before
    /// the range end, and ends (or, lacking an end date, starts) on or after the
    /// range start. The SQL filters in the postgres repository mirror this.
    pub fn falls_within(&self, range: &DateRange) -> bool {
        match self.start_date {
            Some(start) => {
                let end = self.end_date.unwrap_or(start);
                start <= range.end && end >= range.start
            }
            None => false,
        }
    }
}

/// A persisted schedule.
#[derive(Debug, Clone, PartialEq)]
pub struct Schedule {
    pub id: i64,
    pub fields: ScheduleFields,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Schedule {
    pub fn owned_by(&self, user: UserId) -> bool {
        self.fields.user == Some(user)
    }
}

/// Wire representation of a schedule.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleDto {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "lenient_id")]
    pub user_id: Option<i64>,
    #[serde(default, deserialize_with = "lenient_id")]
    pub meeting_id: Option<i64>,
    #[serde(rename = "type")]
    #[validate(length(max = 255))]
    pub schedule_type: Option<String>,
    #[validate(length(max = 255))]
    pub title: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    #[validate(length(max = 255))]
    pub category: Option<String>,
    #[serde(default)]
    pub display_in_calendar: bool,
    #[serde(default)]
    pub added_to_my_schedule: bool,
    #[serde(default, alias = "todo")]
    pub is_todo: bool,
    pub original_todo_id: Option<i64>,
    pub scope: Option<ScheduleScope>,
    #[validate(length(max = 255))]
    pub description: Option<String>,
    pub start_time: Option<NaiveDateTime>,
    pub end_time: Option<NaiveDateTime>,
    #[validate(length(max = 255))]
    pub location: Option<String>,
    #[validate(length(max = 255))]
    pub color: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Accepts ids sent either as JSON numbers or numeric strings.
fn lenient_id<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(i64),
        Text(String),
    }

    match Option::<RawId>::deserialize(deserializer)? {
        None => Ok(None),
        Some(RawId::Number(n)) => Ok(Some(n)),
        Some(RawId::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(RawId::Text(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid id '{}'", s))),
    }
}

/// A persisted line of meeting transcript.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptLine {
    pub id: i64,
    pub meeting_id: i64,
    pub speaker: Option<String>,
    pub text: String,
    pub sequence: i32,
    pub created_at: DateTime<Utc>,
}

/// Transcript line as sent by clients, with or without an id.
#[derive(Debug, Clone, PartialEq, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptLineInput {
    #[serde(default)]
    pub id: Option<i64>,
    pub meeting_id: i64,
    #[validate(length(max = 255))]
    pub speaker: Option<String>,
    #[validate(length(min = 1))]
    pub text: String,
    #[serde(default)]
    pub sequence: i32,
}
