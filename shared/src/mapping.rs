//! Conversions between the wire schedule shape and the domain shape.
//!
//! The wire form carries owner and meeting as bare ids; the domain form wraps
//! them in typed references. Server-managed values (`id`, timestamps) on an
//! incoming DTO are ignored.

use crate::models::{MeetingId, Schedule, ScheduleDto, ScheduleFields, UserId};

pub fn to_dto(schedule: &Schedule) -> ScheduleDto {
    let fields = &schedule.fields;
    ScheduleDto {
        id: Some(schedule.id),
        user_id: fields.user.map(|u| u.0),
        meeting_id: fields.meeting.map(|m| m.0),
        schedule_type: fields.schedule_type.clone(),
        title: fields.title.clone(),
        start_date: fields.start_date,
        end_date: fields.end_date,
        category: fields.category.clone(),
        display_in_calendar: fields.display_in_calendar,
        added_to_my_schedule: fields.added_to_my_schedule,
        is_todo: fields.is_todo,
        original_todo_id: fields.original_todo_id,
        scope: fields.scope,
        description: fields.description.clone(),
        start_time: fields.start_time,
        end_time: fields.end_time,
        location: fields.location.clone(),
        color: fields.color.clone(),
        created_at: Some(schedule.created_at),
        updated_at: Some(schedule.updated_at),
    }
}

pub fn to_dtos(schedules: &[Schedule]) -> Vec<ScheduleDto> {
    schedules.iter().map(to_dto).collect()
}

pub fn from_dto(dto: ScheduleDto) -> ScheduleFields {
    ScheduleFields {
        user: dto.user_id.map(UserId),
        meeting: dto.meeting_id.map(MeetingId),
        schedule_type: dto.schedule_type,
        title: dto.title,
        start_date: dto.start_date,
        end_date: dto.end_date,
        category: dto.category,
        display_in_calendar: dto.display_in_calendar,
        added_to_my_schedule: dto.added_to_my_schedule,
        is_todo: dto.is_todo,
        original_todo_id: dto.original_todo_id,
        scope: dto.scope,
        description: dto.description,
        start_time: dto.start_time,
        end_time: dto.end_time,
        location: dto.location,
        color: dto.color,
    }
}
