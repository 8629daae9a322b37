//! Schedule operations: CRUD, per-user filters, and todo/calendar linking.

use chrono::NaiveDate;
use std::sync::Arc;
use tracing::info;
use validator::Validate;

use crate::auth::AuthContext;
use crate::mapping::{from_dto, to_dto, to_dtos};
use crate::models::{DateRange, Schedule, ScheduleDto, ScheduleFields, UserId};
use crate::repository::ScheduleRepository;
use crate::{Error, Result};

#[derive(Clone)]
pub struct ScheduleService {
    repo: Arc<dyn ScheduleRepository>,
}

impl ScheduleService {
    pub fn new(repo: Arc<dyn ScheduleRepository>) -> Self {
        Self { repo }
    }

    pub async fn list(&self) -> Result<Vec<ScheduleDto>> {
        Ok(to_dtos(&self.repo.find_all().await?))
    }

    pub async fn get(&self, id: i64) -> Result<ScheduleDto> {
        Ok(to_dto(&self.find(id).await?))
    }

    pub async fn create(&self, dto: ScheduleDto) -> Result<ScheduleDto> {
        dto.validate()?;
        let schedule = self.repo.insert(&from_dto(dto)).await?;
        info!("Created schedule {}", schedule.id);
        Ok(to_dto(&schedule))
    }

    /// Replace every mutable field; omitted fields become empty.
    pub async fn update(&self, id: i64, dto: ScheduleDto) -> Result<ScheduleDto> {
        dto.validate()?;
        let schedule = self
            .repo
            .replace(id, &from_dto(dto))
            .await?
            .ok_or_else(|| Error::schedule_not_found(id))?;
        info!("Updated schedule {}", id);
        Ok(to_dto(&schedule))
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        if !self.repo.delete(id).await? {
            return Err(Error::schedule_not_found(id));
        }
        info!("Deleted schedule {}", id);
        Ok(())
    }

    pub async fn list_by_user(&self, user: UserId) -> Result<Vec<ScheduleDto>> {
        Ok(to_dtos(&self.repo.find_by_user(user).await?))
    }

    pub async fn list_by_user_and_date_range(
        &self,
        user: UserId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<ScheduleDto>> {
        self.list_in_range(user, DateRange::new(start, end)?).await
    }

    pub async fn list_by_user_and_category(
        &self,
        user: UserId,
        category: &str,
    ) -> Result<Vec<ScheduleDto>> {
        Ok(to_dtos(
            &self.repo.find_by_user_and_category(user, category).await?,
        ))
    }

    pub async fn list_todos_by_user(&self, user: UserId) -> Result<Vec<ScheduleDto>> {
        Ok(to_dtos(&self.repo.find_todos_by_user(user).await?))
    }

    pub async fn list_by_user_and_date(
        &self,
        user: UserId,
        date: NaiveDate,
    ) -> Result<Vec<ScheduleDto>> {
        self.list_in_range(user, DateRange::single_day(date)).await
    }

    pub async fn list_by_user_and_month(
        &self,
        user: UserId,
        year: i32,
        month: u32,
    ) -> Result<Vec<ScheduleDto>> {
        self.list_in_range(user, DateRange::month(year, month)?).await
    }

    /// Flag a schedule as added and hand its ownership to the caller.
    pub async fn add_to_my_schedule(&self, schedule_id: i64, caller: &AuthContext) -> Result<()> {
        self.repo
            .assign_to_user(schedule_id, caller.user_id)
            .await?
            .ok_or_else(|| Error::schedule_not_found(schedule_id))?;
        info!(
            "Schedule {} added to schedule of user {}",
            schedule_id, caller.user_id.0
        );
        Ok(())
    }

    /// Create a calendar entry linked to an existing todo.
    ///
    /// Anything the template leaves empty is taken from the todo. The todo
    /// itself is not modified.
    pub async fn add_todo_to_calendar(
        &self,
        todo_id: i64,
        template: ScheduleDto,
    ) -> Result<ScheduleDto> {
        template.validate()?;
        let todo = self.find(todo_id).await?;
        if !todo.fields.is_todo {
            return Err(Error::Validation(format!(
                "Schedule {} is not a todo",
                todo_id
            )));
        }

        let fields = calendar_copy(from_dto(template), todo);
        let schedule = self.repo.insert(&fields).await?;
        info!("Todo {} added to calendar as schedule {}", todo_id, schedule.id);
        Ok(to_dto(&schedule))
    }

    /// Remove every calendar copy of a todo. The todo stays.
    pub async fn remove_todo_from_calendar(&self, todo_id: i64) -> Result<()> {
        let removed = self.repo.delete_by_original_todo(todo_id).await?;
        info!("Removed {} calendar entries for todo {}", removed, todo_id);
        Ok(())
    }

    async fn find(&self, id: i64) -> Result<Schedule> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| Error::schedule_not_found(id))
    }

    async fn list_in_range(&self, user: UserId, range: DateRange) -> Result<Vec<ScheduleDto>> {
        Ok(to_dtos(&self.repo.find_by_user_in_range(user, range).await?))
    }
}

fn calendar_copy(template: ScheduleFields, todo: Schedule) -> ScheduleFields {
    let source = todo.fields;
    ScheduleFields {
        user: template.user.or(source.user),
        meeting: template.meeting.or(source.meeting),
        schedule_type: template.schedule_type.or(source.schedule_type),
        title: template.title.or(source.title),
        category: template.category.or(source.category),
        scope: template.scope.or(source.scope),
        description: template.description.or(source.description),
        location: template.location.or(source.location),
        color: template.color.or(source.color),
        is_todo: false,
        display_in_calendar: true,
        original_todo_id: Some(todo.id),
        ..template
    }
}
