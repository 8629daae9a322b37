//! Schedules API.
//!
//! Endpoints:
//! - GET /api/schedules - List all schedules
//! - POST /api/schedules - Create a schedule
//! - GET /api/schedules/{id} - Get a schedule
//! - PUT /api/schedules/{id} - Replace a schedule
//! - DELETE /api/schedules/{id} - Delete a schedule
//! - GET /api/schedules/user/{userId} - A user's schedules
//! - GET /api/schedules/user/{userId}/range?start=&end= - Overlapping a date range
//! - GET /api/schedules/user/{userId}/category?category= - By category
//! - GET /api/schedules/user/{userId}/todos - A user's todos
//! - GET /api/schedules/user/{userId}/date?date= - Covering one day
//! - GET /api/schedules/user/{userId}/month/{year}/{month} - Overlapping a month
//! - POST /api/schedules/{id}/add-to-my-schedule - Take a schedule as the caller's own
//! - POST /api/schedules/todo/{todoId}/calendar - Copy a todo onto the calendar
//! - DELETE /api/schedules/todo/{todoId}/calendar - Remove a todo's calendar copies

use lambda_http::{Body, Request, Response};
use tracing::info;

use crate::auth::AuthContext;
use crate::http::{
    empty_response, error_into_response, error_response, json_response, parse_id,
    parse_json_body, parse_number, path_segments, preflight_response, query_date, query_param,
};
use crate::models::{ScheduleDto, UserId};
use crate::schedules::ScheduleService;
use crate::Result;

pub async fn handle_schedules(
    service: &ScheduleService,
    event: Request,
) -> std::result::Result<Response<Body>, lambda_http::Error> {
    info!("Schedules request: {} {}", event.method(), event.uri().path());

    match route(service, &event).await {
        Ok(response) => Ok(response),
        Err(e) => Ok(error_into_response(&e)?),
    }
}

async fn route(service: &ScheduleService, event: &Request) -> Result<Response<Body>> {
    let segments = path_segments(event.uri().path());
    let method = event.method().as_str();

    match (method, segments.as_slice()) {
        ("GET", ["schedules"]) => json_response(200, &service.list().await?),

        ("POST", ["schedules"]) => {
            let dto: ScheduleDto = parse_json_body(event.body())?;
            json_response(200, &service.create(dto).await?)
        }

        (_, ["schedules", "user" | "todo"]) => error_response(404, "Not found"),

        ("GET", ["schedules", id]) => {
            json_response(200, &service.get(parse_id(id, "schedule id")?).await?)
        }

        ("PUT", ["schedules", id]) => {
            let id = parse_id(id, "schedule id")?;
            let dto: ScheduleDto = parse_json_body(event.body())?;
            json_response(200, &service.update(id, dto).await?)
        }

        ("DELETE", ["schedules", id]) => {
            service.delete(parse_id(id, "schedule id")?).await?;
            empty_response()
        }

        ("GET", ["schedules", "user", user]) => {
            json_response(200, &service.list_by_user(user_id(user)?).await?)
        }

        ("GET", ["schedules", "user", user, "range"]) => {
            let start = query_date(event, "start")?;
            let end = query_date(event, "end")?;
            json_response(
                200,
                &service
                    .list_by_user_and_date_range(user_id(user)?, start, end)
                    .await?,
            )
        }

        ("GET", ["schedules", "user", user, "category"]) => {
            let category = query_param(event, "category")?;
            json_response(
                200,
                &service
                    .list_by_user_and_category(user_id(user)?, &category)
                    .await?,
            )
        }

        ("GET", ["schedules", "user", user, "todos"]) => {
            json_response(200, &service.list_todos_by_user(user_id(user)?).await?)
        }

        ("GET", ["schedules", "user", user, "date"]) => {
            let date = query_date(event, "date")?;
            json_response(
                200,
                &service.list_by_user_and_date(user_id(user)?, date).await?,
            )
        }

        ("GET", ["schedules", "user", user, "month", year, month]) => {
            let year: i32 = parse_number(year, "year")?;
            let month: u32 = parse_number(month, "month")?;
            json_response(
                200,
                &service
                    .list_by_user_and_month(user_id(user)?, year, month)
                    .await?,
            )
        }

        ("POST", ["schedules", id, "add-to-my-schedule"]) => {
            let schedule_id = parse_id(id, "schedule id")?;
            let caller = AuthContext::from_request(event)?;
            service.add_to_my_schedule(schedule_id, &caller).await?;
            empty_response()
        }

        ("POST", ["schedules", "todo", todo, "calendar"]) => {
            let todo_id = parse_id(todo, "todo id")?;
            let template: ScheduleDto = parse_json_body(event.body())?;
            json_response(200, &service.add_todo_to_calendar(todo_id, template).await?)
        }

        ("DELETE", ["schedules", "todo", todo, "calendar"]) => {
            service
                .remove_todo_from_calendar(parse_id(todo, "todo id")?)
                .await?;
            empty_response()
        }

        (method, path) => match allowed_methods(path) {
            Some(allowed) if method == "OPTIONS" => preflight_response(allowed),
            Some(_) => error_response(405, "Method not allowed"),
            None => error_response(404, "Not found"),
        },
    }
}

fn user_id(raw: &str) -> Result<UserId> {
    parse_id(raw, "user id").map(UserId)
}

fn allowed_methods(path: &[&str]) -> Option<&'static str> {
    match path {
        ["schedules"] => Some("GET, POST, OPTIONS"),
        ["schedules", "todo", _, "calendar"] => Some("POST, DELETE, OPTIONS"),
        ["schedules", "user", _]
        | ["schedules", "user", _, "range" | "category" | "todos" | "date"]
        | ["schedules", "user", _, "month", _, _] => Some("GET, OPTIONS"),
        ["schedules", _, "add-to-my-schedule"] => Some("POST, OPTIONS"),
        ["schedules", _] => Some("GET, PUT, DELETE, OPTIONS"),
        _ => None,
    }
}
