//! Transcript lines API.
//!
//! Endpoints:
//! - GET /api/transcript-lines - List all lines
//! - GET /api/transcript-lines/meeting/{meetingId} - Lines of one meeting
//! - POST /api/transcript-lines - Create a line
//! - PUT /api/transcript-lines - Overwrite a batch of lines by id
//! - DELETE /api/transcript-lines/{id} - Delete a line

use lambda_http::{Body, Request, Response};
use serde_json::json;
use tracing::info;

use crate::http::{
    error_into_response, error_response, json_response, parse_id, parse_json_body,
    path_segments, preflight_response,
};
use crate::models::{MeetingId, TranscriptLineInput};
use crate::transcripts::TranscriptLineService;
use crate::Result;

pub async fn handle_transcript_lines(
    service: &TranscriptLineService,
    event: Request,
) -> std::result::Result<Response<Body>, lambda_http::Error> {
    info!(
        "Transcript lines request: {} {}",
        event.method(),
        event.uri().path()
    );

    match route(service, &event).await {
        Ok(response) => Ok(response),
        Err(e) => Ok(error_into_response(&e)?),
    }
}

async fn route(service: &TranscriptLineService, event: &Request) -> Result<Response<Body>> {
    let segments = path_segments(event.uri().path());

    match (event.method().as_str(), segments.as_slice()) {
        ("GET", ["transcript-lines"]) => json_response(200, &service.list().await?),

        ("POST", ["transcript-lines"]) => {
            let line: TranscriptLineInput = parse_json_body(event.body())?;
            json_response(200, &service.create(line).await?)
        }

        ("PUT", ["transcript-lines"]) => {
            let lines: Vec<TranscriptLineInput> = parse_json_body(event.body())?;
            json_response(200, &service.update_batch(lines).await?)
        }

        ("GET", ["transcript-lines", "meeting", meeting]) => {
            let meeting = MeetingId(parse_id(meeting, "meeting id")?);
            json_response(200, &service.list_by_meeting(meeting).await?)
        }

        ("DELETE", ["transcript-lines", id]) => {
            let deleted = service.delete(parse_id(id, "transcript line id")?).await?;
            json_response(200, &json!({ "deleted": deleted }))
        }

        ("OPTIONS", ["transcript-lines"]) => preflight_response("GET, POST, PUT, OPTIONS"),
        ("OPTIONS", ["transcript-lines", "meeting", _]) => preflight_response("GET, OPTIONS"),
        ("OPTIONS", ["transcript-lines", _]) => preflight_response("DELETE, OPTIONS"),

        (_, ["transcript-lines"])
        | (_, ["transcript-lines", _])
        | (_, ["transcript-lines", "meeting", _]) => error_response(405, "Method not allowed"),

        _ => error_response(404, "Not found"),
    }
}
