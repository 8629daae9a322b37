//! Transcript Lines Lambda - Handles /api/transcript-lines endpoints.

use lambda_http::{run, service_fn, Error};
use shared::routes::handle_transcript_lines;
use shared::{db, Config, ObjectStorage, PgTranscriptLineRepository, TranscriptLineService};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Application state
struct AppState {
    transcript_lines: TranscriptLineService,
    storage: ObjectStorage,
}

impl AppState {
    async fn new() -> Result<Self, Error> {
        let config = Config::from_env()?;

        let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        let secrets_client = aws_sdk_secretsmanager::Client::new(&aws_config);

        let db_pool = db::create_pool(&config, &secrets_client).await?;
        db::run_migrations(&db_pool).await?;

        Ok(Self {
            transcript_lines: TranscriptLineService::new(Arc::new(
                PgTranscriptLineRepository::new(db_pool),
            )),
            storage: ObjectStorage::from_config(&config.storage),
        })
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let state = Arc::new(AppState::new().await?);
    info!(
        "Transcript lines service ready, object storage in {}",
        state.storage.region()
    );

    run(service_fn(move |event| {
        let state = Arc::clone(&state);
        async move { handle_transcript_lines(&state.transcript_lines, event).await }
    }))
    .await
}
