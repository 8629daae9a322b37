//! Repository tests against a real Postgres.
//!
//! Each test gets a fresh database with the crate's migrations applied.
//! Run with `DATABASE_URL=postgres://... cargo test -p shared -- --ignored`.

use chrono::{NaiveDate, NaiveDateTime};
use sqlx::PgPool;

use shared::repository::{ScheduleRepository, TranscriptLineRepository};
use shared::{
    DateRange, Error, MeetingId, PgScheduleRepository, PgTranscriptLineRepository,
    ScheduleFields, ScheduleScope, TranscriptLineInput, UserId,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

async fn seed_user(pool: &PgPool, id: i64) {
    sqlx::query("INSERT INTO users (id) VALUES ($1) ON CONFLICT DO NOTHING")
        .bind(id)
        .execute(pool)
        .await
        .unwrap();
}

async fn seed_meeting(pool: &PgPool, id: i64) {
    sqlx::query("INSERT INTO meetings (id) VALUES ($1) ON CONFLICT DO NOTHING")
        .bind(id)
        .execute(pool)
        .await
        .unwrap();
}

fn event(user: i64, title: &str, start: NaiveDate, end: Option<NaiveDate>) -> ScheduleFields {
    ScheduleFields {
        user: Some(UserId(user)),
        title: Some(title.to_string()),
        start_date: Some(start),
        end_date: end,
        ..Default::default()
    }
}

fn line(meeting_id: i64, sequence: i32, text: &str) -> TranscriptLineInput {
    TranscriptLineInput {
        id: None,
        meeting_id,
        speaker: Some("Kim".to_string()),
        text: text.to_string(),
        sequence,
    }
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs DATABASE_URL pointing at a Postgres server"]
async fn schedule_insert_then_find_keeps_every_column(pool: PgPool) {
    seed_user(&pool, 7).await;
    seed_meeting(&pool, 2).await;
    let repo = PgScheduleRepository::new(pool);

    let start_time: NaiveDateTime = date(2024, 3, 1).and_hms_opt(9, 30, 0).unwrap();
    let fields = ScheduleFields {
        meeting: Some(MeetingId(2)),
        schedule_type: Some("MEETING".to_string()),
        category: Some("work".to_string()),
        display_in_calendar: true,
        scope: Some(ScheduleScope::Team),
        description: Some("Daily sync".to_string()),
        start_time: Some(start_time),
        location: Some("Room 4".to_string()),
        color: Some("#00aaff".to_string()),
        ..event(7, "Standup", date(2024, 3, 1), Some(date(2024, 3, 1)))
    };

    let created = repo.insert(&fields).await.unwrap();
    assert_eq!(created.fields, fields);

    let found = repo.find_by_id(created.id).await.unwrap().unwrap();
    assert_eq!(found, created);
    assert!(repo.find_by_id(created.id + 1).await.unwrap().is_none());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs DATABASE_URL pointing at a Postgres server"]
async fn every_scope_survives_the_enum_column(pool: PgPool) {
    seed_user(&pool, 1).await;
    let repo = PgScheduleRepository::new(pool);

    for scope in [
        ScheduleScope::Company,
        ScheduleScope::Team,
        ScheduleScope::Personal,
    ] {
        let created = repo
            .insert(&ScheduleFields {
                scope: Some(scope),
                ..event(1, "Scoped", date(2024, 1, 1), None)
            })
            .await
            .unwrap();
        assert_eq!(created.fields.scope, Some(scope));

        let replaced = repo
            .replace(
                created.id,
                &ScheduleFields {
                    scope: Some(ScheduleScope::Personal),
                    ..created.fields.clone()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(replaced.fields.scope, Some(ScheduleScope::Personal));
    }
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs DATABASE_URL pointing at a Postgres server"]
async fn range_query_is_inclusive_at_both_ends(pool: PgPool) {
    seed_user(&pool, 3).await;
    seed_user(&pool, 4).await;
    let repo = PgScheduleRepository::new(pool);

    let inserts = [
        event(3, "ends on start", date(2024, 2, 25), Some(date(2024, 3, 1))),
        event(3, "starts on end", date(2024, 3, 31), Some(date(2024, 4, 2))),
        event(3, "single day", date(2024, 3, 15), None),
        event(3, "too early", date(2024, 2, 1), Some(date(2024, 2, 29))),
        event(3, "too late", date(2024, 4, 1), None),
        event(4, "other user", date(2024, 3, 15), None),
        ScheduleFields {
            user: Some(UserId(3)),
            title: Some("undated".to_string()),
            ..Default::default()
        },
    ];
    for fields in &inserts {
        repo.insert(fields).await.unwrap();
    }

    let march = DateRange::month(2024, 3).unwrap();
    let titles: Vec<String> = repo
        .find_by_user_in_range(UserId(3), march)
        .await
        .unwrap()
        .into_iter()
        .filter_map(|s| s.fields.title)
        .collect();
    assert_eq!(titles, vec!["ends on start", "single day", "starts on end"]);

    let day = DateRange::single_day(date(2024, 3, 15));
    let found = repo.find_by_user_in_range(UserId(3), day).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].fields.title.as_deref(), Some("single day"));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs DATABASE_URL pointing at a Postgres server"]
async fn replace_clears_omitted_fields(pool: PgPool) {
    seed_user(&pool, 5).await;
    let repo = PgScheduleRepository::new(pool);

    let created = repo
        .insert(&ScheduleFields {
            category: Some("work".to_string()),
            color: Some("#ff0000".to_string()),
            is_todo: true,
            scope: Some(ScheduleScope::Company),
            ..event(5, "Draft", date(2024, 5, 1), Some(date(2024, 5, 2)))
        })
        .await
        .unwrap();

    let replacement = ScheduleFields {
        user: Some(UserId(5)),
        title: Some("Final".to_string()),
        ..Default::default()
    };
    let replaced = repo
        .replace(created.id, &replacement)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(replaced.id, created.id);
    assert_eq!(replaced.fields, replacement);
    assert_eq!(replaced.created_at, created.created_at);
    assert!(replaced.updated_at >= created.updated_at);

    assert!(repo.replace(created.id + 100, &replacement).await.unwrap().is_none());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs DATABASE_URL pointing at a Postgres server"]
async fn calendar_copies_are_removed_without_touching_the_todo(pool: PgPool) {
    seed_user(&pool, 3).await;
    let repo = PgScheduleRepository::new(pool);

    let todo = repo
        .insert(&ScheduleFields {
            user: Some(UserId(3)),
            title: Some("Buy milk".to_string()),
            is_todo: true,
            ..Default::default()
        })
        .await
        .unwrap();
    for day in [5, 6] {
        repo.insert(&ScheduleFields {
            display_in_calendar: true,
            original_todo_id: Some(todo.id),
            ..event(3, "Buy milk", date(2024, 3, day), None)
        })
        .await
        .unwrap();
    }

    assert_eq!(repo.delete_by_original_todo(todo.id).await.unwrap(), 2);
    assert_eq!(repo.delete_by_original_todo(todo.id).await.unwrap(), 0);

    let remaining = repo.find_by_user(UserId(3)).await.unwrap();
    assert_eq!(remaining, vec![todo.clone()]);
    assert_eq!(repo.find_todos_by_user(UserId(3)).await.unwrap(), vec![todo]);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs DATABASE_URL pointing at a Postgres server"]
async fn deleting_a_todo_unlinks_its_copies(pool: PgPool) {
    seed_user(&pool, 3).await;
    let repo = PgScheduleRepository::new(pool);

    let todo = repo
        .insert(&ScheduleFields {
            is_todo: true,
            ..event(3, "Call bank", date(2024, 3, 4), None)
        })
        .await
        .unwrap();
    let copy = repo
        .insert(&ScheduleFields {
            original_todo_id: Some(todo.id),
            ..event(3, "Call bank", date(2024, 3, 4), None)
        })
        .await
        .unwrap();

    assert!(repo.delete(todo.id).await.unwrap());
    assert!(!repo.delete(todo.id).await.unwrap());

    let copy = repo.find_by_id(copy.id).await.unwrap().unwrap();
    assert_eq!(copy.fields.original_todo_id, None);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs DATABASE_URL pointing at a Postgres server"]
async fn assign_to_user_moves_ownership(pool: PgPool) {
    seed_user(&pool, 1).await;
    seed_user(&pool, 2).await;
    let repo = PgScheduleRepository::new(pool);

    let created = repo
        .insert(&event(1, "Offsite", date(2024, 6, 1), None))
        .await
        .unwrap();

    let assigned = repo
        .assign_to_user(created.id, UserId(2))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(assigned.fields.user, Some(UserId(2)));
    assert!(assigned.fields.added_to_my_schedule);
    assert!(repo.find_by_user(UserId(1)).await.unwrap().is_empty());
    assert!(repo.assign_to_user(999, UserId(2)).await.unwrap().is_none());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs DATABASE_URL pointing at a Postgres server"]
async fn transcript_batch_with_unknown_id_rolls_back(pool: PgPool) {
    seed_meeting(&pool, 5).await;
    let repo = PgTranscriptLineRepository::new(pool);

    let first = repo.insert(&line(5, 0, "keep me")).await.unwrap();
    let second = repo.insert(&line(5, 1, "and me")).await.unwrap();

    let result = repo
        .update_batch(&[
            (first.id, line(5, 0, "changed")),
            (second.id + 100, line(5, 1, "ghost")),
        ])
        .await;
    assert!(matches!(result, Err(Error::NotFound(_))));

    let texts: Vec<String> = repo
        .find_by_meeting(MeetingId(5))
        .await
        .unwrap()
        .into_iter()
        .map(|l| l.text)
        .collect();
    assert_eq!(texts, vec!["keep me", "and me"]);

    let updated = repo
        .update_batch(&[(second.id, line(5, 1, "edited"))])
        .await
        .unwrap();
    assert_eq!(updated[0].id, second.id);
    assert_eq!(updated[0].text, "edited");
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs DATABASE_URL pointing at a Postgres server"]
async fn transcript_lines_are_ordered_by_sequence(pool: PgPool) {
    seed_meeting(&pool, 1).await;
    seed_meeting(&pool, 2).await;
    let repo = PgTranscriptLineRepository::new(pool);

    repo.insert(&line(1, 2, "third")).await.unwrap();
    repo.insert(&line(2, 0, "elsewhere")).await.unwrap();
    repo.insert(&line(1, 0, "first")).await.unwrap();

    let texts: Vec<String> = repo
        .find_by_meeting(MeetingId(1))
        .await
        .unwrap()
        .into_iter()
        .map(|l| l.text)
        .collect();
    assert_eq!(texts, vec!["first", "third"]);

    let doomed = repo.find_all().await.unwrap()[0].id;
    assert!(repo.delete(doomed).await.unwrap());
    assert!(!repo.delete(doomed).await.unwrap());
    assert_eq!(repo.find_all().await.unwrap().len(), 2);
}
