use std::collections::HashMap;

use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::core::time::{primitive_now_utc, sentinel_time};
use crate::db::models::ExamSession;
use crate::repositories;
use crate::repositories::sessions::CreateSession;
use crate::services::session_windows::{auto_move_window, plan_windows, resolve_anchor};

#[derive(Debug, Error)]
pub(crate) enum SessionError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    Conflict(&'static str),
    #[error("{0}")]
    Validation(&'static str),
    #[error(transparent)]
    Store(#[from] sqlx::Error),
}

#[derive(Debug)]
pub(crate) struct VerifyOutcome {
    pub(crate) session_id: String,
    pub(crate) submitted: bool,
}

/// Creates one session for the triple. The window stays sentinel ("open
/// anytime") until scheduling assigns one; the allotment and auto-move flag
/// are copied from the exam and schedule so a later rewrite has what it
/// needs. When the active-session index rejects the insert, the surviving
/// row is returned instead.
pub(crate) async fn create_session(
    pool: &PgPool,
    schedule_id: i64,
    exam_id: i64,
    user_id: i64,
    answers: serde_json::Value,
) -> Result<ExamSession, SessionError> {
    let schedule = repositories::schedules::find_by_id(pool, schedule_id)
        .await?
        .ok_or(SessionError::NotFound("schedule"))?;
    let exam = repositories::exams::find_by_id(pool, exam_id)
        .await?
        .ok_or(SessionError::NotFound("exam"))?;

    let now = primitive_now_utc();
    let id = Uuid::new_v4().to_string();
    let inserted = repositories::sessions::create(
        pool,
        CreateSession {
            id: &id,
            schedule_id,
            exam_id,
            user_id,
            start_time: sentinel_time(),
            end_time: sentinel_time(),
            duration_minutes: exam.duration_minutes,
            auto_move: schedule.auto_move,
            answers,
            last_save: now,
            created_at: now,
            updated_at: now,
        },
    )
    .await?;

    if inserted {
        return Ok(repositories::sessions::fetch_one_by_id(pool, &id).await?);
    }

    repositories::sessions::find_active(pool, schedule_id, exam_id, user_id)
        .await?
        .ok_or(SessionError::Conflict("an active session already exists for this exam"))
}

/// The client-facing entry point for a schedule: hands back the existing
/// active sessions when the learner already started, otherwise creates the
/// whole batch.
pub(crate) async fn start_schedule(
    pool: &PgPool,
    user_id: i64,
    schedule_id: i64,
    exam_ids: &[i64],
) -> Result<Vec<ExamSession>, SessionError> {
    let existing =
        repositories::sessions::list_active_for_schedule(pool, schedule_id, user_id).await?;
    if !existing.is_empty() {
        return Ok(existing);
    }

    match create_batch(pool, user_id, schedule_id, exam_ids).await {
        Ok(sessions) => Ok(sessions),
        Err(SessionError::Conflict(message)) => {
            // Lost a race with another request for the same learner; its
            // sessions are the real ones.
            let active =
                repositories::sessions::list_active_for_schedule(pool, schedule_id, user_id)
                    .await?;
            if active.is_empty() {
                Err(SessionError::Conflict(message))
            } else {
                Ok(active)
            }
        }
        Err(err) => Err(err),
    }
}

/// Bulk-creates one session per exam inside a single transaction. A missing
/// schedule or exam, or any failed insert, rolls the whole batch back;
/// partial batches are never visible.
pub(crate) async fn create_batch(
    pool: &PgPool,
    user_id: i64,
    schedule_id: i64,
    exam_ids: &[i64],
) -> Result<Vec<ExamSession>, SessionError> {
    if exam_ids.is_empty() {
        return Err(SessionError::Validation("exam_ids must not be empty"));
    }

    let mut tx = pool.begin().await?;

    let schedule = repositories::schedules::find_by_id(&mut *tx, schedule_id)
        .await?
        .ok_or(SessionError::NotFound("schedule"))?;

    let exams = repositories::exams::list_by_ids(&mut *tx, exam_ids).await?;
    let durations_by_id: HashMap<i64, i32> =
        exams.iter().map(|exam| (exam.id, exam.duration_minutes)).collect();

    let mut durations = Vec::with_capacity(exam_ids.len());
    for exam_id in exam_ids {
        durations
            .push(*durations_by_id.get(exam_id).ok_or(SessionError::NotFound("exam"))?);
    }

    let now = primitive_now_utc();
    let anchor = resolve_anchor(schedule.start_time, now);
    let windows = plan_windows(anchor, &durations);

    let mut ids = Vec::with_capacity(exam_ids.len());
    for (exam_id, window) in exam_ids.iter().zip(&windows) {
        let id = Uuid::new_v4().to_string();
        let inserted = repositories::sessions::create(
            &mut *tx,
            CreateSession {
                id: &id,
                schedule_id,
                exam_id: *exam_id,
                user_id,
                start_time: window.start,
                end_time: window.end,
                duration_minutes: window.duration_minutes,
                auto_move: schedule.auto_move,
                answers: serde_json::json!({}),
                last_save: now,
                created_at: now,
                updated_at: now,
            },
        )
        .await?;

        if !inserted {
            return Err(SessionError::Conflict("an active session already exists for this exam"));
        }
        ids.push(id);
    }

    tx.commit().await?;

    tracing::info!(schedule_id, user_id, count = ids.len(), "created exam session batch");

    let mut sessions = Vec::with_capacity(ids.len());
    for id in &ids {
        sessions.push(repositories::sessions::fetch_one_by_id(pool, id).await?);
    }

    Ok(sessions)
}

/// Fetches the learner's active session for the triple, applying the
/// auto-move rewrite on the way out.
pub(crate) async fn get_active(
    pool: &PgPool,
    schedule_id: i64,
    exam_id: i64,
    user_id: i64,
) -> Result<Option<ExamSession>, SessionError> {
    let Some(session) =
        repositories::sessions::find_active(pool, schedule_id, exam_id, user_id).await?
    else {
        return Ok(None);
    };

    Ok(Some(resume_with_auto_move(pool, session).await?))
}

/// Rewrites the window to begin now when an auto-move session is opened
/// before its nominal start. Safe to call on every fetch; once the window
/// has begun the rewrite is a no-op.
pub(crate) async fn resume_with_auto_move(
    pool: &PgPool,
    session: ExamSession,
) -> Result<ExamSession, SessionError> {
    let now = primitive_now_utc();
    match auto_move_window(session.auto_move, session.start_time, session.duration_minutes, now) {
        Some((start, end)) => {
            repositories::sessions::move_window(pool, &session.id, start, end, now).await?;
            tracing::debug!(session_id = %session.id, "moved session window to first access");
            Ok(ExamSession { start_time: start, end_time: end, updated_at: now, ..session })
        }
        None => Ok(session),
    }
}

/// Replaces the active session's answers (last-write-wins), creating the
/// session first when the learner saves before ever entering the exam.
pub(crate) async fn save_answers(
    pool: &PgPool,
    schedule_id: i64,
    exam_id: i64,
    user_id: i64,
    answers: serde_json::Value,
) -> Result<ExamSession, SessionError> {
    if let Some(session) =
        repositories::sessions::find_active(pool, schedule_id, exam_id, user_id).await?
    {
        let now = primitive_now_utc();
        repositories::sessions::update_answers(pool, &session.id, answers, now).await?;
        return Ok(repositories::sessions::fetch_one_by_id(pool, &session.id).await?);
    }

    create_session(pool, schedule_id, exam_id, user_id, answers).await
}

/// Submits the active session, or creates-and-submits in one transaction
/// when no session exists yet. Answers are required in the latter case;
/// otherwise the stored answers are kept when none are supplied.
pub(crate) async fn submit(
    pool: &PgPool,
    schedule_id: i64,
    exam_id: i64,
    user_id: i64,
    answers: Option<serde_json::Value>,
) -> Result<ExamSession, SessionError> {
    if let Some(session) =
        repositories::sessions::find_active(pool, schedule_id, exam_id, user_id).await?
    {
        let now = primitive_now_utc();
        repositories::sessions::mark_submitted(pool, &session.id, answers, now).await?;
        return Ok(repositories::sessions::fetch_one_by_id(pool, &session.id).await?);
    }

    let answers = answers
        .ok_or(SessionError::Validation("answers are required when submitting without a session"))?;

    let mut tx = pool.begin().await?;

    let schedule = repositories::schedules::find_by_id(&mut *tx, schedule_id)
        .await?
        .ok_or(SessionError::NotFound("schedule"))?;
    let exam = repositories::exams::find_by_id(&mut *tx, exam_id)
        .await?
        .ok_or(SessionError::NotFound("exam"))?;

    let now = primitive_now_utc();
    let id = Uuid::new_v4().to_string();
    let inserted = repositories::sessions::create(
        &mut *tx,
        CreateSession {
            id: &id,
            schedule_id,
            exam_id,
            user_id,
            start_time: sentinel_time(),
            end_time: sentinel_time(),
            duration_minutes: exam.duration_minutes,
            auto_move: schedule.auto_move,
            answers,
            last_save: now,
            created_at: now,
            updated_at: now,
        },
    )
    .await?;

    if !inserted {
        return Err(SessionError::Conflict("an active session already exists for this exam"));
    }

    repositories::sessions::mark_submitted(&mut *tx, &id, None, now).await?;
    tx.commit().await?;

    Ok(repositories::sessions::fetch_one_by_id(pool, &id).await?)
}

/// Reconciles client-perceived progress with server state. A supplied
/// session id must match the caller's most recent session for the schedule;
/// otherwise the submitted flag is re-derived from how many questions the
/// client still shows, un-submitting a session the learner clearly has open.
pub(crate) async fn verify(
    pool: &PgPool,
    schedule_id: i64,
    exam_id: i64,
    user_id: i64,
    questions_left: i64,
    session_id: Option<&str>,
) -> Result<VerifyOutcome, SessionError> {
    if let Some(claimed) = session_id {
        let latest = repositories::sessions::find_latest_for_schedule(pool, schedule_id, user_id)
            .await?
            .ok_or(SessionError::NotFound("session"))?;

        if latest.id != claimed {
            return Err(SessionError::Conflict(
                "session id does not match the current session for this schedule",
            ));
        }

        return Ok(VerifyOutcome { session_id: latest.id, submitted: latest.submitted });
    }

    let finished = questions_left <= 0;
    match repositories::sessions::find_latest(pool, schedule_id, exam_id, user_id).await? {
        Some(session) if session.submitted && !finished => {
            let now = primitive_now_utc();
            repositories::sessions::set_submitted(pool, &session.id, false, now).await?;
            tracing::info!(session_id = %session.id, "un-submitted session with open questions");
            Ok(VerifyOutcome { session_id: session.id, submitted: false })
        }
        Some(session) => {
            Ok(VerifyOutcome { session_id: session.id, submitted: session.submitted })
        }
        None => {
            let session =
                create_session(pool, schedule_id, exam_id, user_id, serde_json::json!({})).await?;
            Ok(VerifyOutcome { session_id: session.id, submitted: session.submitted })
        }
    }
}
