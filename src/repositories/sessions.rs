use time::PrimitiveDateTime;

use crate::db::models::ExamSession;

pub(crate) const COLUMNS: &str = "\
    id, schedule_id, exam_id, user_id, start_time, end_time, duration_minutes, \
    auto_move, answers, submitted, last_save, created_at, updated_at";

pub(crate) struct CreateSession<'a> {
    pub(crate) id: &'a str,
    pub(crate) schedule_id: i64,
    pub(crate) exam_id: i64,
    pub(crate) user_id: i64,
    pub(crate) start_time: PrimitiveDateTime,
    pub(crate) end_time: PrimitiveDateTime,
    pub(crate) duration_minutes: i32,
    pub(crate) auto_move: bool,
    pub(crate) answers: serde_json::Value,
    pub(crate) last_save: PrimitiveDateTime,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

pub(crate) async fn fetch_one_by_id(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
) -> Result<ExamSession, sqlx::Error> {
    sqlx::query_as::<_, ExamSession>(&format!("SELECT {COLUMNS} FROM exam_sessions WHERE id = $1"))
        .bind(id)
        .fetch_one(executor)
        .await
}

/// The idempotency guard every write path consults: the most-recently-saved
/// unsubmitted session for the triple.
pub(crate) async fn find_active(
    executor: impl sqlx::PgExecutor<'_>,
    schedule_id: i64,
    exam_id: i64,
    user_id: i64,
) -> Result<Option<ExamSession>, sqlx::Error> {
    sqlx::query_as::<_, ExamSession>(&format!(
        "SELECT {COLUMNS} FROM exam_sessions \
         WHERE schedule_id = $1 AND exam_id = $2 AND user_id = $3 AND NOT submitted \
         ORDER BY last_save DESC LIMIT 1"
    ))
    .bind(schedule_id)
    .bind(exam_id)
    .bind(user_id)
    .fetch_optional(executor)
    .await
}

/// Latest session for the triple regardless of submission state.
pub(crate) async fn find_latest(
    executor: impl sqlx::PgExecutor<'_>,
    schedule_id: i64,
    exam_id: i64,
    user_id: i64,
) -> Result<Option<ExamSession>, sqlx::Error> {
    sqlx::query_as::<_, ExamSession>(&format!(
        "SELECT {COLUMNS} FROM exam_sessions \
         WHERE schedule_id = $1 AND exam_id = $2 AND user_id = $3 \
         ORDER BY last_save DESC LIMIT 1"
    ))
    .bind(schedule_id)
    .bind(exam_id)
    .bind(user_id)
    .fetch_optional(executor)
    .await
}

/// Latest session across every exam of the schedule.
pub(crate) async fn find_latest_for_schedule(
    executor: impl sqlx::PgExecutor<'_>,
    schedule_id: i64,
    user_id: i64,
) -> Result<Option<ExamSession>, sqlx::Error> {
    sqlx::query_as::<_, ExamSession>(&format!(
        "SELECT {COLUMNS} FROM exam_sessions \
         WHERE schedule_id = $1 AND user_id = $2 \
         ORDER BY last_save DESC LIMIT 1"
    ))
    .bind(schedule_id)
    .bind(user_id)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn list_for_schedule(
    executor: impl sqlx::PgExecutor<'_>,
    schedule_id: i64,
    user_id: i64,
) -> Result<Vec<ExamSession>, sqlx::Error> {
    sqlx::query_as::<_, ExamSession>(&format!(
        "SELECT {COLUMNS} FROM exam_sessions \
         WHERE schedule_id = $1 AND user_id = $2 \
         ORDER BY start_time, created_at"
    ))
    .bind(schedule_id)
    .bind(user_id)
    .fetch_all(executor)
    .await
}

pub(crate) async fn list_active_for_schedule(
    executor: impl sqlx::PgExecutor<'_>,
    schedule_id: i64,
    user_id: i64,
) -> Result<Vec<ExamSession>, sqlx::Error> {
    sqlx::query_as::<_, ExamSession>(&format!(
        "SELECT {COLUMNS} FROM exam_sessions \
         WHERE schedule_id = $1 AND user_id = $2 AND NOT submitted \
         ORDER BY start_time, created_at"
    ))
    .bind(schedule_id)
    .bind(user_id)
    .fetch_all(executor)
    .await
}

/// Inserts an unsubmitted session. Returns false when the partial unique
/// index already holds an active row for the triple; callers re-read and use
/// the surviving session.
pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    session: CreateSession<'_>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO exam_sessions (
            id, schedule_id, exam_id, user_id, start_time, end_time,
            duration_minutes, auto_move, answers, submitted, last_save,
            created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,FALSE,$10,$11,$12)
        ON CONFLICT DO NOTHING",
    )
    .bind(session.id)
    .bind(session.schedule_id)
    .bind(session.exam_id)
    .bind(session.user_id)
    .bind(session.start_time)
    .bind(session.end_time)
    .bind(session.duration_minutes)
    .bind(session.auto_move)
    .bind(session.answers)
    .bind(session.last_save)
    .bind(session.created_at)
    .bind(session.updated_at)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Full replace, last-write-wins. Answers are never merged.
pub(crate) async fn update_answers(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    answers: serde_json::Value,
    now: PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE exam_sessions SET answers = $1, last_save = $2, updated_at = $2 WHERE id = $3",
    )
    .bind(answers)
    .bind(now)
    .bind(id)
    .execute(executor)
    .await?;
    Ok(())
}

/// Marks the session submitted, replacing answers only when new ones are
/// supplied.
pub(crate) async fn mark_submitted(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    answers: Option<serde_json::Value>,
    now: PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE exam_sessions \
         SET submitted = TRUE, answers = COALESCE($1, answers), last_save = $2, updated_at = $2 \
         WHERE id = $3",
    )
    .bind(answers)
    .bind(now)
    .bind(id)
    .execute(executor)
    .await?;
    Ok(())
}

/// Recovery edge: verify() un-submits a session the client still has open.
pub(crate) async fn set_submitted(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    submitted: bool,
    now: PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE exam_sessions SET submitted = $1, last_save = $2, updated_at = $2 WHERE id = $3",
    )
    .bind(submitted)
    .bind(now)
    .bind(id)
    .execute(executor)
    .await?;
    Ok(())
}

pub(crate) async fn move_window(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    start_time: PrimitiveDateTime,
    end_time: PrimitiveDateTime,
    now: PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE exam_sessions SET start_time = $1, end_time = $2, updated_at = $3 WHERE id = $4",
    )
    .bind(start_time)
    .bind(end_time)
    .bind(now)
    .bind(id)
    .execute(executor)
    .await?;
    Ok(())
}
