use crate::db::models::ExamSchedule;

pub(crate) const COLUMNS: &str =
    "id, name, exam_ids, start_time, end_time, auto_move, created_at, updated_at";

pub(crate) async fn find_by_id(
    executor: impl sqlx::PgExecutor<'_>,
    id: i64,
) -> Result<Option<ExamSchedule>, sqlx::Error> {
    sqlx::query_as::<_, ExamSchedule>(&format!(
        "SELECT {COLUMNS} FROM exam_schedules WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(executor)
    .await
}
