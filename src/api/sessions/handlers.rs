use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::core::state::AppState;
use crate::repositories;
use crate::schemas::session::{
    CreateSessionsRequest, ExamSessionResponse, SaveAnswersRequest, SequenceEntryResponse,
    SequenceResponse, SubmitRequest, VerifyRequest, VerifyResponse,
};
use crate::services::{ordering, sessions};

#[derive(Debug, Deserialize)]
pub(in crate::api::sessions) struct SequenceQuery {
    #[serde(default)]
    #[serde(alias = "activeExamId")]
    active_exam_id: Option<i64>,
}

pub(in crate::api::sessions) async fn create_sessions(
    Path(schedule_id): Path<i64>,
    CurrentUser(user_id): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateSessionsRequest>,
) -> Result<Json<Vec<ExamSessionResponse>>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let sessions =
        sessions::start_schedule(state.db(), user_id, schedule_id, &payload.exam_ids).await?;

    Ok(Json(sessions.into_iter().map(ExamSessionResponse::from).collect()))
}

pub(in crate::api::sessions) async fn list_sessions(
    Path(schedule_id): Path<i64>,
    CurrentUser(user_id): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<ExamSessionResponse>>, ApiError> {
    let sessions = repositories::sessions::list_for_schedule(state.db(), schedule_id, user_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list sessions"))?;

    Ok(Json(sessions.into_iter().map(ExamSessionResponse::from).collect()))
}

pub(in crate::api::sessions) async fn get_sequence(
    Path(schedule_id): Path<i64>,
    Query(query): Query<SequenceQuery>,
    CurrentUser(user_id): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<SequenceResponse>, ApiError> {
    let schedule = repositories::schedules::find_by_id(state.db(), schedule_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch schedule"))?
        .ok_or_else(|| ApiError::NotFound("schedule not found".to_string()))?;

    let exams = repositories::exams::list_by_ids(state.db(), &schedule.exam_ids)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch exams"))?;

    // Re-index to the declared order; the query does not preserve it.
    let exam_order: Vec<_> = schedule
        .exam_ids
        .iter()
        .filter_map(|exam_id| exams.iter().find(|exam| exam.id == *exam_id).cloned())
        .collect();

    let sessions = repositories::sessions::list_for_schedule(state.db(), schedule_id, user_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list sessions"))?;

    let sequence = ordering::compute_sequence(&exam_order, &sessions);
    let current_exam_string = ordering::first_incomplete(&sequence, query.active_exam_id)
        .map(|entry| entry.exam_string.clone());
    let all_completed = ordering::all_completed(&sessions);

    let items = sequence
        .iter()
        .enumerate()
        .map(|(index, entry)| SequenceEntryResponse {
            exam_id: entry.exam_id,
            exam_string: entry.exam_string.clone(),
            title: entry.title.clone(),
            start_time: crate::schemas::session::format_primitive(entry.start_time),
            end_time: crate::schemas::session::format_primitive(entry.end_time),
            submitted: entry.submitted,
            completed: ordering::is_effectively_submitted(&sequence, index, query.active_exam_id),
        })
        .collect();

    Ok(Json(SequenceResponse { items, current_exam_string, all_completed }))
}

pub(in crate::api::sessions) async fn get_active_session(
    Path((schedule_id, exam_id)): Path<(i64, i64)>,
    CurrentUser(user_id): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Option<ExamSessionResponse>>, ApiError> {
    let session = sessions::get_active(state.db(), schedule_id, exam_id, user_id).await?;

    Ok(Json(session.map(ExamSessionResponse::from)))
}

pub(in crate::api::sessions) async fn save_answers(
    Path((schedule_id, exam_id)): Path<(i64, i64)>,
    CurrentUser(user_id): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<SaveAnswersRequest>,
) -> Result<Json<ExamSessionResponse>, ApiError> {
    let session =
        sessions::save_answers(state.db(), schedule_id, exam_id, user_id, payload.answers).await?;

    Ok(Json(ExamSessionResponse::from(session)))
}

pub(in crate::api::sessions) async fn submit_exam(
    Path((schedule_id, exam_id)): Path<(i64, i64)>,
    CurrentUser(user_id): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<SubmitRequest>,
) -> Result<Json<ExamSessionResponse>, ApiError> {
    let session =
        sessions::submit(state.db(), schedule_id, exam_id, user_id, payload.answers).await?;

    Ok(Json(ExamSessionResponse::from(session)))
}

pub(in crate::api::sessions) async fn verify_session(
    Path((schedule_id, exam_id)): Path<(i64, i64)>,
    CurrentUser(user_id): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<VerifyRequest>,
) -> Result<Json<VerifyResponse>, ApiError> {
    let outcome = sessions::verify(
        state.db(),
        schedule_id,
        exam_id,
        user_id,
        payload.questions_left,
        payload.session_id.as_deref(),
    )
    .await?;

    Ok(Json(VerifyResponse {
        status: "ok".to_string(),
        session_id: outcome.session_id,
        submitted: outcome.submitted,
    }))
}
