use serde::{Deserialize, Serialize};
use validator::Validate;

pub(crate) use crate::core::time::format_primitive;
use crate::db::models::ExamSession;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct CreateSessionsRequest {
    #[serde(alias = "examIds")]
    #[validate(length(min = 1, message = "exam_ids must not be empty"))]
    pub(crate) exam_ids: Vec<i64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SaveAnswersRequest {
    pub(crate) answers: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SubmitRequest {
    #[serde(default)]
    pub(crate) answers: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VerifyRequest {
    #[serde(alias = "questionsLeft")]
    pub(crate) questions_left: i64,
    #[serde(default)]
    #[serde(alias = "sessionId")]
    pub(crate) session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ExamSessionResponse {
    pub(crate) id: String,
    pub(crate) schedule_id: i64,
    pub(crate) exam_id: i64,
    pub(crate) user_id: i64,
    pub(crate) start_time: String,
    pub(crate) end_time: String,
    pub(crate) duration_minutes: i32,
    pub(crate) auto_move: bool,
    pub(crate) answers: serde_json::Value,
    pub(crate) submitted: bool,
    pub(crate) last_save: String,
}

impl From<ExamSession> for ExamSessionResponse {
    fn from(session: ExamSession) -> Self {
        Self {
            id: session.id,
            schedule_id: session.schedule_id,
            exam_id: session.exam_id,
            user_id: session.user_id,
            start_time: format_primitive(session.start_time),
            end_time: format_primitive(session.end_time),
            duration_minutes: session.duration_minutes,
            auto_move: session.auto_move,
            answers: session.answers.0,
            submitted: session.submitted,
            last_save: format_primitive(session.last_save),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct VerifyResponse {
    pub(crate) status: String,
    pub(crate) session_id: String,
    pub(crate) submitted: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct SequenceEntryResponse {
    pub(crate) exam_id: i64,
    pub(crate) exam_string: String,
    pub(crate) title: String,
    pub(crate) start_time: String,
    pub(crate) end_time: String,
    pub(crate) submitted: bool,
    pub(crate) completed: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct SequenceResponse {
    pub(crate) items: Vec<SequenceEntryResponse>,
    pub(crate) current_exam_string: Option<String>,
    pub(crate) all_completed: bool,
}
