use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use time::PrimitiveDateTime;

/// A named, possibly time-boxed run of exams. `exam_ids` is the declared
/// order; a sentinel `start_time` (year < 2000) means "open anytime".
/// Read-only to the session subsystem.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct ExamSchedule {
    pub(crate) id: i64,
    pub(crate) name: String,
    pub(crate) exam_ids: Vec<i64>,
    pub(crate) start_time: PrimitiveDateTime,
    pub(crate) end_time: PrimitiveDateTime,
    pub(crate) auto_move: bool,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

/// Immutable once referenced by a session. `exam_string` is the stable slug
/// clients route on.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Exam {
    pub(crate) id: i64,
    pub(crate) title: String,
    pub(crate) exam_string: String,
    pub(crate) duration_minutes: i32,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

/// One learner's attempt at one exam within one schedule. `duration_minutes`
/// is the allotted time actually granted to this attempt, recomputed from the
/// window rather than copied blindly from the exam.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct ExamSession {
    pub(crate) id: String,
    pub(crate) schedule_id: i64,
    pub(crate) exam_id: i64,
    pub(crate) user_id: i64,
    pub(crate) start_time: PrimitiveDateTime,
    pub(crate) end_time: PrimitiveDateTime,
    pub(crate) duration_minutes: i32,
    pub(crate) auto_move: bool,
    pub(crate) answers: Json<serde_json::Value>,
    pub(crate) submitted: bool,
    pub(crate) last_save: PrimitiveDateTime,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}
