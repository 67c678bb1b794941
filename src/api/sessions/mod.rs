mod handlers;

use axum::{routing::get, routing::post, routing::put, Router};

use crate::core::state::AppState;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/:schedule_id/sessions",
            post(handlers::create_sessions).get(handlers::list_sessions),
        )
        .route("/:schedule_id/sequence", get(handlers::get_sequence))
        .route("/:schedule_id/exams/:exam_id/session", get(handlers::get_active_session))
        .route("/:schedule_id/exams/:exam_id/answers", put(handlers::save_answers))
        .route("/:schedule_id/exams/:exam_id/submit", post(handlers::submit_exam))
        .route("/:schedule_id/exams/:exam_id/verify", post(handlers::verify_session))
}
