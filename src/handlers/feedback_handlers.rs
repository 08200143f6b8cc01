use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Deserialize;
use tracing::{error, info};

use crate::{
    auth::AuthenticatedUser, repositories::feedback_repository::CreateFeedbackData, AppState,
};

#[derive(Deserialize)]
pub struct FeedbackPayload {
    message: String,
    rating: Option<i16>,
}

/// Handler to submit a feedback entry for the signed-in user.
pub async fn submit_feedback_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<FeedbackPayload>,
) -> Response {
    let message = payload.message.trim().to_string();
    if message.chars().count() < 5 {
        return (
            StatusCode::BAD_REQUEST,
            "Please write a bit more in your feedback",
        )
            .into_response();
    }

    let rating = payload.rating.unwrap_or(5);
    if !(1..=5).contains(&rating) {
        return (StatusCode::BAD_REQUEST, "Rating must be between 1 and 5").into_response();
    }

    let data = CreateFeedbackData {
        user_id: user.0.id,
        user_email: user.0.email.clone(),
        user_name: user.0.name_or_email_prefix(),
        user_photo: user.0.photo_url.clone(),
        message,
        rating,
    };

    match state.feedback.add(data).await {
        Ok(entry) => {
            info!(feedback_id = %entry.id, user_id = %user.0.id, "Feedback submitted");
            (StatusCode::CREATED, Json(entry)).into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to submit feedback");
            (StatusCode::INTERNAL_SERVER_ERROR, "Error submitting feedback").into_response()
        }
    }
}

/// Handler to list feedback entries, newest first.
pub async fn list_feedback_handler(State(state): State<AppState>) -> Response {
    match state.feedback.get_all().await {
        Ok(entries) => (StatusCode::OK, Json(entries)).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to fetch feedback");
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch feedback").into_response()
        }
    }
}
