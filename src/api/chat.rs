use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use chrono::Utc;
use serde::Serialize;
use validator::Validate;

use crate::{
    api::error::ApiError,
    chatbot::{respond, ChatContext, ChatMessage, ChatReply, SUGGESTIONS},
    domain::HorizonSummary,
    state::AppState,
    utils::local_now,
};

#[derive(Debug, Serialize)]
pub struct Suggestions {
    suggestions: [&'static str; 7],
}

/// POST /chat/message
pub async fn message(
    State(state): State<AppState>,
    payload: Result<Json<ChatMessage>, JsonRejection>,
) -> Result<Json<ChatReply>, ApiError> {
    let Json(msg) = payload?;
    msg.validate()?;
    let points = state.day_ahead(local_now())?;
    let summary = HorizonSummary::from_points(&points)
        .ok_or_else(|| ApiError::InternalError("empty forecast".to_string()))?;
    let ctx = ChatContext {
        forecast_peak_mw: summary.peak_demand_mw,
        forecast_peak_hour: summary.peak_hour,
    };
    Ok(Json(respond(&msg.message, &ctx, Utc::now())))
}

/// GET /chat/suggestions
pub async fn suggestions() -> Json<Suggestions> {
    Json(Suggestions {
        suggestions: SUGGESTIONS,
    })
}
