use askama::Template;
use axum::{Json, extract::State, response::Html};
use chrono::Utc;
use serde::Serialize;
use tracing::info;

use crate::{card::DisplayContext, error::AppError, state::AppState};

pub const LIVE_MESSAGE: &str = "NFC AI Networking Card is live!";
pub const TRACKING_STATUS: &str = "Tracking active";

#[derive(Debug, Serialize)]
pub struct StatusMessage {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct Stats {
    pub total_taps: u64,
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct FactBody {
    pub fact: String,
    pub source: String,
}

/// `GET /` liveness.
pub async fn root_handler() -> Json<StatusMessage> {
    Json(StatusMessage {
        message: LIVE_MESSAGE,
    })
}

/// `GET /tap`: count the tap, fetch a fact, render the card.
pub async fn tap_handler(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let total = state.counter.increment().await.map_err(AppError::Tap)?;
    let fact = state.facts.generate().await;
    info!(session_id = total, source = fact.source.label(), "Tap served");

    let page = DisplayContext::new(total, Utc::now(), &fact, &state.profile);
    Ok(Html(page.render()?))
}

/// `GET /stats`: read the counter without touching it.
pub async fn stats_handler(State(state): State<AppState>) -> Result<Json<Stats>, AppError> {
    let total_taps = state.counter.read().await.map_err(AppError::Stats)?;
    Ok(Json(Stats {
        total_taps,
        status: TRACKING_STATUS,
    }))
}

/// `GET /fact`: one fact and the tier that produced it.
pub async fn fact_handler(State(state): State<AppState>) -> Json<FactBody> {
    let fact = state.facts.generate().await;
    Json(FactBody {
        source: fact.source.label().to_string(),
        fact: fact.text,
    })
}
