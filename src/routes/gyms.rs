// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Gym listing and nearby search.

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::error::Result;
use crate::models::{Coordinates, Gym};
use crate::services::gyms::{NearbyGym, DEFAULT_RADIUS_METERS};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/gyms", get(list_gyms))
        .route("/gyms/around-you", get(gyms_around_you))
}

async fn list_gyms(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Gym>>> {
    Ok(Json(state.gyms.list().await?))
}

#[derive(Debug, Deserialize)]
pub struct AroundYouParams {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub radius_meters: Option<f64>,
}

async fn gyms_around_you(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AroundYouParams>,
) -> Result<Json<Vec<NearbyGym>>> {
    let origin = Coordinates {
        latitude: params.latitude,
        longitude: params.longitude,
    };
    let radius = params.radius_meters.unwrap_or(DEFAULT_RADIUS_METERS);
    Ok(Json(state.gyms.around(origin, radius).await?))
}
