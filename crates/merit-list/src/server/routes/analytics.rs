//! Dashboard aggregate endpoints

use axum::{
    extract::{Query, State},
    Json,
};

use crate::error::Result;
use crate::merit::{CategoryDistribution, ScoreDistribution};
use crate::server::state::AppState;
use crate::types::AnalyticsParams;

/// GET /api/analytics/categories - merit list population by category
pub async fn category_distribution(
    State(state): State<AppState>,
    Query(params): Query<AnalyticsParams>,
) -> Result<Json<CategoryDistribution>> {
    let distribution = state
        .analytics()
        .category_distribution(params.exam_type.as_deref())
        .await?;
    Ok(Json(distribution))
}

/// GET /api/analytics/scores - ingested rows bucketed by score
pub async fn score_distribution(
    State(state): State<AppState>,
    Query(params): Query<AnalyticsParams>,
) -> Result<Json<ScoreDistribution>> {
    let distribution = state
        .analytics()
        .score_distribution(params.exam_type.as_deref())
        .await?;
    Ok(Json(distribution))
}
