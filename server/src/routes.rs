//! HTTP routes.

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use countrycache_common::{CacheStatus, CountryQuery, MergedCountry, SortOrder, Timestamp};

use crate::error::ApiError;
use crate::state::AppState;

/// Build the router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/countries/refresh", post(refresh))
        .route("/countries", get(list_countries))
        .route("/countries/:name", get(get_country).delete(delete_country))
        .route("/status", get(status))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct RefreshResponse {
    message: &'static str,
    total_countries: usize,
    last_refreshed_at: Timestamp,
}

/// Query string of `GET /countries`. Empty values count as absent, and a
/// `sort` other than `gdp_desc` leaves the list unsorted.
#[derive(Debug, Default, Deserialize)]
struct ListParams {
    region: Option<String>,
    currency: Option<String>,
    sort: Option<String>,
}

impl ListParams {
    fn into_query(self) -> CountryQuery {
        let mut query = CountryQuery::all();

        if let Some(region) = non_empty(self.region) {
            query = query.with_region(region);
        }
        if let Some(currency) = non_empty(self.currency) {
            query = query.with_currency(currency);
        }
        if let Some(sort) = non_empty(self.sort) {
            match sort.parse::<SortOrder>() {
                Ok(order) => query = query.sorted(order),
                Err(e) => debug!(error = %e, "Ignoring sort parameter"),
            }
        }

        query
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

async fn refresh(State(state): State<AppState>) -> Result<Json<RefreshResponse>, ApiError> {
    let outcome = state.orchestrator.refresh().await?;

    info!(
        refresh_id = %outcome.refresh_id,
        total_countries = outcome.refreshed_count,
        "Refresh served"
    );

    Ok(Json(RefreshResponse {
        message: "Countries data refreshed",
        total_countries: outcome.refreshed_count,
        last_refreshed_at: outcome.refreshed_at,
    }))
}

async fn list_countries(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Json<Vec<MergedCountry>> {
    Json(state.query.list(&params.into_query()))
}

async fn get_country(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<MergedCountry>, ApiError> {
    Ok(Json(state.query.get(&name)?))
}

async fn delete_country(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<MergedCountry>, ApiError> {
    Ok(Json(state.query.delete(&name).await?))
}

async fn status(State(state): State<AppState>) -> Json<CacheStatus> {
    Json(state.query.status())
}

async fn health() -> &'static str {
    "OK"
}
