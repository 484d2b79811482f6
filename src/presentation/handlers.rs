// HTTP request handlers
use crate::application::dashboard_state::DashboardState;
use crate::application::history::{HistoryOutcome, HistoryPanel};
use crate::application::refresh_driver::CycleOutcome;
use crate::domain::reading::Site;
use crate::presentation::app_state::AppState;
use crate::presentation::errors::AppError;
use crate::presentation::page::{PageParts, render_page};
use axum::{
    Form, Json,
    extract::{Path, State},
    response::{Html, Redirect},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Deserialize)]
pub struct SiteSelection {
    #[serde(default)]
    pub site: String,
}

#[derive(Serialize)]
pub struct SummaryResponse {
    #[serde(flatten)]
    pub dashboard: DashboardState,
    pub card_count: usize,
    pub refreshing: bool,
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// The dashboard page: status line, cards as the cache left them, history panel
pub async fn index(State(state): State<Arc<AppState>>) -> Html<String> {
    let (status, cards) = {
        let cache = state.cache.lock().await;
        (cache.surface().render_status(), cache.surface().render_cards())
    };
    let dashboard = state.dashboard.read().await.clone();
    let history = state.history.panel().await;

    Html(render_page(&PageParts {
        status,
        cards,
        sites: &dashboard.sites,
        selected_site: dashboard.selected_site.as_deref(),
        products: &dashboard.products,
        history: history.as_ref(),
        refresh_secs: state.refresh_secs,
    }))
}

pub async fn api_summary(State(state): State<Arc<AppState>>) -> Json<SummaryResponse> {
    let card_count = state.cache.lock().await.len();
    Json(SummaryResponse {
        dashboard: state.dashboard.read().await.clone(),
        card_count,
        refreshing: state.driver.is_refreshing(),
    })
}

/// Site list straight from the backend; a failed fetch is a 502.
pub async fn api_sites(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Site>>, AppError> {
    let sites = state.site_service.list_sites().await?;
    Ok(Json(sites))
}

pub async fn api_history(State(state): State<Arc<AppState>>) -> Json<Option<HistoryPanel>> {
    Json(state.history.panel().await)
}

/// Manual refresh. Reloads the site list too.
pub async fn refresh(State(state): State<Arc<AppState>>) -> Redirect {
    state.site_service.refresh(&state.dashboard).await;
    if let CycleOutcome::Failed(e) = state.driver.request_refresh().await {
        tracing::warn!("Manual refresh failed: {}", e);
    }
    Redirect::to("/")
}

/// Change the site filter; an empty value selects every site.
pub async fn select_site(
    State(state): State<Arc<AppState>>,
    Form(selection): Form<SiteSelection>,
) -> Result<Redirect, AppError> {
    let site = selection.site.trim().to_string();
    let changed = {
        let mut dashboard = state.dashboard.write().await;
        if !site.is_empty()
            && !dashboard.sites.is_empty()
            && !dashboard.sites.iter().any(|s| s.id == site)
        {
            return Err(AppError::bad_request(format!("Unknown site '{}'", site)));
        }
        dashboard.select_site(Some(site))
    };

    if changed {
        tracing::info!("Site selection changed, refreshing");
        state.driver.request_refresh().await;
    }
    Ok(Redirect::to("/"))
}

pub async fn tank_history(
    Path((site, tank)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
) -> Result<Redirect, AppError> {
    if tank.trim().is_empty() {
        return Err(AppError::not_found("No tank reference"));
    }
    match state.history.open(&site, &tank).await {
        HistoryOutcome::Applied | HistoryOutcome::Stale => {}
        // the panel already carries the error message
        HistoryOutcome::Failed(e) => tracing::debug!("History panel shows error: {}", e),
    }
    Ok(Redirect::to("/"))
}

pub async fn close_history(State(state): State<Arc<AppState>>) -> Redirect {
    state.history.close().await;
    Redirect::to("/")
}
