//! Scrape and export endpoints.
//!
//! Every scrape endpoint has export twins that run the same scrape and
//! answer with an Excel or CSV attachment instead of JSON.

use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use haraj_core::ListingRecord;
use haraj_export::ExportFormat;
use haraj_scraper::{PageReport, ScrapeReport};
use serde::{Deserialize, Serialize};

const URL_REQUIRED: &str = "url is required";
const URLS_REQUIRED: &str = "urls are required (comma-separated)";
const HOMEPAGE_REQUIRED: &str = "homepageUrl is required";

#[derive(Debug, Deserialize)]
pub struct UrlParams {
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UrlsParams {
    pub urls: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct HomepageParams {
    #[serde(rename = "homepageUrl")]
    pub homepage_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ScrapeResponse {
    pub publications: Vec<ListingRecord>,
    pub pages: Vec<PageReport>,
}

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn scrape_data(
    State(state): State<AppState>,
    Query(params): Query<UrlParams>,
) -> Result<Json<ScrapeResponse>, ApiError> {
    let url = required(params.url, URL_REQUIRED)?;
    let report = state.orchestrator.scrape_one(&url).await;
    json(report)
}

pub async fn export_excel(
    State(state): State<AppState>,
    Query(params): Query<UrlParams>,
) -> Result<Response, ApiError> {
    let url = required(params.url, URL_REQUIRED)?;
    let report = state.orchestrator.scrape_one(&url).await;
    attachment(report, ExportFormat::Xlsx)
}

pub async fn export_csv(
    State(state): State<AppState>,
    Query(params): Query<UrlParams>,
) -> Result<Response, ApiError> {
    let url = required(params.url, URL_REQUIRED)?;
    let report = state.orchestrator.scrape_one(&url).await;
    attachment(report, ExportFormat::Csv)
}

pub async fn scrape_multi(
    State(state): State<AppState>,
    Query(params): Query<UrlsParams>,
) -> Result<Json<ScrapeResponse>, ApiError> {
    let urls = url_list(params.urls)?;
    let report = state.orchestrator.scrape_many(&urls).await;
    json(report)
}

pub async fn export_excel_multi(
    State(state): State<AppState>,
    Query(params): Query<UrlsParams>,
) -> Result<Response, ApiError> {
    let urls = url_list(params.urls)?;
    let report = state.orchestrator.scrape_many(&urls).await;
    attachment(report, ExportFormat::Xlsx)
}

pub async fn export_csv_multi(
    State(state): State<AppState>,
    Query(params): Query<UrlsParams>,
) -> Result<Response, ApiError> {
    let urls = url_list(params.urls)?;
    let report = state.orchestrator.scrape_many(&urls).await;
    attachment(report, ExportFormat::Csv)
}

pub async fn scrape_all(
    State(state): State<AppState>,
    Query(params): Query<HomepageParams>,
) -> Result<Json<ScrapeResponse>, ApiError> {
    let homepage = required(params.homepage_url, HOMEPAGE_REQUIRED)?;
    let report = state.orchestrator.scrape_all(&homepage).await;
    json(report)
}

pub async fn export_excel_all(
    State(state): State<AppState>,
    Query(params): Query<HomepageParams>,
) -> Result<Response, ApiError> {
    let homepage = required(params.homepage_url, HOMEPAGE_REQUIRED)?;
    let report = state.orchestrator.scrape_all(&homepage).await;
    attachment(report, ExportFormat::Xlsx)
}

pub async fn export_csv_all(
    State(state): State<AppState>,
    Query(params): Query<HomepageParams>,
) -> Result<Response, ApiError> {
    let homepage = required(params.homepage_url, HOMEPAGE_REQUIRED)?;
    let report = state.orchestrator.scrape_all(&homepage).await;
    attachment(report, ExportFormat::Csv)
}

fn required(value: Option<String>, message: &'static str) -> Result<String, ApiError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(ApiError::MissingParameter(message))
}

/// Split a comma-separated list, dropping blank entries.
pub fn split_urls(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .map(str::to_string)
        .collect()
}

fn url_list(raw: Option<String>) -> Result<Vec<String>, ApiError> {
    let urls = split_urls(raw.as_deref().unwrap_or_default());
    if urls.is_empty() {
        return Err(ApiError::MissingParameter(URLS_REQUIRED));
    }
    Ok(urls)
}

fn non_empty(report: ScrapeReport) -> Result<ScrapeReport, ApiError> {
    if report.is_empty() {
        return Err(ApiError::NoListings {
            pages: report.pages,
            discovery_error: report.discovery_error,
        });
    }
    Ok(report)
}

fn json(report: ScrapeReport) -> Result<Json<ScrapeResponse>, ApiError> {
    let report = non_empty(report)?;
    Ok(Json(ScrapeResponse {
        publications: report.listings,
        pages: report.pages,
    }))
}

fn attachment(report: ScrapeReport, format: ExportFormat) -> Result<Response, ApiError> {
    let report = non_empty(report)?;
    let bytes = format.render(&report.listings)?;
    tracing::info!(rows = report.len(), ?format, "exporting listings");

    let disposition = format!("attachment; filename=\"{}\"", format.file_name());
    Ok((
        [
            (header::CONTENT_TYPE, format.content_type().to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}
