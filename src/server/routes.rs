//! Route handlers.

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::{HeaderName, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::AppState;
use super::error::ApiError;
use crate::service::ImageLookup;
use crate::types::{FitnessPlan, FitnessProfile, ImageInput, PlanSubject};
use crate::version::VersionInfo;

type ApiResult<T> = Result<T, ApiError>;

/// Header naming the model that produced a speech clip.
pub const MODEL_HEADER: &str = "x-fitgen-model";

#[derive(Debug, Deserialize)]
pub struct DescribeRequest {
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct DescribeResponse {
    pub content: String,
}

pub async fn describe(
    State(state): State<AppState>,
    payload: Result<Json<DescribeRequest>, JsonRejection>,
) -> ApiResult<Json<DescribeResponse>> {
    let Json(req) = payload?;
    let content = state.assistant()?.describe(&req.name).await?;
    Ok(Json(DescribeResponse { content }))
}

#[derive(Debug, Serialize)]
pub struct PlanResponse {
    pub plan: FitnessPlan,
    /// Exercise and meal names in the plan, classified.
    pub subjects: Vec<PlanSubject>,
}

pub async fn plan(
    State(state): State<AppState>,
    payload: Result<Json<FitnessProfile>, JsonRejection>,
) -> ApiResult<Json<PlanResponse>> {
    let Json(profile) = payload?;
    let plan = state.assistant()?.generate_plan(&profile).await?;
    let subjects = plan.subjects();
    Ok(Json(PlanResponse { plan, subjects }))
}

#[derive(Debug, Deserialize)]
pub struct AnalyzePhotoRequest {
    /// Base64 image, optionally as a `data:` URL.
    pub image_base64: String,
    #[serde(default = "default_mime")]
    pub mime_type: String,
    #[serde(default)]
    pub note: Option<String>,
}

fn default_mime() -> String {
    "image/jpeg".to_string()
}

#[derive(Debug, Serialize)]
pub struct AnalyzePhotoResponse {
    pub analysis: String,
}

pub async fn analyze_photo(
    State(state): State<AppState>,
    payload: Result<Json<AnalyzePhotoRequest>, JsonRejection>,
) -> ApiResult<Json<AnalyzePhotoResponse>> {
    let Json(req) = payload?;
    let image = ImageInput::from_base64(req.mime_type, &req.image_base64)?;
    let analysis = state
        .assistant()?
        .analyze_photo(&image, req.note.as_deref())
        .await?;
    Ok(Json(AnalyzePhotoResponse { analysis }))
}

#[derive(Debug, Deserialize)]
pub struct SpeechRequest {
    pub text: String,
    #[serde(default)]
    pub voice: Option<String>,
}

pub async fn speech(
    State(state): State<AppState>,
    payload: Result<Json<SpeechRequest>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(req) = payload?;
    let clip = state
        .assistant()?
        .synthesize(&req.text, req.voice.as_deref())
        .await?;

    let content_type = HeaderValue::from_str(&clip.content_type)
        .unwrap_or(HeaderValue::from_static("audio/mpeg"));
    let mut response = (StatusCode::OK, clip.data).into_response();
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, content_type);
    if let Ok(model) = HeaderValue::from_str(&clip.model) {
        headers.insert(HeaderName::from_static(MODEL_HEADER), model);
    }
    Ok(response)
}

#[derive(Debug, Deserialize)]
pub struct ImageRequest {
    pub name: String,
}

pub async fn image(
    State(state): State<AppState>,
    payload: Result<Json<ImageRequest>, JsonRejection>,
) -> ApiResult<Json<ImageLookup>> {
    let Json(req) = payload?;
    let lookup = state.assistant()?.image_for(&req.name).await?;
    Ok(Json(lookup))
}

pub async fn forget_image(
    State(state): State<AppState>,
    name: Result<Path<String>, PathRejection>,
) -> ApiResult<StatusCode> {
    let Path(name) = name?;
    state.assistant()?.forget_image(&name)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn health() -> Json<serde_json::Value> {
    let version = VersionInfo::current();
    Json(json!({
        "status": "ok",
        "version": version.version,
        "git_branch": version.git_branch,
        "built_at": version.built_at,
    }))
}
