//! Axum route handlers for the draft and saved-resume API.

use std::str::FromStr;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::errors::{AppError, AppJson, AppPath};
use crate::models::{
    Award, Basics, BasicsPatch, Certificate, Education, Interest, ItemId, Language, Project,
    Publication, RecordPatch, Reference, Resume, ResumeId, ResumePatch, SectionKind,
    SectionRecord, Skill, Volunteer, WorkExperience,
};
use crate::state::AppState;
use crate::store::ResumeStore;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemResponse {
    pub id: ItemId,
    pub index: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveResumeResponse {
    pub resume_id: ResumeId,
    pub next_draft_id: ResumeId,
}

/// One row of the saved-resumes listing.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeSummary {
    pub id: ResumeId,
    pub name: String,
    pub summary: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

impl From<&Resume> for ResumeSummary {
    fn from(resume: &Resume) -> Self {
        Self {
            id: resume.id,
            name: resume.basics.name.clone(),
            summary: resume.basics.summary.clone(),
            created_at: resume.created_at,
            updated_at: resume.updated_at,
        }
    }
}

/// Addresses a section item either by stable id or by current position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemRef {
    Id(ItemId),
    Index(usize),
}

impl FromStr for ItemRef {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(index) = s.parse::<usize>() {
            return Ok(ItemRef::Index(index));
        }
        Uuid::parse_str(s)
            .map(|id| ItemRef::Id(ItemId(id)))
            .map_err(|_| AppError::Validation(format!("'{s}' is neither an item id nor an index")))
    }
}

fn parse_section(segment: &str) -> Result<SectionKind, AppError> {
    segment
        .parse::<SectionKind>()
        .map_err(|e| AppError::NotFound(e.to_string()))
}

// ────────────────────────────────────────────────────────────────────────────
// Section dispatch
// ────────────────────────────────────────────────────────────────────────────

/// Runs `$body` with `$record` aliased to the record type of `$kind`.
macro_rules! with_record_type {
    ($kind:expr, $record:ident => $body:expr) => {
        match $kind {
            SectionKind::Work => {
                type $record = WorkExperience;
                $body
            }
            SectionKind::Volunteer => {
                type $record = Volunteer;
                $body
            }
            SectionKind::Education => {
                type $record = Education;
                $body
            }
            SectionKind::Awards => {
                type $record = Award;
                $body
            }
            SectionKind::Certificates => {
                type $record = Certificate;
                $body
            }
            SectionKind::Publications => {
                type $record = Publication;
                $body
            }
            SectionKind::Skills => {
                type $record = Skill;
                $body
            }
            SectionKind::Languages => {
                type $record = Language;
                $body
            }
            SectionKind::Interests => {
                type $record = Interest;
                $body
            }
            SectionKind::References => {
                type $record = Reference;
                $body
            }
            SectionKind::Projects => {
                type $record = Project;
                $body
            }
        }
    };
}

fn parse_body<T: serde::de::DeserializeOwned>(
    section: SectionKind,
    body: Value,
) -> Result<T, AppError> {
    serde_json::from_value(body)
        .map_err(|e| AppError::Validation(format!("Invalid {section} payload: {e}")))
}

/// New items are read through the section's patch type, so unknown keys are
/// rejected on add just as they are on update.
fn add_item<R: SectionRecord>(
    store: &mut ResumeStore,
    body: Value,
) -> Result<AddItemResponse, AppError> {
    let patch: R::Patch = parse_body(R::SECTION, body)?;
    let mut record = R::default();
    patch.apply(&mut record);

    let id = store.add(record)?;
    let index = R::section(store.draft()).len() - 1;
    Ok(AddItemResponse { id, index })
}

/// Applies the patch and returns the item as it now stands.
fn update_item<R: SectionRecord>(
    store: &mut ResumeStore,
    item: ItemRef,
    body: Value,
) -> Result<Value, AppError> {
    let patch: R::Patch = parse_body(R::SECTION, body)?;
    let updated = match item {
        ItemRef::Id(id) => {
            store.update(id, patch)?;
            R::section(store.draft()).get(id)
        }
        ItemRef::Index(index) => {
            store.update_at(index, patch)?;
            R::section(store.draft()).get_at(index)
        }
    };
    let record = updated.ok_or_else(|| {
        AppError::Internal(anyhow::anyhow!("Updated {} item is missing", R::SECTION))
    })?;
    serde_json::to_value(record).map_err(|e| AppError::Internal(e.into()))
}

fn remove_item<R: SectionRecord>(store: &mut ResumeStore, item: ItemRef) -> Result<(), AppError> {
    match item {
        ItemRef::Id(id) => store.remove::<R>(id)?,
        ItemRef::Index(index) => store.remove_at::<R>(index)?,
    };
    Ok(())
}

// ────────────────────────────────────────────────────────────────────────────
// Draft handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/draft
pub async fn handle_get_draft(State(state): State<AppState>) -> Json<Resume> {
    let store = state.store.lock().await;
    Json(store.draft().clone())
}

/// POST /api/v1/draft
///
/// Discards the current draft and starts an empty one.
pub async fn handle_new_draft(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<Resume>), AppError> {
    let mut store = state.store.lock().await;
    let draft = store.new_draft()?.clone();
    Ok((StatusCode::CREATED, Json(draft)))
}

/// PATCH /api/v1/draft
///
/// Replaces whole sections. Accepts a full JSON Resume document for import.
pub async fn handle_update_draft(
    State(state): State<AppState>,
    AppJson(patch): AppJson<ResumePatch>,
) -> Result<Json<Resume>, AppError> {
    let mut store = state.store.lock().await;
    store.update_resume(patch)?;
    Ok(Json(store.draft().clone()))
}

/// GET /api/v1/draft/preview
///
/// The draft as it would be exported.
pub async fn handle_preview_draft(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let store = state.store.lock().await;
    let json = store.preview_draft()?;
    Ok(([(header::CONTENT_TYPE, "application/json")], json))
}

/// PATCH /api/v1/draft/basics
pub async fn handle_update_basics(
    State(state): State<AppState>,
    AppJson(patch): AppJson<BasicsPatch>,
) -> Result<Json<Basics>, AppError> {
    let mut store = state.store.lock().await;
    store.update_basics(patch)?;
    Ok(Json(store.draft().basics.clone()))
}

/// POST /api/v1/draft/save
pub async fn handle_save_draft(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<SaveResumeResponse>), AppError> {
    let mut store = state.store.lock().await;
    let resume_id = store.save_resume()?;
    Ok((
        StatusCode::CREATED,
        Json(SaveResumeResponse {
            resume_id,
            next_draft_id: store.draft().id,
        }),
    ))
}

/// POST /api/v1/draft/:section
pub async fn handle_add_item(
    State(state): State<AppState>,
    AppPath(section): AppPath<String>,
    AppJson(body): AppJson<Value>,
) -> Result<(StatusCode, Json<AddItemResponse>), AppError> {
    let kind = parse_section(&section)?;
    let mut store = state.store.lock().await;
    let added = with_record_type!(kind, R => add_item::<R>(&mut store, body))?;
    Ok((StatusCode::CREATED, Json(added)))
}

/// PATCH /api/v1/draft/:section/:item
///
/// `:item` is an item id or a zero-based index.
pub async fn handle_update_item(
    State(state): State<AppState>,
    AppPath((section, item)): AppPath<(String, String)>,
    AppJson(body): AppJson<Value>,
) -> Result<Json<Value>, AppError> {
    let kind = parse_section(&section)?;
    let item: ItemRef = item.parse()?;
    let mut store = state.store.lock().await;
    let updated = with_record_type!(kind, R => update_item::<R>(&mut store, item, body))?;
    Ok(Json(updated))
}

/// DELETE /api/v1/draft/:section/:item
pub async fn handle_remove_item(
    State(state): State<AppState>,
    AppPath((section, item)): AppPath<(String, String)>,
) -> Result<StatusCode, AppError> {
    let kind = parse_section(&section)?;
    let item: ItemRef = item.parse()?;
    let mut store = state.store.lock().await;
    with_record_type!(kind, R => remove_item::<R>(&mut store, item))?;
    Ok(StatusCode::NO_CONTENT)
}

// ────────────────────────────────────────────────────────────────────────────
// Saved resume handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/resumes
pub async fn handle_list_resumes(State(state): State<AppState>) -> Json<Vec<ResumeSummary>> {
    let store = state.store.lock().await;
    Json(store.resumes().iter().map(ResumeSummary::from).collect())
}

/// GET /api/v1/resumes/:id
pub async fn handle_get_resume(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<Resume>, AppError> {
    let store = state.store.lock().await;
    Ok(Json(store.resume(ResumeId(id))?.clone()))
}

/// DELETE /api/v1/resumes/:id
pub async fn handle_delete_resume(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<StatusCode, AppError> {
    let mut store = state.store.lock().await;
    store.delete_resume(ResumeId(id))?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/resumes/:id/edit
///
/// Loads a saved resume into the draft; saving then overwrites it in place.
pub async fn handle_edit_resume(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<Resume>, AppError> {
    let mut store = state.store.lock().await;
    let draft = store.open_resume(ResumeId(id))?.clone();
    Ok(Json(draft))
}

/// GET /api/v1/resumes/:id/export
///
/// Returns the JSON Resume file as an attachment.
pub async fn handle_export_resume(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let store = state.store.lock().await;
    let artifact = store.export_resume(ResumeId(id))?;
    let disposition = format!(
        "attachment; filename=\"{}\"",
        ascii_file_name(&artifact.file_name)
    );
    Ok((
        [
            (header::CONTENT_TYPE, "application/json; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        artifact.contents,
    ))
}

/// Header values must be visible ASCII.
fn ascii_file_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii() && !c.is_ascii_control() { c } else { '_' })
        .collect()
}
