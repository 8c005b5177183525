// Demo record CRUD behind the pipeline
use std::collections::HashMap;
use std::sync::Mutex;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::Uri,
    Extension,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::AuthContext;
use crate::error::ApiError;
use crate::middleware::response::{ApiResponse, ApiResult};
use crate::pagination::{extract_pagination_params, Page};
use crate::state::AppState;
use crate::validation::{validate_body, validate_query, FieldErrors, Validate};

const RECORD_KINDS: [&str; 3] = ["note", "task", "event"];

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub id: String,
    pub title: String,
    pub kind: String,
    pub created_at: DateTime<Utc>,
}

/// In-memory record rows, partitioned by org. Insertion order is the list
/// order, which is what the cursor walks.
#[derive(Debug, Default)]
pub struct RecordStore {
    rows: Mutex<HashMap<String, Vec<Record>>>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&self, org_id: &str, record: Record) {
        let mut rows = self.rows.lock().unwrap_or_else(|e| e.into_inner());
        rows.entry(org_id.to_string()).or_default().push(record);
    }

    fn list(&self, org_id: &str) -> Vec<Record> {
        let rows = self.rows.lock().unwrap_or_else(|e| e.into_inner());
        rows.get(org_id).cloned().unwrap_or_default()
    }

    fn get(&self, org_id: &str, id: &str) -> Option<Record> {
        let rows = self.rows.lock().unwrap_or_else(|e| e.into_inner());
        rows.get(org_id)?.iter().find(|r| r.id == id).cloned()
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateRecordRequest {
    pub title: String,
    #[serde(default)]
    pub kind: Option<String>,
}

impl Validate for CreateRecordRequest {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        if self.title.is_empty() {
            errors.push("title", "title must not be empty");
        }
        if self.title.len() > 200 {
            errors.push("title", "title must be at most 200 characters");
        }
        if let Some(kind) = &self.kind {
            if !RECORD_KINDS.contains(&kind.as_str()) {
                errors.push("kind", format!("kind must be one of: {}", RECORD_KINDS.join(", ")));
            }
        }
        errors.into_result()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListRecordsQuery {
    pub kind: Option<String>,
}

impl Validate for ListRecordsQuery {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        if let Some(kind) = &self.kind {
            if !RECORD_KINDS.contains(&kind.as_str()) {
                errors.push("kind", format!("kind must be one of: {}", RECORD_KINDS.join(", ")));
            }
        }
        errors.into_result()
    }
}

/// GET /records - cursor-paged list scoped to the caller's org
pub async fn records_list(
    State(state): State<AppState>,
    Extension(context): Extension<AuthContext>,
    uri: Uri,
) -> ApiResult<Page<Record>> {
    let filter: ListRecordsQuery = validate_query(&uri)?;
    let paging = extract_pagination_params(uri.query());

    let mut rows = state.records.list(&context.org_id);
    if let Some(kind) = &filter.kind {
        rows.retain(|r| r.kind == *kind);
    }
    let total = rows.len() as u64;

    // The cursor is the id of the last record on the previous page.
    let start = match &paging.cursor {
        Some(cursor) => match rows.iter().position(|r| r.id == *cursor) {
            Some(idx) => idx + 1,
            None => {
                let mut errors = FieldErrors::new();
                errors.push("cursor", "unknown cursor");
                return Err(crate::validation::format_validation_error(errors));
            }
        },
        None => 0,
    };

    let end = (start + paging.limit as usize).min(rows.len());
    let page_rows: Vec<Record> = rows[start..end].to_vec();
    let next_cursor =
        if end < rows.len() { page_rows.last().map(|r| r.id.clone()) } else { None };

    Ok(ApiResponse::success(Page::new(page_rows, next_cursor, Some(total))))
}

/// POST /records - create a record for the caller's org
pub async fn records_create(
    State(state): State<AppState>,
    Extension(context): Extension<AuthContext>,
    body: Bytes,
) -> ApiResult<Record> {
    let request: CreateRecordRequest = validate_body(&body)?;

    let record = Record {
        id: format!("rec_{}", Uuid::new_v4().simple()),
        title: request.title,
        kind: request.kind.unwrap_or_else(|| "note".to_string()),
        created_at: Utc::now(),
    };
    state.records.insert(&context.org_id, record.clone());

    tracing::debug!(org_id = %context.org_id, record_id = %record.id, "record created");
    Ok(ApiResponse::created(record))
}

/// GET /records/:id - show a single record
pub async fn records_show(
    State(state): State<AppState>,
    Extension(context): Extension<AuthContext>,
    Path(id): Path<String>,
) -> ApiResult<Record> {
    state
        .records
        .get(&context.org_id, &id)
        .map(ApiResponse::success)
        .ok_or_else(|| ApiError::not_found("record"))
}
