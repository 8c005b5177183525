// Cursor-based pagination parameters and page shaping
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::validation::FieldErrors;

pub const DEFAULT_PAGE_LIMIT: u32 = 50;
pub const MAX_PAGE_LIMIT: u32 = 100;

/// Normalized paging parameters, limit always within 1..=100
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationParams {
    pub limit: u32,
    pub cursor: Option<String>,
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self { limit: DEFAULT_PAGE_LIMIT, cursor: None }
    }
}

/// Paging parameters as they arrived on the wire, before any policy applies
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct RawPaginationParams {
    pub limit: Option<i64>,
    pub cursor: Option<String>,
}

/// Lenient entry point for list endpoints: never rejects. Absent or
/// unparsable limits fall back to the default, values above the maximum are
/// silently clamped.
pub fn extract_pagination_params(query: Option<&str>) -> PaginationParams {
    let mut params = PaginationParams::default();

    let Some(query) = query else { return params };
    for (name, value) in url::form_urlencoded::parse(query.as_bytes()) {
        match name.as_ref() {
            "limit" => {
                if let Ok(limit) = value.parse::<u32>() {
                    if limit >= 1 {
                        params.limit = limit.min(MAX_PAGE_LIMIT);
                    }
                }
            }
            "cursor" => {
                if !value.is_empty() {
                    params.cursor = Some(value.into_owned());
                }
            }
            _ => {}
        }
    }

    params
}

/// Strict entry point for endpoints that reject rather than correct
/// out-of-range input.
pub fn validate_pagination_params(
    raw: &RawPaginationParams,
) -> Result<PaginationParams, ApiError> {
    if let Some(limit) = raw.limit {
        if limit < 1 || limit > MAX_PAGE_LIMIT as i64 {
            let mut errors = FieldErrors::new();
            errors.push(
                "limit",
                format!("limit must be between 1 and {}", MAX_PAGE_LIMIT),
            );
            return Err(crate::validation::format_validation_error(errors));
        }
    }

    Ok(PaginationParams {
        limit: raw.limit.map(|l| l as u32).unwrap_or(DEFAULT_PAGE_LIMIT),
        cursor: raw.cursor.clone(),
    })
}

/// One page of a list response, serialized as `{data, nextCursor, total}`
/// with the optional fields omitted when absent.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub data: Vec<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
}

impl<T> Page<T> {
    pub fn new(data: Vec<T>, next_cursor: Option<String>, total: Option<u64>) -> Self {
        Self { data, next_cursor, total }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use serde_json::json;

    #[test]
    fn defaults_when_query_absent() {
        let params = extract_pagination_params(None);
        assert_eq!(params.limit, 50);
        assert_eq!(params.cursor, None);
    }

    #[test]
    fn oversized_limit_silently_clamped() {
        let params = extract_pagination_params(Some("limit=150"));
        assert_eq!(params.limit, 100);
    }

    #[test]
    fn unparsable_or_zero_limit_falls_back() {
        assert_eq!(extract_pagination_params(Some("limit=abc")).limit, 50);
        assert_eq!(extract_pagination_params(Some("limit=0")).limit, 50);
        assert_eq!(extract_pagination_params(Some("limit=-3")).limit, 50);
    }

    #[test]
    fn cursor_carried_through() {
        let params = extract_pagination_params(Some("limit=10&cursor=rec-042"));
        assert_eq!(params.limit, 10);
        assert_eq!(params.cursor.as_deref(), Some("rec-042"));
    }

    #[test]
    fn strict_validation_rejects_out_of_range_limit() {
        let raw = RawPaginationParams { limit: Some(150), cursor: None };
        let err = validate_pagination_params(&raw).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidRequest);
        let detail = err.detail.unwrap();
        assert!(detail["fields"]["limit"][0]
            .as_str()
            .unwrap()
            .contains("between 1 and 100"));

        let raw = RawPaginationParams { limit: Some(0), cursor: None };
        assert!(validate_pagination_params(&raw).is_err());
    }

    #[test]
    fn strict_validation_accepts_in_range_and_defaults() {
        let raw = RawPaginationParams { limit: Some(25), cursor: Some("c".into()) };
        let params = validate_pagination_params(&raw).unwrap();
        assert_eq!(params.limit, 25);
        assert_eq!(params.cursor.as_deref(), Some("c"));

        let params = validate_pagination_params(&RawPaginationParams::default()).unwrap();
        assert_eq!(params.limit, 50);
    }

    #[test]
    fn page_serializes_camel_case_and_round_trips() {
        let page = Page::new(vec![json!({"id": 1})], Some("cursor-123".into()), Some(100));
        let value = serde_json::to_value(&page).unwrap();
        assert_eq!(value["data"][0]["id"], 1);
        assert_eq!(value["nextCursor"], "cursor-123");
        assert_eq!(value["total"], 100);
    }

    #[test]
    fn page_omits_absent_fields() {
        let page: Page<serde_json::Value> = Page::new(vec![], None, None);
        let value = serde_json::to_value(&page).unwrap();
        assert!(value.get("nextCursor").is_none());
        assert!(value.get("total").is_none());
    }
}
