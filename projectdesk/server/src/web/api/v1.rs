use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, de};
use utoipa::ToSchema;

pub(crate) const UNEXPECTED_ERROR_MESSAGE: &str =
    "An unexpected error occurred while processing your request. Please try again later.";

/// JSON body returned by every failing API request.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Human-readable description of the failure
    pub error: String,
    /// Stable machine-readable error code
    pub code: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
        }
    }
}

/// JSON body returned by delete endpoints.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

/// Error type shared by all JSON API handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("Authentication required to access this resource")]
    Unauthorized,
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    /// Storage or other unexpected failure. The cause is logged, never returned.
    #[error("{}", UNEXPECTED_ERROR_MESSAGE)]
    Internal,
}

impl ApiError {
    /// Logs `err` and returns the opaque internal error.
    pub fn internal(err: impl std::fmt::Display) -> Self {
        tracing::error!("Request failed: {}", err);
        ApiError::Internal
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "VALIDATION_ERROR",
            ApiError::Unauthorized => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::Internal => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse::new(self.to_string(), self.code());
        (status, Json(body)).into_response()
    }
}

impl From<sea_orm::DbErr> for ApiError {
    fn from(err: sea_orm::DbErr) -> Self {
        ApiError::internal(err)
    }
}

/// Unreadable or mistyped JSON bodies get the same `{error, code}` shape as
/// every other validation failure.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!("Rejected JSON body: {}", rejection);
        ApiError::Validation(rejection.body_text())
    }
}

/// Deserializes an optional id sent either as a number or as a string.
///
/// Form-backed clients send `""` for an unselected id, so null and blank
/// strings both mean "absent".
pub fn optional_id<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum IdOrText {
        Id(i32),
        Text(String),
    }

    match Option::<IdOrText>::deserialize(deserializer)? {
        None => Ok(None),
        Some(IdOrText::Id(id)) => Ok(Some(id)),
        Some(IdOrText::Text(text)) => {
            let text = text.trim();
            if text.is_empty() {
                return Ok(None);
            }
            text.parse()
                .map(Some)
                .map_err(|_| de::Error::custom(format!("invalid id: {:?}", text)))
        }
    }
}

/// [`optional_id`] for update bodies: a present but blank id clears the reference.
pub fn nullable_id<'de, D>(deserializer: D) -> Result<Option<Option<i32>>, D::Error>
where
    D: Deserializer<'de>,
{
    optional_id(deserializer).map(Some)
}

/// Deserializes an optional calendar date from `YYYY-MM-DD` or from a full
/// RFC 3339 timestamp, keeping only its date. Blank strings count as absent.
pub fn optional_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(text) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(text).map(|at| at.date_naive()))
        .map(Some)
        .map_err(|_| de::Error::custom(format!("invalid date: {:?}", text)))
}

/// Tells an explicit `null` (`Some(None)`) apart from an absent field (`None`).
/// Use together with `#[serde(default)]`.
pub fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn can_render_validation_error_with_bad_request() {
        let response = ApiError::Validation("dependsOn is required".to_string()).into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({"error": "dependsOn is required", "code": "VALIDATION_ERROR"})
        );
    }

    #[tokio::test]
    async fn can_hide_internal_error_details() {
        let response = ApiError::from(sea_orm::DbErr::Custom("connection reset".to_string()))
            .into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["error"], UNEXPECTED_ERROR_MESSAGE);
        assert_eq!(body["code"], "INTERNAL_ERROR");
    }

    #[derive(Debug, Deserialize)]
    struct Target {
        #[serde(default, deserialize_with = "optional_id")]
        id: Option<i32>,
        #[serde(default, deserialize_with = "nullable")]
        note: Option<Option<String>>,
    }

    #[test]
    fn optional_id_accepts_numbers_and_numeric_strings() {
        let parse = |raw: &str| serde_json::from_str::<Target>(raw).unwrap().id;

        assert_eq!(parse(r#"{"id": 7}"#), Some(7));
        assert_eq!(parse(r#"{"id": "7"}"#), Some(7));
        assert_eq!(parse(r#"{"id": ""}"#), None);
        assert_eq!(parse(r#"{"id": "  "}"#), None);
        assert_eq!(parse(r#"{"id": null}"#), None);
        assert_eq!(parse("{}"), None);
    }

    #[test]
    fn optional_id_rejects_garbage() {
        assert!(serde_json::from_str::<Target>(r#"{"id": "seven"}"#).is_err());
        assert!(serde_json::from_str::<Target>(r#"{"id": true}"#).is_err());
    }

    #[test]
    fn optional_date_accepts_dates_and_timestamps() {
        #[derive(Debug, Deserialize)]
        struct Entry {
            #[serde(default, deserialize_with = "optional_date")]
            date: Option<NaiveDate>,
        }
        let parse = |raw: &str| serde_json::from_str::<Entry>(raw).unwrap().date;
        let expected = NaiveDate::from_ymd_opt(2025, 10, 1);

        assert_eq!(parse(r#"{"date": "2025-10-01"}"#), expected);
        assert_eq!(parse(r#"{"date": "2025-10-01T00:00:00.000Z"}"#), expected);
        assert_eq!(parse(r#"{"date": ""}"#), None);
        assert_eq!(parse("{}"), None);
        assert!(serde_json::from_str::<Entry>(r#"{"date": "yesterday"}"#).is_err());
    }

    #[test]
    fn nullable_tells_null_from_absent() {
        let parse = |raw: &str| serde_json::from_str::<Target>(raw).unwrap().note;

        assert_eq!(parse("{}"), None);
        assert_eq!(parse(r#"{"note": null}"#), Some(None));
        assert_eq!(parse(r#"{"note": "hi"}"#), Some(Some("hi".to_string())));
    }

    #[test]
    fn maps_conflicts_to_409() {
        assert_eq!(
            ApiError::Conflict("cycle".to_string()).status_code(),
            StatusCode::CONFLICT
        );
    }
}
