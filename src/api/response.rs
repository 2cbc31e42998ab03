//! Uniform JSON responses
//!
//! Every endpoint answers with an object carrying a boolean `result`. A
//! success flattens its payload next to it; a failure carries `error`.

use crate::crawler::IndexingError;
use crate::search::SearchError;
use crate::SeekError;
use axum::http::StatusCode;
use axum::Json;
use serde::{Serialize, Serializer};

/// Result of an API call
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse<T> {
    Ok(T),
    Err(String),
}

/// Payload of calls that only report success
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Acknowledged {}

#[derive(Serialize)]
struct Success<'a, T> {
    result: bool,
    #[serde(flatten)]
    payload: &'a T,
}

#[derive(Serialize)]
struct Failure<'a> {
    result: bool,
    error: &'a str,
}

impl<T: Serialize> Serialize for ApiResponse<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ApiResponse::Ok(payload) => Success {
                result: true,
                payload,
            }
            .serialize(serializer),
            ApiResponse::Err(message) => Failure {
                result: false,
                error: message,
            }
            .serialize(serializer),
        }
    }
}

/// HTTP status reported for an error
pub trait ErrorStatus: std::fmt::Display {
    fn status(&self) -> StatusCode;
}

impl ErrorStatus for IndexingError {
    fn status(&self) -> StatusCode {
        match self {
            IndexingError::AlreadyRunning | IndexingError::NotRunning => StatusCode::CONFLICT,
            IndexingError::OutsideConfiguredSites | IndexingError::InvalidUrl(_) => {
                StatusCode::BAD_REQUEST
            }
            IndexingError::Fetch(_) => StatusCode::BAD_GATEWAY,
            IndexingError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ErrorStatus for SearchError {
    fn status(&self) -> StatusCode {
        match self {
            SearchError::EmptyQuery => StatusCode::BAD_REQUEST,
            SearchError::SiteNotFound(_) | SearchError::NothingFound => StatusCode::NOT_FOUND,
            SearchError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ErrorStatus for SeekError {
    fn status(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

/// Converts an operation result into a status code and JSON body
pub fn reply<T, E>(result: Result<T, E>) -> (StatusCode, Json<ApiResponse<T>>)
where
    T: Serialize,
    E: ErrorStatus,
{
    match result {
        Ok(payload) => (StatusCode::OK, Json(ApiResponse::Ok(payload))),
        Err(e) => (e.status(), Json(ApiResponse::Err(e.to_string()))),
    }
}
