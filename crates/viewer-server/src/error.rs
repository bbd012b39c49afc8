//! Error taxonomy of the HTTP API and its mapping to responses.

use axum::extract::rejection::QueryRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use viewer_data::DataError;
use viewer_graph::GraphError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Read(String),

    #[error("{0}")]
    Config(String),

    #[error("{0}")]
    Store(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Read(_) | ApiError::Config(_) | ApiError::Store(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<DataError> for ApiError {
    fn from(err: DataError) -> Self {
        match err {
            DataError::NotFound { .. } | DataError::CallNotFound { .. } => {
                ApiError::NotFound(err.to_string())
            }
            DataError::Validation(msg) => ApiError::Validation(msg),
            DataError::Read { .. } | DataError::Catalog(_) | DataError::Io(_) => {
                ApiError::Read(err.to_string())
            }
        }
    }
}

impl From<GraphError> for ApiError {
    fn from(err: GraphError) -> Self {
        match err {
            GraphError::Config(msg) => ApiError::Config(msg),
            other => ApiError::Store(format!("Failed to query Neo4j: {other}")),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!(status = status.as_u16(), error = %self, "Request failed");
        }
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_errors_map_to_status() {
        let not_found = ApiError::from(DataError::NotFound {
            dataset: "x_results.csv".into(),
        });
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);

        let call = ApiError::from(DataError::CallNotFound {
            call_id: "c9".into(),
        });
        assert_eq!(call.status(), StatusCode::NOT_FOUND);

        let invalid = ApiError::from(DataError::Validation("page must be >= 1".into()));
        assert_eq!(invalid.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let read = ApiError::from(DataError::Read {
            dataset: "x".into(),
            message: "bad row".into(),
        });
        assert_eq!(read.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(read.to_string().contains("bad row"));
    }

    #[test]
    fn test_graph_errors_map_to_internal_error() {
        let config = ApiError::from(GraphError::Config("missing neo4j_uri".into()));
        assert!(matches!(config, ApiError::Config(_)));
        assert_eq!(config.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let store = ApiError::from(GraphError::Connection("refused".into()));
        assert_eq!(store.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(store.to_string().contains("refused"));
    }
}
