use salvo::http::StatusCode;
use salvo::prelude::Json;
use salvo::{Depot, Request, Response, Writer, async_trait};
use serde::Serialize;
use thiserror::Error;

use sharecal_db::error::DbError;
use sharecal_service::error::{ErrorKind, ServiceError};

/// Application-level errors (HTTP layer)
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    ServiceError(#[from] ServiceError),

    #[error(transparent)]
    DatabaseError(#[from] DbError),

    #[error(transparent)]
    CoreError(#[from] sharecal_core::error::CoreError),

    /// Malformed path, query or body.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

pub type AppResult<T> = std::result::Result<T, AppError>;

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

/// HTTP status for an error category.
#[must_use]
pub const fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::Authentication => StatusCode::UNAUTHORIZED,
        ErrorKind::Authorization => StatusCode::FORBIDDEN,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Conflict | ErrorKind::State => StatusCode::CONFLICT,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl AppError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ServiceError(e) => e.kind(),
            Self::DatabaseError(e) if e.unique_violation().is_some() => ErrorKind::Conflict,
            Self::CoreError(sharecal_core::error::CoreError::ValidationError(_))
            | Self::BadRequest(_) => ErrorKind::Validation,
            Self::DatabaseError(_) | Self::CoreError(_) => ErrorKind::Internal,
        }
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::DatabaseError(DbError::PoolError(_))
            | Self::ServiceError(ServiceError::DatabaseError(DbError::PoolError(_))) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            _ => status_for(self.kind()),
        }
    }

    fn public_message(&self) -> String {
        match (self, self.kind()) {
            (Self::ServiceError(e), _) => e.public_message(),
            (_, ErrorKind::Internal) => "Internal server error".to_string(),
            (Self::DatabaseError(_), ErrorKind::Conflict) => "Resource already exists".to_string(),
            _ => self.to_string(),
        }
    }

    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }
}

#[async_trait]
impl Writer for AppError {
    async fn write(self, req: &mut Request, _depot: &mut Depot, res: &mut Response) {
        let kind = self.kind();
        if kind == ErrorKind::Internal {
            tracing::error!(error = ?self, path = %req.uri().path(), "Request failed");
        } else {
            tracing::debug!(error = %self, path = %req.uri().path(), "Request rejected");
        }

        res.status_code(self.status());
        res.render(Json(ErrorBody {
            error: kind.as_str(),
            message: self.public_message(),
        }));
    }
}
