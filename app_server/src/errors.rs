use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use thiserror::Error;
use trust_engine::{CredentialStoreError, SignatureVerificationError};

use crate::dispatcher::DispatchError;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("{0}")]
    InvalidSignature(#[from] SignatureVerificationError),
    #[error("Payload deserialization error. {0}")]
    CouldNotDeserializePayload(String),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("{0}")]
    DispatchFailed(#[from] DispatchError),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
}

impl From<CredentialStoreError> for ServerError {
    fn from(err: CredentialStoreError) -> Self {
        match err {
            CredentialStoreError::NotFound => Self::NoRecordFound(err.to_string()),
            other => Self::BackendError(other.to_string()),
        }
    }
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidSignature(_) => StatusCode::BAD_REQUEST,
            Self::CouldNotDeserializePayload(_) => StatusCode::BAD_REQUEST,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::DispatchFailed(e) => match e {
                DispatchError::MissingAction => StatusCode::BAD_REQUEST,
                DispatchError::MissingEvent => StatusCode::BAD_REQUEST,
                DispatchError::ActionHandlerNotFound { .. } => StatusCode::NOT_FOUND,
                DispatchError::WebhookHandlerNotFound(_) => StatusCode::NOT_FOUND,
                DispatchError::Credentials(CredentialStoreError::NotFound) => StatusCode::NOT_FOUND,
                DispatchError::Credentials(_) => StatusCode::INTERNAL_SERVER_ERROR,
                DispatchError::CredentialsNotConfirmed(_) => StatusCode::CONFLICT,
                DispatchError::ApiClient(_) => StatusCode::INTERNAL_SERVER_ERROR,
                DispatchError::Handler(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}
