use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlatformApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Invalid request: {0}")]
    RequestError(String),
    #[error("Invalid response: {0}")]
    ResponseError(String),
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("Token exchange failed: {0}")]
    TokenError(String),
    #[error("Query failed. Error {status}. {message}")]
    QueryError { status: u16, message: String },
}
