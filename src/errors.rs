use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;

/// Route the client is sent back to when a session is missing or not allowed.
pub const LOGIN_ROUTE: &str = "/login";

/// Application-specific error types.
///
/// Every variant is terminal for the current user action: nothing is retried
/// or queued.
#[derive(Debug, Clone)]
pub enum AppError {
    /// Empty required field, no plan chosen, or a value outside the catalog.
    /// The message is shown to the user as is.
    Validation(String),
    /// Insert into the hosted backend failed.
    RemoteWrite(String),
    /// Select from the hosted backend failed.
    RemoteRead(String),
    /// Credentials rejected or the auth service failed.
    Auth(String),
    /// No active session.
    Unauthenticated(String),
    /// Authenticated, but without the admin role.
    Forbidden(String),
    /// Internal server error.
    Internal(String),
    /// Error with context chain for better debugging.
    WithContext {
        /// The underlying source of the error.
        source: Box<AppError>,
        /// Additional context message.
        context: String,
    },
}

impl AppError {
    /// Returns the innermost error, skipping context wrappers.
    pub fn root(&self) -> &AppError {
        match self {
            AppError::WithContext { source, .. } => source.root(),
            other => other,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(msg) => write!(f, "Validation error: {}", msg),
            AppError::RemoteWrite(msg) => write!(f, "Remote write error: {}", msg),
            AppError::RemoteRead(msg) => write!(f, "Remote read error: {}", msg),
            AppError::Auth(msg) => write!(f, "Auth error: {}", msg),
            AppError::Unauthenticated(msg) => write!(f, "Unauthenticated: {}", msg),
            AppError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
            AppError::WithContext { source, context } => {
                write!(f, "{}: {}", context, source)
            }
        }
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    /// Maps each variant to a status code and a JSON body.
    ///
    /// Remote and auth failures are logged with their detail but only a
    /// generic message reaches the user. Session failures carry a
    /// `redirect` hint pointing at the login view.
    fn into_response(self) -> Response {
        let (status, error_message, redirect) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone(), None),
            AppError::RemoteWrite(msg) => {
                tracing::error!("Remote write error: {}", msg);
                (
                    StatusCode::BAD_GATEWAY,
                    "Erro ao enviar formulário. Tente novamente.".to_string(),
                    None,
                )
            }
            AppError::RemoteRead(msg) => {
                tracing::error!("Remote read error: {}", msg);
                (
                    StatusCode::BAD_GATEWAY,
                    "Erro ao carregar dados".to_string(),
                    None,
                )
            }
            AppError::Auth(msg) => {
                tracing::warn!("Auth failure: {}", msg);
                (
                    StatusCode::UNAUTHORIZED,
                    "Erro ao fazer login. Verifique suas credenciais.".to_string(),
                    None,
                )
            }
            AppError::Unauthenticated(msg) => {
                tracing::debug!("No active session: {}", msg);
                (
                    StatusCode::UNAUTHORIZED,
                    "Sessão expirada. Faça login novamente.".to_string(),
                    Some(LOGIN_ROUTE),
                )
            }
            AppError::Forbidden(msg) => {
                tracing::warn!("Access denied: {}", msg);
                (
                    StatusCode::FORBIDDEN,
                    "Acesso negado. Você não tem permissão de administrador.".to_string(),
                    Some(LOGIN_ROUTE),
                )
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    None,
                )
            }
            AppError::WithContext { source, context } => {
                tracing::error!("Error with context: {} -> {}", context, source);
                return (**source).clone().into_response();
            }
        };

        let body = match redirect {
            Some(route) => json!({ "error": error_message, "redirect": route }),
            None => json!({ "error": error_message }),
        };

        (status, Json(body)).into_response()
    }
}

/// Extension trait for adding context to errors.
/// Similar to `anyhow::Context` but for our `AppError` type.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, context: impl Into<String>) -> Result<T, AppError>;
}

impl<T> ResultExt<T> for Result<T, AppError> {
    fn context(self, context: impl Into<String>) -> Result<T, AppError> {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(e),
            context: context.into(),
        })
    }
}
