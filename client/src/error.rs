//! Error handling for the Uniform Allocation client
//!
//! Every failure carries a bilingual message so the UI can show it in an
//! alert in the active locale.

use serde::Serialize;
use shared::{CsvCheckError, JobId, Locale};
use thiserror::Error;

/// Client error types
#[derive(Error, Debug)]
pub enum ClientError {
    // Gateway errors
    #[error("Network error: {0}")]
    Network(String),

    #[error("Server error {status}: {body}")]
    Server { status: u16, body: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    // Job lifecycle errors
    #[error("An optimization is already in progress")]
    OptimizationInFlight,

    #[error("Job {job_id} was superseded by a newer optimization")]
    Superseded { job_id: JobId },

    #[error("Optimization was cancelled")]
    Cancelled,

    // Local validation errors
    #[error("Invalid CSV: {0}")]
    InvalidCsv(#[from] CsvCheckError),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ClientError::MalformedResponse(e.to_string())
        } else {
            ClientError::Network(e.to_string())
        }
    }
}

impl From<config::ConfigError> for ClientError {
    fn from(e: config::ConfigError) -> Self {
        ClientError::Configuration(e.to_string())
    }
}

/// User-facing description of an error
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ErrorDetail {
    pub code: String,
    pub message_en: String,
    pub message_es: String,
}

impl ErrorDetail {
    pub fn message(&self, locale: Locale) -> &str {
        match locale {
            Locale::En => &self.message_en,
            Locale::Es => &self.message_es,
        }
    }
}

impl ClientError {
    /// Whether the error came from talking to the service
    pub fn is_gateway(&self) -> bool {
        matches!(
            self,
            ClientError::Network(_) | ClientError::Server { .. } | ClientError::MalformedResponse(_)
        )
    }

    pub fn detail(&self) -> ErrorDetail {
        let (code, message_en, message_es) = match self {
            ClientError::Network(_) => (
                "NETWORK_ERROR",
                "Could not reach the server. Check your connection.".to_string(),
                "No se pudo conectar con el servidor. Revisa tu conexión.".to_string(),
            ),
            ClientError::Server { status, body } => (
                "SERVER_ERROR",
                format!("API error {}: {}", status, body),
                format!("Error de la API {}: {}", status, body),
            ),
            ClientError::MalformedResponse(msg) => (
                "MALFORMED_RESPONSE",
                format!("Unexpected response from the server: {}", msg),
                format!("Respuesta inesperada del servidor: {}", msg),
            ),
            ClientError::OptimizationInFlight => (
                "OPTIMIZATION_IN_FLIGHT",
                "An optimization is already running".to_string(),
                "Ya hay una optimización en curso".to_string(),
            ),
            ClientError::Superseded { job_id } => (
                "SUPERSEDED",
                format!("Optimization {} was replaced by a newer run", job_id),
                format!("La optimización {} fue reemplazada por una más reciente", job_id),
            ),
            ClientError::Cancelled => (
                "CANCELLED",
                "The optimization was cancelled".to_string(),
                "La optimización fue cancelada".to_string(),
            ),
            ClientError::InvalidCsv(e) => (
                "INVALID_CSV",
                e.to_string(),
                match e {
                    CsvCheckError::Empty => {
                        "El CSV está vacío o no tiene fila de encabezado".to_string()
                    }
                    CsvCheckError::MissingColumns(columns) => {
                        format!("Faltan columnas requeridas: {}", columns.join(", "))
                    }
                    CsvCheckError::Unreadable(msg) => {
                        format!("No se pudo leer el encabezado del CSV: {}", msg)
                    }
                },
            ),
            ClientError::Configuration(msg) => (
                "CONFIGURATION_ERROR",
                format!("Configuration error: {}", msg),
                format!("Error de configuración: {}", msg),
            ),
        };

        ErrorDetail {
            code: code.to_string(),
            message_en,
            message_es,
        }
    }

    /// Alert text in the given locale
    pub fn user_message(&self, locale: Locale) -> String {
        self.detail().message(locale).to_string()
    }
}

/// Result type alias for client operations
pub type ClientResult<T> = Result<T, ClientError>;
