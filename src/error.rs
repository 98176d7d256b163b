//! Login failure taxonomy and mapping helpers.
//! Every failure a login can produce is a `LoginError`; the HTTP and form
//! surfaces turn it into a user-facing message plus a status code.

use serde::Serialize;
use thiserror::Error;

pub const MSG_REQUIRED: &str = "Usuario y contraseña son requeridos";
pub const MSG_INVALID_CREDENTIALS: &str = "Credenciales incorrectas";
pub const MSG_ACCOUNT_DISABLED: &str = "La cuenta se encuentra desactivada, comunícate con tu entrenador";
pub const MSG_STORE_TIMEOUT: &str = "El servidor está tardando en responder. Intenta nuevamente en unos segundos.";
pub const MSG_STORE_FAULT: &str = "Error interno del servidor. Intenta nuevamente.";

#[derive(Debug, Error)]
pub enum LoginError {
    #[error("username and password required")]
    Validation,
    /// Unknown user and wrong password collapse into this one variant.
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("account disabled")]
    AccountDisabled,
    #[error("credential lookup timed out after {0} ms")]
    BackingStoreTimeout(u64),
    /// Internal detail is kept for logs only.
    #[error("credential lookup failed: {0}")]
    BackingStoreFault(String),
}

impl LoginError {
    pub fn code_str(&self) -> &'static str {
        match self {
            LoginError::Validation => "validation_error",
            LoginError::InvalidCredentials => "invalid_credentials",
            LoginError::AccountDisabled => "account_disabled",
            LoginError::BackingStoreTimeout(_) => "backing_store_timeout",
            LoginError::BackingStoreFault(_) => "backing_store_fault",
        }
    }

    /// Message safe to show the person at the login form.
    pub fn user_message(&self) -> &'static str {
        match self {
            LoginError::Validation => MSG_REQUIRED,
            LoginError::InvalidCredentials => MSG_INVALID_CREDENTIALS,
            LoginError::AccountDisabled => MSG_ACCOUNT_DISABLED,
            LoginError::BackingStoreTimeout(_) => MSG_STORE_TIMEOUT,
            LoginError::BackingStoreFault(_) => MSG_STORE_FAULT,
        }
    }

    /// Map to HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            LoginError::Validation => 400,
            LoginError::InvalidCredentials => 401,
            LoginError::AccountDisabled => 403,
            LoginError::BackingStoreTimeout(_) => 504,
            LoginError::BackingStoreFault(_) => 500,
        }
    }

    pub fn to_body(&self) -> ErrorBody {
        ErrorBody { error: self.user_message(), code: self.code_str() }
    }
}

/// JSON body returned by the login API on failure.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub code: &'static str,
}

pub type LoginResult<T> = Result<T, LoginError>;
