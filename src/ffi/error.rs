// src/ffi/error.rs
use std::cell::RefCell;
use std::ffi::CString;
use std::fmt;
use std::os::raw::c_char;
use serde::{Deserialize, Serialize};
use crate::errors::{DomainError, DbError, ServiceError, ValidationError};

/// Error codes for FFI boundary
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // Success (no error)
    Success = 0,

    // General errors (1-99)
    Unknown = 1,
    InvalidArgument = 2,
    NullPointer = 3,
    InvalidUtf8 = 4,
    InvalidUuid = 5,
    InternalError = 6,

    // Database errors (100-199)
    DatabaseGeneral = 100,
    DatabaseLocked = 103,
    DatabaseMigration = 106,

    // Domain errors (200-299)
    EntityNotFound = 201,
    ValidationFailed = 204,
    InvalidFiscalYear = 209,
    YearNotProvisioned = 210,

    // Service errors (300-399)
    ConfigurationError = 310,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} ({})", self, *self as i32)
    }
}

/// Error type for FFI boundary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FFIError {
    /// Error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,

    /// Optional additional details (JSON string)
    pub details: Option<String>,
}

impl fmt::Display for FFIError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(details) = &self.details {
            write!(f, "{}: {} ({})", self.code, self.message, details)
        } else {
            write!(f, "{}: {}", self.code, self.message)
        }
    }
}

impl std::error::Error for FFIError {}

impl FFIError {
    pub fn new(code: ErrorCode, message: &str) -> Self {
        Self {
            code,
            message: message.to_string(),
            details: None,
        }
    }

    pub fn with_details(code: ErrorCode, message: &str, details: &str) -> Self {
        Self {
            code,
            message: message.to_string(),
            details: Some(details.to_string()),
        }
    }

    pub fn unknown(message: &str) -> Self {
        Self::new(ErrorCode::Unknown, message)
    }

    pub fn invalid_argument(message: &str) -> Self {
        Self::new(ErrorCode::InvalidArgument, message)
    }

    // Helper for internal errors
    pub fn internal(message: String) -> Self {
        Self::new(ErrorCode::InternalError, &message)
    }

    // Helper for converting ServiceError, commonly needed in FFI layer
    pub fn from_service_error(err: ServiceError) -> Self {
        err.into()
    }
}

impl From<DbError> for FFIError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Sqlx(sqlx_err) => {
                Self::new(ErrorCode::DatabaseGeneral, &sqlx_err.to_string())
            },
            DbError::Locked => Self::new(ErrorCode::DatabaseLocked, "Database is locked"),
            DbError::Migration(msg) => Self::new(ErrorCode::DatabaseMigration, &msg),
            DbError::Other(msg) => Self::new(ErrorCode::DatabaseGeneral, &msg),
        }
    }
}

impl From<DomainError> for FFIError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Database(db_err) => db_err.into(),
            DomainError::InvalidFiscalYear(label) => {
                Self::with_details(
                    ErrorCode::InvalidFiscalYear,
                    &format!("Invalid fiscal year: {}", label),
                    &serde_json::json!({ "label": label }).to_string(),
                )
            },
            DomainError::YearNotProvisioned(label) => {
                Self::with_details(
                    ErrorCode::YearNotProvisioned,
                    &format!("Fiscal year {} has not been provisioned", label),
                    &serde_json::json!({ "label": label }).to_string(),
                )
            },
            DomainError::EntityNotFound(entity, id) => {
                Self::with_details(
                    ErrorCode::EntityNotFound,
                    &format!("Entity not found: {} with ID {}", entity, id),
                    &serde_json::json!({ "entity": entity, "id": id }).to_string(),
                )
            },
            DomainError::InvalidUuid(uuid_str) => {
                Self::with_details(
                    ErrorCode::InvalidUuid,
                    &format!("Invalid UUID: {}", uuid_str),
                    &serde_json::json!({ "uuid": uuid_str }).to_string(),
                )
            },
            DomainError::Validation(val_err) => val_err.into(),
            DomainError::Internal(msg) => Self::new(ErrorCode::InternalError, &msg),
        }
    }
}

impl From<ServiceError> for FFIError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Domain(domain_err) => domain_err.into(),
            ServiceError::Configuration(msg) => Self::new(ErrorCode::ConfigurationError, &msg),
        }
    }
}

impl From<ValidationError> for FFIError {
    fn from(err: ValidationError) -> Self {
        let message = err.to_string();
        let details = match &err {
            ValidationError::Required { field } => {
                serde_json::json!({ "field": field, "type": "required" })
            },
            ValidationError::MinLength { field, min } => {
                serde_json::json!({ "field": field, "type": "min_length", "min": min })
            },
            ValidationError::MaxLength { field, max } => {
                serde_json::json!({ "field": field, "type": "max_length", "max": max })
            },
            ValidationError::Range { field, min, max } => {
                serde_json::json!({ "field": field, "type": "range", "min": min, "max": max })
            },
            ValidationError::Format { field, reason } => {
                serde_json::json!({ "field": field, "type": "format", "reason": reason })
            },
            ValidationError::Unique { field } => {
                serde_json::json!({ "field": field, "type": "unique" })
            },
            ValidationError::InvalidValue { field, reason } => {
                serde_json::json!({ "field": field, "type": "invalid_value", "reason": reason })
            },
        };
        Self::with_details(ErrorCode::ValidationFailed, &message, &details.to_string())
    }
}

impl From<std::ffi::NulError> for FFIError {
    fn from(_: std::ffi::NulError) -> Self {
        Self::new(ErrorCode::InvalidUtf8, "String contains null bytes, cannot create CString")
    }
}

thread_local! {
    static LAST_ERROR: RefCell<Option<FFIError>> = const { RefCell::new(None) };
}

/// Remember the most recent error on this thread for `get_last_error`
pub fn set_last_error(error: &FFIError) {
    LAST_ERROR.with(|slot| *slot.borrow_mut() = Some(error.clone()));
}

pub fn clear_last_error() {
    LAST_ERROR.with(|slot| *slot.borrow_mut() = None);
}

/// JSON of the last error on this thread, or null. The caller frees the string.
pub fn get_last_error_message() -> *mut c_char {
    let json = LAST_ERROR.with(|slot| {
        slot.borrow()
            .as_ref()
            .and_then(|e| serde_json::to_string(e).ok())
    });
    match json {
        Some(json) => CString::new(json).map_or(std::ptr::null_mut(), |cs| cs.into_raw()),
        None => std::ptr::null_mut(),
    }
}

// Result type alias for FFI functions
pub type FFIResult<T> = Result<T, FFIError>;

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_domain_errors_map_to_codes() {
        let e: FFIError = DomainError::InvalidFiscalYear("2024-2026".to_string()).into();
        assert_eq!(e.code, ErrorCode::InvalidFiscalYear);
        assert_eq!(e.details.as_deref(), Some(r#"{"label":"2024-2026"}"#));

        let e: FFIError = ServiceError::Domain(DomainError::EntityNotFound("Speaker".to_string(), Uuid::nil())).into();
        assert_eq!(e.code, ErrorCode::EntityNotFound);

        let e: FFIError = DomainError::Database(DbError::Locked).into();
        assert_eq!(e.code, ErrorCode::DatabaseLocked);

        let e: FFIError = DomainError::Database(DbError::Other("disk I/O error".to_string())).into();
        assert_eq!(e.code, ErrorCode::DatabaseGeneral);

        let e: FFIError = ServiceError::Configuration("bad retry".to_string()).into();
        assert_eq!(e.code, ErrorCode::ConfigurationError);

        let e: FFIError = DomainError::Internal("beneficiaries total overflowed".to_string()).into();
        assert_eq!(e.code, ErrorCode::InternalError);
    }

    #[test]
    fn test_db_error_serializes_type_and_message() {
        let json = serde_json::to_value(DbError::Migration("table missing".to_string())).unwrap();
        assert_eq!(json, serde_json::json!({ "type": "Migration", "message": "table missing" }));
        let copy = DbError::Locked.clone();
        assert!(copy.is_transient());
    }

    #[test]
    fn test_validation_details_are_json() {
        let e: FFIError = ValidationError::invalid_value("status", "unknown \"x\"").into();
        assert_eq!(e.code, ErrorCode::ValidationFailed);
        let details: serde_json::Value = serde_json::from_str(e.details.as_deref().unwrap()).unwrap();
        assert_eq!(details["reason"], "unknown \"x\"");
    }

    #[test]
    fn test_last_error_round_trip() {
        clear_last_error();
        assert!(get_last_error_message().is_null());

        set_last_error(&FFIError::invalid_argument("bad payload"));
        let ptr = get_last_error_message();
        assert!(!ptr.is_null());
        let json = unsafe { CString::from_raw(ptr) }.into_string().unwrap();
        assert!(json.contains("bad payload"));
    }
}
