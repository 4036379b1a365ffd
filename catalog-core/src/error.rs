//! Error types for catalog operations

use crate::EntityType;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Storage layer errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    /// The document store did not acknowledge an insert.
    #[error("{entity_type:?} was not added: {reason}")]
    NotAdded { entity_type: EntityType, reason: String },

    /// A replace/update returned no document.
    #[error("{entity_type:?} with id {id} was not updated")]
    NotUpdated { entity_type: EntityType, id: String },

    /// A document could not be encoded or decoded.
    #[error("Document codec error for {entity_type:?}: {reason}")]
    Codec { entity_type: EntityType, reason: String },

    /// A lock guarding an in-process collection was poisoned.
    #[error("Storage lock poisoned")]
    LockPoisoned,

    /// Any other failure reported by the backing store.
    #[error("Storage backend error: {reason}")]
    Backend { reason: String },
}

/// Malformed or missing scalar input. Raised by the validation layer before
/// a request reaches the integrity engine.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A required string field was absent.
    #[error("{field} must be provided")]
    StringNotProvided { field: String },

    /// A string field held only whitespace.
    #[error("{field} must not be empty or only spaces")]
    EmptyString { field: String },

    /// A date was not a real `MM/DD/YYYY` calendar date.
    #[error("Invalid date for {field}: {value:?}, expected MM/DD/YYYY")]
    InvalidDateFormat { field: String, value: String },

    /// An email address failed the format check.
    #[error("Invalid email format: {value:?}")]
    InvalidEmailFormat { value: String },

    /// A phone number failed the format check.
    #[error("Invalid phone format: {value:?}")]
    InvalidPhoneFormat { value: String },

    /// A tier other than FREE or PREMIUM.
    #[error("Invalid subscription tier: {value:?}, expected FREE or PREMIUM")]
    InvalidSubscriptionTier { value: String },

    /// A non-positive track count.
    #[error("track_count must be a positive integer, got {value}")]
    InvalidTrackCount { value: i64 },

    /// A birth date implying an age outside the allowed range.
    #[error("Listener age must be between {min} and {max}, got {age}")]
    AgeOutOfRange { age: i32, min: i32, max: i32 },

    /// A patch with every field unset.
    #[error("At least one field must be provided for update")]
    NoFieldsToUpdate,
}

impl ValidationError {
    /// Stable machine-readable code for this failure.
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::StringNotProvided { .. } => "STRING_NOT_PROVIDED",
            ValidationError::EmptyString { .. } => "EMPTY_STRING_PROVIDED",
            ValidationError::InvalidDateFormat { .. } => "INVALID_DATE_FORMAT",
            ValidationError::InvalidEmailFormat { .. } => "INVALID_EMAIL_FORMAT",
            ValidationError::InvalidPhoneFormat { .. } => "INVALID_PHONE_FORMAT",
            ValidationError::InvalidSubscriptionTier { .. } => "INVALID_SUBSCRIPTION_TIER",
            ValidationError::InvalidTrackCount { .. } => "INVALID_TRACK_COUNT",
            ValidationError::AgeOutOfRange { .. } => "AGE_OUT_OF_RANGE",
            ValidationError::NoFieldsToUpdate => "NO_FIELDS_TO_UPDATE",
        }
    }
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A required setting was not supplied.
    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    /// A setting could not be parsed or is out of range.
    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Master error type for all catalog errors.
#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    /// Input rejected before reaching storage.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A referenced entity does not exist.
    #[error("{entity_type} not found: {id}")]
    NotFound { entity_type: EntityType, id: String },

    /// A date range whose start is not before its end.
    #[error("Invalid range for {field}: {start} must be before {end}")]
    InvalidRange {
        field: String,
        start: String,
        end: String,
    },

    /// The document store failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration could not be loaded.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

impl CatalogError {
    pub fn not_found(entity_type: EntityType, id: impl fmt::Display) -> Self {
        CatalogError::NotFound {
            entity_type,
            id: id.to_string(),
        }
    }

    pub fn invalid_range(
        field: impl Into<String>,
        start: impl fmt::Display,
        end: impl fmt::Display,
    ) -> Self {
        CatalogError::InvalidRange {
            field: field.into(),
            start: start.to_string(),
            end: end.to_string(),
        }
    }

    /// Stable machine-readable code surfaced to callers.
    pub fn code(&self) -> ErrorCode {
        match self {
            CatalogError::Validation(_) => ErrorCode::ValidationFailed,
            CatalogError::NotFound { entity_type, .. } => match entity_type {
                EntityType::Artist => ErrorCode::ArtistNotFound,
                EntityType::Album => ErrorCode::AlbumNotFound,
                EntityType::Listener => ErrorCode::ListenerNotFound,
            },
            CatalogError::InvalidRange { .. } => ErrorCode::InvalidRange,
            CatalogError::Storage(StorageError::NotAdded { .. }) => ErrorCode::NotAdded,
            CatalogError::Storage(StorageError::NotUpdated { .. }) => ErrorCode::NotUpdated,
            CatalogError::Storage(_) => ErrorCode::InternalError,
            CatalogError::Config(_) => ErrorCode::ConfigInvalid,
        }
    }
}

/// Error codes surfaced with every failed operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ValidationFailed,
    ArtistNotFound,
    AlbumNotFound,
    ListenerNotFound,
    InvalidRange,
    NotAdded,
    NotUpdated,
    InternalError,
    ConfigInvalid,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ValidationFailed => "VALIDATION_FAILED",
            ErrorCode::ArtistNotFound => "ARTIST_NOT_FOUND",
            ErrorCode::AlbumNotFound => "ALBUM_NOT_FOUND",
            ErrorCode::ListenerNotFound => "LISTENER_NOT_FOUND",
            ErrorCode::InvalidRange => "INVALID_RANGE",
            ErrorCode::NotAdded => "NOT_ADDED",
            ErrorCode::NotUpdated => "NOT_UPDATED",
            ErrorCode::InternalError => "INTERNAL_ERROR",
            ErrorCode::ConfigInvalid => "CONFIG_INVALID",
        }
    }

    /// Whether the failure is the caller's to fix (as opposed to an internal fault).
    pub fn is_client_error(&self) -> bool {
        !matches!(
            self,
            ErrorCode::NotAdded
                | ErrorCode::NotUpdated
                | ErrorCode::InternalError
                | ErrorCode::ConfigInvalid
        )
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result type alias for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_code_is_per_entity() {
        assert_eq!(
            CatalogError::not_found(EntityType::Artist, "a1").code(),
            ErrorCode::ArtistNotFound
        );
        assert_eq!(
            CatalogError::not_found(EntityType::Album, "b1").code(),
            ErrorCode::AlbumNotFound
        );
        assert_eq!(
            CatalogError::not_found(EntityType::Listener, "l1").code(),
            ErrorCode::ListenerNotFound
        );
    }

    #[test]
    fn test_storage_error_codes() {
        let err: CatalogError = StorageError::NotAdded {
            entity_type: EntityType::Album,
            reason: "not acknowledged".to_string(),
        }
        .into();
        assert_eq!(err.code(), ErrorCode::NotAdded);
        assert!(!err.code().is_client_error());

        let err: CatalogError = StorageError::LockPoisoned.into();
        assert_eq!(err.code(), ErrorCode::InternalError);
    }

    #[test]
    fn test_error_code_serializes_screaming_snake() {
        let json = serde_json::to_string(&ErrorCode::InvalidRange).expect("serialize");
        assert_eq!(json, "\"INVALID_RANGE\"");
        assert_eq!(ErrorCode::InvalidRange.to_string(), "INVALID_RANGE");
    }

    #[test]
    fn test_validation_error_display_and_code() {
        let err = ValidationError::InvalidSubscriptionTier {
            value: "GOLD".to_string(),
        };
        assert!(err.to_string().contains("GOLD"));
        assert_eq!(err.code(), "INVALID_SUBSCRIPTION_TIER");
        assert_eq!(CatalogError::from(err).code(), ErrorCode::ValidationFailed);
    }

    #[test]
    fn test_invalid_range_display() {
        let err = CatalogError::invalid_range("promo", "01/10/2024", "01/01/2024");
        let msg = err.to_string();
        assert!(msg.contains("01/10/2024"));
        assert!(msg.contains("promo"));
    }
}
