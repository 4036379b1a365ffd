//! Input validation
//!
//! The validation collaborator: pure functions from raw caller input to a
//! normalized value or a [`ValidationError`]. Nothing here touches storage.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::{CatalogDate, SubscriptionTier, ValidationError};

/// Inclusive bounds on a listener's age at creation/update.
pub const MIN_LISTENER_AGE: i32 = 13;
pub const MAX_LISTENER_AGE: i32 = 120;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("Invalid email regex"));

static PHONE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\(?\d{3}\)?[-. ]?\d{3}[-. ]\d{4}$").expect("Invalid phone regex")
});

/// Trait for validating non-empty strings.
///
/// # Example
/// ```
/// use catalog_core::validation::ValidateNonEmpty;
///
/// let name = "  Nova  ".validate_non_empty("stage_name").unwrap();
/// assert_eq!(name, "Nova");
/// ```
pub trait ValidateNonEmpty {
    /// Validate that the value is non-empty and return it trimmed.
    fn validate_non_empty(&self, field_name: &str) -> Result<String, ValidationError>;
}

impl ValidateNonEmpty for str {
    fn validate_non_empty(&self, field_name: &str) -> Result<String, ValidationError> {
        let trimmed = self.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyString {
                field: field_name.to_string(),
            });
        }
        Ok(trimmed.to_string())
    }
}

impl ValidateNonEmpty for String {
    fn validate_non_empty(&self, field_name: &str) -> Result<String, ValidationError> {
        self.as_str().validate_non_empty(field_name)
    }
}

impl<T: ValidateNonEmpty> ValidateNonEmpty for Option<T> {
    fn validate_non_empty(&self, field_name: &str) -> Result<String, ValidationError> {
        match self {
            Some(value) => value.validate_non_empty(field_name),
            None => Err(ValidationError::StringNotProvided {
                field: field_name.to_string(),
            }),
        }
    }
}

/// Validate an optional patch field: `None` stays `None`, `Some` must pass `check`.
pub fn validate_present<T, U>(
    value: Option<&T>,
    check: impl FnOnce(&T) -> Result<U, ValidationError>,
) -> Result<Option<U>, ValidationError>
where
    T: ?Sized,
{
    value.map(check).transpose()
}

pub fn validate_date(field: &str, raw: &str) -> Result<CatalogDate, ValidationError> {
    let raw = raw.validate_non_empty(field)?;
    CatalogDate::parse(field, &raw)
}

pub fn validate_email(raw: &str) -> Result<String, ValidationError> {
    let email = raw.validate_non_empty("email")?;
    if !EMAIL_RE.is_match(&email) {
        return Err(ValidationError::InvalidEmailFormat { value: email });
    }
    Ok(email)
}

pub fn validate_phone(raw: &str) -> Result<String, ValidationError> {
    let phone = raw.validate_non_empty("management_phone")?;
    if !PHONE_RE.is_match(&phone) {
        return Err(ValidationError::InvalidPhoneFormat { value: phone });
    }
    Ok(phone)
}

pub fn validate_tier(raw: &str) -> Result<SubscriptionTier, ValidationError> {
    let tier = raw.validate_non_empty("subscription_tier")?;
    tier.parse()
        .map_err(|_| ValidationError::InvalidSubscriptionTier { value: tier })
}

pub fn validate_track_count(value: i64) -> Result<u32, ValidationError> {
    if value <= 0 || value > i64::from(u32::MAX) {
        return Err(ValidationError::InvalidTrackCount { value });
    }
    Ok(value as u32)
}

/// Validate a date of birth so that the listener's age on `today` is within
/// [`MIN_LISTENER_AGE`]..=[`MAX_LISTENER_AGE`].
pub fn validate_date_of_birth(raw: &str, today: CatalogDate) -> Result<CatalogDate, ValidationError> {
    let born = validate_date("date_of_birth", raw)?;
    let age = born.age_on(today);
    if !(MIN_LISTENER_AGE..=MAX_LISTENER_AGE).contains(&age) {
        return Err(ValidationError::AgeOutOfRange {
            age,
            min: MIN_LISTENER_AGE,
            max: MAX_LISTENER_AGE,
        });
    }
    Ok(born)
}

/// Trait for checking if a patch carries any fields.
pub trait HasUpdates {
    /// Check if any update fields are set.
    fn has_any_updates(&self) -> bool;

    /// Validate that at least one update field is set.
    fn validate_has_updates(&self) -> Result<(), ValidationError> {
        if !self.has_any_updates() {
            return Err(ValidationError::NoFieldsToUpdate);
        }
        Ok(())
    }
}
