//! Field-level validation of legacy records.
//!
//! Validators never fail outright. They return the sanitised value (if any)
//! alongside the issues they raised; a `Fatal` issue tells the transformer to
//! abandon the record.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use service_migration_shared::{Address, LegacyServiceRecord};

use crate::transformer::address::format_address;

lazy_static! {
    static ref EMAIL_REGEX: Regex =
        Regex::new(r"^[A-Za-z0-9._%+'-]+@[A-Za-z0-9-]+(\.[A-Za-z0-9-]+)*\.[A-Za-z]{2,}$").unwrap();
    static ref UK_PHONE_REGEX: Regex = Regex::new(r"^(\+44\d{9,10}|0\d{9,10})$").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    Warning,
    Error,
    Fatal,
}

/// A data-quality problem found while transforming a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub severity: IssueSeverity,
    pub code: String,
    pub diagnostics: String,
    pub expression: Vec<String>,
}

impl ValidationIssue {
    pub fn new(
        severity: IssueSeverity,
        code: impl Into<String>,
        diagnostics: impl Into<String>,
        expression: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            code: code.into(),
            diagnostics: diagnostics.into(),
            expression: vec![expression.into()],
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.severity == IssueSeverity::Fatal
    }
}

/// Outcome of validating one field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldValidation<T> {
    pub sanitised: Option<T>,
    pub issues: Vec<ValidationIssue>,
}

impl<T> FieldValidation<T> {
    fn valid(value: Option<T>) -> Self {
        Self {
            sanitised: value,
            issues: Vec::new(),
        }
    }

    fn invalid(issue: ValidationIssue) -> Self {
        Self {
            sanitised: None,
            issues: vec![issue],
        }
    }
}

/// Validated and sanitised contact details of a service.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SanitisedContact {
    pub email: Option<String>,
    pub public_phone: Option<String>,
    pub non_public_phone: Option<String>,
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

/// Checks an email address. Invalid addresses are dropped with a warning.
pub fn validate_email(email: Option<&str>) -> FieldValidation<String> {
    let Some(email) = non_blank(email) else {
        return FieldValidation::valid(None);
    };

    if EMAIL_REGEX.is_match(email) {
        FieldValidation::valid(Some(email.to_string()))
    } else {
        FieldValidation::invalid(ValidationIssue::new(
            IssueSeverity::Warning,
            "invalid_email",
            format!("Email address '{email}' is not valid"),
            "email",
        ))
    }
}

/// Checks a UK phone number after removing whitespace.
pub fn validate_phone_number(phone: Option<&str>, expression: &str) -> FieldValidation<String> {
    let Some(phone) = non_blank(phone) else {
        return FieldValidation::valid(None);
    };

    let compact: String = phone.chars().filter(|c| !c.is_whitespace()).collect();
    if UK_PHONE_REGEX.is_match(&compact) {
        FieldValidation::valid(Some(compact))
    } else {
        FieldValidation::invalid(ValidationIssue::new(
            IssueSeverity::Warning,
            "invalid_phone",
            format!("Phone number '{phone}' is not a valid UK number"),
            expression,
        ))
    }
}

/// Public name for a GP practice: the text before the first `-`.
pub fn validate_public_name(name: Option<&str>) -> FieldValidation<String> {
    let Some(name) = non_blank(name) else {
        return FieldValidation::invalid(ValidationIssue::new(
            IssueSeverity::Error,
            "publicname_required",
            "Public name is required for GP practices",
            "publicname",
        ));
    };

    let cleaned = name.split('-').next().unwrap_or(name).trim();
    FieldValidation::valid(Some(cleaned.to_string()))
}

/// Builds the location address; a location cannot exist without one.
pub fn validate_location(
    address: Option<&str>,
    town: Option<&str>,
    postcode: Option<&str>,
) -> FieldValidation<Address> {
    if non_blank(address).is_none() && non_blank(town).is_none() && non_blank(postcode).is_none() {
        return FieldValidation::invalid(ValidationIssue::new(
            IssueSeverity::Fatal,
            "address_required",
            "Address is required for GP practices to create a location",
            "address",
        ));
    }

    match format_address(address, town, postcode) {
        Some(formatted) => FieldValidation::valid(Some(formatted)),
        None => FieldValidation::invalid(ValidationIssue::new(
            IssueSeverity::Fatal,
            "invalid_address",
            "Address was invalid or incomplete, could not be formatted for GP practices to create a location",
            "address",
        )),
    }
}

/// Validates the contact fields every service carries.
pub fn validate_contact(
    record: &LegacyServiceRecord,
    issues: &mut Vec<ValidationIssue>,
) -> SanitisedContact {
    let email = validate_email(record.email.as_deref());
    let public_phone = validate_phone_number(record.public_phone.as_deref(), "publicphone");
    let non_public_phone =
        validate_phone_number(record.non_public_phone.as_deref(), "nonpublicphone");

    issues.extend(email.issues);
    issues.extend(public_phone.issues);
    issues.extend(non_public_phone.issues);

    SanitisedContact {
        email: email.sanitised,
        public_phone: public_phone.sanitised,
        non_public_phone: non_public_phone.sanitised,
    }
}
