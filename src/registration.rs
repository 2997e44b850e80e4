//! Registration validation - per-field rules, submission blocked on errors.
//!
//! Rules produce structured violations keyed by field name so callers can
//! attach each message to its input. A record only comes into existence once
//! every rule passes.

use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::attendee::{AttendeeRecord, TicketId};

pub const MIN_AGE: u32 = 18;

/// Raw form input, all fields as typed. Nothing here is trusted yet.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegistrationForm {
    pub name: String,
    pub email: String,
    pub planet: String,
    pub country: String,
    pub age: String,
    pub special_requests: String,
    pub photo_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

impl FieldViolation {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// One field rule - checks a single aspect of the form.
pub trait FieldRule {
    fn field(&self) -> &'static str;
    fn check(&self, form: &RegistrationForm) -> Option<FieldViolation>;
}

// --- Concrete Rules ---

struct NameRule;

impl FieldRule for NameRule {
    fn field(&self) -> &'static str {
        "name"
    }

    fn check(&self, form: &RegistrationForm) -> Option<FieldViolation> {
        if form.name.trim().is_empty() {
            Some(FieldViolation::new(self.field(), "Name is required"))
        } else {
            None
        }
    }
}

struct EmailRule;

impl FieldRule for EmailRule {
    fn field(&self) -> &'static str {
        "email"
    }

    fn check(&self, form: &RegistrationForm) -> Option<FieldViolation> {
        let email = form.email.trim();
        if email.is_empty() {
            return Some(FieldViolation::new(self.field(), "Email is required"));
        }
        // Shape check only: local@domain.tld with no embedded whitespace.
        let valid = match email.split_once('@') {
            Some((local, domain)) => {
                !local.is_empty()
                    && domain.contains('.')
                    && !domain.starts_with('.')
                    && !domain.ends_with('.')
                    && !email.contains(char::is_whitespace)
            }
            None => false,
        };
        if valid {
            None
        } else {
            Some(FieldViolation::new(self.field(), "Email is invalid"))
        }
    }
}

struct CountryRule;

impl FieldRule for CountryRule {
    fn field(&self) -> &'static str {
        "country"
    }

    fn check(&self, form: &RegistrationForm) -> Option<FieldViolation> {
        if form.country.trim().is_empty() {
            Some(FieldViolation::new(self.field(), "Country/Colony is required"))
        } else {
            None
        }
    }
}

struct AgeRule;

impl FieldRule for AgeRule {
    fn field(&self) -> &'static str {
        "age"
    }

    fn check(&self, form: &RegistrationForm) -> Option<FieldViolation> {
        let age = form.age.trim();
        if age.is_empty() {
            return Some(FieldViolation::new(self.field(), "Age is required"));
        }
        match age.parse::<u32>() {
            Ok(n) if n >= MIN_AGE => None,
            Ok(_) => Some(FieldViolation::new(
                self.field(),
                format!("Must be at least {} years old", MIN_AGE),
            )),
            Err(_) => Some(FieldViolation::new(self.field(), "Age is invalid")),
        }
    }
}

struct PhotoRule;

impl FieldRule for PhotoRule {
    fn field(&self) -> &'static str {
        "photo"
    }

    fn check(&self, form: &RegistrationForm) -> Option<FieldViolation> {
        let Some(uri) = form.photo_url.as_deref() else {
            return Some(FieldViolation::new(
                self.field(),
                "Photo is required for identification",
            ));
        };
        // Data URIs must decode to a readable image; anything else is passed
        // through untouched and resolved at render time.
        if let Some(bytes) = decode_data_uri(uri) {
            if image::load_from_memory(&bytes).is_err() {
                return Some(FieldViolation::new(self.field(), "Photo could not be read"));
            }
        }
        None
    }
}

/// Decode the payload of a base64 `data:` URI. Returns None for non-data URIs.
pub(crate) fn decode_data_uri(uri: &str) -> Option<Vec<u8>> {
    let rest = uri.strip_prefix("data:")?;
    let (_, payload) = rest.split_once(";base64,")?;
    base64::engine::general_purpose::STANDARD.decode(payload).ok()
}

/// Validator orchestrates the field rules in display order.
pub struct RegistrationValidator {
    rules: Vec<Box<dyn FieldRule>>,
}

impl RegistrationValidator {
    pub fn new() -> Self {
        Self {
            rules: vec![
                Box::new(NameRule),
                Box::new(EmailRule),
                Box::new(CountryRule),
                Box::new(AgeRule),
                Box::new(PhotoRule),
            ],
        }
    }

    pub fn validate(&self, form: &RegistrationForm) -> Vec<FieldViolation> {
        self.rules
            .iter()
            .filter_map(|rule| rule.check(form))
            .collect()
    }
}

impl Default for RegistrationValidator {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub enum RegistrationOutcome {
    Accepted(AttendeeRecord),
    Rejected(Vec<FieldViolation>),
}

/// Validate the form and, if clean, mint the immutable record with a fresh
/// identifier. This is the only way a record is created.
pub fn submit(form: &RegistrationForm) -> RegistrationOutcome {
    let violations = RegistrationValidator::new().validate(form);
    if !violations.is_empty() {
        return RegistrationOutcome::Rejected(violations);
    }

    let special_requests = {
        let trimmed = form.special_requests.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    };

    RegistrationOutcome::Accepted(AttendeeRecord {
        name: form.name.trim().to_string(),
        email: form.email.trim().to_string(),
        planet: form.planet.trim().to_string(),
        country: form.country.trim().to_string(),
        age: form.age.trim().parse().unwrap_or(MIN_AGE),
        special_requests,
        ticket_id: TicketId::generate(),
        photo_url: form.photo_url.clone(),
    })
}
