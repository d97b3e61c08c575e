//! Lead submission validation.
//!
//! Inbound contact-form payloads are checked here before anything touches
//! the store. A [`NewLead`] can only be produced by [`validate`], so the
//! repository never sees a submission that broke a shape rule.

use regex::Regex;
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::sync::LazyLock;
use thiserror::Error;

pub const NAME_MIN_LEN: usize = 2;
pub const PHONE_MIN_LEN: usize = 5;
pub const DIRECTION_MIN_LEN: usize = 1;

const EMAIL_MAX_LEN: usize = 254;
const EMAIL_LOCAL_MAX_LEN: usize = 64;
const EMAIL_DOMAIN_MAX_LEN: usize = 253;
const EMAIL_LABEL_MAX_LEN: usize = 63;

static LOCAL_PART: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+(?:\.[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+)*$")
        .expect("local part pattern is valid")
});

static DOMAIN_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\p{L}\p{N}](?:[\p{L}\p{N}-]*[\p{L}\p{N}])?$")
        .expect("domain label pattern is valid")
});

/// A required string field as it arrived on the wire.
///
/// Keeps an absent key apart from an explicit `null`, which are reported
/// with different error codes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Field {
    #[default]
    Absent,
    Null,
    Value(String),
}

impl<'de> Deserialize<'de> for Field {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<String>::deserialize(deserializer)? {
            Some(value) => Self::Value(value),
            None => Self::Null,
        })
    }
}

impl From<&str> for Field {
    fn from(value: &str) -> Self {
        Self::Value(value.to_string())
    }
}

/// Raw `POST /leads` body.
///
/// Required fields are not enforced by the deserializer so that each one
/// is reported as a field-level violation instead of an opaque
/// deserialization failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LeadSubmission {
    #[serde(default)]
    pub name: Field,
    #[serde(default)]
    pub phone: Field,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub direction: Field,
    #[serde(default)]
    pub message: Option<String>,
}

/// A submission that passed every shape rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLead {
    name: String,
    phone: String,
    email: Option<String>,
    direction: String,
    message: Option<String>,
}

impl NewLead {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn phone(&self) -> &str {
        &self.phone
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn direction(&self) -> &str {
        &self.direction
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

/// The rule a field broke.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    /// A required field was absent.
    Missing,
    /// A required field was `null`.
    NotString,
    /// Fewer characters than the minimum.
    TooShort { min: usize },
    /// Not a well-formed email address.
    InvalidEmail(&'static str),
}

impl Rule {
    /// Stable machine-readable code for API consumers.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Missing => "missing",
            Self::NotString => "string_type",
            Self::TooShort { .. } => "string_too_short",
            Self::InvalidEmail(_) => "value_error",
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => f.write_str("Field required"),
            Self::NotString => f.write_str("Input should be a valid string"),
            Self::TooShort { min } => {
                let unit = if *min == 1 { "character" } else { "characters" };
                write!(f, "String should have at least {min} {unit}")
            }
            Self::InvalidEmail(reason) => {
                write!(f, "value is not a valid email address: {reason}")
            }
        }
    }
}

/// A single field-level violation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {rule}")]
pub struct ValidationError {
    pub field: &'static str,
    pub rule: Rule,
}

impl ValidationError {
    fn new(field: &'static str, rule: Rule) -> Self {
        Self { field, rule }
    }
}

/// Check a submission, returning every violation found.
pub fn validate(submission: LeadSubmission) -> Result<NewLead, Vec<ValidationError>> {
    let mut errors = Vec::new();

    let name = required(&mut errors, "name", submission.name, NAME_MIN_LEN);
    let phone = required(&mut errors, "phone", submission.phone, PHONE_MIN_LEN);

    if let Some(email) = submission.email.as_deref()
        && let Err(reason) = check_email(email)
    {
        errors.push(ValidationError::new("email", Rule::InvalidEmail(reason)));
    }

    let direction = required(
        &mut errors,
        "direction",
        submission.direction,
        DIRECTION_MIN_LEN,
    );

    match (name, phone, direction) {
        (Some(name), Some(phone), Some(direction)) if errors.is_empty() => Ok(NewLead {
            name,
            phone,
            email: submission.email,
            direction,
            message: submission.message,
        }),
        _ => Err(errors),
    }
}

fn required(
    errors: &mut Vec<ValidationError>,
    field: &'static str,
    value: Field,
    min: usize,
) -> Option<String> {
    let rule = match value {
        Field::Value(v) if v.chars().count() >= min => return Some(v),
        Field::Value(_) => Rule::TooShort { min },
        Field::Absent => Rule::Missing,
        Field::Null => Rule::NotString,
    };
    errors.push(ValidationError::new(field, rule));
    None
}

/// Syntactic email check. Returns the reason on failure.
pub fn check_email(address: &str) -> Result<(), &'static str> {
    if address.chars().count() > EMAIL_MAX_LEN {
        return Err("the address is too long");
    }

    let (local, domain) = address
        .split_once('@')
        .ok_or("an email address must have an @-sign")?;

    if domain.contains('@') {
        return Err("an email address must have exactly one @-sign");
    }
    if local.is_empty() {
        return Err("there must be something before the @-sign");
    }
    if domain.is_empty() {
        return Err("there must be something after the @-sign");
    }
    if local.len() > EMAIL_LOCAL_MAX_LEN {
        return Err("the part before the @-sign is too long");
    }
    if !LOCAL_PART.is_match(local) {
        return Err("the part before the @-sign contains invalid characters or dots");
    }
    if domain.chars().count() > EMAIL_DOMAIN_MAX_LEN {
        return Err("the domain name is too long");
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return Err("the domain name must contain a period");
    }
    for label in &labels {
        if label.is_empty() {
            return Err("the domain name has an empty label");
        }
        if label.chars().count() > EMAIL_LABEL_MAX_LEN {
            return Err("a domain label is too long");
        }
        if !DOMAIN_LABEL.is_match(label) {
            return Err("the domain name contains invalid characters");
        }
    }
    if labels
        .last()
        .is_some_and(|tld| tld.chars().all(|c| c.is_ascii_digit()))
    {
        return Err("the domain name is not valid, the last part must not be numeric");
    }

    Ok(())
}
