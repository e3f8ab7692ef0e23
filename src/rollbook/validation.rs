//! Field validation for student forms.
//!
//! The checks are pure functions. Each one returns `Ok(())` or the single
//! [`Violation`] it detects. Presence is a separate rule: the format checks
//! accept an absent value and leave it to [`Violation::Required`].
//!
//! [`error_message`] turns the violations collected for one field into the
//! one line shown to the user. [`validate_form`] runs every rule over raw
//! input and produces a typed [`StudentForm`].

use crate::model::{Branch, ClassYear, HonoursDegree, StudentForm};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

pub const NAME_MIN_LEN: usize = 3;
pub const NAME_MAX_LEN: usize = 50;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,6}$").expect("email pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    Required,
    InvalidRollNumber,
    InvalidEmail,
    MinLength { required: usize },
    MaxLength { required: usize },
    /// Anything without a dedicated message, e.g. an unknown branch.
    Other(String),
}

/// Roll numbers must be whole numbers greater than zero.
pub fn validate_roll_number(value: Option<&str>) -> Result<(), Violation> {
    let Some(raw) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(());
    };
    parse_roll_number(raw).map(|_| ())
}

fn parse_roll_number(raw: &str) -> Result<u32, Violation> {
    match raw.parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(Violation::InvalidRollNumber),
    }
}

/// Emails must look like `local@domain.tld` with a 2-6 letter TLD.
pub fn validate_email(value: Option<&str>) -> Result<(), Violation> {
    let Some(raw) = value.filter(|v| !v.is_empty()) else {
        return Ok(());
    };
    if EMAIL_RE.is_match(raw) {
        Ok(())
    } else {
        Err(Violation::InvalidEmail)
    }
}

/// Interaction state of a single form field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldState {
    pub violations: Vec<Violation>,
    pub touched: bool,
    pub dirty: bool,
}

impl FieldState {
    pub fn new(violations: Vec<Violation>) -> Self {
        Self {
            violations,
            touched: false,
            dirty: false,
        }
    }

    pub fn touched(mut self) -> Self {
        self.touched = true;
        self
    }

    fn has(&self, pred: impl Fn(&Violation) -> bool) -> Option<&Violation> {
        self.violations.iter().find(|v| pred(v))
    }
}

/// Resolves a field's violations to one message.
///
/// Precedence: required, roll number, email, min length, max length, then
/// the generic "Invalid input". Untouched fields never show an error.
pub fn error_message(field: &FieldState, field_name: &str) -> Option<String> {
    if field.violations.is_empty() || !(field.touched || field.dirty) {
        return None;
    }

    if field.has(|v| *v == Violation::Required).is_some() {
        return Some(format!("{} is required", field_name));
    }
    if field.has(|v| *v == Violation::InvalidRollNumber).is_some() {
        return Some("Roll number must be a positive number".to_string());
    }
    if field.has(|v| *v == Violation::InvalidEmail).is_some() {
        return Some("Please enter a valid email address".to_string());
    }
    if let Some(Violation::MinLength { required }) =
        field.has(|v| matches!(v, Violation::MinLength { .. }))
    {
        return Some(format!(
            "{} must be at least {} characters",
            field_name, required
        ));
    }
    if let Some(Violation::MaxLength { required }) =
        field.has(|v| matches!(v, Violation::MaxLength { .. }))
    {
        return Some(format!("{} cannot exceed {} characters", field_name, required));
    }
    Some("Invalid input".to_string())
}

/// Unvalidated form input, as typed by a user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawForm {
    pub name: Option<String>,
    pub branch: Option<String>,
    pub class: Option<String>,
    pub roll_no: Option<String>,
    pub honours_degree: Option<String>,
    pub email: Option<String>,
}

impl From<&StudentForm> for RawForm {
    fn from(form: &StudentForm) -> Self {
        Self {
            name: Some(form.name.clone()),
            branch: Some(form.branch.to_string()),
            class: Some(form.class.to_string()),
            roll_no: Some(form.roll_no.to_string()),
            honours_degree: Some(form.honours_degree.to_string()),
            email: Some(form.email.clone()),
        }
    }
}

/// Per-field violations of a rejected form, in form order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors {
    pub fields: Vec<(&'static str, FieldState)>,
}

impl FormErrors {
    fn push(&mut self, label: &'static str, violations: Vec<Violation>) {
        if !violations.is_empty() {
            self.fields.push((label, FieldState::new(violations).touched()));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// One message per offending field.
    pub fn messages(&self) -> Vec<String> {
        self.fields
            .iter()
            .filter_map(|(label, state)| error_message(state, label))
            .collect()
    }
}

impl fmt::Display for FormErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.messages().join("; "))
    }
}

impl std::error::Error for FormErrors {}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn name_violations(value: Option<&str>) -> Vec<Violation> {
    let Some(name) = value else {
        return vec![Violation::Required];
    };
    let len = name.chars().count();
    let mut found = Vec::new();
    if len < NAME_MIN_LEN {
        found.push(Violation::MinLength {
            required: NAME_MIN_LEN,
        });
    }
    if len > NAME_MAX_LEN {
        found.push(Violation::MaxLength {
            required: NAME_MAX_LEN,
        });
    }
    found
}

fn choice<T: std::str::FromStr>(value: Option<&str>, out: &mut Option<T>) -> Vec<Violation>
where
    T::Err: fmt::Display,
{
    match value {
        None => vec![Violation::Required],
        Some(raw) => match raw.parse::<T>() {
            Ok(v) => {
                *out = Some(v);
                Vec::new()
            }
            Err(e) => vec![Violation::Other(e.to_string())],
        },
    }
}

/// Runs every form rule and builds a [`StudentForm`] when all pass.
///
/// Name: required, 3-50 characters. Branch, class and honours degree: one of
/// the known values. Roll number: required, a positive whole number. Email:
/// required and well formed.
pub fn validate_form(raw: &RawForm) -> Result<StudentForm, FormErrors> {
    let mut errors = FormErrors::default();

    let name = present(&raw.name);
    errors.push("Name", name_violations(name));

    let mut branch: Option<Branch> = None;
    errors.push("Branch", choice(present(&raw.branch), &mut branch));

    let mut class: Option<ClassYear> = None;
    errors.push("Class", choice(present(&raw.class), &mut class));

    let roll_raw = present(&raw.roll_no);
    let roll_violations = match roll_raw {
        None => vec![Violation::Required],
        Some(r) => validate_roll_number(Some(r)).err().into_iter().collect(),
    };
    let roll_no = roll_raw.and_then(|r| parse_roll_number(r).ok());
    errors.push("Roll number", roll_violations);

    let mut honours: Option<HonoursDegree> = None;
    errors.push("Honours degree", choice(present(&raw.honours_degree), &mut honours));

    let email = present(&raw.email);
    let email_violations = match email {
        None => vec![Violation::Required],
        Some(e) => validate_email(Some(e)).err().into_iter().collect(),
    };
    errors.push("Email", email_violations);

    match (name, branch, class, roll_no, honours, email) {
        (Some(name), Some(branch), Some(class), Some(roll_no), Some(honours_degree), Some(email))
            if errors.is_empty() =>
        {
            Ok(StudentForm {
                name: name.to_string(),
                branch,
                class,
                roll_no,
                honours_degree,
                email: email.to_string(),
            })
        }
        _ => Err(errors),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw() -> RawForm {
        RawForm {
            name: Some("Test Student".into()),
            branch: Some("CS".into()),
            class: Some("FE".into()),
            roll_no: Some("105".into()),
            honours_degree: Some("None".into()),
            email: Some("test@college.edu".into()),
        }
    }

    #[test]
    fn roll_number_rules() {
        assert_eq!(validate_roll_number(None), Ok(()));
        assert_eq!(validate_roll_number(Some("")), Ok(()));
        assert_eq!(validate_roll_number(Some("42")), Ok(()));
        assert_eq!(
            validate_roll_number(Some("0")),
            Err(Violation::InvalidRollNumber)
        );
        assert_eq!(
            validate_roll_number(Some("-3")),
            Err(Violation::InvalidRollNumber)
        );
        assert_eq!(
            validate_roll_number(Some("abc")),
            Err(Violation::InvalidRollNumber)
        );
        assert_eq!(
            validate_roll_number(Some("10.5")),
            Err(Violation::InvalidRollNumber)
        );
    }

    #[test]
    fn email_rules() {
        assert_eq!(validate_email(None), Ok(()));
        assert_eq!(validate_email(Some("t@x.com")), Ok(()));
        assert_eq!(validate_email(Some("first.last-1@dept.college.edu")), Ok(()));
        assert_eq!(validate_email(Some("no-at-sign.com")), Err(Violation::InvalidEmail));
        assert_eq!(validate_email(Some("a@b.c")), Err(Violation::InvalidEmail));
        assert_eq!(validate_email(Some("a@b.toolongtld")), Err(Violation::InvalidEmail));
        assert_eq!(validate_email(Some("a b@c.com")), Err(Violation::InvalidEmail));
    }

    #[test]
    fn untouched_fields_show_nothing() {
        let field = FieldState::new(vec![Violation::Required]);
        assert_eq!(error_message(&field, "Name"), None);

        let mut dirty = field.clone();
        dirty.dirty = true;
        assert_eq!(error_message(&dirty, "Name").as_deref(), Some("Name is required"));
    }

    #[test]
    fn message_precedence() {
        let field = FieldState::new(vec![
            Violation::MaxLength { required: 50 },
            Violation::InvalidEmail,
            Violation::Required,
        ])
        .touched();
        assert_eq!(error_message(&field, "Email").as_deref(), Some("Email is required"));

        let field = FieldState::new(vec![
            Violation::MinLength { required: 3 },
            Violation::InvalidEmail,
        ])
        .touched();
        assert_eq!(
            error_message(&field, "Email").as_deref(),
            Some("Please enter a valid email address")
        );

        let field = FieldState::new(vec![
            Violation::MaxLength { required: 50 },
            Violation::MinLength { required: 3 },
        ])
        .touched();
        assert_eq!(
            error_message(&field, "Name").as_deref(),
            Some("Name must be at least 3 characters")
        );

        let field = FieldState::new(vec![Violation::MaxLength { required: 50 }]).touched();
        assert_eq!(
            error_message(&field, "Name").as_deref(),
            Some("Name cannot exceed 50 characters")
        );

        let field = FieldState::new(vec![Violation::Other("weird".into())]).touched();
        assert_eq!(error_message(&field, "Branch").as_deref(), Some("Invalid input"));
    }

    #[test]
    fn valid_form_is_accepted() {
        let form = validate_form(&raw()).unwrap();
        assert_eq!(form.name, "Test Student");
        assert_eq!(form.branch, Branch::Cs);
        assert_eq!(form.roll_no, 105);
    }

    #[test]
    fn every_bad_field_is_reported() {
        let bad = RawForm {
            name: Some("Al".into()),
            branch: Some("Civil".into()),
            class: None,
            roll_no: Some("-1".into()),
            honours_degree: Some("None".into()),
            email: Some("nope".into()),
        };
        let errors = validate_form(&bad).unwrap_err();
        assert_eq!(
            errors.messages(),
            vec![
                "Name must be at least 3 characters".to_string(),
                "Invalid input".to_string(),
                "Class is required".to_string(),
                "Roll number must be a positive number".to_string(),
                "Please enter a valid email address".to_string(),
            ]
        );
    }

    #[test]
    fn fractional_roll_numbers_are_rejected_by_the_form() {
        let mut input = raw();
        input.roll_no = Some("10.5".into());
        let errors = validate_form(&input).unwrap_err();
        assert_eq!(errors.to_string(), "Roll number must be a positive number");
    }

    #[test]
    fn long_names_are_rejected() {
        let mut input = raw();
        input.name = Some("x".repeat(51));
        assert!(validate_form(&input).is_err());
        input.name = Some("x".repeat(50));
        assert!(validate_form(&input).is_ok());
    }

    #[test]
    fn raw_form_round_trips_a_typed_form() {
        let form = validate_form(&raw()).unwrap();
        assert_eq!(validate_form(&RawForm::from(&form)).unwrap(), form);
    }
}
