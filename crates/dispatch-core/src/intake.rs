//! Three-step ambulance request intake form.
//!
//! Step 1 collects the caller, step 2 the pickup location, step 3 the
//! patient. [`RequestForm::advance`] only moves forward when the current
//! step validates; [`RequestForm::submit`] checks every step and yields the
//! [`NewAmbulanceRequest`] payload handed to the request queue.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::types::{
    Coordinates, EmergencyLevel, Gender, Location, NewAmbulanceRequest, PatientInfo,
};

static PHONE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[0-9()\-\s]{7,20}$").expect("phone pattern is valid"));

const MIN_PHONE_DIGITS: usize = 7;

/// Validate caller phone format
pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    let digits = phone.chars().filter(|c| c.is_ascii_digit()).count();
    if PHONE_REGEX.is_match(phone) && digits >= MIN_PHONE_DIGITS {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_phone")
            .with_message(Cow::Borrowed("Enter a valid phone number")))
    }
}

fn validate_coordinates(coordinates: &Coordinates) -> Result<(), ValidationError> {
    if coordinates.is_valid() {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_coordinates")
            .with_message(Cow::Borrowed("Coordinates are out of range")))
    }
}

fn validate_patient_presentation(patient: &PatientDetails) -> Result<(), ValidationError> {
    let has_symptom = patient.symptoms.iter().any(|s| !s.trim().is_empty());
    if has_symptom || !patient.condition.trim().is_empty() {
        Ok(())
    } else {
        Err(ValidationError::new("missing_presentation")
            .with_message(Cow::Borrowed("Add at least one symptom or a condition")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IntakeStep {
    Caller,
    Location,
    Patient,
}

impl IntakeStep {
    /// 1-based step number as shown to the operator
    pub fn number(&self) -> u8 {
        match self {
            Self::Caller => 1,
            Self::Location => 2,
            Self::Patient => 3,
        }
    }

    pub fn next(&self) -> Option<IntakeStep> {
        match self {
            Self::Caller => Some(Self::Location),
            Self::Location => Some(Self::Patient),
            Self::Patient => None,
        }
    }

    pub fn previous(&self) -> Option<IntakeStep> {
        match self {
            Self::Caller => None,
            Self::Location => Some(Self::Caller),
            Self::Patient => Some(Self::Location),
        }
    }
}

#[derive(Debug, Clone, Default, Validate)]
pub struct CallerDetails {
    #[validate(length(min = 1, max = 100, message = "Caller name is required"))]
    pub name: String,

    #[validate(custom(function = "validate_phone"))]
    pub phone: String,
}

impl CallerDetails {
    fn trimmed(&self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            phone: self.phone.trim().to_string(),
        }
    }
}

#[derive(Debug, Clone, Validate)]
pub struct LocationDetails {
    #[validate(length(min = 1, max = 300, message = "Address is required"))]
    pub address: String,

    #[validate(custom(function = "validate_coordinates"))]
    pub coordinates: Coordinates,
}

impl Default for LocationDetails {
    fn default() -> Self {
        Self {
            address: String::new(),
            coordinates: Coordinates::new(0.0, 0.0),
        }
    }
}

impl LocationDetails {
    fn trimmed(&self) -> Self {
        Self {
            address: self.address.trim().to_string(),
            coordinates: self.coordinates,
        }
    }
}

#[derive(Debug, Clone, Validate)]
#[validate(schema(function = "validate_patient_presentation"))]
pub struct PatientDetails {
    #[validate(length(min = 1, max = 100, message = "Patient name is required"))]
    pub name: String,

    #[validate(range(max = 130, message = "Age must be between 0 and 130"))]
    pub age: u16,

    pub gender: Gender,
    pub symptoms: Vec<String>,
    pub condition: String,
    pub emergency_level: EmergencyLevel,
}

impl Default for PatientDetails {
    fn default() -> Self {
        Self {
            name: String::new(),
            age: 0,
            gender: Gender::Unknown,
            symptoms: Vec::new(),
            condition: String::new(),
            emergency_level: EmergencyLevel::Medium,
        }
    }
}

impl PatientDetails {
    /// Trimmed text fields with blank symptoms dropped
    fn trimmed(&self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            age: self.age,
            gender: self.gender,
            symptoms: self
                .symptoms
                .iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            condition: self.condition.trim().to_string(),
            emergency_level: self.emergency_level,
        }
    }
}

/// Field-level validation messages keyed by `step.field`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FieldErrors {
    fields: BTreeMap<String, Vec<String>>,
}

impl FieldErrors {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn fields(&self) -> &BTreeMap<String, Vec<String>> {
        &self.fields
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.fields.entry(field.into()).or_default().push(message.into());
    }

    fn absorb(&mut self, prefix: &str, errors: &ValidationErrors) {
        for (field, list) in errors.field_errors() {
            let field = field.to_string();
            // schema-level errors are keyed "__all__"
            let key = if field == "__all__" {
                prefix.to_string()
            } else {
                format!("{}.{}", prefix, field)
            };
            for error in list.iter() {
                let message = error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| error.code.to_string());
                self.add(key.clone(), message);
            }
        }
    }

    fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .fields
            .iter()
            .map(|(field, messages)| format!("{}: {}", field, messages.join(", ")))
            .collect();
        f.write_str(&parts.join("; "))
    }
}

impl std::error::Error for FieldErrors {}

fn check<T: Validate>(prefix: &str, value: &T) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::default();
    if let Err(e) = value.validate() {
        errors.absorb(prefix, &e);
    }
    errors.into_result()
}

/// Multi-step request intake form
#[derive(Debug, Clone)]
pub struct RequestForm {
    step: IntakeStep,
    pub caller: CallerDetails,
    pub location: LocationDetails,
    pub patient: PatientDetails,
    pub notes: Option<String>,
}

impl Default for RequestForm {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestForm {
    pub fn new() -> Self {
        Self {
            step: IntakeStep::Caller,
            caller: CallerDetails::default(),
            location: LocationDetails::default(),
            patient: PatientDetails::default(),
            notes: None,
        }
    }

    pub fn step(&self) -> IntakeStep {
        self.step
    }

    /// Validate a single step without moving.
    ///
    /// Text is checked as it will be submitted, i.e. trimmed.
    pub fn validate_step(&self, step: IntakeStep) -> Result<(), FieldErrors> {
        match step {
            IntakeStep::Caller => check("caller", &self.caller.trimmed()),
            IntakeStep::Location => check("location", &self.location.trimmed()),
            IntakeStep::Patient => check("patient", &self.patient.trimmed()),
        }
    }

    /// Move to the next step if the current one is valid.
    ///
    /// On the last step this only validates and stays put.
    pub fn advance(&mut self) -> Result<IntakeStep, FieldErrors> {
        self.validate_step(self.step)?;
        if let Some(next) = self.step.next() {
            self.step = next;
        }
        Ok(self.step)
    }

    /// Go back one step; never validates
    pub fn back(&mut self) -> IntakeStep {
        if let Some(previous) = self.step.previous() {
            self.step = previous;
        }
        self.step
    }

    /// Produce the request payload once every step validates.
    ///
    /// Submitting before the last step is refused. When a step is invalid the
    /// form jumps back to the first failing step.
    pub fn submit(&mut self) -> Result<NewAmbulanceRequest, FieldErrors> {
        if self.step != IntakeStep::Patient {
            let mut errors = FieldErrors::default();
            errors.add("form", "Complete every step before submitting");
            return Err(errors);
        }

        for step in [IntakeStep::Caller, IntakeStep::Location, IntakeStep::Patient] {
            if let Err(errors) = self.validate_step(step) {
                self.step = step;
                return Err(errors);
            }
        }

        let caller = self.caller.trimmed();
        let location = self.location.trimmed();
        let patient = self.patient.trimmed();
        Ok(NewAmbulanceRequest {
            caller_name: caller.name,
            caller_phone: caller.phone,
            location: Location {
                address: location.address,
                coordinates: location.coordinates,
            },
            patient_info: PatientInfo {
                name: patient.name,
                age: patient.age,
                gender: patient.gender,
                symptoms: patient.symptoms,
                condition: patient.condition,
                emergency_level: patient.emergency_level,
            },
            notes: self.notes.clone().filter(|n| !n.trim().is_empty()),
        })
    }
}

/// Validate a request payload that did not come through the form
pub fn validate_new_request(request: &NewAmbulanceRequest) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::default();

    let caller = CallerDetails {
        name: request.caller_name.clone(),
        phone: request.caller_phone.clone(),
    };
    let location = LocationDetails {
        address: request.location.address.clone(),
        coordinates: request.location.coordinates,
    };
    let patient = PatientDetails {
        name: request.patient_info.name.clone(),
        age: request.patient_info.age,
        gender: request.patient_info.gender,
        symptoms: request.patient_info.symptoms.clone(),
        condition: request.patient_info.condition.clone(),
        emergency_level: request.patient_info.emergency_level,
    };

    for (prefix, result) in [
        ("caller", caller.trimmed().validate()),
        ("location", location.trimmed().validate()),
        ("patient", patient.trimmed().validate()),
    ] {
        if let Err(e) = result {
            errors.absorb(prefix, &e);
        }
    }

    errors.into_result()
}
