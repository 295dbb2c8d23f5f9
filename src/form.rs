//! Form state for the property attributes a prediction is made from.

use crate::district::District;
use crate::prediction::request::PredictionInput;
use crate::{EstimatorError, Result};

/// Upper bound for bedroom and bathroom counts
pub const MAX_ROOMS: u32 = 10;

/// Form fields, addressed by their input names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Area,
    Bedroom,
    Wc,
    District,
}

impl Field {
    pub const ALL: [Field; 4] = [Field::Area, Field::Bedroom, Field::Wc, Field::District];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Area => "area",
            Self::Bedroom => "bedroom",
            Self::Wc => "wc",
            Self::District => "district",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.name() == name)
    }

    pub fn is_numeric(&self) -> bool {
        !matches!(self, Self::District)
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FieldError {
    #[error("unknown field '{0}'")]
    UnknownField(String),

    #[error("{field}: '{value}' is not a number")]
    NotANumber { field: Field, value: String },

    #[error("{0} must be greater than 0")]
    NonPositive(Field),

    #[error("{0} must be a whole number")]
    NotInteger(Field),

    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: Field, min: u32, max: u32 },

    #[error("{0} must not be blank")]
    Blank(Field),

    #[error("form is locked while a prediction is in progress")]
    Locked,
}

impl FieldError {
    pub fn field(&self) -> Option<Field> {
        match self {
            Self::NotANumber { field, .. } | Self::OutOfRange { field, .. } => Some(*field),
            Self::NonPositive(field) | Self::NotInteger(field) | Self::Blank(field) => {
                Some(*field)
            }
            Self::UnknownField(_) | Self::Locked => None,
        }
    }
}

/// Current form values plus the in-flight flag.
///
/// Numeric values are kept as entered (`f64`) and only checked by
/// [`FormState::validate`], so a half-typed value never blocks editing.
#[derive(Debug, Clone, PartialEq)]
pub struct FormState {
    pub area: f64,
    pub bedroom: f64,
    pub wc: f64,
    pub district: String,
    loading: bool,
}

impl Default for FormState {
    fn default() -> Self {
        Self {
            area: 100.0,
            bedroom: 3.0,
            wc: 2.0,
            district: District::HoaVang.name().to_string(),
            loading: false,
        }
    }
}

impl FormState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// District names offered by the selector
    pub fn district_options() -> Vec<&'static str> {
        District::ALL.iter().map(|district| district.name()).collect()
    }

    /// Applies a change event. Numeric fields parse the text value, the
    /// district keeps it verbatim.
    pub fn set_field(&mut self, name: &str, value: &str) -> std::result::Result<(), FieldError> {
        if self.loading {
            return Err(FieldError::Locked);
        }
        let field =
            Field::from_name(name).ok_or_else(|| FieldError::UnknownField(name.to_string()))?;

        if !field.is_numeric() {
            self.district = value.to_string();
            return Ok(());
        }

        let number = value
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .ok_or_else(|| FieldError::NotANumber {
                field,
                value: value.to_string(),
            })?;

        match field {
            Field::Area => self.area = number,
            Field::Bedroom => self.bedroom = number,
            Field::Wc => self.wc = number,
            Field::District => {}
        }
        Ok(())
    }

    pub fn value(&self, field: Field) -> String {
        match field {
            Field::Area => self.area.to_string(),
            Field::Bedroom => self.bedroom.to_string(),
            Field::Wc => self.wc.to_string(),
            Field::District => self.district.clone(),
        }
    }

    /// Checks every field and builds the request, or lists all problems.
    pub fn validate(&self) -> std::result::Result<PredictionInput, Vec<FieldError>> {
        let mut errors = Vec::new();

        if !self.area.is_finite() {
            errors.push(FieldError::NotANumber {
                field: Field::Area,
                value: self.area.to_string(),
            });
        } else if self.area <= 0.0 {
            errors.push(FieldError::NonPositive(Field::Area));
        }

        let bedroom = room_count(Field::Bedroom, self.bedroom, &mut errors);
        let wc = room_count(Field::Wc, self.wc, &mut errors);

        if self.district.trim().is_empty() {
            errors.push(FieldError::Blank(Field::District));
        }

        match (bedroom, wc) {
            (Some(bedroom), Some(wc)) if errors.is_empty() => Ok(PredictionInput::new(
                self.area,
                bedroom,
                wc,
                self.district.trim(),
            )),
            _ => Err(errors),
        }
    }

    /// Validates and locks the form for the duration of a request.
    pub fn begin_submit(&mut self) -> Result<PredictionInput> {
        if self.loading {
            return Err(EstimatorError::Validation(
                "a prediction is already in progress".to_string(),
            ));
        }

        let input = self.validate().map_err(|errors| {
            let message = errors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ");
            EstimatorError::Validation(message)
        })?;

        self.loading = true;
        Ok(input)
    }

    pub fn finish_submit(&mut self) {
        self.loading = false;
    }
}

fn room_count(field: Field, value: f64, errors: &mut Vec<FieldError>) -> Option<u32> {
    if !value.is_finite() || value.fract() != 0.0 {
        errors.push(FieldError::NotInteger(field));
        return None;
    }
    if value < 0.0 || value > MAX_ROOMS as f64 {
        errors.push(FieldError::OutOfRange {
            field,
            min: 0,
            max: MAX_ROOMS,
        });
        return None;
    }
    Some(value as u32)
}
