//! Edit validation errors and the bound checks shared by every mutator.
//!
//! Explicit edits are never clamped. A mutator either applies in full or
//! returns the first violated bound and leaves the model untouched.

/// A rejected edit. Every variant names the offending field (for example
/// `zoomRegions[1].scale`) and the bound it broke.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field} must be a finite number, got {value}")]
    NotFinite { field: String, value: f64 },

    #[error("{field} must be within [{min}, {max}], got {value}")]
    OutOfRange {
        field: String,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("{field} must be at least {min}, got {value}")]
    BelowMinimum { field: String, value: f64, min: f64 },

    #[error("{field} must be greater than zero, got {value}")]
    NotPositive { field: String, value: f64 },

    #[error("{field} start ({start}) must be before its end ({end})")]
    EmptyRange { field: String, start: f64, end: f64 },

    #[error("{field} overflows the frame: origin {origin} + extent {extent} > 100")]
    RegionOverflow {
        field: String,
        origin: f64,
        extent: f64,
    },

    #[error("{collection}[{index}] does not exist (len {len})")]
    IndexOutOfBounds {
        collection: &'static str,
        index: usize,
        len: usize,
    },

    #[error("{field} must not be empty")]
    EmptyText { field: String },
}

impl ValidationError {
    /// The field path the error refers to.
    pub fn field(&self) -> &str {
        match self {
            Self::NotFinite { field, .. }
            | Self::OutOfRange { field, .. }
            | Self::BelowMinimum { field, .. }
            | Self::NotPositive { field, .. }
            | Self::EmptyRange { field, .. }
            | Self::RegionOverflow { field, .. }
            | Self::EmptyText { field } => field,
            Self::IndexOutOfBounds { collection, .. } => collection,
        }
    }
}

pub(crate) type Checked<T = ()> = Result<T, ValidationError>;

pub(crate) fn finite(field: impl Into<String>, value: f64) -> Checked {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ValidationError::NotFinite {
            field: field.into(),
            value,
        })
    }
}

pub(crate) fn within(field: impl Into<String>, value: f64, min: f64, max: f64) -> Checked {
    let field = field.into();
    finite(field.clone(), value)?;
    if value < min || value > max {
        return Err(ValidationError::OutOfRange {
            field,
            value,
            min,
            max,
        });
    }
    Ok(())
}

pub(crate) fn percent(field: impl Into<String>, value: f64) -> Checked {
    within(field, value, 0.0, 100.0)
}

pub(crate) fn at_least(field: impl Into<String>, value: f64, min: f64) -> Checked {
    let field = field.into();
    finite(field.clone(), value)?;
    if value < min {
        return Err(ValidationError::BelowMinimum { field, value, min });
    }
    Ok(())
}

pub(crate) fn positive(field: impl Into<String>, value: f64) -> Checked {
    let field = field.into();
    finite(field.clone(), value)?;
    if value <= 0.0 {
        return Err(ValidationError::NotPositive { field, value });
    }
    Ok(())
}

/// `0 <= start < end <= duration`, all finite.
pub(crate) fn time_span(prefix: &str, start: f64, end: f64, duration: f64) -> Checked {
    within(format!("{prefix}.startTime"), start, 0.0, duration)?;
    within(format!("{prefix}.endTime"), end, 0.0, duration)?;
    if start >= end {
        return Err(ValidationError::EmptyRange {
            field: prefix.to_string(),
            start,
            end,
        });
    }
    Ok(())
}

/// A 1-D extent expressed in percent must stay inside the frame.
pub(crate) fn extent(field: impl Into<String>, origin: f64, extent: f64) -> Checked {
    let field = field.into();
    if origin + extent > 100.0 {
        return Err(ValidationError::RegionOverflow {
            field,
            origin,
            extent,
        });
    }
    Ok(())
}
