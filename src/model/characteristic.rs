use std::cmp::Ordering;

use serde::Serialize;

use crate::utils::error::ModelError;

use super::value::{Format, Perms, Unit, Value};

/// Addresses an attached characteristic: accessory id plus instance id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CharacteristicHandle {
    pub aid: u64,
    pub iid: u64,
}

/// What a successful [`Characteristic::set_value`] did.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOutcome {
    /// The value was stored. `adjusted` is set when it was clamped or truncated
    /// on the way in.
    Stored { value: Value, adjusted: bool },
    /// The candidate was less than one step away from the stored value, which
    /// was kept.
    BelowStep { kept: Value },
}

impl WriteOutcome {
    /// The newly stored value, if the write went through.
    pub fn stored(&self) -> Option<&Value> {
        match self {
            WriteOutcome::Stored { value, .. } => Some(value),
            WriteOutcome::BelowStep { .. } => None,
        }
    }
}

/// A single typed value exposed by a service.
///
/// The instance id is zero until the owning service is attached to an
/// accessory. Field order matters: it is the key order of the marshalled
/// record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Characteristic {
    iid: u64,
    #[serde(rename = "type")]
    kind: String,
    perms: Perms,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<Value>,
    format: Format,
    #[serde(skip_serializing_if = "Option::is_none")]
    unit: Option<Unit>,
    #[serde(rename = "maxValue", skip_serializing_if = "Option::is_none")]
    max_value: Option<Value>,
    #[serde(rename = "minValue", skip_serializing_if = "Option::is_none")]
    min_value: Option<Value>,
    #[serde(rename = "minStep", skip_serializing_if = "Option::is_none")]
    min_step: Option<Value>,
    #[serde(skip)]
    max_len: Option<usize>,
    #[serde(skip)]
    aid: Option<u64>,
}

impl Characteristic {
    pub fn new(kind: impl Into<String>, format: Format, perms: Perms) -> Self {
        Self {
            iid: 0,
            kind: kind.into(),
            perms,
            value: None,
            format,
            unit: None,
            max_value: None,
            min_value: None,
            min_step: None,
            max_len: None,
            aid: None,
        }
    }

    pub fn with_unit(mut self, unit: Unit) -> Self {
        self.unit = Some(unit);
        self
    }

    pub fn with_max_len(mut self, max_len: usize) -> Self {
        self.max_len = Some(max_len);
        self
    }

    /// Sets minimum, maximum and step in one go.
    pub fn with_range(
        mut self,
        min: impl Into<Value>,
        max: impl Into<Value>,
        step: impl Into<Value>,
    ) -> Result<Self, ModelError> {
        self.set_min_value(min)?;
        self.set_max_value(max)?;
        self.set_min_step(step)?;
        Ok(self)
    }

    /// Boolean characteristic with an initial value.
    pub fn boolean(kind: impl Into<String>, perms: Perms, value: bool) -> Self {
        let mut characteristic = Self::new(kind, Format::Bool, perms);
        characteristic.value = Some(Value::Bool(value));
        characteristic
    }

    /// Builder form of [`reset_value`](Self::reset_value).
    pub fn with_value(mut self, value: impl Into<Value>) -> Result<Self, ModelError> {
        self.reset_value(value)?;
        Ok(self)
    }

    pub fn iid(&self) -> u64 {
        self.iid
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn perms(&self) -> Perms {
        self.perms
    }

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    pub fn unit(&self) -> Option<Unit> {
        self.unit
    }

    pub fn max_len(&self) -> Option<usize> {
        self.max_len
    }

    pub fn min_value(&self) -> Option<&Value> {
        self.min_value.as_ref()
    }

    pub fn max_value(&self) -> Option<&Value> {
        self.max_value.as_ref()
    }

    pub fn min_step(&self) -> Option<&Value> {
        self.min_step.as_ref()
    }

    /// `(aid, iid)` once the characteristic is part of a container.
    pub fn handle(&self) -> Option<CharacteristicHandle> {
        self.aid.map(|aid| CharacteristicHandle { aid, iid: self.iid })
    }

    pub fn set_min_value(&mut self, min: impl Into<Value>) -> Result<(), ModelError> {
        let min = min.into();
        self.check_bound(&min)?;
        self.min_value = Some(min);
        Ok(())
    }

    pub fn set_max_value(&mut self, max: impl Into<Value>) -> Result<(), ModelError> {
        let max = max.into();
        self.check_bound(&max)?;
        self.max_value = Some(max);
        Ok(())
    }

    pub fn set_min_step(&mut self, step: impl Into<Value>) -> Result<(), ModelError> {
        let step = step.into();
        self.check_bound(&step)?;
        self.min_step = Some(step);
        Ok(())
    }

    /// Writes a new value.
    ///
    /// Numeric candidates closer than one step to the stored value are refused
    /// with [`WriteOutcome::BelowStep`]; the rest are clamped to the bounds.
    /// Strings longer than the maximum length are truncated, empty strings fail.
    pub fn set_value(&mut self, candidate: impl Into<Value>) -> Result<WriteOutcome, ModelError> {
        let candidate = candidate.into();
        self.check_format(&candidate)?;

        if let (Some(step), Some(current)) = (&self.min_step, &self.value) {
            if !candidate.clears_step(current, step) {
                return Ok(WriteOutcome::BelowStep {
                    kept: current.clone(),
                });
            }
        }

        let (value, adjusted) = self.conform(candidate)?;
        self.value = Some(value.clone());
        Ok(WriteOutcome::Stored { value, adjusted })
    }

    /// Stores a value ignoring the step rule. Bounds and string rules still
    /// apply.
    pub fn reset_value(&mut self, value: impl Into<Value>) -> Result<(), ModelError> {
        let value = value.into();
        self.check_format(&value)?;
        let (value, _) = self.conform(value)?;
        self.value = Some(value);
        Ok(())
    }

    pub(crate) fn assign_iid(&mut self, iid: u64) {
        self.iid = iid;
    }

    pub(crate) fn assign_aid(&mut self, aid: u64) {
        self.aid = Some(aid);
    }

    fn check_format(&self, value: &Value) -> Result<(), ModelError> {
        if value.format() != self.format {
            return Err(ModelError::FormatMismatch {
                expected: self.format,
                found: value.format(),
            });
        }
        if let Value::Float(v) = value {
            if !v.is_finite() {
                return Err(ModelError::NonFinite);
            }
        }
        Ok(())
    }

    fn check_bound(&self, bound: &Value) -> Result<(), ModelError> {
        if !self.format.is_numeric() {
            return Err(ModelError::NonNumericBound(self.format));
        }
        self.check_format(bound)
    }

    /// Applies length and range limits.
    fn conform(&self, value: Value) -> Result<(Value, bool), ModelError> {
        match value {
            Value::String(s) => {
                if s.is_empty() {
                    return Err(ModelError::EmptyString);
                }
                match self.max_len {
                    Some(max) if s.len() > max => Ok((Value::String(truncate(s, max)), true)),
                    _ => Ok((Value::String(s), false)),
                }
            }
            Value::Bool(_) => Ok((value, false)),
            numeric => {
                if let Some(max) = &self.max_value {
                    if numeric.numeric_cmp(max) == Some(Ordering::Greater) {
                        return Ok((max.clone(), true));
                    }
                }
                if let Some(min) = &self.min_value {
                    if numeric.numeric_cmp(min) == Some(Ordering::Less) {
                        return Ok((min.clone(), true));
                    }
                }
                Ok((numeric, false))
            }
        }
    }
}

/// Cuts `s` to at most `max` bytes on a character boundary.
fn truncate(mut s: String, max: usize) -> String {
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    s.truncate(cut);
    s
}
