//! Power-usage reading domain model.

use serde::{Deserialize, Serialize};
use std::fmt;
use time::OffsetDateTime;

use crate::error::{CoreError, Result};
use crate::id::new_id;

/// Tariff used for cost estimation, per kWh.
const RATE_PER_KWH: f64 = 0.15;

/// Measurement unit for a power reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum UsageUnit {
    /// Kilowatt-hours (default).
    #[default]
    #[serde(rename = "kWh")]
    KilowattHours,
    Watts,
    Amps,
}

impl UsageUnit {
    /// Returns the unit name as stored in documents.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::KilowattHours => "kWh",
            Self::Watts => "Watts",
            Self::Amps => "Amps",
        }
    }
}

impl fmt::Display for UsageUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single power-usage measurement owned by a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerReading {
    /// Document id.
    pub id: String,

    /// Id of the owning user.
    pub owner_id: String,

    /// Measured usage. Never negative.
    pub usage: f64,

    /// Measurement unit.
    #[serde(default)]
    pub unit: UsageUnit,

    /// When the measurement was taken.
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,

    /// Where the measurement was taken (required, trimmed).
    pub location: String,

    /// Device the measurement came from (required, trimmed).
    pub device_id: String,

    /// Whether the reading was flagged as anomalous.
    #[serde(default)]
    pub anomaly: bool,

    /// Recorded cost, if the meter supplied one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,

    /// When the document was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,

    /// When the document was last updated.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl PowerReading {
    /// Creates a new reading, validating usage, location and device id.
    ///
    /// # Errors
    /// Returns a validation error if usage is negative or not finite, or if
    /// location or device id is empty after trimming.
    pub fn new(
        owner_id: impl Into<String>,
        usage: f64,
        unit: UsageUnit,
        timestamp: OffsetDateTime,
        location: &str,
        device_id: &str,
    ) -> Result<Self> {
        validate_usage(usage)?;
        let location = required_trimmed("location", location)?;
        let device_id = required_trimmed("device_id", device_id)?;
        let now = OffsetDateTime::now_utc();
        Ok(Self {
            id: new_id(),
            owner_id: owner_id.into(),
            usage,
            unit,
            timestamp,
            location,
            device_id,
            anomaly: false,
            cost: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Applies an update to the measurement fields.
    ///
    /// # Errors
    /// Returns a validation error under the same rules as [`Self::new`].
    pub fn apply_update(
        &mut self,
        usage: f64,
        unit: UsageUnit,
        timestamp: OffsetDateTime,
        location: &str,
        device_id: &str,
    ) -> Result<()> {
        validate_usage(usage)?;
        self.location = required_trimmed("location", location)?;
        self.device_id = required_trimmed("device_id", device_id)?;
        self.usage = usage;
        self.unit = unit;
        self.timestamp = timestamp;
        self.touch();
        Ok(())
    }

    /// Flags the reading as anomalous.
    pub fn mark_anomaly(&mut self) {
        self.anomaly = true;
        self.touch();
    }

    /// Bumps the `updated_at` timestamp.
    pub fn touch(&mut self) {
        self.updated_at = OffsetDateTime::now_utc();
    }

    /// Estimated cost at the flat kWh tariff.
    ///
    /// Watts are converted to kWh; amps cannot be costed without a voltage
    /// and return `None`.
    #[must_use]
    pub fn estimated_cost(&self) -> Option<f64> {
        match self.unit {
            UsageUnit::KilowattHours => Some(self.usage * RATE_PER_KWH),
            UsageUnit::Watts => Some(self.usage / 1000.0 * RATE_PER_KWH),
            UsageUnit::Amps => None,
        }
    }

    /// Usage normalized to kWh, where the unit allows it.
    #[must_use]
    pub fn usage_kwh(&self) -> Option<f64> {
        match self.unit {
            UsageUnit::KilowattHours => Some(self.usage),
            UsageUnit::Watts => Some(self.usage / 1000.0),
            UsageUnit::Amps => None,
        }
    }
}

fn validate_usage(usage: f64) -> Result<()> {
    if !usage.is_finite() || usage < 0.0 {
        return Err(CoreError::validation("usage must be a non-negative number"));
    }
    Ok(())
}

fn required_trimmed(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CoreError::validation(format!("{field} must not be empty")));
    }
    Ok(trimmed.to_string())
}
