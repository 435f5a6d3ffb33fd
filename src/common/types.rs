// src/common/types.rs

use core::fmt;

use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use super::frame::{DataFrame, FIELD_COUNT};

// --- Measurement fields ---

/// The twelve measurement fields of a data frame, in wire order.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[repr(u8)]
pub enum MeasurementField {
    /// PM1.0 concentration, standard particle (CF=1), µg/m³.
    Pm1_0Standard = 0,
    Pm2_5Standard = 1,
    Pm10Standard = 2,
    /// PM1.0 concentration under atmospheric environment, µg/m³.
    Pm1_0Atmospheric = 3,
    Pm2_5Atmospheric = 4,
    Pm10Atmospheric = 5,
    /// Particles beyond 0.3 µm in 0.1 L of air.
    Particles0_3 = 6,
    Particles0_5 = 7,
    Particles1_0 = 8,
    Particles2_5 = 9,
    Particles5_0 = 10,
    Particles10 = 11,
}

impl MeasurementField {
    pub const ALL: [MeasurementField; FIELD_COUNT] = [
        MeasurementField::Pm1_0Standard,
        MeasurementField::Pm2_5Standard,
        MeasurementField::Pm10Standard,
        MeasurementField::Pm1_0Atmospheric,
        MeasurementField::Pm2_5Atmospheric,
        MeasurementField::Pm10Atmospheric,
        MeasurementField::Particles0_3,
        MeasurementField::Particles0_5,
        MeasurementField::Particles1_0,
        MeasurementField::Particles2_5,
        MeasurementField::Particles5_0,
        MeasurementField::Particles10,
    ];

    /// Position of the field within a frame.
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Short label used in log output.
    pub const fn label(self) -> &'static str {
        match self {
            MeasurementField::Pm1_0Standard => "pm1.0_cf1",
            MeasurementField::Pm2_5Standard => "pm2.5_cf1",
            MeasurementField::Pm10Standard => "pm10_cf1",
            MeasurementField::Pm1_0Atmospheric => "pm1.0",
            MeasurementField::Pm2_5Atmospheric => "pm2.5",
            MeasurementField::Pm10Atmospheric => "pm10",
            MeasurementField::Particles0_3 => "n0.3",
            MeasurementField::Particles0_5 => "n0.5",
            MeasurementField::Particles1_0 => "n1.0",
            MeasurementField::Particles2_5 => "n2.5",
            MeasurementField::Particles5_0 => "n5.0",
            MeasurementField::Particles10 => "n10",
        }
    }
}

// --- Reading ---

/// A validated data frame tagged with its capture time (UTC).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Reading {
    pub captured_at: OffsetDateTime,
    pub frame: DataFrame,
}

impl Reading {
    pub fn new(frame: DataFrame, captured_at: OffsetDateTime) -> Self {
        Reading { captured_at, frame }
    }

    pub fn get(&self, field: MeasurementField) -> u16 {
        self.frame.fields()[field.index()]
    }
}

// --- Averaged reading ---

/// Arithmetic mean of every field over one full window.
#[derive(Debug, Clone, PartialEq)]
pub struct AveragedReading {
    pub computed_at: OffsetDateTime,
    pub values: [f64; FIELD_COUNT],
    pub samples: usize,
}

impl AveragedReading {
    pub fn get(&self, field: MeasurementField) -> f64 {
        self.values[field.index()]
    }

    /// One-line status record: RFC 3339 UTC timestamp at second resolution,
    /// then the twelve means with two decimals, space separated.
    pub fn status_line(&self) -> Result<String, time::error::Format> {
        let stamp = self
            .computed_at
            .to_offset(time::UtcOffset::UTC)
            .replace_nanosecond(0)
            .unwrap_or(self.computed_at)
            .format(&Rfc3339)?;
        let mut line = stamp;
        for value in self.values.iter() {
            line.push_str(&format!(" {:.2}", value));
        }
        Ok(line)
    }
}

impl fmt::Display for AveragedReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, field) in MeasurementField::ALL.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}={:.2}", field.label(), self.values[field.index()])?;
        }
        write!(f, " ({} samples)", self.samples)
    }
}
