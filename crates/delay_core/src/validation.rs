//! Input-domain validation for prediction requests
//!
//! Runs before the pipeline; the predictor itself assumes every record it
//! receives has already passed these checks.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

use crate::record::FlightRecord;

/// Airlines accepted by default
pub const DEFAULT_AIRLINES: [&str; 5] = [
    "Grupo LATAM",
    "Aerolineas Argentinas",
    "Sky Airline",
    "Copa Air",
    "Latin American Wings",
];

/// Flight types accepted by default
pub const DEFAULT_FLIGHT_TYPES: [&str; 2] = ["N", "I"];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid airline (OPERA): {0}")]
    InvalidAirline(String),

    #[error("Invalid flight type (TIPOVUELO): {0}")]
    InvalidFlightType(String),

    #[error("Invalid month (MES): {0}")]
    InvalidMonth(i64),
}

/// Whitelist of allowed categorical values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlightValidator {
    airlines: BTreeSet<String>,
    flight_types: BTreeSet<String>,
}

impl Default for FlightValidator {
    fn default() -> Self {
        Self::new(
            DEFAULT_AIRLINES.iter().map(|s| s.to_string()),
            DEFAULT_FLIGHT_TYPES.iter().map(|s| s.to_string()),
        )
    }
}

impl FlightValidator {
    pub fn new(
        airlines: impl IntoIterator<Item = String>,
        flight_types: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            airlines: airlines.into_iter().collect(),
            flight_types: flight_types.into_iter().collect(),
        }
    }

    pub fn airlines(&self) -> impl Iterator<Item = &str> {
        self.airlines.iter().map(String::as_str)
    }

    /// Check one record; airline first, then flight type, then month
    pub fn validate(&self, record: &FlightRecord) -> Result<(), ValidationError> {
        if !self.airlines.contains(&record.opera) {
            return Err(ValidationError::InvalidAirline(record.opera.clone()));
        }
        if !self.flight_types.contains(&record.tipo_vuelo) {
            return Err(ValidationError::InvalidFlightType(record.tipo_vuelo.clone()));
        }
        if !(1..=12).contains(&record.mes) {
            return Err(ValidationError::InvalidMonth(record.mes));
        }
        Ok(())
    }

    /// Check every record, stopping at the first failure
    pub fn validate_all(&self, records: &[FlightRecord]) -> Result<(), ValidationError> {
        records.iter().try_for_each(|r| self.validate(r))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_record() {
        let validator = FlightValidator::default();
        assert!(validator.validate(&FlightRecord::new("Grupo LATAM", 3, "N")).is_ok());
        assert!(validator.validate(&FlightRecord::new("Copa Air", 12, "I")).is_ok());
    }

    #[test]
    fn test_each_failure_kind() {
        let validator = FlightValidator::default();
        assert_eq!(
            validator.validate(&FlightRecord::new("Aerolineas Argentinas", 13, "N")),
            Err(ValidationError::InvalidMonth(13))
        );
        assert_eq!(
            validator.validate(&FlightRecord::new("Aerolineas Argentinas", 3, "O")),
            Err(ValidationError::InvalidFlightType("O".into()))
        );
        assert_eq!(
            validator.validate(&FlightRecord::new("Argentinas", 3, "N")),
            Err(ValidationError::InvalidAirline("Argentinas".into()))
        );
        assert_eq!(
            validator.validate(&FlightRecord::new("Sky Airline", 0, "N")),
            Err(ValidationError::InvalidMonth(0))
        );
    }

    #[test]
    fn test_batch_stops_at_first_failure() {
        let validator = FlightValidator::default();
        let records = vec![
            FlightRecord::new("Grupo LATAM", 3, "N"),
            FlightRecord::new("Grupo LATAM", 3, "X"),
            FlightRecord::new("Nope", 3, "N"),
        ];
        assert_eq!(
            validator.validate_all(&records),
            Err(ValidationError::InvalidFlightType("X".into()))
        );
    }

    #[test]
    fn test_custom_airlines() {
        let validator = FlightValidator::new(vec!["JetSMART SPA".to_string()], vec!["N".to_string()]);
        assert!(validator.validate(&FlightRecord::new("JetSMART SPA", 1, "N")).is_ok());
        assert!(validator.validate(&FlightRecord::new("Grupo LATAM", 1, "N")).is_err());
        assert_eq!(validator.airlines().collect::<Vec<_>>(), vec!["JetSMART SPA"]);
    }
}
