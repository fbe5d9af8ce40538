//! Raw flight records and request envelopes
//!
//! Field names follow the source dataset (`OPERA`, `MES`, `TIPOVUELO`,
//! `Fecha-I`, `Fecha-O`). Any other column present in a CSV row or JSON
//! object is ignored on deserialization.

use serde::{Deserialize, Serialize};

/// A single raw flight as it arrives from a CSV row or an HTTP body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlightRecord {
    /// Operating airline name
    #[serde(rename = "OPERA")]
    pub opera: String,

    /// Month of operation (1-12)
    #[serde(rename = "MES")]
    pub mes: i64,

    /// Flight type: `N` (national) or `I` (international)
    #[serde(rename = "TIPOVUELO")]
    pub tipo_vuelo: String,

    /// Scheduled timestamp (`YYYY-MM-DD HH:MM:SS`)
    #[serde(
        rename = "Fecha-I",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub fecha_i: Option<String>,

    /// Actual timestamp (`YYYY-MM-DD HH:MM:SS`)
    #[serde(
        rename = "Fecha-O",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub fecha_o: Option<String>,

    /// Pre-computed delay label, if the source already carries one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay: Option<u8>,
}

impl FlightRecord {
    /// Build an inference-only record
    pub fn new(opera: impl Into<String>, mes: i64, tipo_vuelo: impl Into<String>) -> Self {
        Self {
            opera: opera.into(),
            mes,
            tipo_vuelo: tipo_vuelo.into(),
            fecha_i: None,
            fecha_o: None,
            delay: None,
        }
    }

    /// Attach scheduled and actual timestamps (training rows)
    pub fn with_times(mut self, fecha_i: impl Into<String>, fecha_o: impl Into<String>) -> Self {
        self.fecha_i = Some(fecha_i.into());
        self.fecha_o = Some(fecha_o.into());
        self
    }
}

/// Prediction input: either `{"flights": [...]}` or a bare record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PredictionRequest {
    Batch { flights: Vec<FlightRecord> },
    Single(FlightRecord),
}

impl PredictionRequest {
    /// Records in input order
    pub fn records(&self) -> &[FlightRecord] {
        match self {
            PredictionRequest::Batch { flights } => flights,
            PredictionRequest::Single(record) => std::slice::from_ref(record),
        }
    }

    pub fn is_batch(&self) -> bool {
        matches!(self, PredictionRequest::Batch { .. })
    }
}

/// Echo of the categorical inputs in a single-record response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionDetails {
    pub airline: String,
    pub month: i64,
    pub flight_type: String,
}

/// Prediction output, shaped after the request form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PredictionResponse {
    Batch {
        predict: Vec<u8>,
    },
    Single {
        delay_prediction: u8,
        details: PredictionDetails,
    },
}

impl PredictionResponse {
    /// Per-row predictions regardless of shape
    pub fn predictions(&self) -> Vec<u8> {
        match self {
            PredictionResponse::Batch { predict } => predict.clone(),
            PredictionResponse::Single {
                delay_prediction, ..
            } => vec![*delay_prediction],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_request_parses() {
        let json = r#"{"OPERA":"Grupo LATAM","MES":5,"TIPOVUELO":"N"}"#;
        let request: PredictionRequest = serde_json::from_str(json).unwrap();

        assert!(!request.is_batch());
        assert_eq!(request.records().len(), 1);
        assert_eq!(request.records()[0].opera, "Grupo LATAM");
        assert_eq!(request.records()[0].fecha_i, None);
    }

    #[test]
    fn test_batch_request_parses() {
        let json = r#"{"flights":[
            {"OPERA":"Sky Airline","MES":1,"TIPOVUELO":"I"},
            {"OPERA":"Copa Air","MES":12,"TIPOVUELO":"N"}
        ]}"#;
        let request: PredictionRequest = serde_json::from_str(json).unwrap();

        assert!(request.is_batch());
        let records = request.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].mes, 12);
    }

    #[test]
    fn test_training_fields_and_extra_columns() {
        let json = r#"{
            "Fecha-I":"2017-01-01 23:30:00","Vlo-I":"226","OPERA":"Grupo LATAM",
            "MES":1,"TIPOVUELO":"I","Fecha-O":"2017-01-01 23:33:00"
        }"#;
        let record: FlightRecord = serde_json::from_str(json).unwrap();

        assert_eq!(record.fecha_i.as_deref(), Some("2017-01-01 23:30:00"));
        assert_eq!(record.fecha_o.as_deref(), Some("2017-01-01 23:33:00"));
        assert_eq!(record.delay, None);
    }

    #[test]
    fn test_response_shapes() {
        let single = PredictionResponse::Single {
            delay_prediction: 1,
            details: PredictionDetails {
                airline: "Grupo LATAM".into(),
                month: 3,
                flight_type: "N".into(),
            },
        };
        let value = serde_json::to_value(&single).unwrap();
        assert_eq!(value["delay_prediction"], 1);
        assert_eq!(value["details"]["airline"], "Grupo LATAM");

        let batch = PredictionResponse::Batch { predict: vec![0, 1] };
        let value = serde_json::to_value(&batch).unwrap();
        assert_eq!(value["predict"], serde_json::json!([0, 1]));
    }
}
