//! Best-effort prediction logging
//!
//! A sink is called once per predicted row after the response is known.
//! Sinks never fail the request: errors are logged and dropped.

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{info, warn};

use crate::record::FlightRecord;

/// Fire-and-forget recorder of served predictions
pub trait PredictionSink: Send + Sync {
    fn record(&self, request: &FlightRecord, prediction: u8);
}

/// Discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl PredictionSink for NoopSink {
    fn record(&self, _request: &FlightRecord, _prediction: u8) {}
}

/// Emits one structured `info` event per prediction
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl PredictionSink for TracingSink {
    fn record(&self, request: &FlightRecord, prediction: u8) {
        info!(
            airline = %request.opera,
            month = request.mes,
            flight_type = %request.tipo_vuelo,
            delay_prediction = prediction,
            "prediction served"
        );
    }
}

/// One JSON-lines row of the prediction log
#[derive(Debug, Serialize)]
struct PredictionLogRow<'a> {
    prediction_timestamp: String,
    airline: &'a str,
    month: i64,
    flight_type: &'a str,
    delay_prediction: u8,
}

/// Appends predictions to a JSON-lines file
#[derive(Debug)]
pub struct JsonLinesSink {
    path: PathBuf,
    file: Mutex<File>,
}

impl JsonLinesSink {
    pub fn open<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_row(&self, request: &FlightRecord, prediction: u8) -> Result<(), String> {
        let row = PredictionLogRow {
            prediction_timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            airline: &request.opera,
            month: request.mes,
            flight_type: &request.tipo_vuelo,
            delay_prediction: prediction,
        };
        let mut line = serde_json::to_string(&row).map_err(|e| e.to_string())?;
        line.push('\n');

        let mut file = self.file.lock().map_err(|_| "prediction log lock poisoned".to_string())?;
        file.write_all(line.as_bytes()).map_err(|e| e.to_string())
    }
}

impl PredictionSink for JsonLinesSink {
    fn record(&self, request: &FlightRecord, prediction: u8) {
        if let Err(e) = self.write_row(request, prediction) {
            warn!(path = %self.path.display(), "failed to log prediction: {}", e);
        }
    }
}
