//! CSV flight dataset loading and prediction output
//!
//! Rows are kept verbatim next to their parsed `FlightRecord`s so the
//! prediction output can echo every original column unchanged.

use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use flightdelay_core::FlightRecord;
use std::io::{Read, Write};
use std::path::Path;
use tracing::{debug, info};

use crate::errors::TrainerError;

/// Columns every input file must carry
pub const REQUIRED_COLUMNS: [&str; 3] = ["OPERA", "MES", "TIPOVUELO"];

/// Columns needed to derive training labels (unless `delay` is present)
pub const TIMESTAMP_COLUMNS: [&str; 2] = ["Fecha-I", "Fecha-O"];

/// Column appended to the prediction output
pub const PREDICTION_COLUMN: &str = "predicted_delay";

/// Parsed flights plus their raw CSV rows
#[derive(Clone, Debug)]
pub struct FlightDataset {
    headers: StringRecord,
    rows: Vec<StringRecord>,
    records: Vec<FlightRecord>,
}

impl FlightDataset {
    /// Load dataset from a CSV file with a header row
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self, TrainerError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| {
            TrainerError::Dataset(format!("failed to open {}: {}", path.display(), e))
        })?;
        let dataset = Self::from_reader(file)?;
        info!(path = %path.display(), rows = dataset.len(), "loaded flight dataset");
        Ok(dataset)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, TrainerError> {
        let mut reader = ReaderBuilder::new().has_headers(true).from_reader(reader);
        let headers = reader.headers()?.clone();

        for column in REQUIRED_COLUMNS {
            if !headers.iter().any(|h| h == column) {
                return Err(TrainerError::Dataset(format!(
                    "missing required column: {column}"
                )));
            }
        }

        let mut rows = Vec::new();
        let mut records = Vec::new();
        for (line_idx, row) in reader.records().enumerate() {
            let row = row?;
            let record: FlightRecord = row.deserialize(Some(&headers)).map_err(|e| {
                TrainerError::Dataset(format!("row {}: {}", line_idx + 1, e))
            })?;
            records.push(record);
            rows.push(row);
        }

        debug!(columns = headers.len(), rows = rows.len(), "parsed csv");
        Ok(Self {
            headers,
            rows,
            records,
        })
    }

    pub fn records(&self) -> &[FlightRecord] {
        &self.records
    }

    pub fn headers(&self) -> &StringRecord {
        &self.headers
    }

    /// Get number of samples
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if dataset is empty
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether labels can be derived for every row
    pub fn is_labelled(&self) -> bool {
        let has = |name: &str| self.headers.iter().any(|h| h == name);
        has("delay") || TIMESTAMP_COLUMNS.iter().all(|c| has(c))
    }

    /// Write the original rows back with a `predicted_delay` column appended
    pub fn write_with_predictions<W: Write>(
        &self,
        writer: W,
        predictions: &[u8],
    ) -> Result<(), TrainerError> {
        if predictions.len() != self.rows.len() {
            return Err(TrainerError::Dataset(format!(
                "{} predictions for {} rows",
                predictions.len(),
                self.rows.len()
            )));
        }

        let mut writer = WriterBuilder::new().from_writer(writer);

        let mut headers = self.headers.clone();
        headers.push_field(PREDICTION_COLUMN);
        writer.write_record(&headers)?;

        for (row, prediction) in self.rows.iter().zip(predictions) {
            let mut out = row.clone();
            out.push_field(&prediction.to_string());
            writer.write_record(&out)?;
        }

        writer.flush()?;
        Ok(())
    }

    pub fn write_predictions_csv<P: AsRef<Path>>(
        &self,
        path: P,
        predictions: &[u8],
    ) -> Result<(), TrainerError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = std::fs::File::create(path)?;
        self.write_with_predictions(file, predictions)?;
        info!(path = %path.display(), rows = predictions.len(), "wrote predictions");
        Ok(())
    }
}
