//! Integration tests for the deterministic delay trainer
//!
//! Ensures identical artifacts are produced across runs and that the batch
//! pipeline round-trips through the saved artifact.

use anyhow::Result;
use chrono::{Duration, NaiveDate};
use flightdelay_core::{DelayArtifact, DelayPredictor, FlightRecord};
use flightdelay_trainer::{
    predict_csv, train_from_csv, DelayTrainer, FlightDataset, GbdtConfig, PREDICTION_COLUMN,
};
use std::io::Write;
use tempfile::{NamedTempFile, TempDir};

const AIRLINES: [&str; 3] = ["Grupo LATAM", "Sky Airline", "Copa Air"];

/// Sky Airline international flights run 40 minutes late, everything else 5
fn synthetic_records(n: usize) -> Vec<FlightRecord> {
    (0..n)
        .map(|i| {
            let airline = AIRLINES[i % 3];
            let month = ((i / 6) % 12) as u32 + 1;
            let tipo = if i % 2 == 0 { "I" } else { "N" };
            let scheduled = NaiveDate::from_ymd_opt(2017, month, (i % 28) as u32 + 1)
                .and_then(|d| d.and_hms_opt((i % 24) as u32, 0, 0))
                .expect("valid date");
            let late = if airline == "Sky Airline" && tipo == "I" { 40 } else { 5 };
            let actual = scheduled + Duration::minutes(late);

            FlightRecord::new(airline, month as i64, tipo).with_times(
                scheduled.format("%Y-%m-%d %H:%M:%S").to_string(),
                actual.format("%Y-%m-%d %H:%M:%S").to_string(),
            )
        })
        .collect()
}

fn synthetic_csv(n: usize) -> Result<NamedTempFile> {
    let mut file = NamedTempFile::new()?;
    writeln!(file, "Fecha-I,Vlo-I,Fecha-O,MES,OPERA,TIPOVUELO")?;
    for (i, r) in synthetic_records(n).iter().enumerate() {
        writeln!(
            file,
            "{},{},{},{},{},{}",
            r.fecha_i.as_deref().unwrap_or_default(),
            100 + i,
            r.fecha_o.as_deref().unwrap_or_default(),
            r.mes,
            r.opera,
            r.tipo_vuelo
        )?;
    }
    file.flush()?;
    Ok(file)
}

fn quick_config() -> GbdtConfig {
    GbdtConfig {
        num_rounds: 30,
        learning_rate: 200_000,
        ..GbdtConfig::default()
    }
}

#[test]
fn test_deterministic_training() -> Result<()> {
    let records = synthetic_records(120);

    let first = DelayTrainer::new(42).with_config(quick_config()).train(&records)?;
    let second = DelayTrainer::new(42).with_config(quick_config()).train(&records)?;

    assert_eq!(first.artifact.schema(), second.artifact.schema());
    assert_eq!(
        first.artifact.metadata().model_hash,
        second.artifact.metadata().model_hash,
        "Model hashes should be identical"
    );
    assert_eq!(first.artifact.model(), second.artifact.model());

    let p1 = DelayPredictor::new(first.artifact.into());
    let p2 = DelayPredictor::new(second.artifact.into());
    assert_eq!(p1.predict(&records)?, p2.predict(&records)?);

    Ok(())
}

#[test]
fn test_split_sizes_recorded() -> Result<()> {
    let outcome = DelayTrainer::new(7)
        .with_config(quick_config())
        .train(&synthetic_records(100))?;

    let metadata = outcome.artifact.metadata();
    assert_eq!(metadata.test_rows, 33);
    assert_eq!(metadata.train_rows, 67);
    assert_eq!(metadata.seed, 7);
    assert!(metadata.metrics.contains_key("accuracy"));
    assert!(metadata.metrics.get("log_loss").is_some_and(|&l| l > 0.0));
    assert!(metadata.metrics.values().all(|v| v.is_finite()));
    Ok(())
}

#[test]
fn test_learns_delayed_segment() -> Result<()> {
    let records = synthetic_records(240);
    let outcome = DelayTrainer::new(42).with_config(quick_config()).train(&records)?;
    let predictor = DelayPredictor::new(outcome.artifact.into());

    let predictions = predictor.predict(&[
        FlightRecord::new("Sky Airline", 3, "I"),
        FlightRecord::new("Grupo LATAM", 3, "N"),
    ])?;
    assert_eq!(predictions, vec![1, 0]);
    Ok(())
}

#[test]
fn test_csv_pipeline_roundtrip() -> Result<()> {
    let data = synthetic_csv(90)?;
    let dir = TempDir::new()?;
    let artifact_path = dir.path().join("models").join("delay_model.json");
    let output = dir.path().join("predictions_output.csv");

    let outcome = train_from_csv(data.path(), &artifact_path, 42)?;
    assert!(DelayArtifact::hash_path(&artifact_path).exists());

    let loaded = DelayArtifact::load(&artifact_path)?;
    assert_eq!(loaded.model(), outcome.artifact.model());
    assert_eq!(loaded.schema(), outcome.artifact.schema());

    let predictions = predict_csv(data.path(), &artifact_path, &output)?;
    assert_eq!(predictions.len(), 90);

    let written = FlightDataset::from_csv(&output)?;
    assert_eq!(written.len(), 90);
    assert_eq!(
        written.headers().iter().last(),
        Some(PREDICTION_COLUMN)
    );
    assert_eq!(written.records()[5].opera, AIRLINES[5 % 3]);
    Ok(())
}

#[test]
fn test_unlabelled_training_data_rejected() -> Result<()> {
    let mut file = NamedTempFile::new()?;
    writeln!(file, "OPERA,MES,TIPOVUELO")?;
    writeln!(file, "Grupo LATAM,5,N")?;
    file.flush()?;

    let dir = TempDir::new()?;
    assert!(train_from_csv(file.path(), &dir.path().join("m.json"), 42).is_err());
    Ok(())
}
