//! Tabular and text artifacts
//!
//! Every writer goes through [`write_atomically`]: content is written to a
//! temporary file next to the destination and renamed over it, so readers
//! never observe a half-written artifact.

use crate::cleaning::{CleanedPanel, Observation};
use crate::error::{ForecastError, Result};
use crate::features::{MergedPanel, MergedRow};
use crate::records::{ForecastRecord, ImportanceRecord};
use crate::utils::{format_date, parse_date};
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

const COUNTRY: &str = "Country";
const DS: &str = "ds";
const Y: &str = "y";

/// Write `path` through a temporary file in the same directory
pub fn write_atomically<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut File) -> Result<()>,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    write(tmp.as_file_mut())?;
    tmp.as_file_mut().sync_all()?;
    tmp.persist(path)?;

    debug!(path = %path.display(), "wrote artifact");
    Ok(())
}

/// Write plain text
pub fn write_text(path: &Path, text: &str) -> Result<()> {
    write_atomically(path, |file| {
        file.write_all(text.as_bytes())?;
        Ok(())
    })
}

/// Write the long-form KPI series (`Country, ds, y`)
pub fn write_observations(path: &Path, panel: &CleanedPanel) -> Result<()> {
    write_atomically(path, |file| {
        let mut writer = csv::Writer::from_writer(file);
        for observation in panel.observations() {
            writer.serialize(observation)?;
        }
        writer.flush()?;
        Ok(())
    })
}

pub fn read_observations(path: &Path) -> Result<CleanedPanel> {
    let mut reader = csv::Reader::from_path(path)?;
    let observations = reader
        .deserialize()
        .collect::<std::result::Result<Vec<Observation>, _>>()?;
    CleanedPanel::new(observations)
}

/// Write a merged panel (`Country, ds, y, <regressors>`)
pub fn write_merged(path: &Path, panel: &MergedPanel) -> Result<()> {
    write_atomically(path, |file| {
        let mut writer = csv::Writer::from_writer(file);

        let mut header = vec![COUNTRY.to_string(), DS.to_string(), Y.to_string()];
        header.extend(panel.regressors().iter().cloned());
        writer.write_record(&header)?;

        for row in panel.rows() {
            let mut record = vec![row.country.clone(), format_date(row.ds), row.y.to_string()];
            record.extend(row.values.iter().map(|v| v.to_string()));
            writer.write_record(&record)?;
        }

        writer.flush()?;
        Ok(())
    })
}

/// Read a merged panel; the regressors are the columns after `y`
pub fn read_merged(path: &Path) -> Result<MergedPanel> {
    let mut reader = csv::Reader::from_path(path)?;

    let headers: Vec<String> = reader.headers()?.iter().map(String::from).collect();
    if headers.len() < 3 || headers[0] != COUNTRY || headers[1] != DS || headers[2] != Y {
        return Err(ForecastError::SchemaMismatch {
            missing: vec![COUNTRY.to_string(), DS.to_string(), Y.to_string()],
        });
    }
    let regressors: Vec<String> = headers[3..].to_vec();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        let values = record
            .iter()
            .skip(3)
            .map(|cell| cell.trim().parse::<f64>())
            .collect::<std::result::Result<Vec<f64>, _>>()?;

        rows.push(MergedRow {
            country: record[0].to_string(),
            ds: parse_date(&record[1])?,
            y: record[2].trim().parse()?,
            values,
        });
    }

    MergedPanel::new(regressors, rows)
}

/// Write importance records (`Country, Feature, Importance`)
pub fn write_importance(path: &Path, records: &[ImportanceRecord]) -> Result<()> {
    write_atomically(path, |file| {
        let mut writer = csv::Writer::from_writer(file);
        for record in records {
            writer.serialize(record)?;
        }
        writer.flush()?;
        Ok(())
    })
}

pub fn read_importance(path: &Path) -> Result<Vec<ImportanceRecord>> {
    let mut reader = csv::Reader::from_path(path)?;
    let records = reader
        .deserialize()
        .collect::<std::result::Result<Vec<ImportanceRecord>, _>>()?;
    Ok(records)
}

/// Write one country's forecast timeline
pub fn write_forecasts(path: &Path, records: &[ForecastRecord]) -> Result<()> {
    write_atomically(path, |file| {
        let mut writer = csv::Writer::from_writer(file);
        for record in records {
            writer.serialize(record)?;
        }
        writer.flush()?;
        Ok(())
    })
}
