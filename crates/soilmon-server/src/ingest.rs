//! Reading source: CSV rows with one column per parameter plus `timestamp`
//! and `region`, renamed through the configured column mapping.

use crate::config::IngestConfig;
use anyhow::Result;
use soilmon_common::types::Reading;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Column {
    Timestamp,
    Region,
    Parameter(String),
}

/// Lazily yields one [`Reading`] per CSV row, in file order.
pub struct ReadingSource<R: Read> {
    records: csv::StringRecordsIntoIter<R>,
    columns: Vec<Column>,
    default_region: Option<String>,
    row: usize,
}

/// Opens a reading CSV file.
pub fn open_readings(
    path: impl AsRef<Path>,
    config: &IngestConfig,
) -> Result<ReadingSource<BufReader<File>>> {
    let path = path.as_ref();
    let file = File::open(path)
        .map_err(|e| anyhow::anyhow!("Failed to open readings file '{}': {}", path.display(), e))?;
    ReadingSource::from_reader(BufReader::new(file), config)
}

impl<R: Read> ReadingSource<R> {
    pub fn from_reader(reader: R, config: &IngestConfig) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);
        let columns = reader
            .headers()?
            .iter()
            .map(|raw| {
                let name = config
                    .column_mapping
                    .get(raw)
                    .map(String::as_str)
                    .unwrap_or(raw);
                match name {
                    "timestamp" => Column::Timestamp,
                    "region" => Column::Region,
                    other => Column::Parameter(other.to_string()),
                }
            })
            .collect();
        Ok(Self {
            records: reader.into_records(),
            columns,
            default_region: config.default_region.clone(),
            row: 0,
        })
    }

    fn to_reading(&self, record: &csv::StringRecord) -> Reading {
        let mut reading = Reading::default();
        for (idx, column) in self.columns.iter().enumerate() {
            let cell = record.get(idx).unwrap_or("");
            match column {
                Column::Timestamp => {
                    reading.timestamp = (!cell.is_empty()).then(|| cell.to_string());
                }
                Column::Region => {
                    reading.region = (!cell.is_empty()).then(|| cell.to_string());
                }
                Column::Parameter(name) => {
                    reading.values.insert(name.clone(), self.parse_cell(name, cell));
                }
            }
        }
        if reading.region.is_none() {
            reading.region = self.default_region.clone();
        }
        reading
    }

    fn parse_cell(&self, parameter: &str, cell: &str) -> Option<f64> {
        if cell.is_empty() {
            return None;
        }
        match cell.parse::<f64>() {
            Ok(v) if !v.is_nan() => Some(v),
            _ => {
                tracing::debug!(
                    row = self.row,
                    parameter,
                    cell,
                    "Non-numeric cell treated as missing"
                );
                None
            }
        }
    }
}

impl<R: Read> Iterator for ReadingSource<R> {
    type Item = Result<Reading>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = self.records.next()?;
        self.row += 1;
        Some(
            record
                .map(|r| self.to_reading(&r))
                .map_err(|e| anyhow::anyhow!("Failed to read reading row {}: {}", self.row, e)),
        )
    }
}
