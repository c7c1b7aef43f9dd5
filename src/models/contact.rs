// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Contact log rows (one per logged QSO).

use crate::error::{AppError, Result};
use std::collections::HashMap;
use std::io::Read;

pub const TO_STATION: &str = "TO STATION";
pub const DATE: &str = "DATE";
pub const FREQ: &str = "FREQ";
pub const MODE: &str = "MODE";
pub const RST: &str = "RST";

/// Columns printed on every eQSL, in table order.
pub const EQSL_COLUMNS: [&str; 5] = [TO_STATION, DATE, FREQ, MODE, RST];

/// One contact log row as a flat column -> text mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactRow {
    fields: HashMap<String, String>,
}

impl ContactRow {
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            fields: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Value of `column`, or "" when the column is absent.
    pub fn get(&self, column: &str) -> &str {
        self.fields.get(column).map(String::as_str).unwrap_or("")
    }

    /// The station worked in this contact.
    pub fn counterparty(&self) -> &str {
        self.get(TO_STATION)
    }

    /// Parse a CSV contact log with a header row, preserving row order.
    ///
    /// Headers and values are trimmed; blank lines are skipped.
    pub fn parse_log<R: Read>(reader: R) -> Result<Vec<ContactRow>> {
        let mut csv = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let headers = csv
            .headers()
            .map_err(|e| AppError::MissingInput(format!("unreadable contact log header: {}", e)))?
            .clone();

        if !headers.iter().any(|h| h == TO_STATION) {
            return Err(AppError::MissingInput(format!(
                "contact log has no {:?} column",
                TO_STATION
            )));
        }

        let mut rows = Vec::new();
        for record in csv.records() {
            let record = record
                .map_err(|e| AppError::MissingInput(format!("unreadable contact log row: {}", e)))?;
            if record.iter().all(str::is_empty) {
                continue;
            }
            rows.push(ContactRow::from_pairs(
                headers.iter().zip(record.iter()),
            ));
        }

        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_log_preserves_order() {
        let log = "TO STATION,DATE,FREQ,MODE,RST\n\
                   DL1ABC,2025-06-01,14.285,SSB,59\n\
                   F4XYZ, 2025-06-01 ,7.032,CW,599\n";
        let rows = ContactRow::parse_log(log.as_bytes()).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].counterparty(), "DL1ABC");
        assert_eq!(rows[1].counterparty(), "F4XYZ");
        assert_eq!(rows[1].get(DATE), "2025-06-01");
        assert_eq!(rows[1].get(RST), "599");
    }

    #[test]
    fn test_missing_column_reads_empty() {
        let log = "TO STATION,DATE\nEA2AAA,2025-06-01\n";
        let rows = ContactRow::parse_log(log.as_bytes()).unwrap();
        assert_eq!(rows[0].get(MODE), "");
    }

    #[test]
    fn test_log_without_station_column_rejected() {
        let log = "CALL,DATE\nEA2AAA,2025-06-01\n";
        let err = ContactRow::parse_log(log.as_bytes()).unwrap_err();
        assert!(matches!(err, AppError::MissingInput(_)));
    }
}
