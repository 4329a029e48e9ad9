//! Reads the applicant CSV uploaded alongside a job listing.

use csv::{ReaderBuilder, Trim};
use serde::Deserialize;
use thiserror::Error;

use crate::models::applicant::RawApplicant;

pub const REQUIRED_COLUMNS: [&str; 5] = [
    "Name",
    "Email",
    "LinkedIn",
    "Phone Number",
    "Resume Link(PDF)",
];

#[derive(Debug, Error)]
pub enum CsvError {
    #[error("CSV is missing required column(s): {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("CSV contains no applicant rows")]
    Empty,

    #[error("Malformed CSV: {0}")]
    Malformed(#[from] csv::Error),
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Email")]
    email: String,
    #[serde(rename = "LinkedIn")]
    linkedin: String,
    #[serde(rename = "Phone Number")]
    phone: String,
    #[serde(rename = "Resume Link(PDF)")]
    resume_link: String,
}

impl From<CsvRow> for RawApplicant {
    fn from(row: CsvRow) -> Self {
        RawApplicant {
            name: row.name,
            email: row.email,
            linkedin: row.linkedin,
            phone: row.phone,
            resume_link: row.resume_link,
        }
    }
}

/// Parses applicant rows in file order. Extra columns are ignored.
pub fn read_applicants(data: &[u8]) -> Result<Vec<RawApplicant>, CsvError> {
    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(false)
        .from_reader(data);

    let headers = reader.headers()?.clone();
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|col| !headers.iter().any(|h| h == **col))
        .map(|col| col.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(CsvError::MissingColumns(missing));
    }

    let applicants = reader
        .deserialize::<CsvRow>()
        .map(|row| row.map(RawApplicant::from))
        .collect::<Result<Vec<_>, _>>()?;

    if applicants.is_empty() {
        return Err(CsvError::Empty);
    }
    Ok(applicants)
}
