use std::path::Path;

use csv::{ReaderBuilder, StringRecord};

use crate::input::columns::{ColumnMap, resolve_columns};
use crate::input::{InputError, Subgroup, open_maybe_gz};

/// One measured record from the input export.
#[derive(Debug, Clone)]
pub struct Observation {
    pub subject: String,
    pub study: String,
    pub part: String,
    pub compartment: String,
    pub dose: String,
    pub nominal_time_hr: f64,
    pub profile_day: i64,
    pub visit: String,
    pub treatment: String,
    pub subgroup: Subgroup,
    pub value: f64,
}

pub fn load_observations(path: &Path) -> Result<Vec<Observation>, InputError> {
    if !path.exists() {
        return Err(InputError::MissingInput(format!(
            "input file {} not found",
            path.display()
        )));
    }

    let reader = open_maybe_gz(path)?;
    let mut csv_reader = ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let columns = resolve_columns(&headers)?;

    let mut out = Vec::new();
    for (idx, record) in csv_reader.records().enumerate() {
        let record = record?;
        // Header is line 1.
        let line = idx + 2;
        out.push(parse_record(&record, &columns, line)?);
    }

    if out.is_empty() {
        return Err(InputError::Empty("input file has no data rows".to_string()));
    }

    tracing::info!(rows = out.len(), path = %path.display(), "loaded observations");
    Ok(out)
}

fn parse_record(
    record: &StringRecord,
    columns: &ColumnMap,
    line: usize,
) -> Result<Observation, InputError> {
    Ok(Observation {
        subject: require_field(record, columns.subject, "subject", line)?,
        study: require_field(record, columns.study, "study", line)?,
        part: require_field(record, columns.part, "part", line)?,
        compartment: require_field(record, columns.compartment, "compartment", line)?,
        dose: require_field(record, columns.dose, "dose", line)?,
        nominal_time_hr: parse_f64(record, columns.nominal_time, "nominal_time", line)?,
        profile_day: parse_i64(record, columns.profile_day, "profile_day", line)?,
        visit: require_field(record, columns.visit, "visit", line)?,
        treatment: require_field(record, columns.treatment, "treatment", line)?,
        subgroup: parse_subgroup(record, columns.subgroup, line)?,
        value: parse_f64(record, columns.value, "value", line)?,
    })
}

fn require_field(
    record: &StringRecord,
    idx: usize,
    column: &str,
    line: usize,
) -> Result<String, InputError> {
    let raw = record.get(idx).unwrap_or("").trim();
    if raw.is_empty() {
        return Err(InputError::InvalidField {
            line,
            column: column.to_string(),
            message: "field is empty".to_string(),
        });
    }
    Ok(raw.to_string())
}

fn parse_f64(
    record: &StringRecord,
    idx: usize,
    column: &str,
    line: usize,
) -> Result<f64, InputError> {
    let raw = require_field(record, idx, column, line)?;
    let value = raw.parse::<f64>().map_err(|_| InputError::InvalidField {
        line,
        column: column.to_string(),
        message: format!("cannot parse {raw:?} as a number"),
    })?;
    if !value.is_finite() {
        return Err(InputError::InvalidField {
            line,
            column: column.to_string(),
            message: format!("non-finite value {raw:?}"),
        });
    }
    Ok(value)
}

fn parse_i64(
    record: &StringRecord,
    idx: usize,
    column: &str,
    line: usize,
) -> Result<i64, InputError> {
    let raw = require_field(record, idx, column, line)?;
    raw.parse::<i64>().map_err(|_| InputError::InvalidField {
        line,
        column: column.to_string(),
        message: format!("cannot parse {raw:?} as an integer"),
    })
}

fn parse_subgroup(record: &StringRecord, idx: usize, line: usize) -> Result<Subgroup, InputError> {
    let raw = require_field(record, idx, "subgroup", line)?;
    match raw.to_ascii_lowercase().as_str() {
        "0" | "negative" => Ok(Subgroup::Negative),
        "1" | "positive" => Ok(Subgroup::Positive),
        other => Err(InputError::InvalidField {
            line,
            column: "subgroup".to_string(),
            message: format!("expected 0/1, got {other:?}"),
        }),
    }
}
