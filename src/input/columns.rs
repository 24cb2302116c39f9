use csv::StringRecord;

use crate::input::InputError;

/// Resolved indices of the required columns in the input header.
#[derive(Debug, Clone)]
pub struct ColumnMap {
    pub subject: usize,
    pub study: usize,
    pub part: usize,
    pub compartment: usize,
    pub dose: usize,
    pub nominal_time: usize,
    pub profile_day: usize,
    pub visit: usize,
    pub treatment: usize,
    pub subgroup: usize,
    pub value: usize,
}

struct ColumnSpec {
    canonical: &'static str,
    aliases: &'static [&'static str],
}

const COLUMNS: &[ColumnSpec] = &[
    ColumnSpec {
        canonical: "subject",
        aliases: &["subject", "subject_id", "usubjid"],
    },
    ColumnSpec {
        canonical: "study",
        aliases: &["study", "study_id", "studyid"],
    },
    ColumnSpec {
        canonical: "part",
        aliases: &["part", "study_part"],
    },
    ColumnSpec {
        canonical: "compartment",
        aliases: &["compartment", "cmt"],
    },
    ColumnSpec {
        canonical: "dose",
        aliases: &["dose", "dose_level"],
    },
    ColumnSpec {
        canonical: "nominal_time",
        aliases: &["nominal_time", "nominal_time_hr", "time_hr"],
    },
    ColumnSpec {
        canonical: "profile_day",
        aliases: &["profile_day", "profday", "day"],
    },
    ColumnSpec {
        canonical: "visit",
        aliases: &["visit", "visit_label", "avisit"],
    },
    ColumnSpec {
        canonical: "treatment",
        aliases: &["treatment", "arm", "trt"],
    },
    ColumnSpec {
        canonical: "subgroup",
        aliases: &["subgroup", "marker", "biomarker"],
    },
    ColumnSpec {
        canonical: "value",
        aliases: &["value", "aval", "result"],
    },
];

pub fn resolve_columns(headers: &StringRecord) -> Result<ColumnMap, InputError> {
    let lower: Vec<String> = headers
        .iter()
        .map(|h| h.trim().to_ascii_lowercase())
        .collect();

    let mut resolved = Vec::with_capacity(COLUMNS.len());
    for spec in COLUMNS {
        let idx = lower
            .iter()
            .position(|name| spec.aliases.iter().any(|&a| a == name.as_str()))
            .ok_or_else(|| InputError::MissingColumn(spec.canonical.to_string()))?;
        resolved.push(idx);
    }

    Ok(ColumnMap {
        subject: resolved[0],
        study: resolved[1],
        part: resolved[2],
        compartment: resolved[3],
        dose: resolved[4],
        nominal_time: resolved[5],
        profile_day: resolved[6],
        visit: resolved[7],
        treatment: resolved[8],
        subgroup: resolved[9],
        value: resolved[10],
    })
}
