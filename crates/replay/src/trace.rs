//! Recorded trace format
//!
//! One frame per line as `ear,mar`. Blank lines, `#` comments and an
//! `ear,mar` header are skipped. A line containing `-` or `none` marks a frame
//! in which no face was detected.

use drowsiness::FrameSignal;
use thiserror::Error;

/// Trace parsing errors
#[derive(Debug, Error, PartialEq)]
pub enum TraceError {
    #[error("line {line}: expected `ear,mar`, got {content:?}")]
    Malformed { line: usize, content: String },

    #[error("line {line}: invalid {field} value {value:?}")]
    InvalidNumber {
        line: usize,
        field: &'static str,
        value: String,
    },
}

/// One recorded frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TraceRecord {
    Face(FrameSignal),
    NoFace,
}

impl TraceRecord {
    pub fn signal(&self) -> Option<FrameSignal> {
        match self {
            TraceRecord::Face(signal) => Some(*signal),
            TraceRecord::NoFace => None,
        }
    }
}

/// Parse one trace line. `Ok(None)` for lines that carry no frame.
pub fn parse_line(line: &str, line_number: usize) -> Result<Option<TraceRecord>, TraceError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    if line == "-" || line.eq_ignore_ascii_case("none") {
        return Ok(Some(TraceRecord::NoFace));
    }

    let mut fields = line.split(',').map(str::trim);
    let (ear, mar) = match (fields.next(), fields.next(), fields.next()) {
        (Some(ear), Some(mar), None) => (ear, mar),
        _ => {
            return Err(TraceError::Malformed {
                line: line_number,
                content: line.to_string(),
            })
        }
    };

    if ear.eq_ignore_ascii_case("ear") && mar.eq_ignore_ascii_case("mar") {
        return Ok(None);
    }

    let ear = parse_field(ear, "ear", line_number)?;
    let mar = parse_field(mar, "mar", line_number)?;
    Ok(Some(TraceRecord::Face(FrameSignal::new(ear, mar))))
}

fn parse_field(value: &str, field: &'static str, line: usize) -> Result<f64, TraceError> {
    match value.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(TraceError::InvalidNumber {
            line,
            field,
            value: value.to_string(),
        }),
    }
}
