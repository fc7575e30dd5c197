//! Parser for World Magnetic Model `.COF` coefficient tables.
//!
//! The format is a header line `epoch model-name release-date` followed by
//! one row per Gauss coefficient pair:
//!
//! ```text
//!     2025.0            WMM-2025     11/13/2024
//!   1  0  -29351.8       0.0       12.0        0.0
//!   ...
//! 999999999999999999999999999999999999999999999999
//! ```
//!
//! The table ends at a line made only of `9`s or at end of input.

use std::path::PathBuf;

use thiserror::Error;

/// Highest spherical harmonic degree supported.
pub const MAX_DEGREE: usize = 12;

/// Errors loading a coefficient table.
#[derive(Debug, Error)]
pub enum MagneticModelError {
    #[error("Coefficient table is empty")]
    MissingHeader,

    #[error("Invalid coefficient header on line {line}: {reason}")]
    InvalidHeader { line: usize, reason: String },

    #[error("Invalid coefficient row on line {line}: {reason}")]
    InvalidRow { line: usize, reason: String },

    #[error("Coefficient n={n} m={m} on line {line} is outside degree {max}", max = MAX_DEGREE)]
    DegreeOutOfRange { line: usize, n: usize, m: usize },

    #[error("Coefficient table is missing {missing} of the required rows")]
    Incomplete { missing: usize },

    #[error("Failed to read coefficient file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// One row of the table: main field and secular variation for `(n, m)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoefficientRow {
    pub n: usize,
    pub m: usize,
    /// Main field g coefficient (nT).
    pub gnm: f64,
    /// Main field h coefficient (nT).
    pub hnm: f64,
    /// Secular variation of g (nT/year).
    pub dgnm: f64,
    /// Secular variation of h (nT/year).
    pub dhnm: f64,
}

/// A parsed coefficient table.
#[derive(Debug, Clone, PartialEq)]
pub struct CoefficientTable {
    pub epoch: f64,
    pub model_name: String,
    pub release_date: String,
    pub rows: Vec<CoefficientRow>,
}

impl CoefficientTable {
    /// Parse a `.COF` table.
    pub fn parse(input: &str) -> Result<Self, MagneticModelError> {
        let mut lines = input
            .lines()
            .enumerate()
            .map(|(index, line)| (index + 1, line.trim()))
            .filter(|(_, line)| !line.is_empty());

        let (header_line, header) = lines.next().ok_or(MagneticModelError::MissingHeader)?;
        let mut header_tokens = header.split_whitespace();
        let epoch = header_tokens
            .next()
            .and_then(|token| token.parse::<f64>().ok())
            .filter(|epoch| epoch.is_finite())
            .ok_or_else(|| MagneticModelError::InvalidHeader {
                line: header_line,
                reason: format!("expected a numeric epoch, found '{header}'"),
            })?;
        let model_name = header_tokens.next().unwrap_or_default().to_string();
        let release_date = header_tokens.next().unwrap_or_default().to_string();

        let mut rows = Vec::new();
        let mut seen = [[false; MAX_DEGREE + 1]; MAX_DEGREE + 1];

        for (line_number, line) in lines {
            if line.chars().all(|c| c == '9') {
                break;
            }
            let row = parse_row(line_number, line)?;
            if row.n == 0 || row.n > MAX_DEGREE || row.m > row.n {
                return Err(MagneticModelError::DegreeOutOfRange {
                    line: line_number,
                    n: row.n,
                    m: row.m,
                });
            }
            seen[row.n][row.m] = true;
            rows.push(row);
        }

        let missing = (1..=MAX_DEGREE)
            .flat_map(|n| (0..=n).map(move |m| (n, m)))
            .filter(|&(n, m)| !seen[n][m])
            .count();
        if missing > 0 {
            return Err(MagneticModelError::Incomplete { missing });
        }

        Ok(Self {
            epoch,
            model_name,
            release_date,
            rows,
        })
    }
}

fn parse_row(line: usize, text: &str) -> Result<CoefficientRow, MagneticModelError> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    if tokens.len() != 6 {
        return Err(MagneticModelError::InvalidRow {
            line,
            reason: format!("expected 6 columns, found {}", tokens.len()),
        });
    }

    let index = |i: usize| {
        tokens[i]
            .parse::<usize>()
            .map_err(|_| MagneticModelError::InvalidRow {
                line,
                reason: format!("'{}' is not a degree/order", tokens[i]),
            })
    };
    let value = |i: usize| {
        tokens[i]
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| MagneticModelError::InvalidRow {
                line,
                reason: format!("'{}' is not a number", tokens[i]),
            })
    };

    Ok(CoefficientRow {
        n: index(0)?,
        m: index(1)?,
        gnm: value(2)?,
        hnm: value(3)?,
        dgnm: value(4)?,
        dhnm: value(5)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const BUNDLED: &str = include_str!("../../data/WMM.COF");

    #[test]
    fn test_parse_bundled_table() {
        let table = CoefficientTable::parse(BUNDLED).unwrap();
        assert_eq!(table.epoch, 2025.0);
        assert_eq!(table.model_name, "WMM-2025");
        assert_eq!(table.rows.len(), 90);
        assert_eq!(table.rows[0].n, 1);
        assert_eq!(table.rows[0].gnm, -29351.8);
    }

    #[test]
    fn test_empty_input() {
        assert!(matches!(
            CoefficientTable::parse("\n\n"),
            Err(MagneticModelError::MissingHeader)
        ));
    }

    #[test]
    fn test_non_numeric_epoch() {
        let result = CoefficientTable::parse("WMM-2025 2025.0\n");
        assert!(matches!(
            result,
            Err(MagneticModelError::InvalidHeader { line: 1, .. })
        ));
    }

    #[test]
    fn test_wrong_column_count() {
        let input = "2025.0 WMM-2025 11/13/2024\n  1  0  -29351.8  0.0  12.0\n";
        let result = CoefficientTable::parse(input);
        assert!(matches!(result, Err(MagneticModelError::InvalidRow { line: 2, .. })));
    }

    #[test]
    fn test_non_numeric_value() {
        let input = "2025.0 WMM-2025 11/13/2024\n  1  0  abc  0.0  6.7  0.0\n";
        let result = CoefficientTable::parse(input);
        assert!(matches!(result, Err(MagneticModelError::InvalidRow { line: 2, .. })));
    }

    #[test]
    fn test_order_above_degree() {
        let input = "2025.0 WMM-2025 11/13/2024\n  2  3  1.0  0.0  0.0  0.0\n";
        let result = CoefficientTable::parse(input);
        assert!(matches!(
            result,
            Err(MagneticModelError::DegreeOutOfRange { n: 2, m: 3, .. })
        ));
    }

    #[test]
    fn test_truncated_table_is_incomplete() {
        let truncated: String = BUNDLED.lines().take(50).collect::<Vec<_>>().join("\n");
        let result = CoefficientTable::parse(&truncated);
        assert!(matches!(result, Err(MagneticModelError::Incomplete { missing: 41 })));
    }

    #[test]
    fn test_rows_after_terminator_are_ignored() {
        let input = format!("{BUNDLED}\nnot a row\n");
        assert!(CoefficientTable::parse(&input).is_ok());
    }
}
