//! Titanic CSV loading for the trainer.
//!
//! Reads the seaborn-format dataset the companion trainer consumes:
//! a `survived` label column plus the 14 feature columns. Empty fields
//! are missing values; booleans are `True`/`False`. The file contains
//! no quoted separators, so parsing is line-oriented.

use std::fs;
use std::path::Path;

use crate::data::{Column, Frame};
use crate::error::{LifeboatError, Result};

/// Columns the loader expects in the header, label first.
const LABEL_COLUMN: &str = "survived";

const FLOAT_COLUMNS: &[&str] = &["pclass", "age", "sibsp", "parch", "fare"];
const STR_COLUMNS: &[&str] = &[
    "sex",
    "embarked",
    "class",
    "who",
    "deck",
    "embark_town",
    "alive",
];
const BOOL_COLUMNS: &[&str] = &["adult_male", "alone"];

/// Loads a Titanic CSV into a feature frame and label vector.
///
/// # Errors
///
/// Returns `Io` if the file is unreadable and `Format` for a missing
/// header column, a ragged row, or an unparsable value.
pub fn load_titanic_csv<P: AsRef<Path>>(path: P) -> Result<(Frame, Vec<usize>)> {
    let text = fs::read_to_string(path)?;
    let mut lines = text.lines().enumerate();

    let (_, header) = lines.next().ok_or_else(|| LifeboatError::Format {
        message: "dataset file is empty".to_string(),
    })?;
    let header: Vec<&str> = header.split(',').map(str::trim).collect();

    let index_of = |name: &str| -> Result<usize> {
        header
            .iter()
            .position(|&h| h == name)
            .ok_or_else(|| LifeboatError::Format {
                message: format!("dataset header is missing column '{name}'"),
            })
    };

    let label_idx = index_of(LABEL_COLUMN)?;
    let float_idx: Vec<usize> = FLOAT_COLUMNS
        .iter()
        .map(|&n| index_of(n))
        .collect::<Result<_>>()?;
    let str_idx: Vec<usize> = STR_COLUMNS
        .iter()
        .map(|&n| index_of(n))
        .collect::<Result<_>>()?;
    let bool_idx: Vec<usize> = BOOL_COLUMNS
        .iter()
        .map(|&n| index_of(n))
        .collect::<Result<_>>()?;

    let mut labels = Vec::new();
    let mut floats: Vec<Vec<f32>> = vec![Vec::new(); FLOAT_COLUMNS.len()];
    let mut strs: Vec<Vec<Option<String>>> = vec![Vec::new(); STR_COLUMNS.len()];
    let mut bools: Vec<Vec<bool>> = vec![Vec::new(); BOOL_COLUMNS.len()];

    for (lineno, line) in lines {
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() != header.len() {
            return Err(LifeboatError::Format {
                message: format!(
                    "line {}: expected {} fields, got {}",
                    lineno + 1,
                    header.len(),
                    fields.len()
                ),
            });
        }

        labels.push(parse_label(fields[label_idx], lineno)?);
        for (slot, &idx) in floats.iter_mut().zip(&float_idx) {
            slot.push(parse_float(fields[idx], header[idx], lineno)?);
        }
        for (slot, &idx) in strs.iter_mut().zip(&str_idx) {
            let field = fields[idx];
            slot.push(if field.is_empty() {
                None
            } else {
                Some(field.to_string())
            });
        }
        for (slot, &idx) in bools.iter_mut().zip(&bool_idx) {
            slot.push(parse_bool(fields[idx], header[idx], lineno)?);
        }
    }

    if labels.is_empty() {
        return Err(LifeboatError::Format {
            message: "dataset has a header but no rows".to_string(),
        });
    }

    let mut columns: Vec<(String, Column)> = Vec::new();
    for (name, values) in FLOAT_COLUMNS.iter().zip(floats) {
        columns.push(((*name).to_string(), Column::Float(values)));
    }
    for (name, values) in STR_COLUMNS.iter().zip(strs) {
        columns.push(((*name).to_string(), Column::Str(values)));
    }
    for (name, values) in BOOL_COLUMNS.iter().zip(bools) {
        columns.push(((*name).to_string(), Column::Bool(values)));
    }

    Ok((Frame::new(columns)?, labels))
}

fn parse_label(field: &str, lineno: usize) -> Result<usize> {
    match field {
        "0" => Ok(0),
        "1" => Ok(1),
        other => Err(LifeboatError::Format {
            message: format!("line {}: survived must be 0 or 1, got '{other}'", lineno + 1),
        }),
    }
}

fn parse_float(field: &str, column: &str, lineno: usize) -> Result<f32> {
    if field.is_empty() {
        return Ok(f32::NAN);
    }
    field.parse().map_err(|_| LifeboatError::Format {
        message: format!("line {}: '{column}' is not numeric: '{field}'", lineno + 1),
    })
}

fn parse_bool(field: &str, column: &str, lineno: usize) -> Result<bool> {
    match field {
        "True" | "true" => Ok(true),
        "False" | "false" => Ok(false),
        other => Err(LifeboatError::Format {
            message: format!(
                "line {}: '{column}' is not a boolean: '{other}'",
                lineno + 1
            ),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = "\
survived,pclass,sex,age,sibsp,parch,fare,embarked,class,who,adult_male,deck,embark_town,alive,alone
0,3,male,22.0,1,0,7.25,S,Third,man,True,,Southampton,no,False
1,1,female,38.0,1,0,71.2833,C,First,woman,False,C,Cherbourg,yes,False
1,3,female,,0,0,7.925,S,Third,woman,False,,Southampton,yes,True
";

    fn write_sample(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(content.as_bytes()).expect("write");
        file
    }

    #[test]
    fn test_load_sample_csv() {
        let file = write_sample(SAMPLE);
        let (frame, labels) = load_titanic_csv(file.path()).expect("load");
        assert_eq!(labels, vec![0, 1, 1]);
        assert_eq!(frame.n_rows(), 3);

        let ages = frame.float_column("age").expect("age");
        assert_eq!(ages[0], 22.0);
        assert!(ages[2].is_nan());

        let decks = frame.str_column("deck").expect("deck");
        assert!(decks[0].is_none());
        assert_eq!(decks[1].as_deref(), Some("C"));

        let alone = frame.bool_column("alone").expect("alone");
        assert_eq!(alone, &[false, false, true]);
    }

    #[test]
    fn test_load_rejects_missing_column() {
        let file = write_sample("survived,pclass\n0,3\n");
        assert!(matches!(
            load_titanic_csv(file.path()),
            Err(LifeboatError::Format { .. })
        ));
    }

    #[test]
    fn test_load_rejects_ragged_row() {
        let mut truncated = String::from(SAMPLE);
        truncated.push_str("1,1,female\n");
        let file = write_sample(&truncated);
        assert!(matches!(
            load_titanic_csv(file.path()),
            Err(LifeboatError::Format { .. })
        ));
    }

    #[test]
    fn test_load_rejects_bad_label() {
        let bad = SAMPLE.replace("0,3,male", "2,3,male");
        let file = write_sample(&bad);
        assert!(matches!(
            load_titanic_csv(file.path()),
            Err(LifeboatError::Format { .. })
        ));
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        assert!(matches!(
            load_titanic_csv("/nonexistent/titanic.csv"),
            Err(LifeboatError::Io(_))
        ));
    }
}
