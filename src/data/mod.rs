//! Passenger records and the tabular frame the pipeline transforms.
//!
//! A [`Passenger`] is one validated inference request; a [`Frame`] is the
//! named-column table the preprocessing stages operate on. Missing
//! numeric values are `f32::NAN`; missing categoricals are `None`.

use serde::{Deserialize, Serialize};

use crate::error::{LifeboatError, Result};

/// Passenger sex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    /// Female passenger
    Female,
    /// Male passenger
    Male,
}

impl Sex {
    /// Canonical lowercase label, as stored in frame columns.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Sex::Female => "female",
            Sex::Male => "male",
        }
    }

    /// Parses the canonical lowercase label.
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "female" => Ok(Sex::Female),
            "male" => Ok(Sex::Male),
            other => Err(LifeboatError::Schema {
                field: "sex".to_string(),
                message: format!("expected 'male' or 'female', got '{other}'"),
            }),
        }
    }
}

impl std::fmt::Display for Sex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who category (man/woman/child). Used only for age-imputation grouping
/// at fit time, then dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Who {
    /// Adult male
    Man,
    /// Adult female
    Woman,
    /// Child (excluded from age group statistics)
    Child,
}

impl Who {
    /// Canonical lowercase label, as stored in frame columns.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Who::Man => "man",
            Who::Woman => "woman",
            Who::Child => "child",
        }
    }
}

/// One passenger observation.
///
/// Required at inference: `pclass`, `sex`, `sibsp`, `parch`, `fare`.
/// Nullable: `age`, `deck`, `embark_town`, `embarked`. The remaining
/// fields are dropped before modeling and may be absent; `alone` is
/// derived from `sibsp + parch == 0` when not supplied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Passenger {
    /// Ordinal ship class: 1, 2 or 3
    pub pclass: u8,
    /// Passenger sex
    pub sex: Sex,
    /// Age in years; `None` triggers imputation
    #[serde(default)]
    pub age: Option<f32>,
    /// Siblings/spouses aboard
    pub sibsp: u32,
    /// Parents/children aboard
    pub parch: u32,
    /// Ticket fare
    pub fare: f32,
    /// Embarkation port code (redundant with `embark_town`, dropped)
    #[serde(default)]
    pub embarked: Option<String>,
    /// Class name ("First"/"Second"/"Third", redundant with `pclass`, dropped)
    #[serde(default, rename = "class")]
    pub class_name: Option<String>,
    /// Who category; only consulted at fit time
    #[serde(default)]
    pub who: Option<Who>,
    /// Adult-male flag (dropped before modeling)
    #[serde(default)]
    pub adult_male: Option<bool>,
    /// Cabin deck; `None` becomes the "Unknown" sentinel
    #[serde(default)]
    pub deck: Option<String>,
    /// Embarkation town; `None` triggers imputation
    #[serde(default)]
    pub embark_town: Option<String>,
    /// Label-adjacent field from the source dataset (ignored)
    #[serde(default)]
    pub alive: Option<String>,
    /// Traveling-alone flag; derived from `sibsp + parch` when absent
    #[serde(default)]
    pub alone: Option<bool>,
}

/// Fields that must be present and non-null in an inference request.
const REQUIRED_FIELDS: &[&str] = &["pclass", "sex", "sibsp", "parch", "fare"];

impl Passenger {
    /// Parses and validates a JSON request body.
    ///
    /// # Errors
    ///
    /// Returns [`LifeboatError::Schema`] for a non-object body, a missing
    /// or null required field, a type mismatch, or an out-of-domain value.
    /// Never panics on malformed input.
    pub fn from_json(body: &str) -> Result<Self> {
        let value: serde_json::Value =
            serde_json::from_str(body).map_err(|e| LifeboatError::Schema {
                field: "body".to_string(),
                message: format!("request body is not valid JSON: {e}"),
            })?;

        let obj = value.as_object().ok_or_else(|| LifeboatError::Schema {
            field: "body".to_string(),
            message: "request body must be a JSON object".to_string(),
        })?;

        for &field in REQUIRED_FIELDS {
            match obj.get(field) {
                None | Some(serde_json::Value::Null) => {
                    return Err(LifeboatError::Schema {
                        field: field.to_string(),
                        message: format!("missing required field '{field}'"),
                    });
                }
                Some(_) => {}
            }
        }

        let passenger: Passenger =
            serde_json::from_value(value).map_err(|e| LifeboatError::Schema {
                field: "body".to_string(),
                message: e.to_string(),
            })?;
        passenger.validate()?;
        Ok(passenger)
    }

    /// Validates field domains (class range, finite numerics).
    ///
    /// # Errors
    ///
    /// Returns [`LifeboatError::Schema`] on an out-of-domain value.
    pub fn validate(&self) -> Result<()> {
        if !(1..=3).contains(&self.pclass) {
            return Err(LifeboatError::Schema {
                field: "pclass".to_string(),
                message: format!("must be 1, 2 or 3, got {}", self.pclass),
            });
        }
        if !self.fare.is_finite() {
            return Err(LifeboatError::Schema {
                field: "fare".to_string(),
                message: "must be a finite number".to_string(),
            });
        }
        if let Some(age) = self.age {
            if !age.is_finite() {
                return Err(LifeboatError::Schema {
                    field: "age".to_string(),
                    message: "must be a finite number or null".to_string(),
                });
            }
        }
        Ok(())
    }

    /// The traveling-alone flag, derived from family counts when the
    /// record does not carry one.
    #[must_use]
    pub fn alone_flag(&self) -> bool {
        self.alone.unwrap_or(self.sibsp + self.parch == 0)
    }

    /// The adult-male flag, derived from `sex`/`who` when absent.
    #[must_use]
    pub fn adult_male_flag(&self) -> bool {
        self.adult_male
            .unwrap_or(self.sex == Sex::Male && self.who != Some(Who::Child))
    }
}

/// One named column of a [`Frame`].
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    /// Numeric values; missing entries are `f32::NAN`
    Float(Vec<f32>),
    /// Categorical values; missing entries are `None`
    Str(Vec<Option<String>>),
    /// Boolean flags
    Bool(Vec<bool>),
}

impl Column {
    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Column::Float(v) => v.len(),
            Column::Str(v) => v.len(),
            Column::Bool(v) => v.len(),
        }
    }

    /// True if the column has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A table of named heterogeneous columns.
///
/// # Examples
///
/// ```
/// use lifeboat::data::{Column, Frame};
///
/// let frame = Frame::new(vec![
///     ("age".to_string(), Column::Float(vec![22.0, f32::NAN])),
///     ("sex".to_string(), Column::Str(vec![
///         Some("male".to_string()),
///         Some("female".to_string()),
///     ])),
/// ]).unwrap();
/// assert_eq!(frame.n_rows(), 2);
/// assert!(frame.has_column("sex"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    columns: Vec<(String, Column)>,
    n_rows: usize,
}

impl Frame {
    /// Creates a frame from named columns.
    ///
    /// # Errors
    ///
    /// Returns an error if there are no columns, lengths differ, a name
    /// is empty, or a name is duplicated.
    pub fn new(columns: Vec<(String, Column)>) -> Result<Self> {
        if columns.is_empty() {
            return Err("Frame must have at least one column".into());
        }

        let n_rows = columns[0].1.len();
        for (name, col) in &columns {
            if col.len() != n_rows {
                return Err("All columns must have the same length".into());
            }
            if name.is_empty() {
                return Err("Column names cannot be empty".into());
            }
        }

        let mut names: Vec<&str> = columns.iter().map(|(n, _)| n.as_str()).collect();
        names.sort_unstable();
        for pair in names.windows(2) {
            if pair[0] == pair[1] {
                return Err("Duplicate column names not allowed".into());
            }
        }

        Ok(Self { columns, n_rows })
    }

    /// Builds the canonical 14-column frame from passenger records.
    ///
    /// # Errors
    ///
    /// Returns an error if `passengers` is empty.
    pub fn from_passengers(passengers: &[Passenger]) -> Result<Self> {
        if passengers.is_empty() {
            return Err("Cannot build a frame from zero records".into());
        }

        let rows = passengers;
        Self::new(vec![
            (
                "pclass".to_string(),
                Column::Float(rows.iter().map(|p| f32::from(p.pclass)).collect()),
            ),
            (
                "sex".to_string(),
                Column::Str(rows.iter().map(|p| Some(p.sex.as_str().to_string())).collect()),
            ),
            (
                "age".to_string(),
                Column::Float(rows.iter().map(|p| p.age.unwrap_or(f32::NAN)).collect()),
            ),
            (
                "sibsp".to_string(),
                Column::Float(rows.iter().map(|p| p.sibsp as f32).collect()),
            ),
            (
                "parch".to_string(),
                Column::Float(rows.iter().map(|p| p.parch as f32).collect()),
            ),
            (
                "fare".to_string(),
                Column::Float(rows.iter().map(|p| p.fare).collect()),
            ),
            (
                "embarked".to_string(),
                Column::Str(rows.iter().map(|p| p.embarked.clone()).collect()),
            ),
            (
                "class".to_string(),
                Column::Str(rows.iter().map(|p| p.class_name.clone()).collect()),
            ),
            (
                "who".to_string(),
                Column::Str(
                    rows.iter()
                        .map(|p| p.who.map(|w| w.as_str().to_string()))
                        .collect(),
                ),
            ),
            (
                "adult_male".to_string(),
                Column::Bool(rows.iter().map(Passenger::adult_male_flag).collect()),
            ),
            (
                "deck".to_string(),
                Column::Str(rows.iter().map(|p| p.deck.clone()).collect()),
            ),
            (
                "embark_town".to_string(),
                Column::Str(rows.iter().map(|p| p.embark_town.clone()).collect()),
            ),
            (
                "alive".to_string(),
                Column::Str(rows.iter().map(|p| p.alive.clone()).collect()),
            ),
            (
                "alone".to_string(),
                Column::Bool(rows.iter().map(Passenger::alone_flag).collect()),
            ),
        ])
    }

    /// Returns the number of rows.
    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// Returns the number of columns.
    #[must_use]
    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    /// Returns the column names in order.
    #[must_use]
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// True if a column with this name exists.
    #[must_use]
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|(n, _)| n == name)
    }

    /// Returns a column by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the column doesn't exist.
    pub fn column(&self, name: &str) -> Result<&Column> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, c)| c)
            .ok_or_else(|| LifeboatError::Other(format!("Column '{name}' not found")))
    }

    /// Returns a numeric column's values.
    ///
    /// # Errors
    ///
    /// Returns an error if the column is missing or not numeric.
    pub fn float_column(&self, name: &str) -> Result<&[f32]> {
        match self.column(name)? {
            Column::Float(v) => Ok(v),
            _ => Err(LifeboatError::Other(format!(
                "Column '{name}' is not numeric"
            ))),
        }
    }

    /// Returns a categorical column's values.
    ///
    /// # Errors
    ///
    /// Returns an error if the column is missing or not categorical.
    pub fn str_column(&self, name: &str) -> Result<&[Option<String>]> {
        match self.column(name)? {
            Column::Str(v) => Ok(v),
            _ => Err(LifeboatError::Other(format!(
                "Column '{name}' is not categorical"
            ))),
        }
    }

    /// Returns a boolean column's values.
    ///
    /// # Errors
    ///
    /// Returns an error if the column is missing or not boolean.
    pub fn bool_column(&self, name: &str) -> Result<&[bool]> {
        match self.column(name)? {
            Column::Bool(v) => Ok(v),
            _ => Err(LifeboatError::Other(format!(
                "Column '{name}' is not boolean"
            ))),
        }
    }

    /// Replaces an existing column, keeping its position.
    ///
    /// # Errors
    ///
    /// Returns an error if the column doesn't exist or lengths differ.
    pub fn replace_column(&mut self, name: &str, column: Column) -> Result<()> {
        if column.len() != self.n_rows {
            return Err("Replacement column length mismatch".into());
        }
        let slot = self
            .columns
            .iter_mut()
            .find(|(n, _)| n == name)
            .ok_or_else(|| LifeboatError::Other(format!("Column '{name}' not found")))?;
        slot.1 = column;
        Ok(())
    }

    /// Returns a new frame without the named columns.
    ///
    /// # Errors
    ///
    /// Returns an error if any named column is absent, or if dropping
    /// would leave the frame empty.
    pub fn drop_columns(&self, names: &[&str]) -> Result<Self> {
        for &name in names {
            if !self.has_column(name) {
                return Err(LifeboatError::Other(format!(
                    "Cannot drop missing column '{name}'"
                )));
            }
        }
        let kept: Vec<(String, Column)> = self
            .columns
            .iter()
            .filter(|(n, _)| !names.contains(&n.as_str()))
            .cloned()
            .collect();
        if kept.is_empty() {
            return Err("Dropping all columns would leave an empty frame".into());
        }
        Ok(Self {
            columns: kept,
            n_rows: self.n_rows,
        })
    }

    /// Returns a new frame containing the given rows, in index order.
    ///
    /// # Errors
    ///
    /// Returns an error if any index is out of bounds.
    pub fn take_rows(&self, indices: &[usize]) -> Result<Self> {
        if let Some(&bad) = indices.iter().find(|&&i| i >= self.n_rows) {
            return Err(LifeboatError::Other(format!(
                "Row index {bad} out of bounds for {} rows",
                self.n_rows
            )));
        }
        let columns = self
            .columns
            .iter()
            .map(|(name, col)| {
                let taken = match col {
                    Column::Float(v) => Column::Float(indices.iter().map(|&i| v[i]).collect()),
                    Column::Str(v) => {
                        Column::Str(indices.iter().map(|&i| v[i].clone()).collect())
                    }
                    Column::Bool(v) => Column::Bool(indices.iter().map(|&i| v[i]).collect()),
                };
                (name.clone(), taken)
            })
            .collect();
        Ok(Self {
            columns,
            n_rows: indices.len(),
        })
    }
}
