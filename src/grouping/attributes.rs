//! Secondary student attribute tables consumed by the policy rules.

use crate::error::GroupingError;

/// Categorical attributes as fixed-width one-hot rows.
///
/// # Examples
///
/// ```
/// use u_groupform::grouping::AttributeTable;
///
/// let table = AttributeTable::from_labels(&["E", "I"], &["I", "E", "E"]).unwrap();
/// assert_eq!(table.column_of("E"), Some(0));
/// assert!(table.has(1, 0));
/// assert!(!table.has(0, 0));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawAttributeTable"))]
pub struct AttributeTable {
    labels: Vec<String>,
    rows: Vec<Vec<u8>>,
}

impl AttributeTable {
    /// Builds a table from raw rows; every row must hold exactly one `1`.
    pub fn new(labels: Vec<String>, rows: Vec<Vec<u8>>) -> Result<Self, GroupingError> {
        for (i, row) in rows.iter().enumerate() {
            if row.len() != labels.len() {
                return Err(invalid(format!(
                    "attribute row {i} has {} columns, expected {}",
                    row.len(),
                    labels.len()
                )));
            }
            if row.iter().any(|&v| v > 1) || row.iter().filter(|&&v| v == 1).count() != 1 {
                return Err(invalid(format!("attribute row {i} is not one-hot")));
            }
        }
        Ok(Self { labels, rows })
    }

    /// Builds a table from one label per student.
    pub fn from_labels(labels: &[&str], assigned: &[&str]) -> Result<Self, GroupingError> {
        let rows = assigned
            .iter()
            .enumerate()
            .map(|(i, label)| {
                let column = labels
                    .iter()
                    .position(|l| l == label)
                    .ok_or_else(|| invalid(format!("student {i} has unknown label {label:?}")))?;
                let mut row = vec![0u8; labels.len()];
                row[column] = 1;
                Ok(row)
            })
            .collect::<Result<Vec<_>, GroupingError>>()?;
        Self::new(labels.iter().map(|l| l.to_string()).collect(), rows)
    }

    /// Personality-type label set `E I N S T F J P`.
    pub fn personality_labels() -> [&'static str; 8] {
        ["E", "I", "N", "S", "T", "F", "J", "P"]
    }

    pub fn students(&self) -> usize {
        self.rows.len()
    }

    pub fn width(&self) -> usize {
        self.labels.len()
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn column_of(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }

    /// Whether `student` carries the attribute in `column`.
    pub fn has(&self, student: usize, column: usize) -> bool {
        self.rows[student][column] == 1
    }
}

/// Experience levels as cumulative rows: position `p` is `1` iff the
/// student's level is at least `p + 1`.
///
/// # Examples
///
/// ```
/// use u_groupform::grouping::ExperienceTable;
///
/// let table = ExperienceTable::from_levels(&[6, 3], 8).unwrap();
/// assert_eq!(table.level(0), 6);
/// assert!(table.at_least(1, 3));
/// assert!(!table.at_least(1, 4));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawExperienceTable"))]
pub struct ExperienceTable {
    width: usize,
    rows: Vec<Vec<u8>>,
}

impl ExperienceTable {
    /// Builds a table from raw cumulative rows.
    pub fn new(rows: Vec<Vec<u8>>) -> Result<Self, GroupingError> {
        let width = rows.first().map_or(0, Vec::len);
        Self::with_width(width, rows)
    }

    fn with_width(width: usize, rows: Vec<Vec<u8>>) -> Result<Self, GroupingError> {
        for (i, row) in rows.iter().enumerate() {
            if row.len() != width {
                return Err(invalid(format!(
                    "experience row {i} has {} columns, expected {width}",
                    row.len()
                )));
            }
            if row.iter().any(|&v| v > 1) || row.windows(2).any(|w| w[0] < w[1]) {
                return Err(invalid(format!("experience row {i} is not cumulative")));
            }
        }
        Ok(Self { width, rows })
    }

    /// Builds a table of the given width from one level per student.
    pub fn from_levels(levels: &[usize], width: usize) -> Result<Self, GroupingError> {
        if let Some((i, &level)) = levels.iter().enumerate().find(|&(_, &l)| l > width) {
            return Err(invalid(format!(
                "student {i} has level {level}, table width is {width}"
            )));
        }
        let rows = levels
            .iter()
            .map(|&level| (0..width).map(|p| u8::from(p < level)).collect())
            .collect();
        Ok(Self { width, rows })
    }

    pub fn students(&self) -> usize {
        self.rows.len()
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Experience level of `student`.
    pub fn level(&self, student: usize) -> usize {
        self.rows[student].iter().filter(|&&v| v == 1).count()
    }

    /// Whether `student` has at least `level` experience. Level 0 always holds.
    pub fn at_least(&self, student: usize, level: usize) -> bool {
        level == 0 || self.rows[student].get(level - 1) == Some(&1)
    }
}

fn invalid(reason: String) -> GroupingError {
    GroupingError::InvalidPolicy { reason }
}

/// Unchecked wire form; deserialized tables are re-validated through `new`.
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RawAttributeTable {
    labels: Vec<String>,
    rows: Vec<Vec<u8>>,
}

#[cfg(feature = "serde")]
impl TryFrom<RawAttributeTable> for AttributeTable {
    type Error = GroupingError;

    fn try_from(raw: RawAttributeTable) -> Result<Self, Self::Error> {
        Self::new(raw.labels, raw.rows)
    }
}

#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RawExperienceTable {
    width: usize,
    rows: Vec<Vec<u8>>,
}

#[cfg(feature = "serde")]
impl TryFrom<RawExperienceTable> for ExperienceTable {
    type Error = GroupingError;

    fn try_from(raw: RawExperienceTable) -> Result<Self, Self::Error> {
        Self::with_width(raw.width, raw.rows)
    }
}
