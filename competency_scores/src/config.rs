// ********* Input data structures ***********

use std::collections::BTreeMap;
use std::fmt::Display;

use crate::answers::LikertScale;

/// One cell of a decoded survey export.
#[derive(PartialEq, Debug, Clone)]
pub enum Cell {
    Text(String),
    Number(f64),
    Empty,
}

static EMPTY_CELL: Cell = Cell::Empty;

impl Cell {
    /// True for empty cells and for text that only contains whitespace.
    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Text(s) => s.trim().is_empty(),
            Cell::Number(_) => false,
            Cell::Empty => true,
        }
    }

    /// The trimmed textual content of the cell, if there is any.
    ///
    /// Whole numbers are rendered without a fractional part, so an identity
    /// column holding employee numbers reads back as `"1042"`.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Cell::Text(s) if s.trim().is_empty() => None,
            Cell::Text(s) => Some(s.trim().to_string()),
            Cell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => Some(format!("{}", *n as i64)),
            Cell::Number(n) => Some(n.to_string()),
            Cell::Empty => None,
        }
    }

    /// The cell as it was written, used for raw answers and error messages.
    pub fn literal(&self) -> String {
        match self {
            Cell::Text(s) => s.clone(),
            Cell::Empty => String::new(),
            n => n.as_text().unwrap_or_default(),
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        if s.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(s.to_string())
        }
    }
}

/// A wide table as handed over by the file readers: one header per column
/// and one row per reviewer submission.
///
/// Rows may be shorter than the header; missing trailing cells read as empty.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Cell>>) -> RawTable {
        RawTable { headers, rows }
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&EMPTY_CELL)
    }

    pub fn column_values(&self, col: usize) -> impl Iterator<Item = &Cell> + '_ {
        (0..self.rows.len()).map(move |row| self.cell(row, col))
    }

    /// Rows with at least one non-blank cell.
    pub fn num_data_rows(&self) -> usize {
        self.rows
            .iter()
            .filter(|r| r.iter().any(|c| !c.is_blank()))
            .count()
    }
}

// ******** Classification *********

/// What a column of the export is used for.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub enum ColumnRole {
    /// Who filled in the form.
    Reviewer,
    /// Who the form is about.
    Subject,
    /// A Likert question belonging to a competency category.
    /// The question is the bracketed text after the category, when the header has one.
    Competency {
        category: String,
        question: Option<String>,
    },
    Ignored,
}

/// The role of every column of a table, in header order.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct ColumnClassification {
    pub columns: Vec<(String, ColumnRole)>,
}

impl ColumnClassification {
    pub fn reviewer_column(&self) -> Option<usize> {
        self.columns
            .iter()
            .position(|(_, role)| *role == ColumnRole::Reviewer)
    }

    pub fn subject_column(&self) -> Option<usize> {
        self.columns
            .iter()
            .position(|(_, role)| *role == ColumnRole::Subject)
    }

    /// (column index, category) for every competency column.
    pub fn competency_columns(&self) -> Vec<(usize, &str)> {
        self.columns
            .iter()
            .enumerate()
            .filter_map(|(idx, (_, role))| match role {
                ColumnRole::Competency { category, .. } => Some((idx, category.as_str())),
                _ => None,
            })
            .collect()
    }

    pub fn header(&self, col: usize) -> &str {
        self.columns
            .get(col)
            .map(|(h, _)| h.as_str())
            .unwrap_or_default()
    }
}

// ******** Long format *********

/// Whether the reviewer is (presumably) rating themselves.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum Relationship {
    SelfReview,
    Peer,
}

impl Relationship {
    pub fn as_str(&self) -> &'static str {
        match self {
            Relationship::SelfReview => "self",
            Relationship::Peer => "peer",
        }
    }
}

impl Display for Relationship {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One answer of one reviewer about one subject, in long format.
/// A record without a score ("no opinion") is kept but never aggregated.
#[derive(PartialEq, Debug, Clone)]
pub struct FeedbackRecord {
    pub reviewer: String,
    pub subject: String,
    pub category: String,
    pub raw_answer: String,
    pub score: Option<u32>,
    pub relationship: Relationship,
}

// ******** Output data structures *********

#[derive(PartialEq, Debug, Clone, Copy)]
pub struct RelationshipScore {
    pub mean: f64,
    pub count: usize,
}

/// The aggregated score of one subject for one competency category.
#[derive(PartialEq, Debug, Clone)]
pub struct PersonCompetencyScore {
    pub subject: String,
    pub category: String,
    pub mean: f64,
    pub response_count: usize,
    /// Not defined below two responses, which is different from a zero spread.
    pub std_dev: Option<f64>,
    pub by_relationship: BTreeMap<Relationship, RelationshipScore>,
    /// The valid scores behind the mean.
    pub scores: Vec<u32>,
}

#[derive(PartialEq, Debug, Clone)]
pub struct TeamCompetencyAverage {
    pub category: String,
    pub mean: f64,
}

/// The structural problems found in a table. Empty means acceptable.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct ValidationReport {
    issues: Vec<String>,
}

impl ValidationReport {
    pub fn push(&mut self, issue: String) {
        self.issues.push(issue);
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn issues(&self) -> &[String] {
        &self.issues
    }
}

impl Display for ValidationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.issues.join("; "))
    }
}

/// Counters reported next to the scores of one run.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct ProcessingSummary {
    pub rows_read: usize,
    pub rows_skipped: usize,
    pub records_valid: usize,
    pub records_no_opinion: usize,
    pub subjects_found: usize,
    pub categories_found: usize,
    pub warnings: Vec<String>,
}

// ********* Configuration **********

pub const DEFAULT_MIN_COMPETENCY_COLUMNS: usize = 5;

/// Matches `**CATEGORY - question** [sub-question]`.
pub const DEFAULT_MARKER_PATTERN: &str =
    r"\*\*\s*(?P<label>[^*]+?)\s*\*\*(?:\s*\[(?P<question>[^\]]*)\])?";

pub const DEFAULT_CATEGORY_SEPARATOR: &str = " - ";

/// Category labels that are known to be one logical competency.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct CategoryAlias {
    pub logical: String,
    pub variants: Vec<String>,
}

#[derive(PartialEq, Debug, Clone)]
pub struct ProcessingRules {
    pub reviewer_headers: Vec<String>,
    pub subject_headers: Vec<String>,
    pub marker_pattern: String,
    pub category_separator: String,
    pub min_competency_columns: usize,
    pub scale: LikertScale,
    pub category_aliases: Vec<CategoryAlias>,
    /// A fragment shared by several labels makes them one competency, named after the fragment.
    pub merge_keywords: Vec<String>,
}

impl Default for ProcessingRules {
    fn default() -> Self {
        let to_vec = |xs: &[&str]| xs.iter().map(|s| s.to_string()).collect::<Vec<String>>();
        ProcessingRules {
            reviewer_headers: to_vec(&[
                "Wie ben jij?",
                "Reviewer",
                "Beoordelaar",
                "Who are you?",
                "Your name",
            ]),
            subject_headers: to_vec(&[
                "Voor welke collega vul je dit formulier in?",
                "Subject",
                "Persoon",
                "Colleague",
                "Which colleague is this feedback for?",
            ]),
            marker_pattern: DEFAULT_MARKER_PATTERN.to_string(),
            category_separator: DEFAULT_CATEGORY_SEPARATOR.to_string(),
            min_competency_columns: DEFAULT_MIN_COMPETENCY_COLUMNS,
            scale: LikertScale::four_point(),
            category_aliases: Vec::new(),
            merge_keywords: to_vec(&["KLANTGERICHTHEID"]),
        }
    }
}
