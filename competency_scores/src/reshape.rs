use log::{debug, info};
use snafu::prelude::*;

use crate::answers::{Answer, AnswerScoreMapper};
use crate::normalize::normalize_name;
use crate::validation::check_identity_columns;
use crate::*;

/// The long-format records of a table.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct Reshaped {
    pub records: Vec<FeedbackRecord>,
    pub rows_read: usize,
    /// Rows without a reviewer or a subject.
    pub rows_skipped: usize,
}

/// Guesses whether a reviewer rated themselves.
///
/// There is no explicit relationship column in the exports, so a reviewer
/// whose name contains the subject's name (or the reverse) is taken to be the
/// subject. Partial-name collisions ("Jan" and "Jansen") are misread as self
/// reviews.
pub fn infer_relationship(reviewer: &str, subject: &str) -> Relationship {
    let r = normalize_name(reviewer);
    let s = normalize_name(subject);
    if !r.is_empty() && !s.is_empty() && (r.contains(&s) || s.contains(&r)) {
        Relationship::SelfReview
    } else {
        Relationship::Peer
    }
}

/// Turns every (row, competency column) pair into one record.
///
/// Fails on the first answer that is not part of the vocabulary.
pub fn reshape(
    table: &RawTable,
    classification: &ColumnClassification,
    mapper: &AnswerScoreMapper,
    rules: &ProcessingRules,
) -> PipelineResult<Reshaped> {
    let (reviewer_col, subject_col) =
        match (classification.reviewer_column(), classification.subject_column()) {
            (Some(r), Some(s)) => (r, s),
            _ => {
                let mut report = ValidationReport::default();
                check_identity_columns(classification, rules, &mut report);
                return StructuralValidationSnafu { report }.fail();
            }
        };
    let competencies = classification.competency_columns();

    let mut res = Reshaped {
        rows_read: table.num_rows(),
        ..Reshaped::default()
    };
    for row in 0..table.num_rows() {
        let reviewer = table.cell(row, reviewer_col).as_text();
        let subject = table.cell(row, subject_col).as_text();
        let (reviewer, subject) = match (reviewer, subject) {
            (Some(r), Some(s)) => (r, s),
            (r, s) => {
                debug!(
                    "reshape: row {}: skipped, reviewer {:?} subject {:?}",
                    row + 1,
                    r,
                    s
                );
                res.rows_skipped += 1;
                continue;
            }
        };
        let relationship = infer_relationship(&reviewer, &subject);
        for (col, category) in competencies.iter() {
            let cell = table.cell(row, *col);
            let score = match mapper.map_cell(cell, classification.header(*col))? {
                Answer::Score(s) => Some(s),
                Answer::NoOpinion => None,
            };
            res.records.push(FeedbackRecord {
                reviewer: reviewer.clone(),
                subject: subject.clone(),
                category: category.to_string(),
                raw_answer: cell.literal(),
                score,
                relationship,
            });
        }
    }
    info!(
        "reshape: {} rows read, {} skipped, {} records",
        res.rows_read,
        res.rows_skipped,
        res.records.len()
    );
    Ok(res)
}
