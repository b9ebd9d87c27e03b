mod config;

pub mod aggregate;
pub mod answers;
pub mod classifier;
pub mod manual;
pub mod merge;
pub mod normalize;
pub mod reshape;
pub mod snapshot;
pub mod team;
pub mod validation;

use log::{debug, info};
use snafu::prelude::*;

pub use crate::answers::{Answer, AnswerScoreMapper, LikertScale};
pub use crate::classifier::ColumnClassifier;
pub use crate::config::*;
pub use crate::merge::CategoryMerger;
pub use crate::snapshot::{FeedbackSnapshot, QueryError, SnapshotStore};

/// Errors that stop a run before any snapshot is produced.
#[derive(Debug, Snafu)]
pub enum PipelineError {
    #[snafu(display("the table failed structural validation: {report}"))]
    StructuralValidation { report: ValidationReport },

    #[snafu(display("unrecognized answer '{literal}' in column '{column}'"))]
    AnswerMapping { literal: String, column: String },

    #[snafu(display("invalid column pattern {pattern:?}"))]
    InvalidPattern {
        pattern: String,
        source: regex::Error,
    },
}

pub type PipelineResult<T> = Result<T, PipelineError>;

/// Runs the whole pipeline on a decoded table.
///
/// The steps are: classify the columns, validate the structure, reshape to
/// long format while scoring the answers, aggregate per subject and category,
/// merge the split categories and compute the team averages.
///
/// Structural problems are all reported together. An unknown answer stops
/// the run. Subjects without valid scores only produce warnings in the summary.
///
/// ```
/// use competency_scores::*;
///
/// let headers = ["Reviewer", "Subject", "**KLANTGERICHTHEID met behoefte** [a]",
///                "**KLANTGERICHTHEID met boodschap** [b]"];
/// let table = RawTable::new(
///     headers.iter().map(|s| s.to_string()).collect(),
///     vec![
///         vec!["Stan".into(), "Tom".into(), "often".into(), Cell::Empty],
///         vec!["Koen".into(), "Tom".into(), Cell::Empty, "very often".into()],
///     ],
/// );
/// let rules = ProcessingRules { min_competency_columns: 1, ..ProcessingRules::default() };
/// let snapshot = process_table(&table, &rules)?;
///
/// assert_eq!(snapshot.categories, vec!["KLANTGERICHTHEID".to_string()]);
/// assert_eq!(snapshot.scores[0].mean, 3.5);
/// assert_eq!(snapshot.team_average("KLANTGERICHTHEID"), Some(3.5));
/// # Ok::<(), PipelineError>(())
/// ```
pub fn process_table(table: &RawTable, rules: &ProcessingRules) -> PipelineResult<FeedbackSnapshot> {
    info!(
        "process_table: {} columns, {} rows",
        table.headers.len(),
        table.num_rows()
    );
    let classifier = ColumnClassifier::from_processing_rules(rules)?;
    let mapper = AnswerScoreMapper::new(&rules.scale);
    let classification = classifier.classify_table(table, &mapper);
    info!(
        "process_table: reviewer column {:?}, subject column {:?}, {} competency columns",
        classification.reviewer_column(),
        classification.subject_column(),
        classification.competency_columns().len()
    );

    let report = validation::validate(table, &classification, rules);
    ensure!(report.is_empty(), StructuralValidationSnafu { report });

    let reshaped = reshape::reshape(table, &classification, &mapper, rules)?;
    let aggregation = aggregate::aggregate(&reshaped.records);
    let merger = CategoryMerger::from_processing_rules(rules);
    let scores = merger.merge(aggregation.scores);
    let team = team::team_averages(&scores);
    debug!("process_table: team averages {:?}", team);

    let records_valid = reshaped.records.iter().filter(|r| r.score.is_some()).count();
    let summary = ProcessingSummary {
        rows_read: reshaped.rows_read,
        rows_skipped: reshaped.rows_skipped,
        records_valid,
        records_no_opinion: reshaped.records.len() - records_valid,
        warnings: aggregation.warnings,
        ..ProcessingSummary::default()
    };
    let snapshot = FeedbackSnapshot::new(reshaped.records, scores, team, summary);
    info!(
        "process_table: {} subjects, {} categories, {} valid records",
        snapshot.summary.subjects_found,
        snapshot.summary.categories_found,
        snapshot.summary.records_valid
    );
    Ok(snapshot)
}

/// Runs the pipeline and, only if it succeeds, makes the result the current snapshot.
pub fn process_and_commit(
    store: &SnapshotStore,
    table: &RawTable,
    rules: &ProcessingRules,
) -> PipelineResult<std::sync::Arc<FeedbackSnapshot>> {
    let snapshot = process_table(table, rules)?;
    Ok(store.commit(snapshot))
}
