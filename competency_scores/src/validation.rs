use log::debug;

use crate::*;

fn identity_issue(role: &str, phrasings: &[String]) -> String {
    format!(
        "missing {} column (expected one of: {})",
        role,
        phrasings
            .iter()
            .map(|p| format!("'{}'", p))
            .collect::<Vec<String>>()
            .join(", ")
    )
}

/// Checks that the identity columns were found.
pub fn check_identity_columns(
    classification: &ColumnClassification,
    rules: &ProcessingRules,
    report: &mut ValidationReport,
) {
    if classification.reviewer_column().is_none() {
        report.push(identity_issue("reviewer", &rules.reviewer_headers));
    }
    if classification.subject_column().is_none() {
        report.push(identity_issue("subject", &rules.subject_headers));
    }
}

/// Runs every structural check on a classified table and reports all the
/// problems at once.
pub fn validate(
    table: &RawTable,
    classification: &ColumnClassification,
    rules: &ProcessingRules,
) -> ValidationReport {
    let mut report = ValidationReport::default();
    check_identity_columns(classification, rules, &mut report);

    let num_competencies = classification.competency_columns().len();
    if num_competencies < rules.min_competency_columns {
        report.push(format!(
            "found {} competency columns, at least {} required",
            num_competencies, rules.min_competency_columns
        ));
    }

    if table.num_data_rows() == 0 {
        report.push("the table contains no data rows".to_string());
    }

    debug!("validate: {} issue(s): {:?}", report.issues().len(), report);
    report
}
