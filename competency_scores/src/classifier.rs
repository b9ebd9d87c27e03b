use std::collections::HashSet;
use std::fmt::Debug;

use log::debug;
use regex::Regex;
use snafu::prelude::*;

use crate::answers::AnswerScoreMapper;
use crate::normalize::{normalize_label, repair_mojibake};
use crate::*;

/// A way of recognizing what a column holds from its header alone.
///
/// Rules are tried in order and the first one returning a role wins. Support for
/// a new export format is added by adding a rule.
pub trait ColumnRule: Debug + Send + Sync {
    fn classify(&self, header: &str) -> Option<ColumnRole>;
}

/// Recognizes the reviewer or subject column by its phrasing.
#[derive(Debug, Clone)]
pub struct IdentityRule {
    role: ColumnRole,
    phrasings: HashSet<String>,
}

impl IdentityRule {
    pub fn reviewer(phrasings: &[String]) -> IdentityRule {
        IdentityRule::new(ColumnRole::Reviewer, phrasings)
    }

    pub fn subject(phrasings: &[String]) -> IdentityRule {
        IdentityRule::new(ColumnRole::Subject, phrasings)
    }

    fn new(role: ColumnRole, phrasings: &[String]) -> IdentityRule {
        IdentityRule {
            role,
            phrasings: phrasings.iter().map(|p| normalize_label(p)).collect(),
        }
    }
}

impl ColumnRule for IdentityRule {
    fn classify(&self, header: &str) -> Option<ColumnRole> {
        let key = normalize_label(header);
        if !key.is_empty() && self.phrasings.contains(&key) {
            Some(self.role.clone())
        } else {
            None
        }
    }
}

/// Recognizes competency questions written as `**LABEL - question** [sub-question]`.
#[derive(Debug, Clone)]
pub struct MarkerRule {
    pattern: Regex,
    separator: String,
}

impl MarkerRule {
    /// The pattern must have a `label` group; a `question` group is optional.
    pub fn new(pattern: &str, separator: &str) -> PipelineResult<MarkerRule> {
        let re = Regex::new(pattern).context(InvalidPatternSnafu { pattern })?;
        Ok(MarkerRule {
            pattern: re,
            separator: separator.to_string(),
        })
    }
}

impl ColumnRule for MarkerRule {
    fn classify(&self, header: &str) -> Option<ColumnRole> {
        let repaired = repair_mojibake(header);
        let caps = self.pattern.captures(&repaired)?;
        let wrapped = caps.name("label")?.as_str().trim();
        let category = match wrapped.split_once(self.separator.as_str()) {
            Some((before, _)) => before.trim(),
            None => wrapped,
        };
        if category.is_empty() {
            return None;
        }
        let question = caps
            .name("question")
            .map(|m| m.as_str().trim().to_string())
            .filter(|q| !q.is_empty());
        Some(ColumnRole::Competency {
            category: category.to_string(),
            question,
        })
    }
}

/// Decides the role of every column of a table.
#[derive(Debug)]
pub struct ColumnClassifier {
    rules: Vec<Box<dyn ColumnRule>>,
}

impl ColumnClassifier {
    pub fn with_rules(rules: Vec<Box<dyn ColumnRule>>) -> ColumnClassifier {
        ColumnClassifier { rules }
    }

    /// The identity rules followed by the marker rule.
    pub fn from_processing_rules(rules: &ProcessingRules) -> PipelineResult<ColumnClassifier> {
        let marker = MarkerRule::new(&rules.marker_pattern, &rules.category_separator)?;
        Ok(ColumnClassifier::with_rules(vec![
            Box::new(IdentityRule::reviewer(&rules.reviewer_headers)),
            Box::new(IdentityRule::subject(&rules.subject_headers)),
            Box::new(marker),
        ]))
    }

    /// Classifies from the headers only. The same headers always give the same result.
    ///
    /// Only the first reviewer column and the first subject column are kept as
    /// such; later duplicates are ignored.
    pub fn classify(&self, headers: &[String]) -> ColumnClassification {
        let mut seen_reviewer = false;
        let mut seen_subject = false;
        let mut columns: Vec<(String, ColumnRole)> = Vec::with_capacity(headers.len());
        for header in headers.iter() {
            let role = self
                .rules
                .iter()
                .find_map(|rule| rule.classify(header))
                .unwrap_or(ColumnRole::Ignored);
            let role = match role {
                ColumnRole::Reviewer if seen_reviewer => {
                    debug!("classify: second reviewer column {:?} ignored", header);
                    ColumnRole::Ignored
                }
                ColumnRole::Subject if seen_subject => {
                    debug!("classify: second subject column {:?} ignored", header);
                    ColumnRole::Ignored
                }
                r => r,
            };
            match role {
                ColumnRole::Reviewer => seen_reviewer = true,
                ColumnRole::Subject => seen_subject = true,
                _ => {}
            }
            debug!("classify: {:?} -> {:?}", header, role);
            columns.push((header.clone(), role));
        }
        ColumnClassification { columns }
    }

    /// Classifies a table, falling back on the cell contents for exports
    /// without marked-up headers.
    ///
    /// When no header is a marked competency question, every otherwise ignored
    /// column whose non-blank values are all known answers becomes a competency
    /// column named after its raw header.
    pub fn classify_table(
        &self,
        table: &RawTable,
        mapper: &AnswerScoreMapper,
    ) -> ColumnClassification {
        let mut classification = self.classify(&table.headers);
        if !classification.competency_columns().is_empty() {
            return classification;
        }
        debug!("classify_table: no marked competency header, inspecting values");
        for (idx, (header, role)) in classification.columns.iter_mut().enumerate() {
            if *role != ColumnRole::Ignored || header.trim().is_empty() {
                continue;
            }
            let mut values = table.column_values(idx).filter(|c| !c.is_blank()).peekable();
            if values.peek().is_none() {
                continue;
            }
            if values.all(|c| mapper.is_recognized(c)) {
                debug!("classify_table: {:?} holds only Likert answers", header);
                *role = ColumnRole::Competency {
                    category: header.trim().to_string(),
                    question: None,
                };
            }
        }
        classification
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::answers::LikertScale;

    fn classifier() -> ColumnClassifier {
        ColumnClassifier::from_processing_rules(&ProcessingRules::default()).unwrap()
    }

    fn headers(xs: &[&str]) -> Vec<String> {
        xs.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn recognizes_identity_columns_despite_noise() {
        let c = classifier().classify(&headers(&[
            "Timestamp",
            " wie BEN jij? ",
            "\u{feff}Voor welke collega vul je dit formulier in?",
        ]));
        assert_eq!(c.columns[0].1, ColumnRole::Ignored);
        assert_eq!(c.reviewer_column(), Some(1));
        assert_eq!(c.subject_column(), Some(2));
    }

    #[test]
    fn extracts_category_and_question() {
        let c = classifier().classify(&headers(&[
            "ðŸ”¹ **PROJECTMANAGEMENT - Beheert deze collega projecten efficiÃ«nt en succesvol?** [Heeft de doelen scherp]",
            "**TEAMSPELER**",
        ]));
        assert_eq!(
            c.columns[0].1,
            ColumnRole::Competency {
                category: "PROJECTMANAGEMENT".to_string(),
                question: Some("Heeft de doelen scherp".to_string()),
            }
        );
        assert_eq!(
            c.columns[1].1,
            ColumnRole::Competency {
                category: "TEAMSPELER".to_string(),
                question: None,
            }
        );
    }

    #[test]
    fn duplicate_identity_columns_keep_the_first() {
        let c = classifier().classify(&headers(&["Reviewer", "Reviewer", "Subject"]));
        assert_eq!(c.reviewer_column(), Some(0));
        assert_eq!(c.columns[1].1, ColumnRole::Ignored);
    }

    #[test]
    fn classification_is_deterministic() {
        let h = headers(&[
            "Wie ben jij?",
            "Subject",
            "**A - x** [1]",
            "**B - y** [2]",
            "Opmerkingen",
        ]);
        let cl = classifier();
        assert_eq!(cl.classify(&h), cl.classify(&h));
    }

    #[test]
    fn falls_back_on_answer_shaped_columns() {
        let table = RawTable::new(
            headers(&["Reviewer", "Subject", "Listening", "Comments", "Empty"]),
            vec![
                vec!["Ann".into(), "Bob".into(), "Often".into(), "good".into()],
                vec!["Cas".into(), "Bob".into(), "Weet ik niet".into(), "".into()],
            ],
        );
        let mapper = AnswerScoreMapper::new(&LikertScale::four_point());
        let c = classifier().classify_table(&table, &mapper);
        assert_eq!(c.competency_columns(), vec![(2, "Listening")]);
        assert_eq!(c.columns[3].1, ColumnRole::Ignored);
        assert_eq!(c.columns[4].1, ColumnRole::Ignored);
    }

    #[test]
    fn fallback_is_not_used_when_markers_exist() {
        let table = RawTable::new(
            headers(&["Reviewer", "Subject", "**A**", "Listening"]),
            vec![vec!["Ann".into(), "Bob".into(), "vaak".into(), "vaak".into()]],
        );
        let mapper = AnswerScoreMapper::new(&LikertScale::four_point());
        let c = classifier().classify_table(&table, &mapper);
        assert_eq!(c.competency_columns(), vec![(2, "A")]);
    }

    #[test]
    fn rejects_invalid_pattern() {
        assert!(matches!(
            MarkerRule::new("(unclosed", " - "),
            Err(PipelineError::InvalidPattern { .. })
        ));
    }
}
