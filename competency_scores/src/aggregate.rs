use std::collections::BTreeMap;

use log::{info, warn};

use crate::*;

/// Rounds to two decimals, half away from zero.
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

pub fn mean(xs: &[f64]) -> Option<f64> {
    if xs.is_empty() {
        None
    } else {
        Some(xs.iter().sum::<f64>() / xs.len() as f64)
    }
}

/// Sample standard deviation (divisor n - 1); undefined below two values.
pub fn sample_std_dev(xs: &[f64]) -> Option<f64> {
    if xs.len() < 2 {
        return None;
    }
    let m = mean(xs)?;
    let var = xs.iter().map(|x| (x - m) * (x - m)).sum::<f64>() / (xs.len() - 1) as f64;
    Some(var.sqrt())
}

pub(crate) fn score_of(scores: &[u32]) -> (f64, Option<f64>) {
    let xs: Vec<f64> = scores.iter().map(|s| *s as f64).collect();
    let m = mean(&xs).map(round2).unwrap_or_default();
    (m, sample_std_dev(&xs).map(round2))
}

#[derive(PartialEq, Debug, Clone, Default)]
pub struct Aggregation {
    pub scores: Vec<PersonCompetencyScore>,
    pub warnings: Vec<String>,
}

/// Groups the scored records by (subject, category).
///
/// Subjects and categories come out sorted. A subject without any valid score
/// gets no entry and a warning; so does a category of an otherwise scored
/// subject that only received "no opinion" answers.
pub fn aggregate(records: &[FeedbackRecord]) -> Aggregation {
    // subject -> category -> (score, relationship)
    let mut groups: BTreeMap<&str, BTreeMap<&str, Vec<(u32, Relationship)>>> = BTreeMap::new();
    for r in records.iter() {
        let by_category = groups.entry(r.subject.as_str()).or_default();
        let group = by_category.entry(r.category.as_str()).or_default();
        if let Some(s) = r.score {
            group.push((s, r.relationship));
        }
    }

    let mut res = Aggregation::default();
    for (subject, by_category) in groups.iter() {
        if by_category.values().all(|g| g.is_empty()) {
            let msg = format!("subject '{}' has no valid scores and was left out", subject);
            warn!("aggregate: {}", msg);
            res.warnings.push(msg);
            continue;
        }
        for (category, group) in by_category.iter() {
            if group.is_empty() {
                let msg = format!(
                    "subject '{}' has no valid scores for category '{}'",
                    subject, category
                );
                warn!("aggregate: {}", msg);
                res.warnings.push(msg);
                continue;
            }
            let scores: Vec<u32> = group.iter().map(|(s, _)| *s).collect();
            let (m, std_dev) = score_of(&scores);

            let mut per_rel: BTreeMap<Relationship, Vec<u32>> = BTreeMap::new();
            for (s, rel) in group.iter() {
                per_rel.entry(*rel).or_default().push(*s);
            }
            let by_relationship = per_rel
                .iter()
                .map(|(rel, xs)| {
                    (
                        *rel,
                        RelationshipScore {
                            mean: score_of(xs).0,
                            count: xs.len(),
                        },
                    )
                })
                .collect();

            res.scores.push(PersonCompetencyScore {
                subject: subject.to_string(),
                category: category.to_string(),
                mean: m,
                response_count: scores.len(),
                std_dev,
                by_relationship,
                scores,
            });
        }
    }
    info!(
        "aggregate: {} records -> {} subject/category scores, {} warning(s)",
        records.len(),
        res.scores.len(),
        res.warnings.len()
    );
    res
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(reviewer: &str, subject: &str, category: &str, score: Option<u32>) -> FeedbackRecord {
        FeedbackRecord {
            reviewer: reviewer.to_string(),
            subject: subject.to_string(),
            category: category.to_string(),
            raw_answer: score.map(|s| s.to_string()).unwrap_or_default(),
            score,
            relationship: crate::reshape::infer_relationship(reviewer, subject),
        }
    }

    #[test]
    fn rounding_and_dispersion() {
        assert_eq!(round2(3.336), 3.34);
        assert_eq!(round2(0.125), 0.13);
        assert_eq!(round2(2.0 / 3.0), 0.67);
        assert_eq!(sample_std_dev(&[1.0]), None);
        assert_eq!(sample_std_dev(&[3.0, 3.0]), Some(0.0));
        assert_eq!(sample_std_dev(&[2.0, 4.0]).map(round2), Some(1.41));
    }

    #[test]
    fn no_opinion_never_counts() {
        let agg = aggregate(&[
            rec("a", "Tom", "A", Some(4)),
            rec("b", "Tom", "A", None),
            rec("c", "Tom", "A", Some(2)),
        ]);
        assert_eq!(agg.scores.len(), 1);
        let s = &agg.scores[0];
        assert_eq!(s.mean, 3.0);
        assert_eq!(s.response_count, 2);
        assert_eq!(s.std_dev, Some(1.41));
    }

    #[test]
    fn single_response_has_no_std_dev() {
        let agg = aggregate(&[rec("a", "Tom", "A", Some(4))]);
        assert_eq!(agg.scores[0].std_dev, None);
        assert_eq!(agg.scores[0].response_count, 1);
    }

    #[test]
    fn breakdown_by_relationship() {
        let agg = aggregate(&[
            rec("Tom", "Tom", "A", Some(4)),
            rec("Stan", "Tom", "A", Some(2)),
            rec("Koen", "Tom", "A", Some(3)),
            rec("Koen", "Tom", "A", None),
        ]);
        let by_rel = &agg.scores[0].by_relationship;
        assert_eq!(
            by_rel[&Relationship::SelfReview],
            RelationshipScore { mean: 4.0, count: 1 }
        );
        assert_eq!(by_rel[&Relationship::Peer], RelationshipScore { mean: 2.5, count: 2 });
    }

    #[test]
    fn subject_without_scores_is_a_warning() {
        let agg = aggregate(&[
            rec("a", "Anne", "A", None),
            rec("a", "Tom", "A", Some(3)),
            rec("a", "Tom", "B", None),
        ]);
        assert_eq!(agg.scores.len(), 1);
        assert_eq!(agg.scores[0].subject, "Tom");
        assert_eq!(
            agg.warnings,
            vec![
                "subject 'Anne' has no valid scores and was left out".to_string(),
                "subject 'Tom' has no valid scores for category 'B'".to_string(),
            ]
        );
    }
}
