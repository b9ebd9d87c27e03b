use std::collections::BTreeMap;

use log::info;

use crate::aggregate::{mean, round2};
use crate::*;

/// One average per category, taken over the subjects' means.
///
/// Every subject weighs the same, however many reviewers rated them.
pub fn team_averages(scores: &[PersonCompetencyScore]) -> Vec<TeamCompetencyAverage> {
    let mut per_category: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for s in scores.iter() {
        per_category
            .entry(s.category.as_str())
            .or_default()
            .push(s.mean);
    }
    let res: Vec<TeamCompetencyAverage> = per_category
        .into_iter()
        .filter_map(|(category, means)| {
            mean(&means).map(|m| TeamCompetencyAverage {
                category: category.to_string(),
                mean: round2(m),
            })
        })
        .collect();
    info!("team_averages: {} categories", res.len());
    res
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate;

    fn rec(subject: &str, category: &str, score: u32) -> FeedbackRecord {
        FeedbackRecord {
            reviewer: "reviewer".to_string(),
            subject: subject.to_string(),
            category: category.to_string(),
            raw_answer: score.to_string(),
            score: Some(score),
            relationship: Relationship::Peer,
        }
    }

    #[test]
    fn mean_of_subject_means() {
        let mut records: Vec<FeedbackRecord> = (0..4).map(|_| rec("A", "X", 3)).collect();
        records.push(rec("B", "X", 5));
        let team = team_averages(&aggregate(&records).scores);
        assert_eq!(
            team,
            vec![TeamCompetencyAverage {
                category: "X".to_string(),
                mean: 4.0
            }]
        );
    }

    #[test]
    fn categories_of_any_subject() {
        let team = team_averages(
            &aggregate(&[rec("A", "X", 2), rec("B", "Y", 3), rec("B", "X", 3)]).scores,
        );
        let cats: Vec<(&str, f64)> = team.iter().map(|t| (t.category.as_str(), t.mean)).collect();
        assert_eq!(cats, vec![("X", 2.5), ("Y", 3.0)]);
        assert!(team_averages(&[]).is_empty());
    }
}
