use std::collections::BTreeSet;
use std::sync::{Arc, RwLock};

use log::info;
use snafu::prelude::*;

use crate::*;

#[derive(Debug, Snafu, PartialEq, Eq)]
pub enum QueryError {
    #[snafu(display("no feedback data has been processed yet"))]
    NoData {},
    #[snafu(display(
        "subject '{}' not found; available subjects: {}",
        subject,
        available.join(", ")
    ))]
    SubjectNotFound {
        subject: String,
        available: Vec<String>,
    },
}

pub type QueryResult<T> = Result<T, QueryError>;

/// The outcome of one successful run. Never modified after construction.
#[derive(PartialEq, Debug, Clone)]
pub struct FeedbackSnapshot {
    /// Subjects with at least one score, sorted.
    pub subjects: Vec<String>,
    /// Post-merge categories, sorted.
    pub categories: Vec<String>,
    pub scores: Vec<PersonCompetencyScore>,
    pub team_averages: Vec<TeamCompetencyAverage>,
    /// Every long-format record, including the ones without a score.
    pub records: Vec<FeedbackRecord>,
    pub summary: ProcessingSummary,
}

/// One line of the individual-versus-team comparison.
#[derive(PartialEq, Debug, Clone)]
pub struct CompetencyComparison {
    pub category: String,
    pub individual: Option<f64>,
    pub team: Option<f64>,
}

/// Every subject's scores with the team averages, taken from one snapshot.
#[derive(PartialEq, Debug, Clone)]
pub struct SnapshotExport {
    pub subjects: Vec<(String, Vec<PersonCompetencyScore>)>,
    pub team_averages: Vec<TeamCompetencyAverage>,
}

#[derive(PartialEq, Debug, Clone)]
pub struct SubjectComparison {
    pub subject: String,
    pub competencies: Vec<CompetencyComparison>,
}

impl FeedbackSnapshot {
    pub fn new(
        records: Vec<FeedbackRecord>,
        scores: Vec<PersonCompetencyScore>,
        team_averages: Vec<TeamCompetencyAverage>,
        mut summary: ProcessingSummary,
    ) -> FeedbackSnapshot {
        let subjects: BTreeSet<&str> = scores.iter().map(|s| s.subject.as_str()).collect();
        let categories: BTreeSet<&str> = scores.iter().map(|s| s.category.as_str()).collect();
        let subjects: Vec<String> = subjects.into_iter().map(String::from).collect();
        let categories: Vec<String> = categories.into_iter().map(String::from).collect();
        summary.subjects_found = subjects.len();
        summary.categories_found = categories.len();
        FeedbackSnapshot {
            subjects,
            categories,
            scores,
            team_averages,
            records,
            summary,
        }
    }

    fn find_subject(&self, subject: &str) -> QueryResult<&str> {
        let wanted = subject.trim();
        self.subjects
            .iter()
            .find(|s| s.as_str() == wanted)
            .map(|s| s.as_str())
            .context(SubjectNotFoundSnafu {
                subject: wanted,
                available: self.subjects.clone(),
            })
    }

    pub fn team_average(&self, category: &str) -> Option<f64> {
        self.team_averages
            .iter()
            .find(|t| t.category == category)
            .map(|t| t.mean)
    }

    /// All the scores of one subject, with the relationship breakdown.
    pub fn subject_detail(&self, subject: &str) -> QueryResult<Vec<&PersonCompetencyScore>> {
        let name = self.find_subject(subject)?;
        Ok(self.scores.iter().filter(|s| s.subject == name).collect())
    }

    /// The subject's mean next to the team average, for every category of the snapshot.
    pub fn subject_scores(&self, subject: &str) -> QueryResult<SubjectComparison> {
        let detail = self.subject_detail(subject)?;
        let competencies = self
            .categories
            .iter()
            .map(|category| CompetencyComparison {
                category: category.clone(),
                individual: detail
                    .iter()
                    .find(|s| s.category == *category)
                    .map(|s| s.mean),
                team: self.team_average(category),
            })
            .collect();
        Ok(SubjectComparison {
            subject: subject.trim().to_string(),
            competencies,
        })
    }

    /// Every subject with its scores, for batch export.
    pub fn export(&self) -> Vec<(&str, Vec<&PersonCompetencyScore>)> {
        self.subjects
            .iter()
            .map(|subject| {
                (
                    subject.as_str(),
                    self.scores.iter().filter(|s| s.subject == *subject).collect(),
                )
            })
            .collect()
    }
}

/// Holds the snapshot that readers query.
///
/// A commit swaps the whole snapshot under the write lock, so a reader sees
/// either the previous snapshot or the new one. Readers only hold the lock
/// long enough to clone the pointer.
#[derive(Debug, Default)]
pub struct SnapshotStore {
    current: RwLock<Option<Arc<FeedbackSnapshot>>>,
}

impl SnapshotStore {
    pub fn new() -> SnapshotStore {
        SnapshotStore::default()
    }

    pub fn commit(&self, snapshot: FeedbackSnapshot) -> Arc<FeedbackSnapshot> {
        let snapshot = Arc::new(snapshot);
        // The slot only ever holds a complete Arc, so a poisoned lock is still consistent.
        let mut slot = self.current.write().unwrap_or_else(|e| e.into_inner());
        *slot = Some(snapshot.clone());
        info!(
            "commit: snapshot with {} subjects and {} categories",
            snapshot.subjects.len(),
            snapshot.categories.len()
        );
        snapshot
    }

    pub fn current(&self) -> QueryResult<Arc<FeedbackSnapshot>> {
        let slot = self.current.read().unwrap_or_else(|e| e.into_inner());
        slot.clone().context(NoDataSnafu {})
    }

    pub fn list_subjects(&self) -> QueryResult<Vec<String>> {
        Ok(self.current()?.subjects.clone())
    }

    pub fn subject_scores(&self, subject: &str) -> QueryResult<SubjectComparison> {
        self.current()?.subject_scores(subject)
    }

    pub fn subject_detail(&self, subject: &str) -> QueryResult<Vec<PersonCompetencyScore>> {
        let snapshot = self.current()?;
        let detail = snapshot.subject_detail(subject)?;
        Ok(detail.into_iter().cloned().collect())
    }

    pub fn export_all(&self) -> QueryResult<SnapshotExport> {
        let snapshot = self.current()?;
        let subjects = snapshot
            .export()
            .into_iter()
            .map(|(subject, scores)| {
                (
                    subject.to_string(),
                    scores.into_iter().cloned().collect(),
                )
            })
            .collect();
        Ok(SnapshotExport {
            subjects,
            team_averages: snapshot.team_averages.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate;
    use crate::team::team_averages;

    fn snapshot(entries: &[(&str, &str, u32)]) -> FeedbackSnapshot {
        let records: Vec<FeedbackRecord> = entries
            .iter()
            .map(|(subject, category, score)| FeedbackRecord {
                reviewer: "r".to_string(),
                subject: subject.to_string(),
                category: category.to_string(),
                raw_answer: score.to_string(),
                score: Some(*score),
                relationship: Relationship::Peer,
            })
            .collect();
        let scores = aggregate(&records).scores;
        let team = team_averages(&scores);
        FeedbackSnapshot::new(records, scores, team, ProcessingSummary::default())
    }

    #[test]
    fn queries_before_any_commit() {
        let store = SnapshotStore::new();
        assert_eq!(store.list_subjects(), Err(QueryError::NoData {}));
        assert_eq!(
            store.subject_scores("Tom").unwrap_err().to_string(),
            "no feedback data has been processed yet"
        );
    }

    #[test]
    fn unknown_subject_lists_the_available_ones() {
        let store = SnapshotStore::new();
        store.commit(snapshot(&[("Tom", "A", 3), ("Anne", "A", 4)]));
        let err = store.subject_detail("Koen").unwrap_err();
        assert_eq!(
            err,
            QueryError::SubjectNotFound {
                subject: "Koen".to_string(),
                available: vec!["Anne".to_string(), "Tom".to_string()],
            }
        );
        assert_eq!(
            err.to_string(),
            "subject 'Koen' not found; available subjects: Anne, Tom"
        );
    }

    #[test]
    fn comparison_covers_every_category() {
        let store = SnapshotStore::new();
        store.commit(snapshot(&[("Tom", "A", 3), ("Anne", "A", 4), ("Anne", "B", 2)]));
        let cmp = store.subject_scores(" Tom ").unwrap();
        assert_eq!(cmp.subject, "Tom");
        assert_eq!(
            cmp.competencies,
            vec![
                CompetencyComparison {
                    category: "A".to_string(),
                    individual: Some(3.0),
                    team: Some(3.5),
                },
                CompetencyComparison {
                    category: "B".to_string(),
                    individual: None,
                    team: Some(2.0),
                },
            ]
        );
        let export = store.export_all().unwrap();
        assert_eq!(export.subjects.len(), 2);
        assert_eq!(export.subjects[0].0, "Anne");
        assert_eq!(export.subjects[0].1.len(), 2);
        assert_eq!(export.team_averages, store.current().unwrap().team_averages);
    }

    #[test]
    fn commit_replaces_the_whole_snapshot() {
        let store = SnapshotStore::new();
        store.commit(snapshot(&[("Tom", "A", 3)]));
        let before = store.current().unwrap();
        store.commit(snapshot(&[("Anne", "B", 4)]));
        assert_eq!(before.subjects, vec!["Tom".to_string()]);
        assert_eq!(store.list_subjects().unwrap(), vec!["Anne".to_string()]);
        assert_eq!(store.current().unwrap().team_average("A"), None);
    }

    #[test]
    fn export_pairs_scores_with_their_own_team_averages() {
        let store = SnapshotStore::new();
        let first = snapshot(&[("Tom", "A", 3)]);
        let second = snapshot(&[("Anne", "B", 4), ("Koen", "B", 2)]);
        store.commit(first.clone());
        std::thread::scope(|scope| {
            scope.spawn(|| {
                for i in 0..200 {
                    let s = if i % 2 == 0 { second.clone() } else { first.clone() };
                    store.commit(s);
                }
            });
            for _ in 0..4 {
                scope.spawn(|| {
                    for _ in 0..200 {
                        let export = store.export_all().unwrap();
                        let source = if export.subjects[0].0 == "Tom" { &first } else { &second };
                        assert_eq!(export.team_averages, source.team_averages);
                        assert_eq!(export.subjects.len(), source.subjects.len());
                    }
                });
            }
        });
    }

    #[test]
    fn readers_never_see_a_mix() {
        let store = SnapshotStore::new();
        let first = snapshot(&[("Tom", "A", 3)]);
        let second = snapshot(&[("Anne", "B", 4), ("Koen", "B", 2)]);
        store.commit(first.clone());
        std::thread::scope(|scope| {
            scope.spawn(|| {
                for i in 0..200 {
                    let s = if i % 2 == 0 { second.clone() } else { first.clone() };
                    store.commit(s);
                }
            });
            for _ in 0..4 {
                scope.spawn(|| {
                    for _ in 0..200 {
                        let snap = store.current().unwrap();
                        assert!(*snap == first || *snap == second);
                    }
                });
            }
        });
    }
}
