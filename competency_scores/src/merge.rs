use std::collections::{BTreeMap, BTreeSet, HashMap};

use log::{debug, info};

use crate::aggregate::{mean, round2, score_of};
use crate::normalize::normalize_label;
use crate::*;

/// Collapses category labels that stand for the same competency.
///
/// A label belongs to a logical competency either because it is listed as a
/// variant of it, or because it contains one of the merge keywords and at
/// least one other label contains the same keyword.
#[derive(Debug, Clone, Default)]
pub struct CategoryMerger {
    // normalized variant -> logical name
    aliases: HashMap<String, String>,
    keywords: Vec<String>,
}

impl CategoryMerger {
    pub fn new(aliases: &[CategoryAlias], keywords: &[String]) -> CategoryMerger {
        let mut alias_map: HashMap<String, String> = HashMap::new();
        for alias in aliases.iter() {
            for variant in alias.variants.iter() {
                alias_map.insert(normalize_label(variant), alias.logical.clone());
            }
        }
        CategoryMerger {
            aliases: alias_map,
            keywords: keywords
                .iter()
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    pub fn from_processing_rules(rules: &ProcessingRules) -> CategoryMerger {
        CategoryMerger::new(&rules.category_aliases, &rules.merge_keywords)
    }

    /// The logical name of every label. Labels that are not aliases map to themselves.
    pub fn resolve<'a>(
        &self,
        labels: impl IntoIterator<Item = &'a str>,
    ) -> BTreeMap<String, String> {
        let labels: BTreeSet<&str> = labels.into_iter().collect();
        let mut res: BTreeMap<String, String> = BTreeMap::new();
        for label in labels.iter() {
            if let Some(logical) = self.aliases.get(&normalize_label(label)) {
                res.insert(label.to_string(), logical.clone());
            }
        }
        for keyword in self.keywords.iter() {
            let key = normalize_label(keyword);
            let matching: Vec<&&str> = labels
                .iter()
                .filter(|l| !res.contains_key(**l) && normalize_label(l).contains(&key))
                .collect();
            if matching.len() >= 2 {
                debug!("resolve: {:?} share the keyword {:?}", matching, keyword);
                for label in matching {
                    res.insert(label.to_string(), keyword.clone());
                }
            }
        }
        for label in labels.iter() {
            res.entry(label.to_string())
                .or_insert_with(|| label.to_string());
        }
        res
    }

    /// Applies the merge to the scores of every subject.
    ///
    /// The mean of a merged entry is the plain mean of the constituent means,
    /// whatever their response counts. The relationship breakdown follows the
    /// same rule; the standard deviation is computed over the pooled scores.
    pub fn merge(&self, scores: Vec<PersonCompetencyScore>) -> Vec<PersonCompetencyScore> {
        let names = self.resolve(scores.iter().map(|s| s.category.as_str()));

        // (subject, logical) -> constituents, in input order
        let mut groups: BTreeMap<(String, String), Vec<PersonCompetencyScore>> = BTreeMap::new();
        for s in scores.into_iter() {
            let logical = names
                .get(&s.category)
                .cloned()
                .unwrap_or_else(|| s.category.clone());
            groups
                .entry((s.subject.clone(), logical))
                .or_default()
                .push(s);
        }

        let mut merged_count = 0;
        let res: Vec<PersonCompetencyScore> = groups
            .into_iter()
            .map(|((subject, logical), parts)| {
                if parts.len() > 1 {
                    merged_count += 1;
                }
                merge_parts(subject, logical, parts)
            })
            .collect();
        info!(
            "merge: {} entries after merging, {} merged",
            res.len(),
            merged_count
        );
        res
    }
}

fn merge_parts(
    subject: String,
    category: String,
    mut parts: Vec<PersonCompetencyScore>,
) -> PersonCompetencyScore {
    assert!(!parts.is_empty(), "merge_parts: no constituent for {}", category);
    if parts.len() == 1 {
        let mut only = parts.remove(0);
        only.category = category;
        return only;
    }
    debug!(
        "merge_parts: {}: {:?} -> {}",
        subject,
        parts.iter().map(|p| p.category.as_str()).collect::<Vec<&str>>(),
        category
    );

    let means: Vec<f64> = parts.iter().map(|p| p.mean).collect();
    let scores: Vec<u32> = parts.iter().flat_map(|p| p.scores.iter().cloned()).collect();
    let (_, std_dev) = score_of(&scores);

    let mut rel_parts: BTreeMap<Relationship, (Vec<f64>, usize)> = BTreeMap::new();
    for p in parts.iter() {
        for (rel, rs) in p.by_relationship.iter() {
            let e = rel_parts.entry(*rel).or_default();
            e.0.push(rs.mean);
            e.1 += rs.count;
        }
    }
    let by_relationship = rel_parts
        .into_iter()
        .map(|(rel, (ms, count))| {
            (
                rel,
                RelationshipScore {
                    mean: mean(&ms).map(round2).unwrap_or_default(),
                    count,
                },
            )
        })
        .collect();

    PersonCompetencyScore {
        subject,
        category,
        mean: mean(&means).map(round2).unwrap_or_default(),
        response_count: parts.iter().map(|p| p.response_count).sum(),
        std_dev,
        by_relationship,
        scores,
    }
}
