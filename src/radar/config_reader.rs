use crate::radar::*;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// The JSON rules file. Every setting is optional and falls back to the defaults
/// of `ProcessingRules`.
#[derive(PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct RadarConfig {
    #[serde(rename = "reviewerHeaders")]
    pub reviewer_headers: Option<Vec<String>>,
    #[serde(rename = "subjectHeaders")]
    pub subject_headers: Option<Vec<String>>,
    #[serde(rename = "minCompetencyColumns")]
    pub min_competency_columns: Option<JSValue>,
    /// "four", "five" or a list of levels, each level being a list of spellings.
    pub scale: Option<JSValue>,
    #[serde(rename = "noOpinion")]
    pub no_opinion: Option<Vec<String>>,
    #[serde(rename = "categoryAliases")]
    pub category_aliases: Option<BTreeMap<String, Vec<String>>>,
    #[serde(rename = "mergeKeywords")]
    pub merge_keywords: Option<Vec<String>>,
}

impl RadarConfig {
    pub fn processing_rules(&self) -> RadarResult<ProcessingRules> {
        let mut rules = ProcessingRules::default();
        if let Some(headers) = &self.reviewer_headers {
            rules.reviewer_headers = headers.clone();
        }
        if let Some(headers) = &self.subject_headers {
            rules.subject_headers = headers.clone();
        }
        if self.min_competency_columns.is_some() {
            rules.min_competency_columns = read_js_int(&self.min_competency_columns)?;
        }
        if let Some(js) = &self.scale {
            rules.scale = read_scale(js)?;
        }
        if let Some(no_opinion) = &self.no_opinion {
            rules.scale.no_opinion = no_opinion.clone();
        }
        if let Some(aliases) = &self.category_aliases {
            rules.category_aliases = aliases
                .iter()
                .map(|(logical, variants)| CategoryAlias {
                    logical: logical.clone(),
                    variants: variants.clone(),
                })
                .collect();
        }
        if let Some(keywords) = &self.merge_keywords {
            rules.merge_keywords = keywords.clone();
        }
        Ok(rules)
    }
}

pub fn read_config(path: &str) -> RadarResult<RadarConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let config: RadarConfig = serde_json::from_str(&contents).context(ParsingJsonSnafu {})?;
    info!("read_config: {:?}", config);
    Ok(config)
}

/// Reads a previous result to compare against.
pub fn read_reference(path: &str) -> RadarResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(js)
}

fn read_scale(js: &JSValue) -> RadarResult<LikertScale> {
    match js {
        JSValue::String(s) => match s.to_lowercase().as_str() {
            "four" | "4" => Ok(LikertScale::four_point()),
            "five" | "5" => Ok(LikertScale::five_point()),
            _ => whatever!("unknown scale {:?}: expected \"four\", \"five\" or a list of levels", s),
        },
        JSValue::Array(levels) => {
            let mut res: Vec<Vec<String>> = Vec::new();
            for level in levels.iter() {
                let spellings: Vec<String> = match level {
                    JSValue::String(s) => vec![s.clone()],
                    JSValue::Array(xs) => {
                        let mut spellings: Vec<String> = Vec::new();
                        for x in xs.iter() {
                            match x.as_str() {
                                Some(s) => spellings.push(s.to_string()),
                                None => whatever!("scale: expected a string, found {}", x),
                            }
                        }
                        spellings
                    }
                    x => whatever!("scale: expected a level, found {}", x),
                };
                ensure_whatever!(!spellings.is_empty(), "scale: a level has no spelling");
                res.push(spellings);
            }
            ensure_whatever!(!res.is_empty(), "scale: the list of levels is empty");
            Ok(LikertScale {
                levels: res,
                no_opinion: LikertScale::default_no_opinion(),
            })
        }
        x => whatever!("scale: expected a name or a list of levels, found {}", x),
    }
}

fn read_js_int(x: &Option<JSValue>) -> RadarResult<usize> {
    match x {
        Some(JSValue::Number(n)) => match n.as_u64() {
            Some(i) => Ok(i as usize),
            None => whatever!("expected a positive integer, found {}", n),
        },
        Some(JSValue::String(s)) => match s.trim().parse::<usize>() {
            Ok(i) => Ok(i),
            Err(_) => whatever!("expected a positive integer, found {:?}", s),
        },
        x => whatever!("expected a positive integer, found {:?}", x),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules_of(js: &str) -> RadarResult<ProcessingRules> {
        let config: RadarConfig = serde_json::from_str(js).unwrap();
        config.processing_rules()
    }

    #[test]
    fn empty_config_keeps_the_defaults() {
        assert_eq!(rules_of("{}").unwrap(), ProcessingRules::default());
    }

    #[test]
    fn camel_case_settings() {
        let rules = rules_of(
            r#"{
                "reviewerHeaders": ["Naam"],
                "minCompetencyColumns": "3",
                "scale": "five",
                "noOpinion": ["geen idee"],
                "categoryAliases": {"COMMUNICATIE": ["Luisteren", "Presenteren"]},
                "mergeKeywords": []
            }"#,
        )
        .unwrap();
        assert_eq!(rules.reviewer_headers, vec!["Naam".to_string()]);
        assert_eq!(rules.subject_headers, ProcessingRules::default().subject_headers);
        assert_eq!(rules.min_competency_columns, 3);
        assert_eq!(rules.scale.num_levels(), 5);
        assert_eq!(rules.scale.no_opinion, vec!["geen idee".to_string()]);
        assert_eq!(
            rules.category_aliases,
            vec![CategoryAlias {
                logical: "COMMUNICATIE".to_string(),
                variants: vec!["Luisteren".to_string(), "Presenteren".to_string()],
            }]
        );
        assert!(rules.merge_keywords.is_empty());
    }

    #[test]
    fn explicit_scale() {
        let rules = rules_of(r#"{"scale": [["always", "altijd"], "mostly", ["seldom"]], "minCompetencyColumns": 1}"#)
            .unwrap();
        assert_eq!(rules.min_competency_columns, 1);
        assert_eq!(
            rules.scale.levels,
            vec![
                vec!["always".to_string(), "altijd".to_string()],
                vec!["mostly".to_string()],
                vec!["seldom".to_string()],
            ]
        );
        let mapper = AnswerScoreMapper::new(&rules.scale);
        assert_eq!(mapper.lookup("Altijd"), Some(Answer::Score(3)));
        assert_eq!(mapper.lookup("seldom"), Some(Answer::Score(1)));
    }

    #[test]
    fn bad_settings() {
        assert!(rules_of(r#"{"scale": "seven"}"#).is_err());
        assert!(rules_of(r#"{"scale": []}"#).is_err());
        assert!(rules_of(r#"{"scale": [[1, 2]]}"#).is_err());
        assert!(rules_of(r#"{"minCompetencyColumns": -2}"#).is_err());
        assert!(rules_of(r#"{"minCompetencyColumns": "many"}"#).is_err());
    }
}
