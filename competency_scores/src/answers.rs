use std::collections::HashMap;

use log::debug;

use crate::normalize::normalize_label;
use crate::*;

/// The outcome of reading one Likert answer.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum Answer {
    Score(u32),
    /// "Don't know", "not applicable" or a blank cell. Never counts as a zero.
    NoOpinion,
}

/// The answer vocabulary of a survey.
///
/// `levels` goes from the most frequent answer to the least frequent one; each
/// level may be spelled in several ways. With N levels the first one scores N
/// and the last one scores 1.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct LikertScale {
    pub levels: Vec<Vec<String>>,
    pub no_opinion: Vec<String>,
}

fn strings(xs: &[&str]) -> Vec<String> {
    xs.iter().map(|s| s.to_string()).collect()
}

impl LikertScale {
    pub fn four_point() -> LikertScale {
        LikertScale {
            levels: vec![
                strings(&["very often", "zeer vaak"]),
                strings(&["often", "vaak"]),
                strings(&["sometimes", "soms"]),
                strings(&["rarely", "zelden"]),
            ],
            no_opinion: LikertScale::default_no_opinion(),
        }
    }

    /// The four-point scale with `never` as the lowest level.
    pub fn five_point() -> LikertScale {
        let mut scale = LikertScale::four_point();
        scale.levels.push(strings(&["never", "nooit"]));
        scale
    }

    pub fn default_no_opinion() -> Vec<String> {
        strings(&[
            "don't know",
            "dont know",
            "do not know",
            "no opinion",
            "not applicable",
            "n/a",
            "na",
            "weet ik niet",
            "niet van toepassing",
            "nvt",
            "n.v.t.",
        ])
    }

    pub fn num_levels(&self) -> usize {
        self.levels.len()
    }
}

/// Converts answer cells to scores using a [`LikertScale`].
#[derive(Debug, Clone)]
pub struct AnswerScoreMapper {
    lookup: HashMap<String, Answer>,
}

impl AnswerScoreMapper {
    pub fn new(scale: &LikertScale) -> AnswerScoreMapper {
        let mut lookup: HashMap<String, Answer> = HashMap::new();
        let num_levels = scale.levels.len() as u32;
        for (idx, tokens) in scale.levels.iter().enumerate() {
            let score = num_levels - idx as u32;
            for token in tokens {
                // The first spelling registered for a key wins.
                lookup
                    .entry(normalize_label(token))
                    .or_insert(Answer::Score(score));
            }
        }
        for token in scale.no_opinion.iter() {
            lookup
                .entry(normalize_label(token))
                .or_insert(Answer::NoOpinion);
        }
        debug!("AnswerScoreMapper: {} known answer spellings", lookup.len());
        AnswerScoreMapper { lookup }
    }

    /// The answer for a textual token, or None if the token is not part of the vocabulary.
    ///
    /// Only a blank token is "no opinion" by itself. Punctuation or symbols
    /// alone (`-`, `?`) are not part of any vocabulary.
    pub fn lookup(&self, raw: &str) -> Option<Answer> {
        if raw.trim().is_empty() {
            return Some(Answer::NoOpinion);
        }
        let key = normalize_label(raw);
        if key.is_empty() {
            return None;
        }
        self.lookup.get(&key).copied()
    }

    pub fn is_recognized(&self, cell: &Cell) -> bool {
        match cell {
            Cell::Number(_) => false,
            c if c.is_blank() => true,
            c => self.lookup(&c.literal()).is_some(),
        }
    }

    /// Maps one answer cell of the given column.
    ///
    /// Anything that is neither on the scale nor a "no opinion" spelling is an
    /// error: a renamed scale must not look like people not answering.
    pub fn map_cell(&self, cell: &Cell, column: &str) -> PipelineResult<Answer> {
        if cell.is_blank() {
            return Ok(Answer::NoOpinion);
        }
        let literal = cell.literal();
        let answer = match cell {
            Cell::Text(s) => self.lookup(s),
            _ => None,
        };
        answer.context(AnswerMappingSnafu {
            literal: literal.trim(),
            column,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapper() -> AnswerScoreMapper {
        AnswerScoreMapper::new(&LikertScale::four_point())
    }

    #[test]
    fn scale_runs_from_most_to_least_frequent() {
        let m = mapper();
        assert_eq!(m.lookup("very often"), Some(Answer::Score(4)));
        assert_eq!(m.lookup("Often"), Some(Answer::Score(3)));
        assert_eq!(m.lookup("  soms "), Some(Answer::Score(2)));
        assert_eq!(m.lookup("Zelden"), Some(Answer::Score(1)));
    }

    #[test]
    fn five_point_scale_shifts_scores() {
        let m = AnswerScoreMapper::new(&LikertScale::five_point());
        assert_eq!(m.lookup("Zeer vaak"), Some(Answer::Score(5)));
        assert_eq!(m.lookup("Nooit"), Some(Answer::Score(1)));
    }

    #[test]
    fn no_opinion_is_not_zero() {
        let m = mapper();
        for token in ["Weet ik niet", "Donâ€™t know", "N/A", ""] {
            assert_eq!(m.lookup(token), Some(Answer::NoOpinion), "{}", token);
        }
        assert_eq!(
            m.map_cell(&Cell::Empty, "q1").unwrap(),
            Answer::NoOpinion
        );
    }

    #[test]
    fn unknown_literal_names_literal_and_column() {
        let err = mapper()
            .map_cell(&Cell::Text("maybe".to_string()), "**TEAMSPELER**")
            .unwrap_err();
        match err {
            PipelineError::AnswerMapping { literal, column } => {
                assert_eq!(literal, "maybe");
                assert_eq!(column, "**TEAMSPELER**");
            }
            e => panic!("unexpected error {:?}", e),
        }
    }

    #[test]
    fn symbols_alone_are_not_answers() {
        let m = mapper();
        for literal in ["-", "?", "...", "\u{1F44D}"] {
            assert_eq!(m.lookup(literal), None, "{}", literal);
            assert!(!m.is_recognized(&Cell::Text(literal.to_string())), "{}", literal);
            match m.map_cell(&Cell::Text(literal.to_string()), "**X**") {
                Err(PipelineError::AnswerMapping { literal: l, column }) => {
                    assert_eq!(l, literal);
                    assert_eq!(column, "**X**");
                }
                other => panic!("unexpected result for {:?}: {:?}", literal, other),
            }
        }
        assert_eq!(m.lookup("   "), Some(Answer::NoOpinion));
    }

    #[test]
    fn numbers_are_not_answers() {
        let m = mapper();
        assert!(!m.is_recognized(&Cell::Number(3.0)));
        assert!(m.map_cell(&Cell::Number(3.0), "q").is_err());
        assert!(m.is_recognized(&Cell::Text("vaak".to_string())));
        assert!(m.is_recognized(&Cell::Empty));
    }
}
