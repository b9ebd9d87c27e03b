//! Text clean-up shared by header and answer matching.
//!
//! Survey exports regularly go through a tool that reads UTF-8 as Windows-1252,
//! which turns `’` into `â€™` and `ë` into `Ã«`. The most common sequences are
//! mapped back before comparing.

const MOJIBAKE: &[(&str, &str)] = &[
    ("\u{feff}", ""),
    ("ï»¿", ""),
    ("ðŸ”¹", ""),
    ("â€™", "'"),
    ("â€˜", "'"),
    ("â€œ", "\""),
    ("â€\u{9d}", "\""),
    ("â€“", "-"),
    ("â€”", "-"),
    ("â€¦", "..."),
    ("Ã«", "ë"),
    ("Ã©", "é"),
    ("Ã¨", "è"),
    ("Ã¯", "ï"),
    ("Ã¶", "ö"),
    ("Ã¼", "ü"),
    ("Ã¤", "ä"),
    ("Ã‹", "Ë"),
    ("Â\u{a0}", " "),
    ("\u{a0}", " "),
    ("’", "'"),
    ("‘", "'"),
    ("–", "-"),
    ("—", "-"),
];

/// Maps the known mis-decoded sequences back to the intended characters.
pub fn repair_mojibake(s: &str) -> String {
    let mut res = s.to_string();
    for (broken, fixed) in MOJIBAKE {
        if res.contains(broken) {
            res = res.replace(broken, fixed);
        }
    }
    res
}

/// The comparison key of a header phrasing or an answer token: repaired,
/// lowercased, punctuation dropped and whitespace collapsed.
///
/// `"  Wie ben  jij? "` and `"wie ben jij"` share the key `"wie ben jij"`.
pub fn normalize_label(s: &str) -> String {
    let repaired = repair_mojibake(s).to_lowercase();
    let spaced: String = repaired
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    spaced.split_whitespace().collect::<Vec<&str>>().join(" ")
}

/// Lowercased and trimmed, used for reviewer and subject names.
pub fn normalize_name(s: &str) -> String {
    s.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repairs_windows_1252_sequences() {
        assert_eq!(repair_mojibake("Donâ€™t know"), "Don't know");
        assert_eq!(repair_mojibake("efficiÃ«nt"), "efficiënt");
        assert_eq!(repair_mojibake("ðŸ”¹ **TEAMSPELER**"), " **TEAMSPELER**");
    }

    #[test]
    fn labels_ignore_case_and_punctuation() {
        assert_eq!(normalize_label("  Wie ben  jij? "), "wie ben jij");
        assert_eq!(normalize_label("\u{feff}Wie ben jij?"), "wie ben jij");
        assert_eq!(normalize_label("Don’t know"), normalize_label("don't know"));
        assert_eq!(normalize_label("N/A"), "n a");
    }
}
