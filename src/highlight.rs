use regex::{Regex, RegexBuilder};

pub fn build_highlight_regex(term: &str) -> Option<Regex> {
    if term.is_empty() {
        return None;
    }
    RegexBuilder::new(&regex::escape(term))
        .case_insensitive(true)
        .build()
        .ok()
}

pub fn match_ranges(text: &str, regex: Option<&Regex>) -> Vec<(usize, usize)> {
    regex
        .map(|re| re.find_iter(text).map(|m| (m.start(), m.end())).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_case_insensitively() {
        let regex = build_highlight_regex("slack").expect("regex");
        let matches: Vec<_> = regex
            .find_iter("Slack Pro by SLACK Technologies")
            .map(|m| m.as_str())
            .collect();
        assert_eq!(matches, vec!["Slack", "SLACK"]);
    }

    #[test]
    fn treats_term_as_literal() {
        let regex = build_highlight_regex("c++ (pro)").expect("regex");
        assert!(regex.is_match("Visual C++ (Pro) Edition"));
        assert!(!regex.is_match("c (pro)"));
    }

    #[test]
    fn empty_term_highlights_nothing() {
        assert!(build_highlight_regex("").is_none());
        assert!(match_ranges("anything", None).is_empty());
    }

    #[test]
    fn reports_byte_ranges() {
        let regex = build_highlight_regex("it");
        assert_eq!(
            match_ranges("IT suite", regex.as_ref()),
            vec![(0, 2), (5, 7)]
        );
    }
}
