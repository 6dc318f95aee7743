use crate::config::SearchConfig;
use crate::model::MenuItem;
use nucleo_matcher::pattern::{Atom, AtomKind, CaseMatching, Normalization};
use nucleo_matcher::{Matcher, Utf32Str};

/// Decides which items a query selects.
///
/// Fuzzy mode is an ordered-subsequence match against the display name only.
/// Substring mode looks for the query as a contiguous run inside the display
/// name, any keyword, or the description.
pub struct ItemMatcher {
    matcher: Matcher,
    buf: Vec<char>,
    fuzzy: bool,
    case_sensitive: bool,
}

impl ItemMatcher {
    pub fn new(search: &SearchConfig) -> Self {
        Self {
            matcher: Matcher::new(nucleo_matcher::Config::DEFAULT),
            buf: Vec::new(),
            fuzzy: search.fuzzy_matching,
            case_sensitive: search.case_sensitive,
        }
    }

    fn atom(&self, query: &str) -> Atom {
        let case = if self.case_sensitive {
            CaseMatching::Respect
        } else {
            CaseMatching::Ignore
        };
        let kind = if self.fuzzy { AtomKind::Fuzzy } else { AtomKind::Substring };
        Atom::new(query, case, Normalization::Never, kind, false)
    }

    pub fn matches(&mut self, query: &str, item: &MenuItem) -> bool {
        if query.is_empty() {
            return true;
        }
        let atom = self.atom(query);
        self.matches_atom(&atom, item)
    }

    /// Indices into `items` that match `query`, in their original order.
    pub fn filter(&mut self, query: &str, items: &[MenuItem]) -> Vec<usize> {
        if query.is_empty() {
            return (0..items.len()).collect();
        }
        let atom = self.atom(query);
        items
            .iter()
            .enumerate()
            .filter(|(_, item)| self.matches_atom(&atom, item))
            .map(|(i, _)| i)
            .collect()
    }

    fn matches_atom(&mut self, atom: &Atom, item: &MenuItem) -> bool {
        if self.hit(atom, item.display_name()) {
            return true;
        }
        if self.fuzzy {
            return false;
        }
        for keyword in item.search_keywords() {
            if self.hit(atom, keyword) {
                return true;
            }
        }
        item.description().is_some_and(|d| self.hit(atom, d))
    }

    fn hit(&mut self, atom: &Atom, haystack: &str) -> bool {
        let haystack = Utf32Str::new(haystack, &mut self.buf);
        atom.score(haystack, &mut self.matcher).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn search(fuzzy: bool, case_sensitive: bool) -> SearchConfig {
        SearchConfig {
            fuzzy_matching: fuzzy,
            case_sensitive,
            min_chars_for_search: 0,
        }
    }

    fn item(name: &str) -> MenuItem {
        MenuItem::command(name, "true", false).unwrap()
    }

    #[test]
    fn fuzzy_matches_ordered_subsequence() {
        let mut m = ItemMatcher::new(&search(true, false));
        assert!(m.matches("fx", &item("Firefox")));
        assert!(m.matches("fx", &item("FILE EXPLORER")));
        assert!(!m.matches("xf", &item("Firefox")));
        assert!(m.matches("", &item("Firefox")));
    }

    #[test]
    fn fuzzy_respects_case_when_configured() {
        let mut m = ItemMatcher::new(&search(true, true));
        assert!(m.matches("Fx", &item("Firefox")));
        assert!(!m.matches("fX", &item("Firefox")));
        assert!(!m.matches("FX", &item("Firefox")));
    }

    #[test]
    fn fuzzy_ignores_keywords_and_description() {
        let mut m = ItemMatcher::new(&search(true, false));
        let it = item("Terminal")
            .with_keywords(vec!["shell".to_string()])
            .with_description(Some("console".to_string()));
        assert!(!m.matches("shell", &it));
        assert!(!m.matches("console", &it));
    }

    #[test]
    fn substring_checks_name_keywords_and_description() {
        let mut m = ItemMatcher::new(&search(false, false));
        let it = item("Terminal")
            .with_keywords(vec!["System".to_string(), "Shell".to_string()])
            .with_description(Some("Use the command line".to_string()));
        assert!(m.matches("term", &it));
        assert!(m.matches("shell", &it));
        assert!(m.matches("command", &it));
        assert!(!m.matches("tml", &it));
    }

    #[test]
    fn substring_case_sensitive() {
        let mut m = ItemMatcher::new(&search(false, true));
        assert!(m.matches("Term", &item("Terminal")));
        assert!(!m.matches("term", &item("Terminal")));
    }

    #[test]
    fn filter_keeps_original_order() {
        let mut m = ItemMatcher::new(&search(true, false));
        let items = vec![item("Files"), item("Firefox"), item("Terminal"), item("Fractal")];
        assert_eq!(m.filter("f", &items), vec![0, 1, 3]);
        assert_eq!(m.filter("", &items), vec![0, 1, 2, 3]);
    }
}
