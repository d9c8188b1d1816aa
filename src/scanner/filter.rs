//! Match filter
//!
//! Selects the items of a page whose display name contains any keyword.

use crate::keywords::KeywordSet;
use crate::scanner::Item;

/// Returns the items whose name contains a keyword, in input order
///
/// An empty keyword set matches nothing.
pub fn matches<'a>(items: &'a [Item], keywords: &KeywordSet) -> Vec<&'a Item> {
    if keywords.is_empty() {
        return Vec::new();
    }
    items
        .iter()
        .filter(|item| keywords.matches(&item.name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> Vec<Item> {
        vec![
            Item::new(1, "Iron Sword", "10"),
            Item::new(2, "Wooden Shield", "5"),
            Item::new(3, "sword of dawn", "99"),
            Item::new(4, "初音未来 手办", "199"),
        ]
    }

    #[test]
    fn test_matches_keep_input_order() {
        let items = page();
        let keywords = KeywordSet::parse("SWORD");

        let ids: Vec<_> = matches(&items, &keywords)
            .iter()
            .map(|item| item.key().unwrap())
            .collect();
        assert_eq!(ids, ["1", "3"]);
    }

    #[test]
    fn test_any_keyword_matches() {
        let items = page();
        let keywords = KeywordSet::parse("shield，初音");

        let names: Vec<_> = matches(&items, &keywords)
            .iter()
            .map(|item| item.name.as_str())
            .collect();
        assert_eq!(names, ["Wooden Shield", "初音未来 手办"]);
    }

    #[test]
    fn test_item_matching_several_keywords_listed_once() {
        let items = vec![Item::new(1, "sword and shield", "1")];
        let keywords = KeywordSet::parse("sword, shield");
        assert_eq!(matches(&items, &keywords).len(), 1);
    }

    #[test]
    fn test_empty_keywords_match_nothing() {
        let items = page();
        assert!(matches(&items, &KeywordSet::default()).is_empty());
        assert!(matches(&items, &KeywordSet::parse(" ， ")).is_empty());
    }

    #[test]
    fn test_empty_page() {
        assert!(matches(&[], &KeywordSet::parse("sword")).is_empty());
    }
}
