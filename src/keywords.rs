//! Keyword set parsing and matching
//!
//! Keywords are supplied once per session as a single line separated by
//! ASCII (`,`) or fullwidth (`，`) commas. Matching is a case-insensitive
//! substring test against an item's display name.

/// Separators accepted between keywords
const SEPARATORS: [char; 2] = [',', '，'];

/// An ordered, de-duplicated set of non-empty keywords
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordSet {
    /// Keywords as entered (trimmed)
    originals: Vec<String>,

    /// Lowercased forms, index-aligned with `originals`
    lowered: Vec<String>,
}

impl KeywordSet {
    /// Parses a comma-separated keyword line
    ///
    /// Parts are trimmed and empty parts dropped. A keyword equal to an
    /// earlier one ignoring case is dropped too.
    ///
    /// # Example
    ///
    /// ```
    /// use magic_market_scanner::KeywordSet;
    ///
    /// let keywords = KeywordSet::parse("Sword， shield ,,sword");
    /// assert_eq!(keywords.as_slice(), ["Sword", "shield"]);
    /// ```
    pub fn parse(input: &str) -> Self {
        Self::from_keywords(input.split(SEPARATORS))
    }

    /// Builds a keyword set from already separated keywords
    pub fn from_keywords<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::default();
        for keyword in keywords {
            let trimmed = keyword.as_ref().trim();
            if trimmed.is_empty() {
                continue;
            }
            let lowered = trimmed.to_lowercase();
            if set.lowered.contains(&lowered) {
                continue;
            }
            set.originals.push(trimmed.to_string());
            set.lowered.push(lowered);
        }
        set
    }

    pub fn is_empty(&self) -> bool {
        self.originals.is_empty()
    }

    pub fn len(&self) -> usize {
        self.originals.len()
    }

    /// Keywords in input order, as entered
    pub fn as_slice(&self) -> &[String] {
        &self.originals
    }

    /// Returns the first keyword contained in `name`, ignoring case
    pub fn first_match(&self, name: &str) -> Option<&str> {
        if self.is_empty() {
            return None;
        }
        let name = name.to_lowercase();
        self.lowered
            .iter()
            .position(|keyword| name.contains(keyword.as_str()))
            .map(|index| self.originals[index].as_str())
    }

    /// Returns true if any keyword is contained in `name`, ignoring case
    pub fn matches(&self, name: &str) -> bool {
        self.first_match(name).is_some()
    }
}

impl std::fmt::Display for KeywordSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.originals.join(", "))
    }
}
