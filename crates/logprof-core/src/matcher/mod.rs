use crate::error::ConfigError;
use regex::Regex;

/// One matching group: the pattern text doubles as the normalized key.
#[derive(Debug, Clone)]
pub struct MatchGroup {
    pattern: String,
    regex: Regex,
}

impl MatchGroup {
    /// Compile a matching group. The expression must match the whole URI.
    pub fn parse(pattern: &str) -> std::result::Result<Self, ConfigError> {
        let regex = Regex::new(&format!("^(?:{})$", pattern)).map_err(|e| {
            ConfigError::InvalidPattern(format!("'{}': {}", pattern, e))
        })?;
        Ok(Self {
            pattern: pattern.to_string(),
            regex,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn matches(&self, uri: &str) -> bool {
        self.regex.is_match(uri)
    }
}

/// Collapses parameterized paths into endpoint keys.
///
/// Groups are tried in configuration order and the first match wins. The
/// list is fixed once built; there is no way to reorder or extend it.
#[derive(Debug, Clone, Default)]
pub struct UriMatcher {
    groups: Vec<MatchGroup>,
}

impl UriMatcher {
    pub fn new<I, S>(patterns: I) -> std::result::Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let groups = patterns
            .into_iter()
            .map(|p| MatchGroup::parse(p.as_ref()))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        tracing::debug!("Compiled {} URI matching groups", groups.len());
        Ok(Self { groups })
    }

    /// Normalize a raw URI: the first matching group's pattern, or the URI
    /// itself when nothing matches.
    pub fn classify<'a>(&'a self, uri: &'a str) -> &'a str {
        self.groups
            .iter()
            .find(|group| group.matches(uri))
            .map(|group| group.pattern())
            .unwrap_or(uri)
    }

    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|g| g.pattern())
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}
