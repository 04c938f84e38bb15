use crate::error::ConfigError;
use glob::Pattern;
use regex::Regex;

/// A URI criterion for record filtering
#[derive(Debug, Clone)]
pub enum UriPattern {
    /// Exact URI match (case-sensitive)
    Exact(String),
    /// Glob pattern match (e.g., /api/*/items)
    Glob(Pattern),
    /// Unanchored regular expression
    Regex(Regex),
    /// Substring match
    Contains(String),
}

impl UriPattern {
    /// Parse an equality pattern.
    ///
    /// If the pattern contains '*' or '?', it's treated as a glob pattern.
    /// Otherwise, it's treated as an exact match.
    pub fn parse(pattern: &str) -> std::result::Result<Self, ConfigError> {
        if pattern.contains('*') || pattern.contains('?') {
            let glob_pattern = Pattern::new(pattern).map_err(|e| {
                ConfigError::InvalidFilter(format!("invalid glob pattern '{}': {}", pattern, e))
            })?;
            Ok(UriPattern::Glob(glob_pattern))
        } else {
            Ok(UriPattern::Exact(pattern.to_string()))
        }
    }

    pub fn regex(pattern: &str) -> std::result::Result<Self, ConfigError> {
        let regex = Regex::new(pattern).map_err(|e| {
            ConfigError::InvalidFilter(format!("invalid regex '{}': {}", pattern, e))
        })?;
        Ok(UriPattern::Regex(regex))
    }

    pub fn matches(&self, uri: &str) -> bool {
        match self {
            UriPattern::Exact(pattern) => uri == pattern,
            UriPattern::Glob(pattern) => pattern.matches(uri),
            UriPattern::Regex(regex) => regex.is_match(uri),
            UriPattern::Contains(needle) => uri.contains(needle.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match() {
        let pattern = UriPattern::parse("/api/users").unwrap();
        assert!(pattern.matches("/api/users"));
        assert!(!pattern.matches("/API/USERS"));
        assert!(!pattern.matches("/api/users/1"));
    }

    #[test]
    fn test_glob_wildcard() {
        let pattern = UriPattern::parse("/api/*/items").unwrap();
        assert!(pattern.matches("/api/v1/items"));
        assert!(pattern.matches("/api/v2/items"));
        assert!(!pattern.matches("/api/v1/orders"));
    }

    #[test]
    fn test_glob_question_mark() {
        let pattern = UriPattern::parse("/v?/health").unwrap();
        assert!(pattern.matches("/v1/health"));
        assert!(!pattern.matches("/v10/health"));
    }

    #[test]
    fn test_regex_is_unanchored() {
        let pattern = UriPattern::regex(r"/estate/\d+").unwrap();
        assert!(pattern.matches("/api/estate/12"));
        assert!(!pattern.matches("/api/estate/search"));
        assert!(UriPattern::regex("(").is_err());
    }

    #[test]
    fn test_contains() {
        let pattern = UriPattern::Contains("login".to_string());
        assert!(pattern.matches("/auth/login"));
        assert!(!pattern.matches("/auth/logout"));
    }
}
