use std::path::Path;

use regex::Regex;

use crate::errors::VerityError;

/// A path glob supporting `*`, `**` and `?`.
///
/// Patterns without a `/` are matched against the file name only. Other
/// patterns are matched against the trailing components of the path, or the
/// whole path when they start with `/`.
#[derive(Debug, Clone)]
pub struct GlobPattern {
    pattern: String,
    regex: Regex,
}

impl GlobPattern {
    pub fn new(pattern: &str) -> Result<Self, VerityError> {
        let regex = Regex::new(&translate(pattern)).map_err(|source| {
            VerityError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            }
        })?;
        Ok(Self {
            pattern: pattern.to_string(),
            regex,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    pub fn matches(&self, path: &Path) -> bool {
        if self.pattern.contains('/') {
            let normalized = path.to_string_lossy().replace('\\', "/");
            self.regex.is_match(&normalized)
        } else {
            path.file_name()
                .map(|name| self.regex.is_match(&name.to_string_lossy()))
                .unwrap_or(false)
        }
    }
}

fn translate(pattern: &str) -> String {
    let mut out = String::from(if pattern.starts_with('/') {
        "^"
    } else {
        "(?:^|/)"
    });
    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '*' if chars.peek() == Some(&'*') => {
                chars.next();
                if chars.peek() == Some(&'/') {
                    chars.next();
                    out.push_str("(?:.*/)?");
                } else {
                    out.push_str(".*");
                }
            }
            '*' => out.push_str("[^/]*"),
            '?' => out.push_str("[^/]"),
            other => out.push_str(&regex::escape(other.encode_utf8(&mut [0; 4]))),
        }
    }
    out.push('$');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn glob(pattern: &str) -> GlobPattern {
        GlobPattern::new(pattern).unwrap()
    }

    #[test]
    fn test_default_pattern_matches_test_files_anywhere() {
        let pattern = glob("**/test*");
        assert!(pattern.matches(Path::new("test_math.yaml")));
        assert!(pattern.matches(Path::new("/tmp/suite/tests/test_math.yaml")));
        assert!(!pattern.matches(Path::new("/tmp/suite/tests/helpers.yaml")));
    }

    #[test]
    fn test_name_only_patterns() {
        let pattern = glob("*.yml");
        assert!(pattern.matches(Path::new("a/b/c.yml")));
        assert!(!pattern.matches(Path::new("a/b/c.yaml")));
        assert!(glob("test_?.yaml").matches(Path::new("x/test_1.yaml")));
        assert!(!glob("test_?.yaml").matches(Path::new("x/test_12.yaml")));
    }

    #[test]
    fn test_directory_patterns() {
        let pattern = glob("fixtures/*.yaml");
        assert!(pattern.matches(Path::new("/repo/tests/fixtures/test_a.yaml")));
        assert!(!pattern.matches(Path::new("/repo/tests/fixtures/deep/test_a.yaml")));
        assert!(glob("fixtures/**/*.yaml").matches(Path::new("/repo/fixtures/deep/test_a.yaml")));
    }

    #[test]
    fn test_literal_characters_are_escaped() {
        let pattern = glob("test.yaml");
        assert!(pattern.matches(Path::new("test.yaml")));
        assert!(!pattern.matches(Path::new("testXyaml")));
    }
}
