//! .env file parsing.
//!
//! Credentials for the git host and the cloud account are conventionally kept
//! in a `.env` file next to the projects root. This module parses that file
//! into a plain map; layering over the process environment happens in
//! [`super::credentials`].

use anyhow::Result;
use std::collections::HashMap;
use std::path::Path;

/// Parses .env files into a map of environment variables.
///
/// # Supported Formats
///
/// - Simple: `KEY=value`
/// - Quoted: `KEY="value with spaces"` or `KEY='single quoted'`
/// - Empty: `KEY=`
/// - Comments: `# This is a comment`
/// - Whitespace around equals: `KEY = value`
/// - Values with equals signs: `URL=postgresql://host:6432/db?sslmode=require`
///
/// # Example
///
/// ```
/// use groundwork::config::EnvFileParser;
///
/// let content = r#"
/// # Git hosting
/// GITHUB_API_TOKEN=ghp_abc123
/// GITHUB_USERNAME="octocat"
/// "#;
///
/// let vars = EnvFileParser::parse(content).unwrap();
/// assert_eq!(vars.get("GITHUB_API_TOKEN"), Some(&"ghp_abc123".to_string()));
/// assert_eq!(vars.get("GITHUB_USERNAME"), Some(&"octocat".to_string()));
/// ```
pub struct EnvFileParser;

impl EnvFileParser {
    /// Parse an env file content string into a map of variables.
    pub fn parse(content: &str) -> Result<HashMap<String, String>> {
        let mut vars = HashMap::new();

        for line in content.lines() {
            let line = line.trim();

            // Skip empty lines and comments
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some((key, value)) = Self::parse_line(line) {
                vars.insert(key, value);
            }
        }

        Ok(vars)
    }

    /// Parse a single line. An `export ` prefix is ignored so files written
    /// for shell sourcing still load.
    fn parse_line(line: &str) -> Option<(String, String)> {
        let line = line.strip_prefix("export ").map_or(line, str::trim);
        let eq_pos = line.find('=')?;
        let key = line[..eq_pos].trim().to_string();
        let value = line[eq_pos + 1..].trim();

        Some((key, Self::unquote(value)))
    }

    /// Remove surrounding quotes from a value.
    fn unquote(value: &str) -> String {
        if (value.starts_with('"') && value.ends_with('"'))
            || (value.starts_with('\'') && value.ends_with('\''))
        {
            if value.len() >= 2 {
                value[1..value.len() - 1].to_string()
            } else {
                value.to_string()
            }
        } else {
            value.to_string()
        }
    }

    /// Load and parse an env file from a path.
    pub fn load(path: &Path) -> Result<HashMap<String, String>> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Load and parse an env file, returning empty map if file doesn't exist.
    pub fn load_optional(path: &Path) -> Result<HashMap<String, String>> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(HashMap::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_env_file() {
        let content = r#"
KEY1=value1
KEY2=value2
"#;

        let vars = EnvFileParser::parse(content).unwrap();

        assert_eq!(vars.get("KEY1"), Some(&"value1".to_string()));
        assert_eq!(vars.get("KEY2"), Some(&"value2".to_string()));
    }

    #[test]
    fn skips_comments_and_empty_lines() {
        let content = r#"
# This is a comment
KEY=value

# Another comment
"#;

        let vars = EnvFileParser::parse(content).unwrap();

        assert_eq!(vars.len(), 1);
        assert_eq!(vars.get("KEY"), Some(&"value".to_string()));
    }

    #[test]
    fn handles_quoted_values() {
        let content = r#"
DOUBLE="double quoted"
SINGLE='single quoted'
UNQUOTED=no quotes
"#;

        let vars = EnvFileParser::parse(content).unwrap();

        assert_eq!(vars.get("DOUBLE"), Some(&"double quoted".to_string()));
        assert_eq!(vars.get("SINGLE"), Some(&"single quoted".to_string()));
        assert_eq!(vars.get("UNQUOTED"), Some(&"no quotes".to_string()));
    }

    #[test]
    fn strips_export_prefix() {
        let content = r#"
export KEY1=value1
KEY2=value2
"#;

        let vars = EnvFileParser::parse(content).unwrap();

        assert_eq!(vars.get("KEY1"), Some(&"value1".to_string()));
        assert_eq!(vars.get("KEY2"), Some(&"value2".to_string()));
    }

    #[test]
    fn handles_empty_values() {
        let vars = EnvFileParser::parse("EMPTY=").unwrap();
        assert_eq!(vars.get("EMPTY"), Some(&"".to_string()));
    }

    #[test]
    fn handles_values_with_equals() {
        let content = "DATABASE_URL=postgresql://u:p@host:6432/db?sslmode=require";

        let vars = EnvFileParser::parse(content).unwrap();

        assert!(vars.get("DATABASE_URL").unwrap().contains("sslmode=require"));
    }

    #[test]
    fn handles_whitespace_around_equals() {
        let vars = EnvFileParser::parse("KEY = value with spaces").unwrap();
        assert_eq!(vars.get("KEY"), Some(&"value with spaces".to_string()));
    }

    #[test]
    fn skips_lines_without_equals() {
        let content = r#"
KEY1=value1
invalid line without equals
KEY2=value2
"#;

        let vars = EnvFileParser::parse(content).unwrap();

        assert_eq!(vars.len(), 2);
    }

    #[test]
    fn load_optional_returns_empty_for_missing_file() {
        let result = EnvFileParser::load_optional(Path::new("/nonexistent/path/.env"));

        assert!(result.is_ok());
        assert!(result.unwrap().is_empty());
    }

    #[test]
    fn credential_file_round_trip() {
        let content = r#"
# Git hosting
GITHUB_API_TOKEN=ghp_abc123
GITHUB_USERNAME=octocat

# Cloud account
YC_OAUTH_TOKEN='y0_secret'
YC_FOLDER_ID=b1gexample

# Database admin
DB_ADMIN_USERNAME=admin
DB_ADMIN_PASSWORD="s3cret pass"
"#;

        let vars = EnvFileParser::parse(content).unwrap();

        assert_eq!(vars.get("GITHUB_USERNAME"), Some(&"octocat".to_string()));
        assert_eq!(vars.get("YC_OAUTH_TOKEN"), Some(&"y0_secret".to_string()));
        assert_eq!(vars.get("DB_ADMIN_PASSWORD"), Some(&"s3cret pass".to_string()));
    }
}
