// src/envfile.rs

//! Parser for the optional `KEY=VALUE` env override file.
//!
//! Accepted per line:
//! - blank lines and `# comments`
//! - an optional `export ` prefix
//! - `KEY=VALUE`, where `KEY` is `[A-Za-z_][A-Za-z0-9_]*`
//!
//! Values follow shell `source` rules closely enough for real `.env` files:
//! single quotes are literal, double quotes understand `\n \t \" \\ \$` and
//! expand `$VAR` / `${VAR}`, and unquoted values expand variables and drop a
//! trailing ` # comment`. Expansion sees keys defined earlier in the same file
//! first, then the caller-provided lookup (the inherited environment).
//!
//! Duplicate keys: the last definition wins, keeping its first position.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::{Captures, Regex};
use tracing::{debug, warn};

use crate::config::MalformedLinePolicy;
use crate::errors::{LaunchError, Result};

static KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid key regex"));

static UNQUOTED_EXPAND_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}|\$([A-Za-z_][A-Za-z0-9_]*)")
        .expect("valid expansion regex")
});

static DOUBLE_QUOTED_EXPAND_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\\(.)|\$\{([A-Za-z_][A-Za-z0-9_]*)\}|\$([A-Za-z_][A-Za-z0-9_]*)")
        .expect("valid expansion regex")
});

/// Overrides read from an env file, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvOverrides {
    entries: Vec<(String, String)>,
}

impl EnvOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse env-file contents.
    ///
    /// `source` is only used in error messages. `lookup` resolves variables
    /// not defined earlier in the file.
    pub fn parse<F>(
        contents: &str,
        source: &Path,
        policy: MalformedLinePolicy,
        lookup: F,
    ) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut overrides = EnvOverrides::new();

        for (idx, raw_line) in contents.lines().enumerate() {
            let line_no = idx + 1;
            let parsed = parse_line(raw_line, |name| {
                overrides
                    .get(name)
                    .map(str::to_string)
                    .or_else(|| lookup(name))
            });

            match parsed {
                Ok(Some((key, value))) => overrides.insert(key, value),
                Ok(None) => {}
                Err(reason) => match policy {
                    MalformedLinePolicy::Reject => {
                        return Err(LaunchError::EnvFile {
                            path: source.to_path_buf(),
                            line: line_no,
                            reason,
                        });
                    }
                    MalformedLinePolicy::Skip => {
                        warn!(
                            file = ?source,
                            line = line_no,
                            %reason,
                            "skipping malformed env file line"
                        );
                    }
                },
            }
        }

        Ok(overrides)
    }

    /// Set `key`, replacing any earlier value in place.
    pub fn insert(&mut self, key: String, value: String) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Result of looking for the env file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedEnvFile {
    pub path: PathBuf,
    pub overrides: EnvOverrides,
}

/// Read and parse the env file at `path`.
///
/// A missing file is `Ok(None)`. Anything else that prevents reading it (a
/// directory, permissions, invalid UTF-8) is an error.
pub fn load_env_file<F>(
    path: &Path,
    policy: MalformedLinePolicy,
    lookup: F,
) -> Result<Option<LoadedEnvFile>>
where
    F: Fn(&str) -> Option<String>,
{
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(file = ?path, "no env file; skipping overrides");
            return Ok(None);
        }
        Err(e) => {
            return Err(LaunchError::Other(
                anyhow::Error::new(e).context(format!("reading env file {:?}", path)),
            ));
        }
    };

    let overrides = EnvOverrides::parse(&contents, path, policy, lookup)?;

    Ok(Some(LoadedEnvFile {
        path: path.to_path_buf(),
        overrides,
    }))
}

/// Parse one line. `Ok(None)` for blank lines and comments.
fn parse_line<F>(raw: &str, lookup: F) -> std::result::Result<Option<(String, String)>, String>
where
    F: Fn(&str) -> Option<String>,
{
    let line = raw.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let line = line
        .strip_prefix("export")
        .filter(|rest| rest.starts_with(char::is_whitespace))
        .map(str::trim_start)
        .unwrap_or(line);

    let Some((key, value)) = line.split_once('=') else {
        return Err(format!("expected KEY=VALUE, got '{line}'"));
    };

    let key = key.trim();
    if !KEY_RE.is_match(key) {
        return Err(format!("invalid variable name '{key}'"));
    }

    let value = parse_value(value, &lookup)?;
    Ok(Some((key.to_string(), value)))
}

/// `raw` is everything after `=`; leading whitespace still matters for
/// comment detection (`KEY= # note` is empty, `KEY=#x` is `#x`).
fn parse_value<F>(raw: &str, lookup: &F) -> std::result::Result<String, String>
where
    F: Fn(&str) -> Option<String>,
{
    let value = raw.trim();
    if let Some(rest) = value.strip_prefix('\'') {
        let Some(end) = rest.find('\'') else {
            return Err("unterminated single quote".to_string());
        };
        ensure_only_comment(&rest[end + 1..])?;
        return Ok(rest[..end].to_string());
    }

    if let Some(rest) = value.strip_prefix('"') {
        let Some(end) = closing_double_quote(rest) else {
            return Err("unterminated double quote".to_string());
        };
        ensure_only_comment(&rest[end + 1..])?;
        return Ok(expand_double_quoted(&rest[..end], lookup));
    }

    Ok(expand_unquoted(strip_inline_comment(raw).trim(), lookup))
}

/// Byte index of the first `"` not preceded by a backslash escape.
fn closing_double_quote(s: &str) -> Option<usize> {
    let mut escaped = false;
    for (idx, ch) in s.char_indices() {
        match ch {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '"' => return Some(idx),
            _ => {}
        }
    }
    None
}

fn ensure_only_comment(trailing: &str) -> std::result::Result<(), String> {
    let trailing = trailing.trim_start();
    if trailing.is_empty() || trailing.starts_with('#') {
        Ok(())
    } else {
        Err(format!("unexpected text after closing quote: '{trailing}'"))
    }
}

/// `a b # note` -> `a b` and ` # note` -> empty; a `#` glued to text (`a#b`) is
/// kept.
fn strip_inline_comment(value: &str) -> &str {
    let mut prev_ws = false;
    for (idx, ch) in value.char_indices() {
        if ch == '#' && prev_ws {
            return value[..idx].trim_end();
        }
        prev_ws = ch.is_whitespace();
    }
    value
}

fn expand_unquoted<F>(value: &str, lookup: &F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    UNQUOTED_EXPAND_RE
        .replace_all(value, |caps: &Captures| {
            let name = caps.get(1).or_else(|| caps.get(2)).map_or("", |m| m.as_str());
            lookup(name).unwrap_or_default()
        })
        .into_owned()
}

fn expand_double_quoted<F>(value: &str, lookup: &F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    DOUBLE_QUOTED_EXPAND_RE
        .replace_all(value, |caps: &Captures| {
            if let Some(escaped) = caps.get(1) {
                return match escaped.as_str() {
                    "n" => "\n".to_string(),
                    "t" => "\t".to_string(),
                    "\"" | "\\" | "$" => escaped.as_str().to_string(),
                    other => format!("\\{other}"),
                };
            }
            let name = caps.get(2).or_else(|| caps.get(3)).map_or("", |m| m.as_str());
            lookup(name).unwrap_or_default()
        })
        .into_owned()
}
