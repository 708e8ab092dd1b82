//! Command-line serialization of form values
//!
//! Values are turned into one token each and appended, in registry order, to
//! a fixed prefix. Text is double-quoted when it contains whitespace or a
//! double quote, booleans become `yes`/`no`, and empty text becomes `""` so
//! every field always occupies exactly one position.

use serde::{Deserialize, Serialize};
use std::borrow::{Borrow, Cow};
use std::fmt;

use crate::form::FieldValue;

/// Prefix of every generated command
pub const DEFAULT_PREFIX: &str = "watdo todo";

/// Token written for an empty text value
const EMPTY_TOKEN: &str = "\"\"";

/// When text values get wrapped in double quotes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuotePolicy {
    /// Quote only values containing whitespace or `"`
    #[default]
    Minimal,
    /// Quote every non-empty text value
    Always,
}

/// True if the value must be quoted to stay a single shell word
#[must_use]
pub fn needs_quoting(text: &str) -> bool {
    text.chars().any(|c| c.is_whitespace() || c == '"')
}

/// Serialize one text value
#[must_use]
pub fn quote_text(text: &str, policy: QuotePolicy) -> Cow<'_, str> {
    if text.is_empty() {
        return Cow::Borrowed(EMPTY_TOKEN);
    }
    if policy == QuotePolicy::Always || needs_quoting(text) {
        Cow::Owned(format!("\"{}\"", text.replace('"', "\\\"")))
    } else {
        Cow::Borrowed(text)
    }
}

/// Serialize one field value
#[must_use]
pub fn token(value: &FieldValue, policy: QuotePolicy) -> Cow<'_, str> {
    match value {
        FieldValue::Flag(true) => Cow::Borrowed("yes"),
        FieldValue::Flag(false) => Cow::Borrowed("no"),
        FieldValue::Text(text) => quote_text(text, policy),
    }
}

/// Build the command line for `values`, in the order given.
///
/// Literal newlines are written as the two characters `\n`, so the result
/// is always a single line.
pub fn serialize<I>(prefix: &str, policy: QuotePolicy, values: I) -> CommandString
where
    I: IntoIterator,
    I::Item: Borrow<FieldValue>,
{
    let mut line = String::with_capacity(prefix.len() + 64);
    line.push_str(prefix);
    for value in values {
        if !line.is_empty() {
            line.push(' ');
        }
        line.push_str(&token(value.borrow(), policy));
    }

    let prefix_len = prefix.replace('\n', "\\n").len();
    CommandString {
        text: line.replace('\n', "\\n"),
        prefix_len,
    }
}

/// A serialized command line
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandString {
    text: String,
    prefix_len: usize,
}

impl CommandString {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn into_string(self) -> String {
        self.text
    }

    /// All whitespace-delimited tokens, prefix words included
    #[must_use]
    pub fn tokens(&self) -> Vec<&str> {
        split_tokens(&self.text)
    }

    /// Tokens after the prefix, one per field
    #[must_use]
    pub fn field_tokens(&self) -> Vec<&str> {
        split_tokens(&self.text[self.prefix_len..])
    }
}

impl fmt::Display for CommandString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl AsRef<str> for CommandString {
    fn as_ref(&self) -> &str {
        &self.text
    }
}

/// Split on spaces outside double quotes; a backslash escapes the next char
fn split_tokens(line: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut start: Option<usize> = None;
    let mut in_quotes = false;
    let mut escaped = false;

    for (i, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => {
                start.get_or_insert(i);
                escaped = true;
            }
            '"' => {
                start.get_or_insert(i);
                in_quotes = !in_quotes;
            }
            ' ' if !in_quotes => {
                if let Some(s) = start.take() {
                    tokens.push(&line[s..i]);
                }
            }
            _ => {
                start.get_or_insert(i);
            }
        }
    }
    if let Some(s) = start {
        tokens.push(&line[s..]);
    }
    tokens
}
