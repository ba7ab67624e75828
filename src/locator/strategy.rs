//! Locator strategies: the individual lookup rules a target can be found by.

use crate::error::{Result, UiScoutError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a text or accessible name is compared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TextMatch {
    /// Whitespace-normalized equality.
    Exact { value: String },
    /// Case-insensitive substring.
    Contains { value: String },
    /// Regular expression tested against the normalized text.
    Pattern {
        source: String,
        #[serde(default)]
        ignore_case: bool,
    },
}

impl TextMatch {
    pub fn exact(value: impl Into<String>) -> Self {
        TextMatch::Exact {
            value: value.into(),
        }
    }

    pub fn contains(value: impl Into<String>) -> Self {
        TextMatch::Contains {
            value: value.into(),
        }
    }

    /// Case-insensitive pattern, the `/.../i` form.
    pub fn pattern(source: impl Into<String>) -> Self {
        TextMatch::Pattern {
            source: source.into(),
            ignore_case: true,
        }
    }

    /// Reject a pattern before it reaches a page. Patterns run as JavaScript
    /// `RegExp`s, so only syntax both engines read the same way is accepted.
    pub fn validate(&self) -> Result<()> {
        if let TextMatch::Pattern {
            source,
            ignore_case,
        } = self
        {
            let invalid = |reason: String| {
                UiScoutError::Validation(format!("Invalid pattern /{}/: {}", source, reason))
            };
            check_portable(source).map_err(invalid)?;
            regex::RegexBuilder::new(source)
                .case_insensitive(*ignore_case)
                .build()
                .map_err(|e| invalid(e.to_string()))?;
        }
        Ok(())
    }
}

/// Syntax outside the subset shared by the `regex` crate and JavaScript:
/// groups other than `(?:...)` (inline flags, lookaround, named groups),
/// backreferences, `\A`/`\z`, Unicode classes and POSIX classes.
fn check_portable(source: &str) -> std::result::Result<(), String> {
    let mut chars = source.chars().peekable();
    let mut in_class = false;
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some(d @ '1'..='9') => {
                    return Err(format!("backreference \\{} is not supported", d))
                }
                Some(e @ ('k' | 'A' | 'z' | 'Z' | 'p' | 'P' | 'Q' | 'E')) => {
                    return Err(format!("\\{} is not supported in page patterns", e))
                }
                _ => {}
            },
            '[' if in_class && chars.peek() == Some(&':') => {
                return Err("POSIX character classes are not supported".to_string())
            }
            '[' => in_class = true,
            ']' if in_class => in_class = false,
            '(' if !in_class && chars.peek() == Some(&'?') => {
                chars.next();
                if chars.next() != Some(':') {
                    return Err(
                        "only (?:...) groups are supported; use ignore_case instead of inline flags"
                            .to_string(),
                    );
                }
            }
            _ => {}
        }
    }
    Ok(())
}

impl fmt::Display for TextMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextMatch::Exact { value } => write!(f, "\"{}\"", value),
            TextMatch::Contains { value } => write!(f, "{}", value),
            TextMatch::Pattern {
                source,
                ignore_case,
            } => write!(f, "/{}/{}", source, if *ignore_case { "i" } else { "" }),
        }
    }
}

/// A single rule for finding an element in the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "by", rename_all = "snake_case")]
pub enum Locator {
    Css {
        selector: String,
        /// Keep only matches whose text contains this value.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        has_text: Option<String>,
    },
    Role {
        role: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<TextMatch>,
    },
    Placeholder {
        text: TextMatch,
    },
    Text {
        text: TextMatch,
    },
}

impl Locator {
    pub fn css(selector: impl Into<String>) -> Self {
        Locator::Css {
            selector: selector.into(),
            has_text: None,
        }
    }

    pub fn css_with_text(selector: impl Into<String>, text: impl Into<String>) -> Self {
        Locator::Css {
            selector: selector.into(),
            has_text: Some(text.into()),
        }
    }

    pub fn role(role: impl Into<String>) -> Self {
        Locator::Role {
            role: role.into(),
            name: None,
        }
    }

    /// Role with an accessible name, matched as a case-insensitive substring.
    pub fn role_named(role: impl Into<String>, name: impl Into<String>) -> Self {
        Locator::Role {
            role: role.into(),
            name: Some(TextMatch::contains(name)),
        }
    }

    pub fn role_exact(role: impl Into<String>, name: impl Into<String>) -> Self {
        Locator::Role {
            role: role.into(),
            name: Some(TextMatch::exact(name)),
        }
    }

    pub fn role_matching(role: impl Into<String>, pattern: impl Into<String>) -> Self {
        Locator::Role {
            role: role.into(),
            name: Some(TextMatch::pattern(pattern)),
        }
    }

    pub fn placeholder(text: impl Into<String>) -> Self {
        Locator::Placeholder {
            text: TextMatch::contains(text),
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Locator::Text {
            text: TextMatch::contains(text),
        }
    }

    pub fn text_exact(text: impl Into<String>) -> Self {
        Locator::Text {
            text: TextMatch::exact(text),
        }
    }

    pub fn text_matching(pattern: impl Into<String>) -> Self {
        Locator::Text {
            text: TextMatch::pattern(pattern),
        }
    }

    /// Stable description used in diagnostics and logs.
    pub fn describe(&self) -> String {
        match self {
            Locator::Css { selector, has_text } => match has_text {
                Some(text) => format!("css={} >> has-text={}", selector, text),
                None => format!("css={}", selector),
            },
            Locator::Role { role, name } => match name {
                Some(name) => format!("role={}[name={}]", role, name),
                None => format!("role={}", role),
            },
            Locator::Placeholder { text } => format!("placeholder={}", text),
            Locator::Text { text } => format!("text={}", text),
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            Locator::Css { selector, .. } if selector.trim().is_empty() => Err(
                UiScoutError::Validation("CSS selector cannot be empty".to_string()),
            ),
            Locator::Css { .. } => Ok(()),
            Locator::Role { role, .. } if role.trim().is_empty() => {
                Err(UiScoutError::Validation("Role cannot be empty".to_string()))
            }
            Locator::Role { name, .. } => name.as_ref().map_or(Ok(()), TextMatch::validate),
            Locator::Placeholder { text } | Locator::Text { text } => text.validate(),
        }
    }

    /// Whether filling this element should keep the value out of logs.
    pub fn is_secret(&self) -> bool {
        let mentions_password = |s: &str| s.to_lowercase().contains("password");
        match self {
            Locator::Css { selector, .. } => {
                mentions_password(selector) || selector.contains("type=\"password\"")
            }
            Locator::Role { name, .. } => name
                .as_ref()
                .is_some_and(|n| mentions_password(&n.to_string())),
            Locator::Placeholder { text } => mentions_password(&text.to_string()),
            Locator::Text { .. } => false,
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}
