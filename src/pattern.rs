// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Glob-like patterns with named captures.
//!
//! A pattern such as `pkg/:name.deb` matches `pkg/tool.deb` and binds
//! `name = "tool"`. A capture extends up to the first occurrence of the text
//! that follows it, so captures are bounded by delimiters rather than by
//! character classes. A capture at the end of a pattern takes the rest of
//! the subject. Captured values can be substituted into other patterns with
//! [`Match::interpolate`].

use std::collections::HashMap;

use crate::lexer::{Token, tokenize};

/// Capture name always bound to the complete subject of a successful match.
pub const FULL_SUBJECT: &str = "*";

/// Replacement emitted by [`Match::interpolate`] for unknown capture names.
pub const MISSING: &str = "(MISSING)";

/// Pattern compiled from a string once and matched many times.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    source: String,
    tokens: Vec<Token>
}

impl Pattern {
    /// Compiles `source` into a pattern.
    ///
    /// # Examples
    ///
    /// ```
    /// use gack::Pattern;
    ///
    /// let pattern = Pattern::new("pkg/:name.deb");
    /// let matched = pattern.matches("pkg/tool.deb");
    /// assert!(matched.is_match());
    /// assert_eq!(matched.param("name"), Some("tool"));
    /// assert_eq!(matched.interpolate("build/:name"), "build/tool");
    /// ```
    pub fn new(source: &str) -> Self {
        Self {
            source: source.to_owned(),
            tokens: tokenize(source)
        }
    }

    /// Returns the string the pattern was compiled from.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Returns the compiled token sequence.
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Matches `subject` against the pattern.
    ///
    /// The whole subject must be consumed. On failure the returned [`Match`]
    /// carries no captures.
    pub fn matches(&self, subject: &str) -> Match {
        match self.capture(subject) {
            Some(mut captures) => {
                captures.insert(FULL_SUBJECT.to_owned(), subject.to_owned());
                Match {
                    subject: subject.to_owned(),
                    matched: true,
                    captures
                }
            }
            None => Match::failed(subject)
        }
    }

    fn capture(&self, subject: &str) -> Option<HashMap<String, String>> {
        let mut captures = HashMap::new();
        let mut remaining = subject;

        for (index, token) in self.tokens.iter().enumerate() {
            match token {
                Token::Literal(text) => {
                    remaining = remaining.strip_prefix(text.as_str())?;
                }
                Token::Capture(name) => match self.tokens.get(index + 1) {
                    None => {
                        captures.insert(name.clone(), remaining.to_owned());
                        remaining = "";
                    }
                    Some(next) => {
                        let boundary = remaining.find(&*next.source_text())?;
                        captures.insert(name.clone(), remaining[..boundary].to_owned());
                        remaining = &remaining[boundary..];
                    }
                }
            }
        }

        remaining.is_empty().then_some(captures)
    }
}

/// Outcome of matching a subject against a [`Pattern`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    subject:  String,
    matched:  bool,
    captures: HashMap<String, String>
}

impl Match {
    fn failed(subject: &str) -> Self {
        Self {
            subject:  subject.to_owned(),
            matched:  false,
            captures: HashMap::new()
        }
    }

    /// Returns the subject the pattern was matched against.
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Indicates whether the subject matched the pattern.
    pub fn is_match(&self) -> bool {
        self.matched
    }

    /// Returns the value captured under `name`, including [`FULL_SUBJECT`].
    pub fn param(&self, name: &str) -> Option<&str> {
        self.captures.get(name).map(String::as_str)
    }

    /// Returns every capture of the match.
    pub fn captures(&self) -> &HashMap<String, String> {
        &self.captures
    }

    /// Substitutes captured values into `template`.
    ///
    /// The template is tokenized like a pattern. Captures this match does not
    /// know are rendered as [`MISSING`] so the mistake shows up in the
    /// resulting subject instead of aborting.
    pub fn interpolate(&self, template: &str) -> String {
        let mut output = String::with_capacity(template.len());
        for token in tokenize(template) {
            match token {
                Token::Literal(text) => output.push_str(&text),
                Token::Capture(name) => {
                    output.push_str(self.param(&name).unwrap_or(MISSING));
                }
            }
        }
        output
    }
}
