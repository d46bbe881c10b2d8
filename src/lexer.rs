// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Single-pass tokenizer splitting pattern strings into literal and capture
//! segments.
//!
//! A capture is introduced by [`DELIMITER`] and spans the alphabetic
//! characters that follow it. The first non-alphabetic character ends the
//! capture and starts the next literal without being consumed, so `:a:b`
//! yields two adjacent captures and `:_` yields a capture with an empty name.

use std::{borrow::Cow, fmt, iter::Peekable, str::CharIndices};

/// Character introducing a named capture inside a pattern.
pub const DELIMITER: char = ':';

/// Segment of a compiled pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Token {
    /// Text that must appear verbatim. Never empty.
    Literal(String),
    /// Named capture; the name excludes the delimiter.
    Capture(String)
}

impl Token {
    /// Returns the text this token was scanned from.
    ///
    /// Literals borrow their text; captures are rendered with the delimiter
    /// prefix so the result can be searched for inside a subject.
    pub fn source_text(&self) -> Cow<'_, str> {
        match self {
            Self::Literal(text) => Cow::Borrowed(text.as_str()),
            Self::Capture(name) => Cow::Owned(format!("{DELIMITER}{name}"))
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(text) => f.write_str(text),
            Self::Capture(name) => write!(f, "{DELIMITER}{name}")
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Literal,
    Capture,
    Finished
}

struct Lexer<'input> {
    input:       &'input str,
    chars:       Peekable<CharIndices<'input>>,
    token_start: usize,
    tokens:      Vec<Token>
}

impl<'input> Lexer<'input> {
    fn new(input: &'input str) -> Self {
        Self {
            input,
            chars: input.char_indices().peekable(),
            token_start: 0,
            tokens: Vec::new()
        }
    }

    fn step(&mut self, state: State) -> State {
        match state {
            State::Literal => match self.chars.peek().copied() {
                None => {
                    self.flush_literal(self.input.len());
                    State::Finished
                }
                Some((index, DELIMITER)) => {
                    self.flush_literal(index);
                    self.chars.next();
                    self.token_start = index + DELIMITER.len_utf8();
                    State::Capture
                }
                Some(_) => {
                    self.chars.next();
                    State::Literal
                }
            },
            State::Capture => match self.chars.peek().copied() {
                Some((_, candidate)) if candidate.is_alphabetic() => {
                    self.chars.next();
                    State::Capture
                }
                Some((index, _)) => {
                    self.emit_capture(index);
                    State::Literal
                }
                None => {
                    self.emit_capture(self.input.len());
                    State::Finished
                }
            },
            State::Finished => State::Finished
        }
    }

    fn flush_literal(&mut self, end: usize) {
        if end > self.token_start {
            self.tokens
                .push(Token::Literal(self.input[self.token_start..end].to_owned()));
        }
        self.token_start = end;
    }

    fn emit_capture(&mut self, end: usize) {
        self.tokens
            .push(Token::Capture(self.input[self.token_start..end].to_owned()));
        self.token_start = end;
    }
}

/// Splits `input` into literal and capture tokens.
///
/// # Examples
///
/// ```
/// use gack::{Token, tokenize};
///
/// let tokens = tokenize("build/:package_:arch");
/// assert_eq!(
///     tokens,
///     vec![
///         Token::Literal("build/".to_owned()),
///         Token::Capture("package".to_owned()),
///         Token::Literal("_".to_owned()),
///         Token::Capture("arch".to_owned()),
///     ]
/// );
/// ```
pub fn tokenize(input: &str) -> Vec<Token> {
    let mut lexer = Lexer::new(input);
    let mut state = State::Literal;
    while state != State::Finished {
        state = lexer.step(state);
    }
    lexer.tokens
}
