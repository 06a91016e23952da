//! Tokens of the patch text format.

use std::fmt;

use crate::span::Span;

/// A lexical token of a patch source.
///
/// Atoms are kept exactly as written, escapes included. Only unescaped
/// commas and semicolons are punctuation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'src> {
    /// A run of non-separator characters, e.g. `osc~`, `440` or `\$0-x`.
    Atom(&'src str),
    /// An unescaped `,`.
    Comma,
    /// An unescaped `;`, the statement terminator.
    Semicolon,
    Whitespace,
}

/// A token with its byte span in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionedToken<'src> {
    pub token: Token<'src>,
    pub span: Span,
}

impl<'src> PositionedToken<'src> {
    pub fn new(token: Token<'src>, span: Span) -> Self {
        Self { token, span }
    }
}

impl<'src> std::ops::Deref for PositionedToken<'src> {
    type Target = Token<'src>;

    fn deref(&self) -> &Self::Target {
        &self.token
    }
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Atom(text) => write!(f, "{text}"),
            Token::Comma => write!(f, ","),
            Token::Semicolon => write!(f, ";"),
            Token::Whitespace => write!(f, " "),
        }
    }
}
