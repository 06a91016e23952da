//! Lexical analyzer for patch source text.
//!
//! Patch text is a sequence of statements terminated by unescaped `;`.
//! Inside a statement atoms are separated by unescaped whitespace, and an
//! unescaped `,` splits off a trailing decoration. A backslash escapes the
//! character that follows it; escapes are kept verbatim in the atoms and
//! are resolved by the consumer of each field.
//!
//! The lexer is total: every input produces tokens.

use log::{debug, warn};
use winnow::{
    Parser as _,
    combinator::{alt, opt, repeat},
    error::{ContextError, ModalResult},
    stream::{LocatingSlice, Location, Stream},
    token::{any, take_while},
};

use crate::{
    span::Span,
    statement::Statement,
    tokens::{PositionedToken, Token},
};

type Input<'a> = LocatingSlice<&'a str>;
type IResult<O> = ModalResult<O, ContextError>;

fn is_separator(c: char) -> bool {
    c.is_whitespace() || matches!(c, ',' | ';' | '\\')
}

/// A backslash and the character it escapes. A backslash at the very end
/// of the input stands alone.
fn escape_pair(input: &mut Input<'_>) -> IResult<()> {
    ('\\', opt(any)).void().parse_next(input)
}

/// Parse an atom: plain characters and escape pairs up to the next
/// unescaped separator.
fn atom<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    repeat::<_, _, (), _, _>(
        1..,
        alt((take_while(1.., |c: char| !is_separator(c)).void(), escape_pair)),
    )
    .take()
    .map(Token::Atom)
    .parse_next(input)
}

/// Parse whitespace, newlines included
fn whitespace<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    take_while(1.., char::is_whitespace)
        .value(Token::Whitespace)
        .parse_next(input)
}

/// Parse the punctuation characters
fn punctuation<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    alt((';'.value(Token::Semicolon), ','.value(Token::Comma))).parse_next(input)
}

/// Parse a single token with position tracking
fn positioned_token<'a>(input: &mut Input<'a>) -> IResult<PositionedToken<'a>> {
    let start_pos = input.current_token_start();

    let token = alt((whitespace, punctuation, atom)).parse_next(input)?;

    let end_pos = input.current_token_start();
    Ok(PositionedToken::new(token, Span::new(start_pos..end_pos)))
}

/// Lexer that accumulates tokens.
struct Lexer<'a> {
    tokens: Vec<PositionedToken<'a>>,
}

impl<'a> Lexer<'a> {
    fn new() -> Self {
        Self { tokens: Vec::new() }
    }

    fn tokenize(&mut self, mut input: Input<'a>) {
        while !input.is_empty() {
            match positioned_token(&mut input) {
                Ok(token) => self.tokens.push(token),
                Err(_) => {
                    let error_pos = input.current_token_start();
                    warn!(offset = error_pos; "Skipping unreadable character");
                    input.next_token();
                }
            }
        }
    }

    fn finish(self) -> Vec<PositionedToken<'a>> {
        self.tokens
    }
}

fn positioned_tokens(source: &str) -> Vec<PositionedToken<'_>> {
    let mut lexer = Lexer::new();
    lexer.tokenize(LocatingSlice::new(source));
    lexer.finish()
}

/// Split the body of one statement into its fields.
///
/// Fields are separated by unescaped whitespace. Escapes stay in the
/// fields as written, an unescaped comma becomes its own `","` field and
/// empty fields never appear.
///
/// ```
/// # use pdpatch_parser::tokenize;
/// let fields = tokenize(r"#X msg 10 10 1 \, 2, f 7");
/// assert_eq!(fields, ["#X", "msg", "10", "10", "1", r"\,", "2", ",", "f", "7"]);
/// ```
pub fn tokenize(line: &str) -> Vec<String> {
    positioned_tokens(line)
        .into_iter()
        .filter_map(|token| match token.token {
            Token::Whitespace => None,
            other => Some(other.to_string()),
        })
        .collect()
}

/// Split a whole source text into statements.
///
/// Statements may span several physical lines; only an unescaped `;` ends
/// one. Empty statements are dropped. A final statement without a
/// terminator is kept and flagged.
pub fn lex(source: &str) -> Vec<Statement> {
    let mut statements = Vec::new();
    let mut fields: Vec<String> = Vec::new();
    let mut span: Option<Span> = None;

    for token in positioned_tokens(source) {
        match token.token {
            Token::Whitespace => {}
            Token::Semicolon => {
                if let Some(start) = span.take() {
                    let fields = std::mem::take(&mut fields);
                    statements.push(Statement::new(fields, start.union(token.span), true));
                }
            }
            other => {
                span = Some(match span {
                    Some(start) => start.union(token.span),
                    None => token.span,
                });
                fields.push(other.to_string());
            }
        }
    }

    if let Some(span) = span {
        debug!(span:? = span.range(); "Last statement has no terminating `;`");
        statements.push(Statement::new(fields, span, false));
    }

    debug!(statements = statements.len(); "Source split into statements");
    statements
}
