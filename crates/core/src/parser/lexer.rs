//! Tokenizer for spec units.

use crate::error::{ParseError, ParseErrorKind, Span};

/// Token categories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// Identifier or keyword
    Ident(String),
    /// String literal, unescaped
    Str(String),
    /// Numeric literal as written
    Number(String),
    /// Single punctuation character
    Punct(char),
    /// End of input
    Eof,
}

impl TokenKind {
    /// Human-readable rendering for error messages.
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Ident(name) => format!("`{name}`"),
            TokenKind::Str(value) => format!("string '{value}'"),
            TokenKind::Number(value) => format!("number {value}"),
            TokenKind::Punct(c) => format!("`{c}`"),
            TokenKind::Eof => "end of file".to_string(),
        }
    }
}

/// A token with its start position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Category and payload
    pub kind: TokenKind,
    /// Start position
    pub span: Span,
}

const PUNCTUATION: &[char] = &[
    '{', '}', '(', ')', '<', '>', '[', ']', ':', ';', ',', '?', '|', '=', '.', '&', '*', '!',
];

struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: u32,
    col: u32,
}

impl Lexer<'_> {
    fn span(&self) -> Span {
        Span::new(self.line, self.col)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(c)
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn peek_second(&self) -> Option<char> {
        let mut ahead = self.chars.clone();
        ahead.next();
        ahead.next()
    }

    /// Skip whitespace and comments.
    fn skip_trivia(&mut self) -> Result<(), ParseError> {
        loop {
            match (self.peek(), self.peek_second()) {
                (Some(c), _) if c.is_whitespace() => {
                    self.bump();
                }
                (Some('/'), Some('/')) => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                (Some('/'), Some('*')) => {
                    let start = self.span();
                    self.bump();
                    self.bump();
                    let mut closed = false;
                    while let Some(c) = self.bump() {
                        if c == '*' && self.peek() == Some('/') {
                            self.bump();
                            closed = true;
                            break;
                        }
                    }
                    if !closed {
                        return Err(ParseError::new(
                            ParseErrorKind::UnterminatedComment,
                            start,
                            "block comment is never closed",
                        ));
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn string(&mut self, quote: char, start: Span) -> Result<TokenKind, ParseError> {
        let mut value = String::new();
        loop {
            match self.bump() {
                Some(c) if c == quote => return Ok(TokenKind::Str(value)),
                Some('\\') => match self.bump() {
                    Some('n') => value.push('\n'),
                    Some('t') => value.push('\t'),
                    Some('r') => value.push('\r'),
                    Some('0') => value.push('\0'),
                    Some(c) if c != '\n' => value.push(c),
                    _ => break,
                },
                Some('\n') | None => break,
                Some(c) => value.push(c),
            }
        }
        Err(ParseError::new(
            ParseErrorKind::UnterminatedString,
            start,
            "string literal is never closed",
        ))
    }

    fn next_token(&mut self) -> Result<Token, ParseError> {
        self.skip_trivia()?;
        let span = self.span();
        let Some(c) = self.bump() else {
            return Ok(Token {
                kind: TokenKind::Eof,
                span,
            });
        };

        let kind = if c == '\'' || c == '"' {
            self.string(c, span)?
        } else if c.is_alphabetic() || c == '_' || c == '$' {
            let mut ident = String::from(c);
            while let Some(next) = self.peek() {
                if next.is_alphanumeric() || next == '_' || next == '$' {
                    ident.push(next);
                    self.bump();
                } else {
                    break;
                }
            }
            TokenKind::Ident(ident)
        } else if c.is_ascii_digit() || (c == '-' && self.peek().is_some_and(|n| n.is_ascii_digit())) {
            let mut number = String::from(c);
            while let Some(next) = self.peek() {
                if next.is_ascii_alphanumeric() || next == '.' || next == '_' {
                    number.push(next);
                    self.bump();
                } else {
                    break;
                }
            }
            TokenKind::Number(number)
        } else if PUNCTUATION.contains(&c) {
            TokenKind::Punct(c)
        } else {
            return Err(ParseError::new(
                ParseErrorKind::UnexpectedToken,
                span,
                format!("unexpected character '{c}'"),
            ));
        };

        Ok(Token { kind, span })
    }
}

/// Tokenize a whole unit. The returned vector always ends with `Eof`.
pub fn tokenize(source: &str) -> Result<Vec<Token>, ParseError> {
    let mut lexer = Lexer {
        chars: source.chars().peekable(),
        line: 1,
        col: 1,
    };
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token()?;
        let done = token.kind == TokenKind::Eof;
        tokens.push(token);
        if done {
            return Ok(tokens);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_tokenize_skips_comments() {
        let tokens = kinds("// header\nfoo /* inline */ : 'bar';");
        assert_eq!(
            tokens,
            vec![
                TokenKind::Ident("foo".into()),
                TokenKind::Punct(':'),
                TokenKind::Str("bar".into()),
                TokenKind::Punct(';'),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_token_spans_are_one_based() {
        let tokens = tokenize("a\n  b").unwrap();
        assert_eq!(tokens[0].span, Span::new(1, 1));
        assert_eq!(tokens[1].span, Span::new(2, 3));
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(kinds(r#""a\"b""#)[0], TokenKind::Str("a\"b".into()));
        assert_eq!(kinds(r"'it\'s'")[0], TokenKind::Str("it's".into()));
    }

    #[test]
    fn test_unterminated_string() {
        let err = tokenize("enum A { X = 'oops\n}").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnterminatedString);
        assert_eq!(err.span, Span::new(1, 14));
    }

    #[test]
    fn test_unterminated_comment() {
        let err = tokenize("foo /* never closed").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnterminatedComment);
        assert_eq!(err.span, Span::new(1, 5));
    }

    #[test]
    fn test_unexpected_character() {
        let err = tokenize("@decorator").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnexpectedToken);
    }
}
