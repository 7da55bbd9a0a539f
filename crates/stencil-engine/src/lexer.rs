// SPDX-License-Identifier: Apache-2.0 OR MIT
use std::str::Chars;

use crate::ast::Span;
use crate::error::Error;

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Identifier(String),
    StringLiteral(String),
    NumberLiteral(String),
    Keyword(Keyword),
    Dot,
    Pipe,
    Comma,
    Colon,
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    LeftBrace,
    RightBrace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    True,
    False,
    Null,
}

/// Lexes the trimmed body of a placeholder into tokens. `offset` is the byte
/// position of the body within the enclosing template, so token spans point
/// into the original source.
pub fn lex_placeholder(input: &str, offset: usize) -> Result<Vec<Token>, Error> {
    let mut lexer = Lexer::new(input, offset);
    let mut tokens = Vec::new();
    while let Some(token) = lexer.next_token()? {
        tokens.push(token);
    }
    Ok(tokens)
}

struct Lexer<'a> {
    chars: Chars<'a>,
    pos: usize,
    offset: usize,
    peeked: Option<char>,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str, offset: usize) -> Self {
        Self {
            chars: input.chars(),
            pos: 0,
            offset,
            peeked: None,
        }
    }

    fn next_token(&mut self) -> Result<Option<Token>, Error> {
        self.skip_whitespace();

        let start = self.pos;
        let chr = match self.bump_char() {
            Some(c) => c,
            None => return Ok(None),
        };

        let kind = match chr {
            '.' => TokenKind::Dot,
            '|' => TokenKind::Pipe,
            ',' => TokenKind::Comma,
            ':' => TokenKind::Colon,
            '(' => TokenKind::LeftParen,
            ')' => TokenKind::RightParen,
            '[' => TokenKind::LeftBracket,
            ']' => TokenKind::RightBracket,
            '{' => TokenKind::LeftBrace,
            '}' => TokenKind::RightBrace,
            quote @ ('\'' | '"') => TokenKind::StringLiteral(self.read_string(quote, start)?),
            '-' => {
                match self.peek_char() {
                    Some(c) if c.is_ascii_digit() => TokenKind::NumberLiteral(self.read_number('-')),
                    _ => {
                        return Err(Error::parse_with_span(
                            "unexpected '-' outside a number literal",
                            self.span_from(start),
                        ))
                    }
                }
            }
            c if is_identifier_start(c) => {
                let ident = self.read_identifier(c);
                match ident.as_str() {
                    "true" => TokenKind::Keyword(Keyword::True),
                    "false" => TokenKind::Keyword(Keyword::False),
                    "null" => TokenKind::Keyword(Keyword::Null),
                    _ => TokenKind::Identifier(ident),
                }
            }
            c if c.is_ascii_digit() => TokenKind::NumberLiteral(self.read_number(c)),
            other => {
                return Err(Error::parse(
                    format!("unexpected character '{other}'"),
                    Some(self.span_from(start)),
                ));
            }
        };

        Ok(Some(Token {
            kind,
            span: self.span_from(start),
        }))
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek_char() {
            if ch.is_whitespace() {
                self.bump_char();
            } else {
                break;
            }
        }
    }

    fn read_identifier(&mut self, first: char) -> String {
        let mut ident = String::new();
        ident.push(first);
        while let Some(ch) = self.peek_char() {
            if is_identifier_part(ch) {
                ident.push(self.bump_char().unwrap());
            } else {
                break;
            }
        }
        ident
    }

    // String literals take either quote style and carry no escape syntax:
    // the body runs to the first matching quote.
    fn read_string(&mut self, quote: char, start: usize) -> Result<String, Error> {
        let mut literal = String::new();
        while let Some(ch) = self.bump_char() {
            if ch == quote {
                return Ok(literal);
            }
            literal.push(ch);
        }
        Err(Error::parse_with_span(
            "unterminated string literal",
            self.span_from(start),
        ))
    }

    fn read_number(&mut self, first: char) -> String {
        let mut literal = String::new();
        literal.push(first);
        while let Some(ch) = self.peek_char() {
            if ch.is_ascii_digit() || ch == '.' {
                literal.push(self.bump_char().unwrap());
            } else {
                break;
            }
        }
        literal
    }

    fn bump_char(&mut self) -> Option<char> {
        if let Some(peek) = self.peeked.take() {
            self.pos += peek.len_utf8();
            Some(peek)
        } else {
            let ch = self.chars.next()?;
            self.pos += ch.len_utf8();
            Some(ch)
        }
    }

    fn peek_char(&mut self) -> Option<char> {
        if self.peeked.is_none() {
            self.peeked = self.chars.next();
        }
        self.peeked
    }

    fn span_from(&self, start: usize) -> Span {
        Span::new(self.offset + start, self.offset + self.pos)
    }
}

fn is_identifier_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_'
}

fn is_identifier_part(ch: char) -> bool {
    is_identifier_start(ch) || ch.is_ascii_digit()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(tokens: &[Token]) -> Vec<TokenKind> {
        tokens.iter().map(|t| t.kind.clone()).collect()
    }

    #[test]
    fn lexes_binding_and_filter_chain() {
        let tokens = lex_placeholder("name | upper", 0).unwrap();
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::Identifier("name".into()),
                TokenKind::Pipe,
                TokenKind::Identifier("upper".into()),
            ]
        );
    }

    #[test]
    fn both_quote_styles_produce_string_literals() {
        let tokens = lex_placeholder(r#"'a' "b""#, 0).unwrap();
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::StringLiteral("a".into()),
                TokenKind::StringLiteral("b".into()),
            ]
        );
    }

    #[test]
    fn strings_are_distinguished_from_bindings() {
        let tokens = lex_placeholder("'2001-01-01' year2000", 0).unwrap();
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::StringLiteral("2001-01-01".into()),
                TokenKind::Identifier("year2000".into()),
            ]
        );
    }

    #[test]
    fn negative_numbers_lex_as_one_literal() {
        let tokens = lex_placeholder("-3.5", 0).unwrap();
        assert_eq!(kinds(&tokens), vec![TokenKind::NumberLiteral("-3.5".into())]);
    }

    #[test]
    fn multi_line_input_lexes_like_single_line() {
        let single = kinds(&lex_placeholder("a | add(1) | mul(2)", 0).unwrap());
        let multi = kinds(&lex_placeholder("a\n  | add(1)\n  | mul(2)", 0).unwrap());
        assert_eq!(single, multi);
    }

    #[test]
    fn errors_on_unterminated_string() {
        let err = lex_placeholder("'open", 0).unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }
}
