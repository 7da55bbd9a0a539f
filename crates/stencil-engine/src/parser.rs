// SPDX-License-Identifier: Apache-2.0 OR MIT
use crate::ast::{
    Binding, Expression, FilterCall, PathStep, Placeholder, PipedExpr, Segment, Span, TextSegment,
};
use crate::error::Error;
use crate::lexer::{self, Keyword, Token, TokenKind};
use crate::value::Value;

/// Splits template source into literal text and placeholder segments, and
/// parses every placeholder body into its expression tree.
///
/// The split walks the input once. A `{{` opens a placeholder; the first
/// `}}` that is not inside a `'`/`"` string literal closes it. Placeholders
/// do not nest. An unterminated placeholder is fatal and reports the byte
/// offset of its opening delimiter.
pub fn parse_template(source: &str) -> Result<Vec<Segment>, Error> {
    let mut segments = Vec::new();
    let bytes = source.as_bytes();
    let mut cursor = 0usize;

    while cursor < bytes.len() {
        let Some(open) = find_subslice(bytes, b"{{", cursor) else {
            segments.push(Segment::Text(TextSegment::new(
                Span::new(cursor, source.len()),
                &source[cursor..],
            )));
            break;
        };

        if open > cursor {
            segments.push(Segment::Text(TextSegment::new(
                Span::new(cursor, open),
                &source[cursor..open],
            )));
        }

        let close = find_placeholder_end(bytes, open + 2).ok_or_else(|| {
            Error::parse_with_span("unterminated placeholder", Span::new(open, source.len()))
        })?;

        let span = Span::new(open, close + 2);
        let raw_body = &source[open + 2..close];
        let trimmed = raw_body.trim();
        let body_offset = open + 2 + (raw_body.len() - raw_body.trim_start().len());

        let expr = parse_placeholder_body(trimmed, body_offset)?;
        segments.push(Segment::Placeholder(Placeholder {
            span,
            source: source[open..close + 2].to_string(),
            expr,
        }));

        cursor = close + 2;
    }

    Ok(segments)
}

fn find_subslice(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if haystack.len() < needle.len() {
        return None;
    }
    (from..=haystack.len() - needle.len()).find(|&i| &haystack[i..i + needle.len()] == needle)
}

// Scans for the closing `}}`, treating string literal bodies as opaque so a
// fragment argument may itself contain `}}`.
fn find_placeholder_end(bytes: &[u8], mut index: usize) -> Option<usize> {
    let mut in_string: Option<u8> = None;
    while index < bytes.len() {
        let b = bytes[index];
        match in_string {
            Some(quote) => {
                if b == quote {
                    in_string = None;
                }
            }
            None => match b {
                b'\'' | b'"' => in_string = Some(b),
                b'}' if index + 1 < bytes.len() && bytes[index + 1] == b'}' => {
                    return Some(index);
                }
                _ => {}
            },
        }
        index += 1;
    }
    None
}

fn parse_placeholder_body(body: &str, offset: usize) -> Result<PipedExpr, Error> {
    let tokens = lexer::lex_placeholder(body, offset)?;
    if tokens.is_empty() {
        return Err(Error::parse(
            "empty placeholder",
            Some(Span::new(offset, offset)),
        ));
    }
    let mut parser = ExprParser::new(&tokens, body);
    let expr = parser.parse_piped()?;
    if let Some(token) = parser.peek() {
        return Err(Error::parse(
            format!("unexpected token {:?}", token.kind),
            Some(token.span),
        ));
    }
    Ok(expr)
}

struct ExprParser<'a> {
    tokens: &'a [Token],
    index: usize,
    body: &'a str,
}

impl<'a> ExprParser<'a> {
    fn new(tokens: &'a [Token], body: &'a str) -> Self {
        Self {
            tokens,
            index: 0,
            body,
        }
    }

    fn parse_piped(&mut self) -> Result<PipedExpr, Error> {
        let head = self.parse_term()?;
        let mut chain = Vec::new();
        while self.consume(&TokenKind::Pipe) {
            chain.push(self.parse_filter_call()?);
        }
        Ok(PipedExpr { head, chain })
    }

    // An expression in argument or element position: a piped chain collapses
    // to its head when no pipe follows.
    fn parse_expression(&mut self) -> Result<Expression, Error> {
        let piped = self.parse_piped()?;
        if piped.chain.is_empty() {
            Ok(piped.head)
        } else {
            Ok(Expression::SubExpr(Box::new(piped)))
        }
    }

    fn parse_filter_call(&mut self) -> Result<FilterCall, Error> {
        let token = self
            .next()
            .ok_or_else(|| Error::parse("expected filter name after '|'", None))?;
        let name = match &token.kind {
            TokenKind::Identifier(name) => name.clone(),
            other => {
                return Err(Error::parse(
                    format!("expected filter name after '|', found {other:?}"),
                    Some(token.span),
                ));
            }
        };
        let args = if self.consume(&TokenKind::LeftParen) {
            self.parse_call_args()?
        } else {
            Vec::new()
        };
        Ok(FilterCall::new(name, args))
    }

    fn parse_call_args(&mut self) -> Result<Vec<Expression>, Error> {
        let mut args = Vec::new();
        if self.consume(&TokenKind::RightParen) {
            return Ok(args);
        }
        loop {
            args.push(self.parse_expression()?);
            if self.consume(&TokenKind::Comma) {
                continue;
            }
            if self.consume(&TokenKind::RightParen) {
                return Ok(args);
            }
            let found = self
                .peek()
                .map(|t| format!("{:?}", t.kind))
                .unwrap_or_else(|| "end of placeholder".to_string());
            return Err(Error::parse(
                format!("expected ',' or ')' in filter arguments, found {found}"),
                self.peek().map(|t| t.span),
            ));
        }
    }

    fn parse_term(&mut self) -> Result<Expression, Error> {
        let token = self
            .next()
            .ok_or_else(|| Error::parse("unexpected end of placeholder", None))?
            .clone();
        match token.kind {
            TokenKind::StringLiteral(text) => Ok(Expression::Literal(Value::String(text))),
            TokenKind::NumberLiteral(text) => {
                parse_number_literal(&text)
                    .map(Expression::Literal)
                    .ok_or_else(|| {
                        Error::parse(format!("invalid number literal {text}"), Some(token.span))
                    })
            }
            TokenKind::Keyword(Keyword::True) => Ok(Expression::Literal(Value::Bool(true))),
            TokenKind::Keyword(Keyword::False) => Ok(Expression::Literal(Value::Bool(false))),
            TokenKind::Keyword(Keyword::Null) => Ok(Expression::Literal(Value::Null)),
            TokenKind::LeftBrace => self.parse_object_literal(),
            TokenKind::LeftBracket => self.parse_array_literal(),
            TokenKind::Identifier(name) => {
                if self.consume(&TokenKind::LeftParen) {
                    let args = self.parse_call_args()?;
                    Ok(Expression::Call(FilterCall::new(name, args)))
                } else {
                    self.parse_binding(name)
                }
            }
            other => Err(Error::parse(
                format!("unexpected token in expression: {other:?}"),
                Some(token.span),
            )),
        }
    }

    fn parse_binding(&mut self, head: String) -> Result<Expression, Error> {
        let mut binding = Binding::name(head);
        loop {
            if self.consume(&TokenKind::Dot) {
                let token = self
                    .next()
                    .ok_or_else(|| Error::parse("expected field name after '.'", None))?
                    .clone();
                let name = match token.kind {
                    TokenKind::Identifier(name) => name,
                    other => {
                        return Err(Error::parse(
                            format!("expected field name after '.', found {other:?}"),
                            Some(token.span),
                        ));
                    }
                };
                // `.name(` is a method invocation attempt, the one construct
                // the engine refuses outright.
                if matches!(self.peek().map(|t| &t.kind), Some(TokenKind::LeftParen)) {
                    return Err(Error::binding(self.body));
                }
                binding.steps.push(PathStep::Field(name));
            } else if self.consume(&TokenKind::LeftBracket) {
                let key = self.parse_expression()?;
                if !self.consume(&TokenKind::RightBracket) {
                    return Err(Error::parse(
                        "expected ']' to close index expression",
                        self.peek().map(|t| t.span),
                    ));
                }
                binding.steps.push(PathStep::Index(Box::new(key)));
            } else {
                break;
            }
        }
        Ok(Expression::Binding(binding))
    }

    fn parse_object_literal(&mut self) -> Result<Expression, Error> {
        let mut entries = Vec::new();
        if self.consume(&TokenKind::RightBrace) {
            return Ok(Expression::ObjectLit(entries));
        }
        loop {
            let token = self
                .next()
                .ok_or_else(|| Error::parse("expected key in object literal", None))?
                .clone();
            let key = match token.kind {
                TokenKind::Identifier(name) => name,
                TokenKind::StringLiteral(name) => name,
                other => {
                    return Err(Error::parse(
                        format!("expected key in object literal, found {other:?}"),
                        Some(token.span),
                    ));
                }
            };
            if !self.consume(&TokenKind::Colon) {
                return Err(Error::parse(
                    "expected ':' after object literal key",
                    self.peek().map(|t| t.span),
                ));
            }
            entries.push((key, self.parse_expression()?));
            if self.consume(&TokenKind::Comma) {
                continue;
            }
            if self.consume(&TokenKind::RightBrace) {
                return Ok(Expression::ObjectLit(entries));
            }
            return Err(Error::parse(
                "expected ',' or '}' in object literal",
                self.peek().map(|t| t.span),
            ));
        }
    }

    fn parse_array_literal(&mut self) -> Result<Expression, Error> {
        let mut items = Vec::new();
        if self.consume(&TokenKind::RightBracket) {
            return Ok(Expression::ArrayLit(items));
        }
        loop {
            items.push(self.parse_expression()?);
            if self.consume(&TokenKind::Comma) {
                continue;
            }
            if self.consume(&TokenKind::RightBracket) {
                return Ok(Expression::ArrayLit(items));
            }
            return Err(Error::parse(
                "expected ',' or ']' in array literal",
                self.peek().map(|t| t.span),
            ));
        }
    }

    fn consume(&mut self, kind: &TokenKind) -> bool {
        if self.peek().map(|t| &t.kind) == Some(kind) {
            self.index += 1;
            true
        } else {
            false
        }
    }

    fn next(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.index)?;
        self.index += 1;
        Some(token)
    }

    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.index)
    }
}

fn parse_number_literal(text: &str) -> Option<Value> {
    if text.contains('.') {
        text.parse::<f64>().ok().map(Value::Float)
    } else {
        text.parse::<i64>()
            .ok()
            .map(Value::Integer)
            .or_else(|| text.parse::<f64>().ok().map(Value::Float))
    }
}
