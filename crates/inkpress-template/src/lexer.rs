/*
 * lexer.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Template lexer.
//!
//! Lexing happens in two steps. [`split`] cuts the source into literal text
//! and `{{ ... }}` actions, applying trim markers and dropping comments.
//! [`tokenize`] then turns the inside of one action into tokens.

use crate::error::{TemplateError, TemplateResult};

const LEFT_DELIM: &str = "{{";
const RIGHT_DELIM: &str = "}}";
const LEFT_COMMENT: &str = "/*";
const RIGHT_COMMENT: &str = "*/";

/// A top-level piece of a template source.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    Text(String),
    Action { tokens: Vec<Token>, line: usize },
}

/// A token inside an action.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// A run of whitespace. Significant only for field chaining.
    Space,
    /// `.` on its own.
    Dot,
    /// `.Name`
    Field(String),
    /// `$name`, or `$` alone as the empty name.
    Variable(String),
    /// A keyword or function name.
    Identifier(String),
    Str(String),
    Int(i64),
    Bool(bool),
    Nil,
    Pipe,
    LeftParen,
    RightParen,
    Comma,
    Declare,
    Assign,
}

struct Splitter<'a> {
    name: &'a str,
    src: &'a str,
    pos: usize,
    line: usize,
    segments: Vec<Segment>,
    trim_next: bool,
}

/// Split a template source into text and action segments.
pub fn split(name: &str, src: &str) -> TemplateResult<Vec<Segment>> {
    let mut splitter = Splitter {
        name,
        src,
        pos: 0,
        line: 1,
        segments: Vec::new(),
        trim_next: false,
    };
    splitter.run()?;
    Ok(splitter.segments)
}

impl<'a> Splitter<'a> {
    fn error(&self, line: usize, message: impl Into<String>) -> TemplateError {
        TemplateError::ParseError {
            name: self.name.to_string(),
            line,
            message: message.into(),
        }
    }

    fn push_text(&mut self, mut text: &str, trim_end: bool) {
        if self.trim_next {
            text = text.trim_start();
            self.trim_next = false;
        }
        if trim_end {
            text = text.trim_end();
        }
        if !text.is_empty() {
            self.segments.push(Segment::Text(text.to_string()));
        }
    }

    /// Move `pos` forward, counting the newlines passed over.
    fn advance_to(&mut self, pos: usize) {
        self.line += self.src[self.pos..pos].matches('\n').count();
        self.pos = pos;
    }

    fn run(&mut self) -> TemplateResult<()> {
        let src = self.src;
        while let Some(offset) = src[self.pos..].find(LEFT_DELIM) {
            let start = self.pos + offset;
            let mut inner = start + LEFT_DELIM.len();
            let trim_left = has_left_trim(&src[inner..]);
            if trim_left {
                inner += 1;
            }
            self.push_text(&src[self.pos..start], trim_left);
            self.advance_to(start);

            let line = self.line;
            let body_start = inner + leading_space(&src[inner..]);
            if src[body_start..].starts_with(LEFT_COMMENT) {
                let end = self.comment_end(body_start, line)?;
                self.advance_to(end);
            } else {
                let (body_end, close, trim_right) = self.action_end(inner, line)?;
                let tokens =
                    tokenize(&src[inner..body_end]).map_err(|message| self.error(line, message))?;
                self.segments.push(Segment::Action { tokens, line });
                self.advance_to(close);
                self.trim_next = trim_right;
            }
        }
        self.push_text(&src[self.pos..], false);
        Ok(())
    }

    /// Find the end of a `{{/* */}}` comment and return the offset after it.
    fn comment_end(&mut self, body_start: usize, line: usize) -> TemplateResult<usize> {
        let after_open = body_start + LEFT_COMMENT.len();
        let close = self.src[after_open..]
            .find(RIGHT_COMMENT)
            .map(|i| after_open + i + RIGHT_COMMENT.len())
            .ok_or_else(|| self.error(line, "unclosed comment"))?;
        let tail = &self.src[close..];
        if tail.starts_with(RIGHT_DELIM) {
            return Ok(close + RIGHT_DELIM.len());
        }
        let space = leading_space(tail);
        if space > 0 && tail[space..].starts_with("-}}") {
            self.trim_next = true;
            return Ok(close + space + 1 + RIGHT_DELIM.len());
        }
        Err(self.error(line, "comment ends before closing delimiter"))
    }

    /// Find the closing delimiter of an action, skipping over quoted text.
    ///
    /// Returns the end of the action body, the offset after `}}` and whether
    /// a right trim marker was present.
    fn action_end(&self, inner: usize, line: usize) -> TemplateResult<(usize, usize, bool)> {
        let bytes = self.src.as_bytes();
        let mut i = inner;
        while i < bytes.len() {
            match bytes[i] {
                quote @ (b'"' | b'`' | b'\'') => {
                    i += 1;
                    while i < bytes.len() && bytes[i] != quote {
                        if bytes[i] == b'\\' && quote != b'`' {
                            i += 1;
                        }
                        i += 1;
                    }
                    if i >= bytes.len() {
                        return Err(self.error(line, "unterminated quoted string"));
                    }
                    i += 1;
                }
                b'}' if self.src[i..].starts_with(RIGHT_DELIM) => {
                    let body = &self.src[inner..i];
                    let trimmed = body.strip_suffix('-').filter(|rest| {
                        rest.ends_with(|c: char| c.is_ascii_whitespace())
                    });
                    return Ok(match trimmed {
                        Some(rest) => (inner + rest.len(), i + RIGHT_DELIM.len(), true),
                        None => (i, i + RIGHT_DELIM.len(), false),
                    });
                }
                _ => i += 1,
            }
        }
        Err(self.error(line, "unclosed action"))
    }
}

/// `{{- ` trims preceding text. The dash must be followed by whitespace so
/// that `{{-3}}` still reads as a number.
fn has_left_trim(s: &str) -> bool {
    let mut chars = s.chars();
    chars.next() == Some('-') && chars.next().is_some_and(|c| c.is_ascii_whitespace())
}

fn leading_space(s: &str) -> usize {
    s.len() - s.trim_start_matches(|c: char| c.is_ascii_whitespace()).len()
}

fn is_ident_char(c: char) -> bool {
    c == '_' || c.is_alphanumeric()
}

/// Tokenize the body of a single action.
pub fn tokenize(src: &str) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = src.chars().collect();
    let mut i = 0;

    let take_ident = |start: usize| -> (String, usize) {
        let mut end = start;
        while end < chars.len() && is_ident_char(chars[end]) {
            end += 1;
        }
        (chars[start..end].iter().collect(), end)
    };

    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => {
                while i < chars.len() && chars[i].is_whitespace() {
                    i += 1;
                }
                tokens.push(Token::Space);
            }
            '.' => {
                let next = chars.get(i + 1).copied();
                if next.is_some_and(is_ident_char) && !next.is_some_and(|c| c.is_ascii_digit()) {
                    let (name, end) = take_ident(i + 1);
                    tokens.push(Token::Field(name));
                    i = end;
                } else {
                    tokens.push(Token::Dot);
                    i += 1;
                }
            }
            '$' => {
                let (name, end) = take_ident(i + 1);
                tokens.push(Token::Variable(name));
                i = end;
            }
            '|' => {
                tokens.push(Token::Pipe);
                i += 1;
            }
            '(' => {
                tokens.push(Token::LeftParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RightParen);
                i += 1;
            }
            ',' => {
                tokens.push(Token::Comma);
                i += 1;
            }
            ':' if chars.get(i + 1) == Some(&'=') => {
                tokens.push(Token::Declare);
                i += 2;
            }
            '=' => {
                tokens.push(Token::Assign);
                i += 1;
            }
            '"' => {
                let (value, end) = read_quoted(&chars, i)?;
                tokens.push(Token::Str(value));
                i = end;
            }
            '`' => {
                let end = chars[i + 1..]
                    .iter()
                    .position(|&c| c == '`')
                    .map(|p| i + 1 + p)
                    .ok_or("unterminated raw string")?;
                tokens.push(Token::Str(chars[i + 1..end].iter().collect()));
                i = end + 1;
            }
            '\'' => {
                let (value, end) = read_char(&chars, i)?;
                tokens.push(Token::Int(i64::from(u32::from(value))));
                i = end;
            }
            c if c.is_ascii_digit() || ((c == '-' || c == '+') && next_is_digit(&chars, i)) => {
                let start = i;
                i += 1;
                while i < chars.len() && chars[i].is_ascii_alphanumeric() {
                    i += 1;
                }
                let text: String = chars[start..i].iter().collect();
                let number = text
                    .parse::<i64>()
                    .map_err(|_| format!("bad number syntax: {:?}", text))?;
                tokens.push(Token::Int(number));
            }
            c if is_ident_char(c) => {
                let (name, end) = take_ident(i);
                tokens.push(match name.as_str() {
                    "true" => Token::Bool(true),
                    "false" => Token::Bool(false),
                    "nil" => Token::Nil,
                    _ => Token::Identifier(name),
                });
                i = end;
            }
            other => return Err(format!("unexpected {:?} in action", other)),
        }
    }
    Ok(tokens)
}

fn next_is_digit(chars: &[char], i: usize) -> bool {
    chars.get(i + 1).is_some_and(|c| c.is_ascii_digit())
}

fn read_escape(chars: &[char], i: usize) -> Result<(char, usize), String> {
    let c = chars.get(i).ok_or("unterminated escape sequence")?;
    let decoded = match c {
        'n' => '\n',
        't' => '\t',
        'r' => '\r',
        '\\' => '\\',
        '"' => '"',
        '\'' => '\'',
        '0' => '\0',
        other => return Err(format!("unknown escape sequence: \\{}", other)),
    };
    Ok((decoded, i + 1))
}

/// Read an interpreted string literal starting at the opening quote.
fn read_quoted(chars: &[char], start: usize) -> Result<(String, usize), String> {
    let mut value = String::new();
    let mut i = start + 1;
    loop {
        match chars.get(i) {
            None | Some('\n') => return Err("unterminated quoted string".to_string()),
            Some('"') => return Ok((value, i + 1)),
            Some('\\') => {
                let (c, next) = read_escape(chars, i + 1)?;
                value.push(c);
                i = next;
            }
            Some(&c) => {
                value.push(c);
                i += 1;
            }
        }
    }
}

fn read_char(chars: &[char], start: usize) -> Result<(char, usize), String> {
    let (value, next) = match chars.get(start + 1) {
        Some('\\') => read_escape(chars, start + 2)?,
        Some(&c) if c != '\'' => (c, start + 2),
        _ => return Err("empty character constant".to_string()),
    };
    if chars.get(next) != Some(&'\'') {
        return Err("unterminated character constant".to_string());
    }
    Ok((value, next + 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn text(s: &str) -> Segment {
        Segment::Text(s.to_string())
    }

    #[test]
    fn test_split_text_and_actions() {
        let segments = split("t", "Hello {{.Title}}!").unwrap();
        assert_eq!(
            segments,
            vec![
                text("Hello "),
                Segment::Action {
                    tokens: vec![Token::Field("Title".into())],
                    line: 1
                },
                text("!"),
            ]
        );
    }

    #[test]
    fn test_trim_markers() {
        let segments = split("t", "a  \n {{- .X -}} \n b").unwrap();
        assert_eq!(segments[0], text("a"));
        assert_eq!(segments[2], text("b"));
    }

    #[test]
    fn test_dash_number_is_not_trim() {
        let segments = split("t", "a {{-3}}").unwrap();
        assert_eq!(segments[0], text("a "));
        assert_eq!(
            segments[1],
            Segment::Action {
                tokens: vec![Token::Int(-3)],
                line: 1
            }
        );
    }

    #[test]
    fn test_comments_are_dropped() {
        let segments = split("t", "a {{/* note {{ }} */}} b").unwrap();
        assert_eq!(segments, vec![text("a "), text(" b")]);

        let trimmed = split("t", "a {{- /* note */ -}} b").unwrap();
        assert_eq!(trimmed, vec![text("a"), text("b")]);
    }

    #[test]
    fn test_line_numbers() {
        let segments = split("t", "one\ntwo {{.A}}\n\n{{.B}}").unwrap();
        let lines: Vec<usize> = segments
            .iter()
            .filter_map(|s| match s {
                Segment::Action { line, .. } => Some(*line),
                _ => None,
            })
            .collect();
        assert_eq!(lines, vec![2, 4]);
    }

    #[test]
    fn test_braces_inside_strings() {
        let segments = split("t", r#"{{print "}}"}}"#).unwrap();
        assert_eq!(
            segments,
            vec![Segment::Action {
                tokens: vec![
                    Token::Identifier("print".into()),
                    Token::Space,
                    Token::Str("}}".into())
                ],
                line: 1
            }]
        );
    }

    #[test]
    fn test_unclosed_action() {
        let err = split("page", "x\n{{.Title").unwrap_err();
        assert_eq!(err.to_string(), "page:2: parse error: unclosed action");
    }

    #[test]
    fn test_tokenize_pipeline() {
        let tokens = tokenize(r#"$x := .A.B | printf `raw` 'a' (len $)"#).unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Variable("x".into()),
                Token::Space,
                Token::Declare,
                Token::Space,
                Token::Field("A".into()),
                Token::Field("B".into()),
                Token::Space,
                Token::Pipe,
                Token::Space,
                Token::Identifier("printf".into()),
                Token::Space,
                Token::Str("raw".into()),
                Token::Space,
                Token::Int(97),
                Token::Space,
                Token::LeftParen,
                Token::Identifier("len".into()),
                Token::Space,
                Token::Variable(String::new()),
                Token::RightParen,
            ]
        );
    }

    #[test]
    fn test_tokenize_escapes() {
        assert_eq!(
            tokenize(r#""a\n\"b\"""#).unwrap(),
            vec![Token::Str("a\n\"b\"".into())]
        );
        assert!(tokenize(r#""\q""#).is_err());
        assert!(tokenize("12ab").is_err());
    }
}
