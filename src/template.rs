//! Template strings with embedded expressions.
//!
//! A template such as `Hello ${user.name}!` is cut into literal text and
//! `${...}` expression spans. Inside a span, braces nest and string and
//! regex literals are skipped, so `${ {a: "}"}[k] }` is one expression.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("Unterminated '${{' starting at position {position}")]
    Unterminated { position: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Expression(String),
}

/// Characters after which a `/` inside a span starts a regex literal.
const REGEX_PRECEDERS: &str = "(,=:[!&|?{};+-*%<>~^}";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SpanState {
    Code,
    Quoted(char),
    Regex { in_class: bool },
}

/// Splits `source` into literal and expression segments. Empty literal
/// runs are dropped.
pub fn split(source: &str) -> Result<Vec<Segment>, TemplateError> {
    let chars: Vec<char> = source.chars().collect();
    let mut segments = vec![];
    let mut literal = String::new();
    let mut i = 0;

    while i < chars.len() {
        if chars[i] == '$' && chars.get(i + 1) == Some(&'{') {
            if !literal.is_empty() {
                segments.push(Segment::Literal(std::mem::take(&mut literal)));
            }
            let (expression, end) = scan_span(&chars, i)?;
            segments.push(Segment::Expression(expression));
            i = end;
        } else {
            literal.push(chars[i]);
            i += 1;
        }
    }

    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    Ok(segments)
}

/// Reads the span opened by `${` at `start`. Returns its text and the index
/// just past the closing brace.
fn scan_span(chars: &[char], start: usize) -> Result<(String, usize), TemplateError> {
    let mut expression = String::new();
    let mut state = SpanState::Code;
    let mut depth = 1;
    let mut i = start + 2;

    while let Some(&c) = chars.get(i) {
        i += 1;
        match state {
            SpanState::Code => match c {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok((expression, i));
                    }
                }
                '\'' | '"' => state = SpanState::Quoted(c),
                '/' if starts_regex(&expression) => state = SpanState::Regex { in_class: false },
                _ => {}
            },
            SpanState::Quoted(quote) => {
                if c == '\\' {
                    if let Some(&escaped) = chars.get(i) {
                        expression.push(c);
                        expression.push(escaped);
                        i += 1;
                        continue;
                    }
                } else if c == quote {
                    state = SpanState::Code;
                }
            }
            SpanState::Regex { in_class } => match c {
                '\\' => {
                    if let Some(&escaped) = chars.get(i) {
                        expression.push(c);
                        expression.push(escaped);
                        i += 1;
                        continue;
                    }
                }
                '[' => state = SpanState::Regex { in_class: true },
                ']' if in_class => state = SpanState::Regex { in_class: false },
                '/' if !in_class => state = SpanState::Code,
                _ => {}
            },
        }
        expression.push(c);
    }

    Err(TemplateError::Unterminated { position: start })
}

fn starts_regex(expression: &str) -> bool {
    match expression.chars().rev().find(|c| !c.is_whitespace()) {
        None => true,
        Some(c) => REGEX_PRECEDERS.contains(c),
    }
}

/// Joins segments into one expression. Literals become JSON strings; a
/// single segment stands alone, several are concatenated with `+`.
pub fn render(segments: &[Segment]) -> String {
    match segments {
        [] => "\"\"".to_string(),
        [Segment::Literal(text)] => quote(text),
        [Segment::Expression(code)] => code.clone(),
        _ => segments
            .iter()
            .map(|segment| match segment {
                Segment::Literal(text) => quote(text),
                Segment::Expression(code) => format!("({})", code),
            })
            .collect::<Vec<_>>()
            .join(" + "),
    }
}

fn quote(text: &str) -> String {
    serde_json::Value::String(text.to_string()).to_string()
}

/// Rewrites a template into a single expression over its spans.
///
/// # Examples
///
/// ```
/// use binding_expr::template::extract;
///
/// assert_eq!(extract("aaa${bbb}${ccc()}").unwrap(), r#""aaa" + (bbb) + (ccc())"#);
/// assert_eq!(extract("").unwrap(), r#""""#);
/// ```
pub fn extract(source: &str) -> Result<String, TemplateError> {
    Ok(render(&split(source)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regex_lookback() {
        assert!(starts_regex(""));
        assert!(starts_regex("a = "));
        assert!(starts_regex("f("));
        assert!(!starts_regex("a "));
        assert!(!starts_regex("x)"));
    }
}
