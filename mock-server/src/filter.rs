//! Evaluator for the `q` filter grammar: `FIELD op literal` terms joined
//! with `and`. Literals are single-quoted strings (`''` escapes a quote),
//! numbers, or `true`/`false`. `like` treats `*` as a wildcard.

use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
#[error("invalid filter: {0}")]
pub struct FilterError(String);

#[derive(Debug, Clone, Copy, PartialEq)]
enum Op {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    Like,
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Word(String),
    Str(String),
    Num(f64),
}

#[derive(Debug, Clone, PartialEq)]
struct Term {
    field: String,
    op: Op,
    value: Value,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Filter {
    terms: Vec<Term>,
}

impl Filter {
    pub fn parse(expression: &str) -> Result<Self, FilterError> {
        let tokens = tokenize(expression)?;
        let mut terms = Vec::new();
        let mut iter = tokens.into_iter();
        loop {
            let field = match iter.next() {
                Some(Token::Word(w)) => w,
                None if terms.is_empty() => return Ok(Filter::default()),
                other => return Err(FilterError(format!("expected field, got {other:?}"))),
            };
            let op = match iter.next() {
                Some(Token::Word(w)) => parse_op(&w)?,
                other => return Err(FilterError(format!("expected operator, got {other:?}"))),
            };
            let value = match iter.next() {
                Some(Token::Str(s)) => Value::String(s),
                Some(Token::Num(n)) => serde_json::json!(n),
                Some(Token::Word(w)) if w.eq_ignore_ascii_case("true") => Value::Bool(true),
                Some(Token::Word(w)) if w.eq_ignore_ascii_case("false") => Value::Bool(false),
                other => return Err(FilterError(format!("expected literal, got {other:?}"))),
            };
            if op == Op::Like && !value.is_string() {
                return Err(FilterError("like needs a string pattern".to_string()));
            }
            terms.push(Term { field, op, value });
            match iter.next() {
                None => return Ok(Filter { terms }),
                Some(Token::Word(w)) if w.eq_ignore_ascii_case("and") => continue,
                other => return Err(FilterError(format!("expected 'and', got {other:?}"))),
            }
        }
    }

    pub fn matches(&self, record: &Map<String, Value>) -> bool {
        self.terms.iter().all(|term| match record.get(&term.field) {
            Some(actual) => term.holds_for(actual),
            None => false,
        })
    }
}

impl Term {
    fn holds_for(&self, actual: &Value) -> bool {
        use std::cmp::Ordering::*;

        if self.op == Op::Like {
            return match (actual.as_str(), self.value.as_str()) {
                (Some(text), Some(pattern)) => wildcard_match(pattern, text),
                _ => false,
            };
        }
        let ordering = match (actual, &self.value) {
            (Value::Number(a), Value::Number(b)) => a.as_f64().partial_cmp(&b.as_f64()),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            _ => None,
        };
        match (self.op, ordering) {
            (Op::Ne, None) => true,
            (_, None) => false,
            (Op::Eq, Some(o)) => o == Equal,
            (Op::Ne, Some(o)) => o != Equal,
            (Op::Gt, Some(o)) => o == Greater,
            (Op::Ge, Some(o)) => o != Less,
            (Op::Lt, Some(o)) => o == Less,
            (Op::Le, Some(o)) => o != Greater,
            (Op::Like, _) => unreachable!("handled above"),
        }
    }
}

fn parse_op(word: &str) -> Result<Op, FilterError> {
    Ok(match word.to_ascii_lowercase().as_str() {
        "eq" => Op::Eq,
        "ne" => Op::Ne,
        "gt" => Op::Gt,
        "ge" => Op::Ge,
        "lt" => Op::Lt,
        "le" => Op::Le,
        "like" => Op::Like,
        other => return Err(FilterError(format!("unknown operator {other:?}"))),
    })
}

fn tokenize(input: &str) -> Result<Vec<Token>, FilterError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
        } else if c == '\'' {
            let mut text = String::new();
            i += 1;
            loop {
                match chars.get(i) {
                    None => return Err(FilterError("unterminated string".to_string())),
                    Some('\'') if chars.get(i + 1) == Some(&'\'') => {
                        text.push('\'');
                        i += 2;
                    }
                    Some('\'') => {
                        i += 1;
                        break;
                    }
                    Some(&other) => {
                        text.push(other);
                        i += 1;
                    }
                }
            }
            tokens.push(Token::Str(text));
        } else if c.is_ascii_digit() || (c == '-' && chars.get(i + 1).is_some_and(|n| n.is_ascii_digit())) {
            let start = i;
            i += 1;
            while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                i += 1;
            }
            let raw: String = chars[start..i].iter().collect();
            let n = raw
                .parse::<f64>()
                .map_err(|_| FilterError(format!("bad number {raw:?}")))?;
            tokens.push(Token::Num(n));
        } else if c.is_ascii_alphanumeric() || c == '_' || c == '.' {
            let start = i;
            while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_' || chars[i] == '.') {
                i += 1;
            }
            tokens.push(Token::Word(chars[start..i].iter().collect()));
        } else {
            return Err(FilterError(format!("unexpected character {c:?}")));
        }
    }
    Ok(tokens)
}

/// `*` matches any run of characters, everything else matches itself.
fn wildcard_match(pattern: &str, text: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let t: Vec<char> = text.chars().collect();
    let (mut pi, mut ti) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;
    while ti < t.len() {
        if pi < p.len() && p[pi] == '*' {
            backtrack = Some((pi, ti));
            pi += 1;
        } else if pi < p.len() && p[pi] == t[ti] {
            pi += 1;
            ti += 1;
        } else if let Some((star, matched)) = backtrack {
            pi = star + 1;
            ti = matched + 1;
            backtrack = Some((star, matched + 1));
        } else {
            return false;
        }
    }
    p[pi..].iter().all(|&c| c == '*')
}
