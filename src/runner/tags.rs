//! Boolean tag expressions such as `@smoke and not (@slow or @flaky)`.
//!
//! `not` binds tighter than `and`, which binds tighter than `or`. Tags may be
//! written with or without their leading `@`.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagExpr {
    Tag(String),
    Not(Box<TagExpr>),
    And(Box<TagExpr>, Box<TagExpr>),
    Or(Box<TagExpr>, Box<TagExpr>),
}

impl TagExpr {
    pub fn parse(input: &str) -> Result<Self, String> {
        let tokens = tokenize(input);
        if tokens.is_empty() {
            return Err("empty tag expression".to_string());
        }
        let mut parser = Parser { tokens, pos: 0 };
        let expr = parser.or_expr()?;
        match parser.peek() {
            None => Ok(expr),
            Some(token) => Err(format!("unexpected '{}'", token)),
        }
    }

    /// Evaluate against a scenario's tags, which carry no `@`.
    pub fn matches(&self, tags: &[String]) -> bool {
        match self {
            Self::Tag(tag) => tags.iter().any(|t| t == tag),
            Self::Not(inner) => !inner.matches(tags),
            Self::And(a, b) => a.matches(tags) && b.matches(tags),
            Self::Or(a, b) => a.matches(tags) || b.matches(tags),
        }
    }
}

impl fmt::Display for TagExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tag(tag) => write!(f, "@{}", tag),
            Self::Not(inner) => write!(f, "not {}", inner),
            Self::And(a, b) => write!(f, "({} and {})", a, b),
            Self::Or(a, b) => write!(f, "({} or {})", a, b),
        }
    }
}

fn tokenize(input: &str) -> Vec<String> {
    input
        .replace('(', " ( ")
        .replace(')', " ) ")
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

struct Parser {
    tokens: Vec<String>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&str> {
        self.tokens.get(self.pos).map(String::as_str)
    }

    fn next(&mut self) -> Option<String> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn or_expr(&mut self) -> Result<TagExpr, String> {
        let mut expr = self.and_expr()?;
        while self.peek() == Some("or") {
            self.pos += 1;
            expr = TagExpr::Or(Box::new(expr), Box::new(self.and_expr()?));
        }
        Ok(expr)
    }

    fn and_expr(&mut self) -> Result<TagExpr, String> {
        let mut expr = self.unary()?;
        while self.peek() == Some("and") {
            self.pos += 1;
            expr = TagExpr::And(Box::new(expr), Box::new(self.unary()?));
        }
        Ok(expr)
    }

    fn unary(&mut self) -> Result<TagExpr, String> {
        match self.next().as_deref() {
            Some("not") => Ok(TagExpr::Not(Box::new(self.unary()?))),
            Some("(") => {
                let expr = self.or_expr()?;
                match self.next().as_deref() {
                    Some(")") => Ok(expr),
                    _ => Err("missing ')'".to_string()),
                }
            }
            Some(op @ ("and" | "or" | ")")) => Err(format!("unexpected '{}'", op)),
            Some(tag) => {
                let tag = tag.trim_start_matches('@');
                if tag.is_empty() {
                    return Err("empty tag name".to_string());
                }
                Ok(TagExpr::Tag(tag.to_string()))
            }
            None => Err("expression ends early".to_string()),
        }
    }
}
