//! # Configuration Templates
//!
//! Connection settings may reference pipeline-supplied values:
//!
//! ```text
//! address: "{{user `consul_host`}}:8500"
//! ```
//!
//! Text outside `{{ ... }}` is copied verbatim. Each action is a function
//! name followed by its arguments; arguments are quoted with backticks or
//! double quotes.
//!
//! | action | expands to |
//! |--------|------------|
//! | ``user `name` `` | the user variable `name` (error if undefined) |
//! | `timestamp` | UNIX seconds of the resolve instant |
//! | `isotime` | RFC 3339 UTC rendering of the same instant |
//! | `uuid` | a fresh v4 UUID |
//! | `pwd` | the current working directory |

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// Errors raised while expanding a single template string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    /// `{{` without a matching `}}`.
    #[error("unterminated action starting at byte {offset}")]
    Unterminated { offset: usize },

    /// `{{ }}` with nothing inside.
    #[error("empty action at byte {offset}")]
    EmptyAction { offset: usize },

    /// Quoted argument missing its closing quote.
    #[error("unterminated quoted argument in action `{action}`")]
    UnterminatedQuote { action: String },

    /// Action does not start with a function name.
    #[error("action `{action}` must start with a function name")]
    MissingFunction { action: String },

    #[error("function \"{name}\" not defined")]
    UnknownFunction { name: String },

    #[error("wrong number of args for {function}: want {expected} got {found}")]
    Arity {
        function: String,
        expected: usize,
        found: usize,
    },

    /// `user` referenced a variable the pipeline did not supply.
    #[error("unknown user var: {name}")]
    UnknownUserVariable { name: String },

    #[error("failed to read current directory: {reason}")]
    WorkingDirectory { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Word(String),
    Quoted(String),
}

impl Token {
    fn text(&self) -> &str {
        match self {
            Self::Word(s) | Self::Quoted(s) => s,
        }
    }
}

/// Everything an expansion may read. One context is shared by all fields of
/// a single resolve, so `timestamp` and `isotime` agree across fields.
#[derive(Debug, Clone)]
pub struct TemplateContext<'a> {
    user_vars: &'a BTreeMap<String, String>,
    now: DateTime<Utc>,
}

impl<'a> TemplateContext<'a> {
    pub fn new(user_vars: &'a BTreeMap<String, String>) -> Self {
        Self::at(user_vars, Utc::now())
    }

    /// Context pinned to a fixed instant.
    pub fn at(user_vars: &'a BTreeMap<String, String>, now: DateTime<Utc>) -> Self {
        Self { user_vars, now }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }
}

/// Expand every action in `template`.
pub fn expand(template: &str, ctx: &TemplateContext<'_>) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    let mut consumed = 0;

    while let Some(start) = rest.find(OPEN) {
        out.push_str(&rest[..start]);
        let offset = consumed + start;
        let after_open = &rest[start + OPEN.len()..];
        let end = after_open
            .find(CLOSE)
            .ok_or(TemplateError::Unterminated { offset })?;
        let action = after_open[..end].trim();
        if action.is_empty() {
            return Err(TemplateError::EmptyAction { offset });
        }
        out.push_str(&evaluate(action, ctx)?);

        let advance = start + OPEN.len() + end + CLOSE.len();
        consumed += advance;
        rest = &rest[advance..];
    }
    out.push_str(rest);
    Ok(out)
}

fn evaluate(action: &str, ctx: &TemplateContext<'_>) -> Result<String, TemplateError> {
    let tokens = tokenize(action)?;
    let (name, args) = match tokens.split_first() {
        Some((Token::Word(name), args)) => (name.as_str(), args),
        _ => {
            return Err(TemplateError::MissingFunction {
                action: action.to_string(),
            })
        }
    };

    match name {
        "user" => {
            let [arg] = args else {
                return Err(arity(name, 1, args.len()));
            };
            ctx.user_vars
                .get(arg.text())
                .cloned()
                .ok_or_else(|| TemplateError::UnknownUserVariable {
                    name: arg.text().to_string(),
                })
        }
        "timestamp" => no_args(name, args).map(|()| ctx.now.timestamp().to_string()),
        "isotime" => {
            no_args(name, args).map(|()| ctx.now.to_rfc3339_opts(SecondsFormat::Secs, true))
        }
        "uuid" => no_args(name, args).map(|()| uuid::Uuid::new_v4().to_string()),
        "pwd" => {
            no_args(name, args)?;
            std::env::current_dir()
                .map(|dir| dir.display().to_string())
                .map_err(|e| TemplateError::WorkingDirectory {
                    reason: e.to_string(),
                })
        }
        other => Err(TemplateError::UnknownFunction {
            name: other.to_string(),
        }),
    }
}

fn no_args(function: &str, args: &[Token]) -> Result<(), TemplateError> {
    if args.is_empty() {
        Ok(())
    } else {
        Err(arity(function, 0, args.len()))
    }
}

fn arity(function: &str, expected: usize, found: usize) -> TemplateError {
    TemplateError::Arity {
        function: function.to_string(),
        expected,
        found,
    }
}

fn tokenize(action: &str) -> Result<Vec<Token>, TemplateError> {
    let mut tokens = Vec::new();
    let mut chars = action.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        if c == '`' || c == '"' {
            chars.next();
            let mut text = String::new();
            loop {
                match chars.next() {
                    Some(ch) if ch == c => break,
                    Some(ch) => text.push(ch),
                    None => {
                        return Err(TemplateError::UnterminatedQuote {
                            action: action.to_string(),
                        })
                    }
                }
            }
            tokens.push(Token::Quoted(text));
            continue;
        }
        let mut word = String::new();
        while let Some(&ch) = chars.peek() {
            if ch.is_whitespace() {
                break;
            }
            word.push(ch);
            chars.next();
        }
        tokens.push(Token::Word(word));
    }
    Ok(tokens)
}
