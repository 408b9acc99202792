//! Pattern matching for IAM actions and resources
//!
//! A pattern is brace-expanded into alternatives and each alternative is
//! compiled on its own:
//! - no `*`: an exact literal (backslash escapes resolved)
//! - with `*`: an anchored regex where `*` matches a run of characters other
//!   than `/`. A segment made only of wildcards needs at least one character,
//!   so `docs/*` does not match `docs/`.

use super::brace;
use crate::error::{PolicyError, Result};
use regex::{Regex, RegexBuilder};
use tracing::debug;

/// Longest alternative (in characters) that will be compiled
pub const MAX_PATTERN_LENGTH: usize = 1024 * 64;

/// Compiled size budget for one wildcard alternative
const COMPILED_SIZE_LIMIT: usize = 2 * 1024 * 1024;

/// Regex body for a `*` inside a segment
const STAR: &str = "[^/]*?";

/// Regex body for a segment that is nothing but wildcards
const STAR_SEGMENT: &str = "[^/]+?";

/// One compiled alternative of a pattern
#[derive(Debug, Clone)]
pub enum CompiledAlternative {
    /// Exact string comparison
    Literal(String),
    /// Full, anchored wildcard match
    Wildcard(Regex),
    /// The wildcard translation could not be built; never matches
    Unmatchable,
}

impl CompiledAlternative {
    /// Check a candidate string against this alternative
    pub fn matches(&self, candidate: &str) -> bool {
        match self {
            CompiledAlternative::Literal(literal) => literal == candidate,
            CompiledAlternative::Wildcard(regex) => regex.is_match(candidate),
            CompiledAlternative::Unmatchable => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    Char(char),
    Star,
    Separator,
}

fn tokenize(alternative: &str) -> Vec<Token> {
    let mut tokens = Vec::with_capacity(alternative.len());
    let mut chars = alternative.chars();

    while let Some(c) = chars.next() {
        let token = match c {
            '\\' => match chars.next() {
                Some('/') => Token::Separator,
                Some(escaped) => Token::Char(escaped),
                None => Token::Char('\\'),
            },
            '*' => Token::Star,
            '/' => Token::Separator,
            other => Token::Char(other),
        };
        tokens.push(token);
    }

    tokens
}

/// Compile one expanded alternative
///
/// Returns `Ok(None)` for the empty alternative, which contributes nothing to
/// a matcher. Fails only when the alternative is longer than
/// [`MAX_PATTERN_LENGTH`].
pub fn compile_alternative(alternative: &str) -> Result<Option<CompiledAlternative>> {
    let length = alternative.chars().count();
    if length > MAX_PATTERN_LENGTH {
        return Err(PolicyError::OversizedPattern {
            length,
            max: MAX_PATTERN_LENGTH,
        });
    }

    let tokens = tokenize(alternative);
    if tokens.is_empty() {
        return Ok(None);
    }

    if !tokens.contains(&Token::Star) {
        let literal: String = tokens
            .iter()
            .map(|token| match token {
                Token::Char(c) => *c,
                _ => '/',
            })
            .collect();
        return Ok(Some(CompiledAlternative::Literal(literal)));
    }

    let source = wildcard_source(&tokens);
    match RegexBuilder::new(&source)
        .size_limit(COMPILED_SIZE_LIMIT)
        .build()
    {
        Ok(regex) => Ok(Some(CompiledAlternative::Wildcard(regex))),
        Err(e) => {
            debug!(pattern = alternative, error = %e, "wildcard pattern can never match");
            Ok(Some(CompiledAlternative::Unmatchable))
        }
    }
}

fn wildcard_source(tokens: &[Token]) -> String {
    let mut source = String::from("^");
    let mut buf = [0u8; 4];

    for (i, segment) in tokens.split(|t| *t == Token::Separator).enumerate() {
        if i > 0 {
            source.push('/');
        }

        if !segment.is_empty() && segment.iter().all(|t| *t == Token::Star) {
            source.push_str(STAR_SEGMENT);
            continue;
        }

        for token in segment {
            match token {
                Token::Star => source.push_str(STAR),
                Token::Char(c) => source.push_str(&regex::escape(c.encode_utf8(&mut buf))),
                Token::Separator => unreachable!("segments are split on separators"),
            }
        }
    }

    source.push('$');
    source
}

/// Compiled form of one pattern string
#[derive(Debug, Clone)]
pub struct Matcher {
    pattern: String,
    alternatives: Vec<CompiledAlternative>,
    empty: bool,
}

impl Matcher {
    /// Compile a pattern (surrounding whitespace is ignored)
    ///
    /// Fails when brace expansion goes over its budget or an alternative is
    /// longer than [`MAX_PATTERN_LENGTH`].
    ///
    /// # Examples
    /// ```
    /// use policy_match::iam::Matcher;
    ///
    /// let matcher = Matcher::new("docs/{public,shared}/*").unwrap();
    /// assert!(matcher.is_match("docs/public/readme"));
    /// assert!(matcher.is_match("docs/shared/notes"));
    /// assert!(!matcher.is_match("docs/private/keys"));
    /// assert!(!matcher.is_match("docs/public/"));
    /// ```
    pub fn new(pattern: &str) -> Result<Self> {
        let trimmed = pattern.trim();
        let empty = trimmed.is_empty();

        let mut alternatives = Vec::new();
        if !empty {
            for alternative in brace::expand(trimmed)? {
                if let Some(compiled) = compile_alternative(&alternative)? {
                    alternatives.push(compiled);
                }
            }
        }

        Ok(Matcher {
            pattern: trimmed.to_string(),
            alternatives,
            empty,
        })
    }

    /// Compile `pattern` and test a single candidate
    pub fn matches(pattern: &str, candidate: &str) -> Result<bool> {
        Ok(Self::new(pattern)?.is_match(candidate))
    }

    /// Check whether any alternative accepts `candidate`
    pub fn is_match(&self, candidate: &str) -> bool {
        if self.empty {
            return candidate.is_empty();
        }
        self.alternatives.iter().any(|alt| alt.matches(candidate))
    }

    /// The trimmed pattern this matcher was built from
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn alternatives(&self) -> &[CompiledAlternative] {
        &self.alternatives
    }

    /// True when the pattern was empty after trimming
    pub fn is_empty_pattern(&self) -> bool {
        self.empty
    }
}
