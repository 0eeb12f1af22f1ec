//! Shell-style glob patterns over search names (`1 of selection_*`).
//!
//! Patterns are translated to anchored regexes:
//! - `*` matches any run of characters other than `/`
//! - `?` matches one character other than `/`
//! - `[abc]`, `[a-z]`, `[^a-z]` match one character from (or outside) a class
//! - `\x` matches `x` literally
//!
//! An unterminated class, an empty class, or a dangling `\` is a malformed
//! pattern. A reversed range such as `z-a` is accepted and matches nothing.

use crate::error::{Result, SigmaError};
use crate::ir::{Condition, SearchExpr};
use regex::Regex;
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt::Write as _;

#[derive(Debug, Clone)]
pub struct SearchPattern {
    source: String,
    regex: Regex,
}

impl SearchPattern {
    /// Compile a glob pattern.
    ///
    /// # Errors
    /// Returns [`SigmaError::InvalidPattern`] when the pattern is malformed.
    pub fn compile(glob: &str) -> Result<Self> {
        let invalid = |reason: &str| SigmaError::InvalidPattern(format!("{glob}: {reason}"));

        let mut translated = String::with_capacity(glob.len() * 2 + 2);
        translated.push('^');
        let mut chars = glob.chars();
        while let Some(c) = chars.next() {
            match c {
                '*' => translated.push_str("[^/]*"),
                '?' => translated.push_str("[^/]"),
                '\\' => {
                    let escaped = chars.next().ok_or_else(|| invalid("trailing escape"))?;
                    translated.push_str(&regex::escape(escaped.encode_utf8(&mut [0; 4])));
                }
                '[' => {
                    let negated = chars.as_str().starts_with('^');
                    if negated {
                        chars.next();
                    }
                    let mut class = String::new();
                    let mut empty = true;
                    loop {
                        let lo = match chars.next() {
                            Some(']') if !empty => break,
                            Some('\\') => chars.next().ok_or_else(|| invalid("trailing escape"))?,
                            Some(']') | Some('-') => {
                                return Err(invalid("malformed character class"))
                            }
                            Some(c) => c,
                            None => return Err(invalid("unterminated character class")),
                        };
                        empty = false;

                        if !chars.as_str().starts_with('-') {
                            push_class_char(&mut class, lo);
                        } else {
                            chars.next();
                            let hi = match chars.next() {
                                Some('\\') => {
                                    chars.next().ok_or_else(|| invalid("trailing escape"))?
                                }
                                Some(']') | Some('-') | None => {
                                    return Err(invalid("malformed character range"))
                                }
                                Some(c) => c,
                            };
                            if lo <= hi {
                                push_class_char(&mut class, lo);
                                class.push('-');
                                push_class_char(&mut class, hi);
                            }
                        }
                    }
                    // Only reversed ranges: nothing is in the class
                    match (class.is_empty(), negated) {
                        (true, true) => translated.push_str("(?s:.)"),
                        (true, false) => translated.push_str("[^\\x{0}-\\x{10FFFF}]"),
                        (false, true) => write_class(&mut translated, "[^", &class),
                        (false, false) => write_class(&mut translated, "[", &class),
                    }
                }
                other => translated.push_str(&regex::escape(other.encode_utf8(&mut [0; 4]))),
            }
        }
        translated.push('$');

        let regex = Regex::new(&translated).map_err(|e| invalid(&e.to_string()))?;
        Ok(Self {
            source: glob.to_string(),
            regex,
        })
    }

    pub fn matches(&self, name: &str) -> bool {
        self.regex.is_match(name)
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

fn push_class_char(out: &mut String, c: char) {
    let _ = write!(out, "\\x{{{:X}}}", c as u32);
}

fn write_class(out: &mut String, open: &str, class: &str) {
    out.push_str(open);
    out.push_str(class);
    out.push(']');
}

/// Glob patterns of a rule, compiled once up front.
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    compiled: HashMap<String, SearchPattern>,
}

impl PatternSet {
    /// Compile every pattern referenced by the given conditions.
    pub fn from_conditions(conditions: &[Condition]) -> Result<Self> {
        let mut globs = Vec::new();
        for condition in conditions {
            condition.search.walk(&mut |node| {
                if let SearchExpr::OneOfPattern(glob) | SearchExpr::AllOfPattern(glob) = node {
                    globs.push(glob.as_str());
                }
            });
        }

        let mut compiled = HashMap::with_capacity(globs.len());
        for glob in globs {
            if !compiled.contains_key(glob) {
                compiled.insert(glob.to_string(), SearchPattern::compile(glob)?);
            }
        }
        Ok(Self { compiled })
    }

    /// Look up a compiled pattern, compiling it on demand when unseen.
    pub fn get(&self, glob: &str) -> Result<Cow<'_, SearchPattern>> {
        match self.compiled.get(glob) {
            Some(pattern) => Ok(Cow::Borrowed(pattern)),
            None => SearchPattern::compile(glob).map(Cow::Owned),
        }
    }

    pub fn len(&self) -> usize {
        self.compiled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.compiled.is_empty()
    }
}
