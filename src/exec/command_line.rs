// src/exec/command_line.rs

//! Turning a single command string into a program and its arguments.
//!
//! The command string is never given to a shell. It is split the way a
//! process loader splits a command line and nothing more:
//!
//! - runs of ASCII whitespace separate arguments;
//! - `"..."` groups text containing whitespace (the quotes are removed);
//! - `\"` is a literal quote and `\\` a literal backslash; any other
//!   backslash is kept as-is.
//!
//! There is no globbing, variable expansion, piping or redirection.

use std::fmt;

use crate::errors::{ProcessError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    program: String,
    args: Vec<String>,
}

impl CommandLine {
    pub fn parse(text: &str) -> Result<Self> {
        let mut words = split_words(text)?.into_iter();
        let program = words.next().ok_or(ProcessError::EmptyCommand)?;
        Ok(Self {
            program,
            args: words.collect(),
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", quote_word(&self.program))?;
        for arg in &self.args {
            write!(f, " {}", quote_word(arg))?;
        }
        Ok(())
    }
}

/// Build `"program args"` when `args` is non-empty, otherwise `program`.
pub fn join_program_args(program: &str, args: &str) -> String {
    if args.is_empty() {
        program.to_string()
    } else {
        format!("{program} {args}")
    }
}

/// Quote a single argument so that [`CommandLine::parse`] yields it back
/// unchanged.
pub fn quote_word(word: &str) -> String {
    let needs_quotes = word.is_empty() || word.chars().any(|c| c.is_ascii_whitespace());
    let needs_escapes = word.contains('"') || word.contains('\\');
    if !needs_quotes && !needs_escapes {
        return word.to_string();
    }

    let mut out = String::with_capacity(word.len() + 2);
    if needs_quotes {
        out.push('"');
    }
    for c in word.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    if needs_quotes {
        out.push('"');
    }
    out
}

fn split_words(text: &str) -> Result<Vec<String>> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                match chars.peek() {
                    Some(&next @ ('"' | '\\')) => {
                        current.push(next);
                        chars.next();
                    }
                    _ => current.push('\\'),
                }
                in_word = true;
            }
            '"' => {
                in_quotes = !in_quotes;
                in_word = true;
            }
            c if c.is_ascii_whitespace() && !in_quotes => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            c => {
                current.push(c);
                in_word = true;
            }
        }
    }

    if in_quotes {
        return Err(ProcessError::UnterminatedQuote(text.to_string()));
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}
