// src/command.rs

//! Command model: a program followed by its arguments.

use std::fmt;

use crate::errors::{ProcessError, Result};

/// An ordered, non-empty sequence of strings: program path/name followed by
/// its arguments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Command {
    parts: Vec<String>,
}

impl Command {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            parts: vec![program.into()],
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.parts.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parts.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn program(&self) -> &str {
        &self.parts[0]
    }

    pub fn args_slice(&self) -> &[String] {
        &self.parts[1..]
    }

    pub fn as_slice(&self) -> &[String] {
        &self.parts
    }

    pub fn into_vec(self) -> Vec<String> {
        self.parts
    }
}

impl TryFrom<Vec<String>> for Command {
    type Error = ProcessError;

    fn try_from(parts: Vec<String>) -> Result<Self> {
        if parts.is_empty() {
            return Err(ProcessError::Config(
                "command must contain at least the program name".to_string(),
            ));
        }
        Ok(Self { parts })
    }
}

impl TryFrom<&[&str]> for Command {
    type Error = ProcessError;

    fn try_from(parts: &[&str]) -> Result<Self> {
        Command::try_from(parts.iter().map(|s| s.to_string()).collect::<Vec<_>>())
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.parts.join(" "))
    }
}
