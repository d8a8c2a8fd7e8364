//! External formatter commands and the ordered chain they form.
//!
//! A [`Tool`] is parsed from a single whitespace separated string such as
//! `"goimports -local example.com"`: the first token is the command, the rest
//! are fixed arguments. Blank specs never produce a tool.

use std::fmt;

use tracing::debug;

/// A single external command to invoke
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tool {
    command: String,
    arguments: Vec<String>,
}

impl Tool {
    /// Build a tool from a command and its fixed arguments.
    ///
    /// Surrounding whitespace is stripped from the command. Returns `None` if
    /// nothing is left.
    #[must_use]
    pub fn new<I, S>(command: impl Into<String>, arguments: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let command = command.into();
        let command = command.trim();
        if command.is_empty() {
            return None;
        }
        Some(Self {
            command: command.to_string(),
            arguments: arguments.into_iter().map(Into::into).collect(),
        })
    }

    /// Parse a `"command arg..."` spec
    #[must_use]
    pub fn parse(spec: &str) -> Option<Self> {
        let mut parts = spec.split_whitespace();
        let command = parts.next()?;
        Self::new(command, parts)
    }

    #[must_use]
    pub fn command(&self) -> &str {
        &self.command
    }

    #[must_use]
    pub fn arguments(&self) -> &[String] {
        &self.arguments
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.command)?;
        for arg in &self.arguments {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Ordered list of tools; the output of each feeds the next
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolChain {
    tools: Vec<Tool>,
}

impl ToolChain {
    /// Parse every spec in order, dropping the ones without a command
    pub fn parse<I, S>(specs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let tools = specs
            .into_iter()
            .filter_map(|spec| {
                let spec = spec.as_ref();
                let tool = Tool::parse(spec);
                if tool.is_none() {
                    debug!("Ignoring empty formatter spec `{spec}'");
                }
                tool
            })
            .collect();
        Self { tools }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Tool> {
        self.tools.iter()
    }
}

impl FromIterator<Tool> for ToolChain {
    fn from_iter<T: IntoIterator<Item = Tool>>(iter: T) -> Self {
        Self {
            tools: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ToolChain {
    type Item = &'a Tool;
    type IntoIter = std::slice::Iter<'a, Tool>;

    fn into_iter(self) -> Self::IntoIter {
        self.tools.iter()
    }
}
