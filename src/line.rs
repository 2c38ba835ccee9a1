//! Raw text lines and their mapping to routable packages.
//!
//! A line is `COMMAND param param :trailing parameter`. Words are separated
//! by spaces; a word starting with `:` takes the rest of the line.

use sldispatch_core::{Package, PackageMapper};

/// A parsed line: command word plus parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    /// First word, verbatim. Empty for a blank line.
    pub command: String,
    pub params: Vec<String>,
}

impl Line {
    /// Parse one line. Never fails; a blank line yields an empty command.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim_end_matches(['\r', '\n']).trim_start_matches(' ');

        let (command, mut rest) = match raw.split_once(' ') {
            Some((command, rest)) => (command, rest),
            None => (raw, ""),
        };

        let mut params = Vec::new();
        loop {
            rest = rest.trim_start_matches(' ');
            if rest.is_empty() {
                break;
            }
            if let Some(trailing) = rest.strip_prefix(':') {
                params.push(trailing.to_string());
                break;
            }
            match rest.split_once(' ') {
                Some((word, tail)) => {
                    params.push(word.to_string());
                    rest = tail;
                }
                None => {
                    params.push(rest.to_string());
                    break;
                }
            }
        }

        Self {
            command: command.to_string(),
            params,
        }
    }

    /// Parameter at `index`, if present.
    #[inline]
    pub fn param(&self, index: usize) -> Option<&str> {
        self.params.get(index).map(String::as_str)
    }
}

impl Package for Line {
    type Key = String;

    fn key(&self) -> &String {
        &self.command
    }
}

/// Maps raw text lines to [`Line`] packages.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineMapper;

impl PackageMapper<str> for LineMapper {
    type Package = Line;

    fn map(&self, raw: &str) -> Line {
        Line::parse(raw)
    }
}
