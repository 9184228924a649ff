//! Tool name reservation.
//!
//! Names are bounded to [`MAX_TOOL_NAME_LEN`] characters and unique within one conversion run.
//! A name that is too long, or already taken, is truncated to make room for a zero-padded
//! `-NNNN` suffix drawn from a run-wide counter.

use std::collections::HashSet;

/// Maximum tool name length (in characters) accepted by tool-calling providers.
pub const MAX_TOOL_NAME_LEN: usize = 64;

const SUFFIX_DIGITS: usize = 4;

/// Run-scoped name registry. Never reuse across runs.
#[derive(Debug, Default)]
pub struct ToolNames {
    issued: HashSet<String>,
    counter: usize,
}

impl ToolNames {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve a unique, length-bounded name derived from `base`.
    pub fn reserve(&mut self, base: &str) -> String {
        if base.chars().count() <= MAX_TOOL_NAME_LEN && self.issued.insert(base.to_string()) {
            return base.to_string();
        }

        loop {
            self.counter += 1;
            let suffix = format!("-{:0width$}", self.counter, width = SUFFIX_DIGITS);
            let stem: String = base
                .chars()
                .take(MAX_TOOL_NAME_LEN.saturating_sub(suffix.len()))
                .collect();
            let candidate = format!("{stem}{suffix}");
            if self.issued.insert(candidate.clone()) {
                return candidate;
            }
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.issued.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.issued.is_empty()
    }
}
