//! Operation inclusion policy.

use crate::config::FilterConfig;

/// Decides whether a candidate operation becomes a tool. Called once per operation, before it is
/// compiled.
pub trait OperationFilter {
    fn should_include(&self, operation_id: Option<&str>, path: &str) -> bool;
}

impl OperationFilter for FilterConfig {
    /// Exclude wins; a non-empty include list must match. Each pattern is tried against the
    /// operation id and against the path.
    fn should_include(&self, operation_id: Option<&str>, path: &str) -> bool {
        let matches = |pattern: &String| {
            operation_id.is_some_and(|id| glob_match(pattern, id)) || glob_match(pattern, path)
        };

        if self.exclude.iter().any(matches) {
            return false;
        }
        self.include.is_empty() || self.include.iter().any(matches)
    }
}

/// Glob matching over chars: `*` matches any run (including none), `?` exactly one char.
///
/// Backtracks only to the most recent `*`, so matching is linear in practice.
#[must_use]
pub fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();

    let (mut p, mut t) = (0, 0);
    // Pattern position after the last `*`, and the text position it is currently anchored at.
    let mut resume: Option<(usize, usize)> = None;

    while t < text.len() {
        match pattern.get(p) {
            Some('*') => {
                p += 1;
                resume = Some((p, t));
            }
            Some(&c) if c == '?' || c == text[t] => {
                p += 1;
                t += 1;
            }
            _ => match resume {
                Some((after_star, anchor)) => {
                    p = after_star;
                    t = anchor + 1;
                    resume = Some((after_star, t));
                }
                None => return false,
            },
        }
    }

    pattern[p..].iter().all(|&c| c == '*')
}
