//! `$ref` resolution against the in-memory document.
//!
//! Only pointers rooted at the document (`#/...`) are supported; file and URL references are the
//! loader's concern and resolve to nothing here.
//!
//! Cycle safety is per descent, not global: a [`VisitedPath`] holds the pointers entered on the
//! current recursion path, and the caller leaves a pointer once it has finished converting the
//! target. Two independent top-level descents may therefore each traverse the same pointer.

use crate::diagnostics::Diagnostic;
use crate::document::{ReferenceOr, SchemaDocument};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Pointers entered on the current recursion path.
#[derive(Debug, Clone, Default)]
pub struct VisitedPath {
    stack: Vec<String>,
}

impl VisitedPath {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn contains(&self, pointer: &str) -> bool {
        self.stack.iter().any(|p| p == pointer)
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    fn enter(&mut self, pointer: &str) {
        self.stack.push(pointer.to_string());
    }

    /// Leave `pointer` after its target has been fully processed.
    pub fn leave(&mut self, pointer: &str) {
        if let Some(pos) = self.stack.iter().rposition(|p| p == pointer) {
            self.stack.truncate(pos);
        }
    }
}

/// Outcome of resolving one pointer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolution<'a> {
    /// The target; the pointer is now entered on the visited path.
    Found(&'a Value),
    /// The pointer is already on the current path.
    Cycle,
    /// Not rooted at the document, or a segment is missing.
    Missing,
}

#[derive(Debug, Clone, Copy)]
pub struct ReferenceResolver<'a> {
    document: &'a SchemaDocument,
}

impl<'a> ReferenceResolver<'a> {
    #[must_use]
    pub fn new(document: &'a SchemaDocument) -> Self {
        Self { document }
    }

    /// Resolve a pointer to the raw JSON it targets, guarding against cycles on this path.
    #[must_use]
    pub fn resolve(&self, pointer: &str, visited: &mut VisitedPath) -> Resolution<'a> {
        let Some(fragment) = pointer.strip_prefix('#') else {
            return Resolution::Missing;
        };
        if !fragment.starts_with('/') {
            return Resolution::Missing;
        }
        if visited.contains(pointer) {
            return Resolution::Cycle;
        }

        match self.document.raw().pointer(fragment) {
            Some(target) => {
                visited.enter(pointer);
                Resolution::Found(target)
            }
            None => Resolution::Missing,
        }
    }

    /// Resolve a `ReferenceOr<T>` (parameter, request body, response), following `$ref` chains.
    ///
    /// # Errors
    ///
    /// Returns an [`Diagnostic::UnresolvedReference`] if a pointer in the chain is missing, cyclic,
    /// or does not deserialize as `T`.
    pub fn resolve_item<T>(&self, item: &ReferenceOr<T>, context: &str) -> Result<T, Diagnostic>
    where
        T: Clone + DeserializeOwned,
    {
        let mut seen = VisitedPath::new();
        let mut current = item.clone();

        loop {
            match current {
                ReferenceOr::Item(item) => return Ok(item),
                ReferenceOr::Reference { reference } => {
                    let Resolution::Found(value) = self.resolve(&reference, &mut seen) else {
                        return Err(Diagnostic::UnresolvedReference {
                            pointer: reference,
                            context: context.to_string(),
                        });
                    };
                    current = serde_json::from_value(value.clone()).map_err(|e| {
                        Diagnostic::UnresolvedReference {
                            pointer: reference.clone(),
                            context: format!("{context}: {e}"),
                        }
                    })?;
                }
            }
        }
    }
}
