//! Per-run conversion state.
//!
//! A [`ConversionContext`] is created by one top-level conversion, threaded through every
//! recursive call, and dropped when the run finishes. It owns everything that accumulates across
//! operations: the reference memo, the converted component table, and the tool name registry.
//! Each named component is converted at most once per run; the table doubles as its memo.
//! Sharing one context between two documents would leak memo entries and name counters from the
//! first run into the second, so there is no way to reset or reuse it.

use crate::config::ConverterConfig;
use crate::convert::ConversionMode;
use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::document::SchemaDocument;
use crate::naming::ToolNames;
use crate::resolver::ReferenceResolver;
use crate::schema::SchemaNode;
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};

pub struct ConversionContext<'a> {
    document: &'a SchemaDocument,
    config: &'a ConverterConfig,
    sink: &'a mut dyn DiagnosticSink,
    reported: usize,
    cache: HashMap<(ConversionMode, String), SchemaNode>,
    cycle_hits: usize,
    components: IndexMap<String, SchemaNode>,
    pending: HashSet<String>,
    names: ToolNames,
}

impl<'a> ConversionContext<'a> {
    pub fn new(
        document: &'a SchemaDocument,
        config: &'a ConverterConfig,
        sink: &'a mut dyn DiagnosticSink,
    ) -> Self {
        Self {
            document,
            config,
            sink,
            reported: 0,
            cache: HashMap::new(),
            cycle_hits: 0,
            components: IndexMap::new(),
            pending: HashSet::new(),
            names: ToolNames::new(),
        }
    }

    #[must_use]
    pub fn document(&self) -> &'a SchemaDocument {
        self.document
    }

    #[must_use]
    pub fn config(&self) -> &'a ConverterConfig {
        self.config
    }

    #[must_use]
    pub fn resolver(&self) -> ReferenceResolver<'a> {
        ReferenceResolver::new(self.document)
    }

    pub fn report(&mut self, diagnostic: Diagnostic) {
        self.reported += 1;
        self.sink.report(diagnostic);
    }

    /// Number of diagnostics reported so far in this run.
    #[must_use]
    pub fn reported(&self) -> usize {
        self.reported
    }

    pub(crate) fn cached(&self, mode: ConversionMode, pointer: &str) -> Option<&SchemaNode> {
        self.cache.get(&(mode, pointer.to_string()))
    }

    pub(crate) fn remember(&mut self, mode: ConversionMode, pointer: &str, node: SchemaNode) {
        self.cache.insert((mode, pointer.to_string()), node);
    }

    /// Cycle guards tripped so far; a conversion is memoizable only if this did not move.
    pub(crate) fn cycle_hits(&self) -> usize {
        self.cycle_hits
    }

    pub(crate) fn note_cycle(&mut self) {
        self.cycle_hits += 1;
    }

    /// The converted component table (empty until it has been built for this run).
    #[must_use]
    pub fn components(&self) -> &IndexMap<String, SchemaNode> {
        &self.components
    }

    pub(crate) fn set_components(&mut self, components: IndexMap<String, SchemaNode>) {
        self.components = components;
    }

    pub(crate) fn take_components(&mut self) -> IndexMap<String, SchemaNode> {
        std::mem::take(&mut self.components)
    }

    /// Whether `name` is converted or currently being converted.
    pub(crate) fn has_component(&self, name: &str) -> bool {
        self.components.contains_key(name) || self.pending.contains(name)
    }

    pub(crate) fn begin_component(&mut self, name: &str) {
        self.pending.insert(name.to_string());
    }

    pub(crate) fn finish_component(&mut self, name: &str, node: SchemaNode) {
        self.pending.remove(name);
        self.components.insert(name.to_string(), node);
    }

    pub fn reserve_name(&mut self, base: &str) -> String {
        self.names.reserve(base)
    }
}
