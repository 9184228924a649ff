//! `OpenAPI` schema -> tool schema conversion.
//!
//! Two modes:
//! - [`ConversionMode::Local`] rewrites component references to `#/$defs/<name>` without looking
//!   at their targets. Final tool schemas are converted this way and get their own definitions
//!   block.
//! - [`ConversionMode::Resolved`] dereferences every pointer. A named component target is
//!   converted once into the run's component table and referred to by its local pointer; any
//!   other target is converted in place. The component table is built this way.
//!
//! Conversion never fails. An unresolvable pointer is kept as it was written, plus a diagnostic.

use crate::context::ConversionContext;
use crate::diagnostics::Diagnostic;
use crate::pointer::{component_name, local_pointer};
use crate::resolver::{Resolution, VisitedPath};
use crate::schema::{AdditionalProperties, Concrete, Reference, SchemaNode};
use indexmap::IndexMap;

/// Format keyword kept (as `uri-reference`) for binary payloads.
const BINARY_FORMAT: &str = "binary";
const FILE_PATH_FORMAT: &str = "uri-reference";
const FILE_PATH_NOTE: &str = "absolute paths to local files";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConversionMode {
    Local,
    Resolved,
}

pub struct SchemaConverter<'c, 'a> {
    ctx: &'c mut ConversionContext<'a>,
}

impl<'c, 'a> SchemaConverter<'c, 'a> {
    pub fn new(ctx: &'c mut ConversionContext<'a>) -> Self {
        Self { ctx }
    }

    /// Convert every `components.schemas` entry in resolved mode and store the table, in
    /// document order, on the context.
    pub fn build_component_table(&mut self) {
        let document = self.ctx.document();
        for name in document.schemas().keys() {
            self.resolve_component(name);
        }

        let mut converted = self.ctx.take_components();
        let table: IndexMap<String, SchemaNode> = document
            .schemas()
            .keys()
            .filter_map(|name| {
                converted
                    .swap_remove(name)
                    .map(|node| (name.clone(), node))
            })
            .collect();
        tracing::debug!(components = table.len(), "built component table");
        self.ctx.set_components(table);
    }

    pub fn convert(
        &mut self,
        node: &SchemaNode,
        visited: &mut VisitedPath,
        mode: ConversionMode,
    ) -> SchemaNode {
        match node {
            SchemaNode::Reference(reference) => self.convert_reference(reference, visited, mode),
            SchemaNode::Concrete(concrete) => {
                SchemaNode::Concrete(Box::new(self.convert_concrete(concrete, visited, mode)))
            }
        }
    }

    fn convert_concrete(
        &mut self,
        source: &Concrete,
        visited: &mut VisitedPath,
        mode: ConversionMode,
    ) -> Concrete {
        let mut out = source.map_children(&mut |child| self.convert(child, visited, mode));

        out.schema_type.clone_from(&source.schema_type);
        out.description.clone_from(&source.description);
        out.enumeration.clone_from(&source.enumeration);
        out.default.clone_from(&source.default);
        out.required.clone_from(&source.required);

        if source.format.as_deref() == Some(BINARY_FORMAT) {
            out.format = Some(FILE_PATH_FORMAT.to_string());
            out.description = Some(match out.description.take() {
                Some(desc) if !desc.is_empty() => format!("{desc} ({FILE_PATH_NOTE})"),
                _ => FILE_PATH_NOTE.to_string(),
            });
        }

        if matches!(out.additional_properties, Some(AdditionalProperties::Allowed(true))) {
            out.additional_properties = None;
        }

        out
    }

    fn convert_reference(
        &mut self,
        reference: &Reference,
        visited: &mut VisitedPath,
        mode: ConversionMode,
    ) -> SchemaNode {
        let pointer = reference.pointer.as_str();

        if let Some(name) = component_name(pointer) {
            if mode == ConversionMode::Resolved && !self.resolve_component(&name) {
                self.ctx.report(Diagnostic::UnresolvedReference {
                    pointer: pointer.to_string(),
                    context: "schema".to_string(),
                });
            }
            return SchemaNode::Reference(Reference {
                pointer: local_pointer(&name),
                description: reference.description.clone(),
            });
        }

        if let Some(hit) = self.ctx.cached(mode, pointer) {
            return with_description(hit.clone(), reference);
        }

        match self.ctx.resolver().resolve(pointer, visited) {
            Resolution::Found(target) => {
                let target = SchemaNode::from_value(target);
                let hits_before = self.ctx.cycle_hits();
                let converted = self.convert(&target, visited, mode);
                visited.leave(pointer);
                if self.ctx.cycle_hits() == hits_before {
                    self.ctx.remember(mode, pointer, converted.clone());
                }
                with_description(converted, reference)
            }
            Resolution::Cycle => {
                self.ctx.note_cycle();
                self.ctx.report(Diagnostic::CyclicReference {
                    pointer: pointer.to_string(),
                });
                SchemaNode::Reference(reference.clone())
            }
            Resolution::Missing => {
                self.ctx.report(Diagnostic::UnresolvedReference {
                    pointer: pointer.to_string(),
                    context: "schema".to_string(),
                });
                SchemaNode::Reference(reference.clone())
            }
        }
    }

    /// Make sure component `name` is in the table, converting its body on first sight. A
    /// component that is still being converted counts as present, which cuts cycles between
    /// components. Returns `false` if the document has no such component.
    fn resolve_component(&mut self, name: &str) -> bool {
        if self.ctx.has_component(name) {
            return true;
        }
        let Some(body) = self.ctx.document().schemas().get(name) else {
            return false;
        };

        self.ctx.begin_component(name);
        let converted = self.convert(body, &mut VisitedPath::new(), ConversionMode::Resolved);
        self.ctx.finish_component(name, converted);
        true
    }
}

/// A sibling description on the `$ref` wins over the target's own.
fn with_description(mut node: SchemaNode, reference: &Reference) -> SchemaNode {
    if let Some(desc) = &reference.description {
        node.set_description(desc.clone());
    }
    node
}
