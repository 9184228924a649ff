//! Minimal `$defs` for a converted schema.
//!
//! The closure of a schema is every component name reachable from it through local pointers,
//! following each newly discovered name into its body in the component table. Names are kept in a
//! `BTreeSet`, which both terminates cyclic walks and fixes the output order of `$defs`.

use crate::pointer::local_name;
use crate::schema::SchemaNode;
use indexmap::IndexMap;
use std::collections::BTreeSet;

/// Every component name transitively reachable from `schema` through `#/$defs/` pointers.
///
/// Names that are missing from `components` are still part of the closure (they are dangling
/// pointers); they just cannot be followed any further.
#[must_use]
pub fn compute_closure(
    schema: &SchemaNode,
    components: &IndexMap<String, SchemaNode>,
) -> BTreeSet<String> {
    let mut seen = BTreeSet::new();
    collect(schema, components, &mut seen);
    seen
}

fn collect(
    node: &SchemaNode,
    components: &IndexMap<String, SchemaNode>,
    seen: &mut BTreeSet<String>,
) {
    match node {
        SchemaNode::Reference(reference) => {
            if let Some(name) = local_name(&reference.pointer)
                && seen.insert(name.clone())
                && let Some(body) = components.get(&name)
            {
                collect(body, components, seen);
            }
        }
        SchemaNode::Concrete(concrete) => {
            concrete.for_each_child(&mut |child| collect(child, components, seen));
        }
    }
}

/// The `$defs` block for `schema`: its closure restricted to names present in `components`.
///
/// Returns `None` rather than an empty map when there is nothing to attach.
#[must_use]
pub fn build_selective_defs(
    schema: &SchemaNode,
    components: &IndexMap<String, SchemaNode>,
) -> Option<IndexMap<String, SchemaNode>> {
    select_defs(&compute_closure(schema, components), components)
}

/// Like [`build_selective_defs`], for an already computed closure.
#[must_use]
pub fn select_defs(
    closure: &BTreeSet<String>,
    components: &IndexMap<String, SchemaNode>,
) -> Option<IndexMap<String, SchemaNode>> {
    let defs: IndexMap<String, SchemaNode> = closure
        .iter()
        .filter_map(|name| {
            components
                .get(name)
                .map(|body| (name.clone(), body.clone()))
        })
        .collect();
    (!defs.is_empty()).then_some(defs)
}
