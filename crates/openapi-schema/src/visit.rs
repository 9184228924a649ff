//! Child traversal shared by the converter and the closure builder.
//!
//! Both walks must agree on what counts as a child schema: `properties`, a schema-valued
//! `additionalProperties`, `items` (single or tuple), and every branch of `oneOf`/`anyOf`/`allOf`.
//! Adding a new child-bearing keyword means touching both functions below, and nothing else.

use crate::schema::{AdditionalProperties, Concrete, Items, SchemaNode};

impl Concrete {
    /// Call `visit` on every direct child schema, in document order.
    pub fn for_each_child<'s>(&'s self, visit: &mut impl FnMut(&'s SchemaNode)) {
        if let Some(props) = &self.properties {
            for child in props.values() {
                visit(child);
            }
        }
        if let Some(AdditionalProperties::Schema(child)) = &self.additional_properties {
            visit(&**child);
        }
        match &self.items {
            Some(Items::Single(child)) => visit(&**child),
            Some(Items::Tuple(children)) => {
                for child in children {
                    visit(child);
                }
            }
            None => {}
        }
        for child in self.one_of.iter().chain(&self.any_of).chain(&self.all_of) {
            visit(child);
        }
    }

    /// Rebuild the child slots through `map`, preserving order.
    ///
    /// Only child-bearing keywords are populated in the result (plus a boolean
    /// `additionalProperties`, which is carried through as-is); scalar keywords are left for the
    /// caller to fill in.
    #[must_use]
    pub fn map_children(&self, map: &mut impl FnMut(&SchemaNode) -> SchemaNode) -> Concrete {
        let properties = self.properties.as_ref().map(|props| {
            props
                .iter()
                .map(|(name, child)| (name.clone(), map(child)))
                .collect()
        });
        let additional_properties = match &self.additional_properties {
            Some(AdditionalProperties::Schema(child)) => {
                Some(AdditionalProperties::Schema(Box::new(map(&**child))))
            }
            Some(AdditionalProperties::Allowed(b)) => Some(AdditionalProperties::Allowed(*b)),
            None => None,
        };
        let items = match &self.items {
            Some(Items::Single(child)) => Some(Items::Single(Box::new(map(&**child)))),
            Some(Items::Tuple(children)) => {
                Some(Items::Tuple(children.iter().map(&mut *map).collect()))
            }
            None => None,
        };
        let one_of = self.one_of.iter().map(&mut *map).collect();
        let any_of = self.any_of.iter().map(&mut *map).collect();
        let all_of = self.all_of.iter().map(&mut *map).collect();

        Concrete {
            properties,
            additional_properties,
            items,
            one_of,
            any_of,
            all_of,
            ..Concrete::default()
        }
    }
}
