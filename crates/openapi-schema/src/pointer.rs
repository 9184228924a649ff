//! Internal document pointers.
//!
//! Shared component schemas live at `#/components/schemas/<name>` in the source document and at
//! `#/$defs/<name>` in a converted tool schema. Names are JSON-pointer escaped inside pointers
//! (`~` -> `~0`, `/` -> `~1`) and unescaped when used as map keys.

/// Pointer prefix of shared component schemas in an `OpenAPI` document.
pub const COMPONENT_SCHEMA_PREFIX: &str = "#/components/schemas/";

/// Pointer prefix of the local definitions block attached to a converted schema.
pub const LOCAL_DEFS_PREFIX: &str = "#/$defs/";

/// Key of the local definitions block.
pub const DEFS_KEY: &str = "$defs";

/// Component name targeted by a `#/components/schemas/<name>` pointer.
///
/// Returns `None` for any other pointer, including pointers into a component
/// (`#/components/schemas/Pet/properties/id`).
#[must_use]
pub fn component_name(pointer: &str) -> Option<String> {
    single_segment(pointer, COMPONENT_SCHEMA_PREFIX)
}

/// Definition name targeted by a `#/$defs/<name>` pointer.
#[must_use]
pub fn local_name(pointer: &str) -> Option<String> {
    single_segment(pointer, LOCAL_DEFS_PREFIX)
}

/// Build the local pointer for a definition name.
#[must_use]
pub fn local_pointer(name: &str) -> String {
    format!("{LOCAL_DEFS_PREFIX}{}", escape(name))
}

fn single_segment(pointer: &str, prefix: &str) -> Option<String> {
    let segment = pointer.strip_prefix(prefix)?;
    if segment.is_empty() || segment.contains('/') {
        return None;
    }
    Some(unescape(segment))
}

fn escape(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

fn unescape(segment: &str) -> String {
    segment.replace("~1", "/").replace("~0", "~")
}
