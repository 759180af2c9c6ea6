//! WGSL struct declaration emitter.
//!
//! Every member carries explicit `@align` / `@size` attributes taken from the
//! computed layout, so the shader compiler cannot arrive at different offsets
//! for 3-component vectors or padded matrix columns.

use std::fmt::Write as _;

use crate::error::LayoutError;
use crate::layout::{is_wgsl_identifier, StructLayout};

/// Formatting switches for [`emit_struct_with`].
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct EmitOptions {
    /// Append `// offset N` after each member.
    pub offset_comments: bool,
}

/// Renders `layout` as a WGSL struct named `type_name`.
pub fn emit_struct(layout: &StructLayout, type_name: &str) -> Result<String, LayoutError> {
    emit_struct_with(layout, type_name, EmitOptions::default())
}

/// Like [`emit_struct`] with explicit formatting options.
///
/// WGSL has no member-less structs, so an empty layout fails with
/// [`LayoutError::EmptyStruct`].
pub fn emit_struct_with(
    layout: &StructLayout,
    type_name: &str,
    options: EmitOptions,
) -> Result<String, LayoutError> {
    if !is_wgsl_identifier(type_name) {
        return Err(LayoutError::InvalidIdentifier(type_name.to_string()));
    }
    if layout.is_empty() {
        return Err(LayoutError::EmptyStruct(type_name.to_string()));
    }

    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = writeln!(out, "struct {type_name} {{");
    for entry in layout.iter() {
        let ty = entry.ty();
        let _ = write!(
            out,
            "    @align({}) @size({}) {}: {},",
            ty.align_of(),
            ty.size_of(),
            entry.name(),
            ty
        );
        if options.offset_comments {
            let _ = write!(out, " // offset {}", entry.offset);
        }
        out.push('\n');
    }
    out.push_str("}\n");

    Ok(out)
}
