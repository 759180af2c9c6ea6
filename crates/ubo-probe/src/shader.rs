//! Probe shader generation.
//!
//! The probe copies every scalar component of the uniform block into a
//! storage array of raw `u32` bits, in declaration order. Comparing that array
//! against the host bytes at the layout's offsets shows whether both sides
//! agree on where each component lives.

use std::fmt::Write as _;

use ubo_engine::layout::{emit_struct, LayoutError, Shape, StructLayout};

pub const STRUCT_NAME: &str = "Uniforms";

/// Slot of the uniform block in group 0.
pub const UNIFORM_BINDING: u32 = 0;

/// Slot of the `array<u32>` output in group 0.
pub const OUTPUT_BINDING: u32 = 1;

/// Builds the full compute shader source.
///
/// The struct declaration is spliced in first; the probe body follows.
pub fn probe_source(layout: &StructLayout) -> Result<String, LayoutError> {
    let mut src = emit_struct(layout, STRUCT_NAME)?;
    let _ = write!(
        src,
        "\n@group(0) @binding({UNIFORM_BINDING}) var<uniform> u: {STRUCT_NAME};\n\
         @group(0) @binding({OUTPUT_BINDING}) var<storage, read_write> probe: array<u32>;\n\
         \n\
         @compute @workgroup_size(1)\n\
         fn main() {{\n"
    );

    let mut slot = 0usize;
    for entry in layout.iter() {
        for access in component_accessors(entry.name(), entry.ty().shape()) {
            let _ = writeln!(src, "    probe[{slot}] = bitcast<u32>({access});");
            slot += 1;
        }
    }
    src.push_str("}\n");

    Ok(src)
}

/// Number of `u32` slots the probe writes.
pub fn component_total(layout: &StructLayout) -> usize {
    layout.iter().map(|e| e.ty().component_count()).sum()
}

/// WGSL expressions reading each component, column-major for matrices.
fn component_accessors(name: &str, shape: Shape) -> Vec<String> {
    match shape {
        Shape::Scalar => vec![format!("u.{name}")],
        Shape::Vector { len } => (0..len).map(|i| format!("u.{name}[{i}]")).collect(),
        Shape::Matrix { columns, rows } => (0..columns)
            .flat_map(|c| (0..rows).map(move |r| format!("u.{name}[{c}][{r}]")))
            .collect(),
    }
}

/// Host-side expectation: the `u32` bits at every component offset.
pub fn expected_bits(layout: &StructLayout, host: &[u8]) -> Vec<u32> {
    let mut out = Vec::with_capacity(component_total(layout));
    for entry in layout.iter() {
        let ty = entry.ty();
        for i in 0..ty.component_count() {
            let at = (entry.offset + ty.component_offset(i)) as usize;
            out.push(bytemuck::pod_read_unaligned(&host[at..at + 4]));
        }
    }
    out
}
