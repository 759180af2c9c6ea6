//! Host value -> device byte encoding.

use ubo_layout::{ScalarKind, TypeDescriptor};

/// Encodes `values` as the native scalars of `ty`.
///
/// The result starts at the value's first byte and ends after the last
/// supplied component. Matrix values are column-major; padding between
/// columns that falls inside the written span is zero.
///
/// Callers must not pass more values than `ty.component_count()`.
pub(crate) fn encode_values(ty: &TypeDescriptor, values: &[f64]) -> Vec<u8> {
    debug_assert!(values.len() <= ty.component_count());

    let Some(last) = values.len().checked_sub(1) else {
        return Vec::new();
    };

    let width = ty.element_size() as usize;
    let mut words = vec![0u32; ty.component_offset(last) as usize / width + 1];
    for (i, &v) in values.iter().enumerate() {
        words[ty.component_offset(i) as usize / width] = encode_scalar(ty.kind(), v);
    }

    bytemuck::cast_slice(&words).to_vec()
}

fn encode_scalar(kind: ScalarKind, v: f64) -> u32 {
    match kind {
        ScalarKind::F32 => (v as f32).to_bits(),
        // i32 shares the u32 bit pattern after modular wrapping.
        ScalarKind::U32 | ScalarKind::I32 => wrap_u32(v),
    }
}

/// Truncates toward zero and wraps modulo 2^32; non-finite values become 0.
fn wrap_u32(v: f64) -> u32 {
    if !v.is_finite() {
        return 0;
    }
    v.trunc().rem_euclid(4_294_967_296.0) as u32
}
