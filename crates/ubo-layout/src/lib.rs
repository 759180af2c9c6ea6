//! WGSL uniform struct layout.
//!
//! Computes byte offsets for an ordered list of uniform fields using WGSL's
//! alignment rules and renders a matching struct declaration. This crate has
//! no GPU dependencies so it can be used by tooling and tests directly.
//!
//! # Structure
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`types`] | `TypeDescriptor`, `ScalarKind`, `Shape`, `round_up` |
//! | [`layout`] | `StructSpec`, `FieldSpec`, `StructLayout`, `LayoutEntry` |
//! | [`emit`] | `emit_struct`, `EmitOptions` |
//! | [`error`] | `LayoutError` |
//!
//! # Quick start
//!
//! ```rust
//! use ubo_layout::{emit_struct, StructSpec};
//!
//! let layout = StructSpec::new()
//!     .field("resolution", "vec2<f32>")
//!     .field("mousePos", "vec2<f32>")
//!     .field("time", "f32")
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(layout.get("time").unwrap().offset, 16);
//! assert_eq!(layout.total_size(), 24);
//!
//! let wgsl = emit_struct(&layout, "Uniforms").unwrap();
//! assert!(wgsl.contains("@align(4) @size(4) time: f32,"));
//! ```

pub mod emit;
pub mod error;
pub mod layout;
pub mod types;

pub use emit::{emit_struct, emit_struct_with, EmitOptions};
pub use error::LayoutError;
pub use layout::{FieldSpec, LayoutEntry, StructLayout, StructSpec};
pub use types::{round_up, ScalarKind, Shape, TypeCategory, TypeDescriptor};
