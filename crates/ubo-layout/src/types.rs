use std::fmt;
use std::str::FromStr;

use crate::error::LayoutError;

// ── helpers ───────────────────────────────────────────────────────────────

/// Rounds `value` up to the next multiple of `base`.
///
/// `round_up(base, value) = base * ceil(value / base)`. `base` must be non-zero.
#[inline]
pub const fn round_up(base: u32, value: u32) -> u32 {
    debug_assert!(base > 0);
    value.div_ceil(base) * base
}

// ── scalar kind ───────────────────────────────────────────────────────────

/// Scalar element kind of a uniform value.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ScalarKind {
    U32,
    I32,
    F32,
}

impl ScalarKind {
    /// Native byte width of one element.
    #[inline]
    pub const fn byte_width(self) -> u32 {
        match self {
            ScalarKind::U32 | ScalarKind::I32 | ScalarKind::F32 => 4,
        }
    }

    /// WGSL spelling of the kind.
    pub const fn wgsl_name(self) -> &'static str {
        match self {
            ScalarKind::U32 => "u32",
            ScalarKind::I32 => "i32",
            ScalarKind::F32 => "f32",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "u32" => Some(ScalarKind::U32),
            "i32" => Some(ScalarKind::I32),
            "f32" => Some(ScalarKind::F32),
            _ => None,
        }
    }
}

// ── shape ─────────────────────────────────────────────────────────────────

/// Category of a uniform type.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum TypeCategory {
    Scalar,
    Vector,
    Matrix,
}

/// Component structure of a uniform type.
///
/// Matrices are `columns` column-vectors of `rows` components each, matching
/// WGSL's `matCxR<T>` spelling.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Shape {
    Scalar,
    Vector { len: u32 },
    Matrix { columns: u32, rows: u32 },
}

// ── descriptor ────────────────────────────────────────────────────────────

/// Immutable size/alignment description of one uniform type.
///
/// Built only through [`TypeDescriptor::parse`]; every field is derived from
/// the type name.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct TypeDescriptor {
    kind: ScalarKind,
    shape: Shape,
    size: u32,
    align: u32,
}

impl TypeDescriptor {
    /// Parses a WGSL type name.
    ///
    /// Accepted grammars:
    /// - scalar `u32` | `i32` | `f32`
    /// - vector `vec{2,3,4}<kind>`
    /// - matrix `mat{2,3,4}x{2,3,4}<kind>`
    ///
    /// Integer matrices (`mat3x3<u32>`, `mat2x4<i32>`, ...) are accepted and
    /// laid out like their `f32` counterparts, but WGSL itself only has
    /// floating-point matrices: a shader declaring one will not compile.
    pub fn parse(name: &str) -> Result<Self, LayoutError> {
        let unsupported = || LayoutError::UnsupportedType(name.to_string());

        if let Some(rest) = name.strip_prefix("vec") {
            let (len, kind) = parse_dim_and_kind(rest).ok_or_else(unsupported)?;
            return Ok(Self::vector(len, kind));
        }

        if let Some(rest) = name.strip_prefix("mat") {
            let (columns, rest) = split_dim(rest).ok_or_else(unsupported)?;
            let rest = rest.strip_prefix('x').ok_or_else(unsupported)?;
            let (rows, kind) = parse_dim_and_kind(rest).ok_or_else(unsupported)?;
            return Ok(Self::matrix(columns, rows, kind));
        }

        let kind = ScalarKind::from_name(name).ok_or_else(unsupported)?;
        Ok(Self::scalar(kind))
    }

    fn scalar(kind: ScalarKind) -> Self {
        let width = kind.byte_width();
        Self { kind, shape: Shape::Scalar, size: width, align: width }
    }

    fn vector(len: u32, kind: ScalarKind) -> Self {
        let size = len * kind.byte_width();
        // vec3 aligns like vec4.
        Self { kind, shape: Shape::Vector { len }, size, align: size.next_power_of_two() }
    }

    fn matrix(columns: u32, rows: u32, kind: ScalarKind) -> Self {
        let column = Self::vector(rows, kind);
        let stride = round_up(column.align, column.size);
        Self {
            kind,
            shape: Shape::Matrix { columns, rows },
            size: columns * stride,
            align: column.align,
        }
    }

    #[inline]
    pub fn kind(&self) -> ScalarKind {
        self.kind
    }

    #[inline]
    pub fn shape(&self) -> Shape {
        self.shape
    }

    pub fn category(&self) -> TypeCategory {
        match self.shape {
            Shape::Scalar => TypeCategory::Scalar,
            Shape::Vector { .. } => TypeCategory::Vector,
            Shape::Matrix { .. } => TypeCategory::Matrix,
        }
    }

    /// Number of scalar components (`columns * rows` for matrices).
    pub fn component_count(&self) -> usize {
        match self.shape {
            Shape::Scalar => 1,
            Shape::Vector { len } => len as usize,
            Shape::Matrix { columns, rows } => (columns * rows) as usize,
        }
    }

    /// Byte width of one scalar element.
    #[inline]
    pub fn element_size(&self) -> u32 {
        self.kind.byte_width()
    }

    /// `sizeOf` in bytes, including inter-column padding for matrices.
    #[inline]
    pub fn size_of(&self) -> u32 {
        self.size
    }

    /// `alignOf` in bytes. Always a power of two.
    #[inline]
    pub fn align_of(&self) -> u32 {
        self.align
    }

    /// Byte distance between consecutive matrix columns.
    ///
    /// Returns `None` for scalars and vectors.
    pub fn column_stride(&self) -> Option<u32> {
        match self.shape {
            Shape::Matrix { columns, .. } => Some(self.size / columns),
            _ => None,
        }
    }

    /// Byte offset of the `index`-th component relative to the value's start.
    ///
    /// Matrix components are numbered column-major, so component `i` lives in
    /// column `i / rows`, row `i % rows`.
    pub fn component_offset(&self, index: usize) -> u32 {
        let index = index as u32;
        let width = self.element_size();
        match self.shape {
            Shape::Matrix { columns, rows } => {
                let stride = self.size / columns;
                (index / rows) * stride + (index % rows) * width
            }
            _ => index * width,
        }
    }
}

impl FromStr for TypeDescriptor {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = self.kind.wgsl_name();
        match self.shape {
            Shape::Scalar => f.write_str(kind),
            Shape::Vector { len } => write!(f, "vec{len}<{kind}>"),
            Shape::Matrix { columns, rows } => write!(f, "mat{columns}x{rows}<{kind}>"),
        }
    }
}

// ── grammar pieces ────────────────────────────────────────────────────────

/// Splits a leading dimension digit (2..=4) off `s`.
fn split_dim(s: &str) -> Option<(u32, &str)> {
    let mut chars = s.chars();
    let dim = chars.next()?.to_digit(10)?;
    (2..=4).contains(&dim).then_some((dim, chars.as_str()))
}

/// Parses `N<kind>` where N is a dimension digit.
fn parse_dim_and_kind(s: &str) -> Option<(u32, ScalarKind)> {
    let (dim, rest) = split_dim(s)?;
    let kind = rest.strip_prefix('<')?.strip_suffix('>')?;
    Some((dim, ScalarKind::from_name(kind)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ty(name: &str) -> TypeDescriptor {
        TypeDescriptor::parse(name).unwrap()
    }

    // ── scalars ───────────────────────────────────────────────────────────

    #[test]
    fn scalars_size_equals_align_equals_width() {
        for name in ["u32", "i32", "f32"] {
            let t = ty(name);
            assert_eq!(t.category(), TypeCategory::Scalar);
            assert_eq!(t.size_of(), 4, "{name}");
            assert_eq!(t.align_of(), 4, "{name}");
            assert_eq!(t.component_count(), 1);
        }
    }

    // ── vectors ───────────────────────────────────────────────────────────

    #[test]
    fn vector_sizes_and_alignment() {
        for (len, align) in [(2, 8), (3, 16), (4, 16)] {
            let t = ty(&format!("vec{len}<f32>"));
            assert_eq!(t.category(), TypeCategory::Vector);
            assert_eq!(t.size_of(), 4 * len);
            assert_eq!(t.align_of(), align);
            assert_eq!(t.component_count(), len as usize);
        }
    }

    #[test]
    fn vec3_aligns_like_vec4() {
        assert_eq!(ty("vec3<i32>").align_of(), ty("vec4<i32>").align_of());
        assert_eq!(ty("vec3<u32>").size_of(), 12);
    }

    // ── matrices ──────────────────────────────────────────────────────────

    #[test]
    fn mat3x3_pads_each_column() {
        let t = ty("mat3x3<f32>");
        assert_eq!(t.category(), TypeCategory::Matrix);
        assert_eq!(t.align_of(), 16);
        assert_eq!(t.size_of(), 48);
        assert_eq!(t.column_stride(), Some(16));
        assert_eq!(t.component_count(), 9);
    }

    #[test]
    fn matrix_rule_holds_for_all_dimensions() {
        for n in 2..=4u32 {
            for m in 2..=4u32 {
                let t = ty(&format!("mat{n}x{m}<f32>"));
                let column = ty(&format!("vec{m}<f32>"));
                assert_eq!(t.align_of(), column.align_of(), "mat{n}x{m}");
                assert_eq!(
                    t.size_of(),
                    n * round_up(column.align_of(), column.size_of()),
                    "mat{n}x{m}"
                );
            }
        }
    }

    #[test]
    fn mat4x2_is_columns_of_vec2() {
        let t = ty("mat4x2<f32>");
        assert_eq!(t.align_of(), 8);
        assert_eq!(t.size_of(), 32);
        assert_eq!(t.shape(), Shape::Matrix { columns: 4, rows: 2 });
    }

    #[test]
    fn integer_matrices_share_float_layout() {
        let t = ty("mat3x3<u32>");
        assert_eq!(t.kind(), ScalarKind::U32);
        assert_eq!((t.size_of(), t.align_of()), (48, 16));
        assert_eq!(t.to_string(), "mat3x3<u32>");
    }

    #[test]
    fn component_offsets_skip_column_padding() {
        let t = ty("mat3x3<f32>");
        assert_eq!(t.component_offset(0), 0);
        assert_eq!(t.component_offset(2), 8);
        assert_eq!(t.component_offset(3), 16);
        assert_eq!(t.component_offset(8), 40);

        let v = ty("vec3<f32>");
        assert_eq!(v.component_offset(2), 8);
    }

    // ── rejection ─────────────────────────────────────────────────────────

    #[test]
    fn rejects_unknown_kinds_and_shapes() {
        for name in [
            "f64", "u8", "bool", "vec5<f32>", "vec1<f32>", "vec3<f16>", "vec3f", "vec3<f32",
            "mat3<f32>", "mat3x5<f32>", "mat3x3<u64>", "mat3x3x3<f32>", "", "Vec3<f32>",
            "vec3<f32> ",
        ] {
            assert_eq!(
                TypeDescriptor::parse(name),
                Err(LayoutError::UnsupportedType(name.to_string())),
                "{name:?}"
            );
        }
    }

    // ── display ───────────────────────────────────────────────────────────

    #[test]
    fn display_round_trips_canonical_names() {
        for name in ["u32", "vec2<i32>", "mat2x4<f32>"] {
            assert_eq!(ty(name).to_string(), name);
        }
        let parsed: TypeDescriptor = "vec4<u32>".parse().unwrap();
        assert_eq!(parsed.kind(), ScalarKind::U32);
    }

    #[test]
    fn round_up_matches_definition() {
        assert_eq!(round_up(8, 20), 24);
        assert_eq!(round_up(16, 12), 16);
        assert_eq!(round_up(4, 0), 0);
        assert_eq!(round_up(4, 4), 4);
    }
}
