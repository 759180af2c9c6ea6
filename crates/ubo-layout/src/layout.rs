use std::collections::HashMap;

use crate::error::LayoutError;
use crate::types::{round_up, TypeDescriptor};

// ── field spec ────────────────────────────────────────────────────────────

/// A named, already-parsed uniform field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: String,
    pub ty: TypeDescriptor,
}

impl FieldSpec {
    /// Parses `type_name` and validates `name` as a WGSL identifier.
    pub fn new(name: impl Into<String>, type_name: &str) -> Result<Self, LayoutError> {
        let name = name.into();
        if !is_wgsl_identifier(&name) {
            return Err(LayoutError::InvalidIdentifier(name));
        }
        let ty = TypeDescriptor::parse(type_name)?;
        Ok(Self { name, ty })
    }
}

/// Ordered `field name -> type name` configuration.
///
/// Order matters: it fixes both offset assignment and declaration order.
/// Nothing is validated until [`StructSpec::build`].
#[derive(Debug, Clone, Default)]
pub struct StructSpec {
    fields: Vec<(String, String)>,
}

impl StructSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a field.
    pub fn field(mut self, name: impl Into<String>, type_name: impl Into<String>) -> Self {
        self.fields.push((name.into(), type_name.into()));
        self
    }

    /// Parses every field and computes the layout.
    pub fn build(&self) -> Result<StructLayout, LayoutError> {
        StructLayout::from_pairs(self.fields.iter().map(|(n, t)| (n.as_str(), t.as_str())))
    }
}

impl<N, T> FromIterator<(N, T)> for StructSpec
where
    N: Into<String>,
    T: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (N, T)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().map(|(n, t)| (n.into(), t.into())).collect(),
        }
    }
}

// ── layout ────────────────────────────────────────────────────────────────

/// One field with its assigned byte offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutEntry {
    pub field: FieldSpec,
    pub offset: u32,
}

impl LayoutEntry {
    #[inline]
    pub fn name(&self) -> &str {
        &self.field.name
    }

    #[inline]
    pub fn ty(&self) -> &TypeDescriptor {
        &self.field.ty
    }

    /// First byte past this entry: `offset + sizeOf`.
    #[inline]
    pub fn end(&self) -> u32 {
        self.offset + self.field.ty.size_of()
    }
}

/// Computed layout of a uniform struct.
///
/// Invariants:
/// - every `entry.offset` is a multiple of the entry's `alignOf`
/// - entry byte ranges never overlap and follow declaration order
/// - `total_size % max_align == 0` and `total_size >= last.end()`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructLayout {
    entries: Vec<LayoutEntry>,
    index: HashMap<String, usize>,
    max_align: u32,
    total_size: u32,
}

impl StructLayout {
    /// Lays out already-parsed fields in order.
    pub fn new(fields: impl IntoIterator<Item = FieldSpec>) -> Result<Self, LayoutError> {
        let mut entries: Vec<LayoutEntry> = Vec::new();
        let mut index = HashMap::new();
        let mut cursor = 0u32;
        let mut max_align = 1u32;

        for field in fields {
            if index.contains_key(&field.name) {
                return Err(LayoutError::DuplicateField(field.name));
            }

            let offset = round_up(field.ty.align_of(), cursor);
            cursor = offset + field.ty.size_of();
            max_align = max_align.max(field.ty.align_of());

            log::debug!(
                "uniform field `{}`: {} at offset {} (size {}, align {})",
                field.name,
                field.ty,
                offset,
                field.ty.size_of(),
                field.ty.align_of()
            );

            index.insert(field.name.clone(), entries.len());
            entries.push(LayoutEntry { field, offset });
        }

        let total_size = round_up(max_align, cursor);
        log::debug!(
            "uniform layout: {} fields, align {}, size {} bytes",
            entries.len(),
            max_align,
            total_size
        );

        Ok(Self { entries, index, max_align, total_size })
    }

    /// Parses `(name, type name)` pairs and lays them out in order.
    ///
    /// Fails on the first unsupported type, invalid name or duplicate.
    pub fn from_pairs<'a>(
        pairs: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<Self, LayoutError> {
        let fields = pairs
            .into_iter()
            .map(|(name, type_name)| FieldSpec::new(name, type_name))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(fields)
    }

    /// Entries in declaration order.
    #[inline]
    pub fn entries(&self) -> &[LayoutEntry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &LayoutEntry> {
        self.entries.iter()
    }

    /// Looks up an entry by field name.
    pub fn get(&self, name: &str) -> Option<&LayoutEntry> {
        self.index.get(name).map(|&i| &self.entries[i])
    }

    /// Declaration index of a field.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Largest `alignOf` over all entries; 1 when empty.
    #[inline]
    pub fn max_align(&self) -> u32 {
        self.max_align
    }

    /// Struct size in bytes, rounded up to `max_align`.
    #[inline]
    pub fn total_size(&self) -> u32 {
        self.total_size
    }
}

// ── identifiers ───────────────────────────────────────────────────────────

/// WGSL keywords.
const KEYWORDS: &[&str] = &[
    "alias", "break", "case", "const", "const_assert", "continue", "continuing", "default",
    "diagnostic", "discard", "else", "enable", "false", "fn", "for", "if", "let", "loop",
    "override", "requires", "return", "struct", "switch", "true", "var", "while",
];

/// Words WGSL reserves for future use.
const RESERVED: &[&str] = &[
    "NULL", "Self", "abstract", "active", "alignas", "alignof", "as", "asm", "asm_fragment",
    "async", "attribute", "auto", "await", "become", "cast", "catch", "class", "co_await",
    "co_return", "co_yield", "coherent", "column_major", "common", "compile",
    "compile_fragment", "concept", "const_cast", "consteval", "constexpr", "constinit",
    "crate", "debugger", "decltype", "delete", "demote", "demote_to_helper", "do",
    "dynamic_cast", "enum", "explicit", "export", "extends", "extern", "external",
    "fallthrough", "filter", "final", "finally", "friend", "from", "fxgroup", "get", "goto",
    "groupshared", "highp", "impl", "implements", "import", "inline", "instanceof",
    "interface", "layout", "lowp", "macro", "macro_rules", "match", "mediump", "meta", "mod",
    "module", "move", "mut", "mutable", "namespace", "new", "nil", "noexcept", "noinline",
    "nointerpolation", "non_coherent", "noncoherent", "noperspective", "null", "nullptr",
    "of", "operator", "package", "packoffset", "partition", "pass", "patch", "pixelfragment",
    "precise", "precision", "premerge", "priv", "protected", "pub", "public", "readonly",
    "ref", "regardless", "register", "reinterpret_cast", "require", "resource", "restrict",
    "self", "set", "shared", "sizeof", "smooth", "snorm", "static", "static_assert",
    "static_cast", "std", "subroutine", "super", "target", "template", "this", "thread_local",
    "throw", "trait", "try", "type", "typedef", "typeid", "typename", "typeof", "union",
    "unless", "unorm", "unsafe", "unsized", "use", "using", "varying", "virtual", "volatile",
    "wgsl", "where", "with", "writeonly", "yield",
];

/// Returns `true` if `s` can be used as a WGSL identifier.
///
/// Accepts `[A-Za-z_][A-Za-z0-9_]*`, excluding `_` on its own, names that
/// start with `__`, keywords and reserved words.
pub fn is_wgsl_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    let Some(first) = chars.next() else { return false };
    if !(first.is_ascii_alphabetic() || first == '_') {
        return false;
    }
    if s == "_" || s.starts_with("__") || KEYWORDS.contains(&s) || RESERVED.contains(&s) {
        return false;
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(pairs: &[(&str, &str)]) -> StructLayout {
        StructLayout::from_pairs(pairs.iter().copied()).unwrap()
    }

    // ── offsets ───────────────────────────────────────────────────────────

    #[test]
    fn resolution_mouse_time_example() {
        let l = layout(&[
            ("resolution", "vec2<f32>"),
            ("mousePos", "vec2<f32>"),
            ("time", "f32"),
        ]);
        let offsets: Vec<_> = l.iter().map(|e| (e.name(), e.offset)).collect();
        assert_eq!(offsets, [("resolution", 0), ("mousePos", 8), ("time", 16)]);
        assert_eq!(l.max_align(), 8);
        assert_eq!(l.total_size(), 24);
    }

    #[test]
    fn vec3_after_scalar_jumps_to_16() {
        let l = layout(&[("t", "f32"), ("color", "vec3<f32>"), ("k", "f32")]);
        assert_eq!(l.get("color").unwrap().offset, 16);
        // A scalar may pack into the tail of a vec3.
        assert_eq!(l.get("k").unwrap().offset, 28);
        assert_eq!(l.total_size(), 32);
    }

    #[test]
    fn matrix_after_vec2_aligns_to_column() {
        let l = layout(&[("uv", "vec2<f32>"), ("m", "mat3x3<f32>"), ("n", "u32")]);
        let m = l.get("m").unwrap();
        assert_eq!(m.offset, 16);
        assert_eq!(m.end(), 64);
        assert_eq!(l.get("n").unwrap().offset, 64);
        assert_eq!(l.total_size(), 80);
    }

    #[test]
    fn offsets_are_smallest_aligned_after_previous_end() {
        let l = layout(&[
            ("a", "u32"),
            ("b", "vec2<i32>"),
            ("c", "vec3<f32>"),
            ("d", "mat2x3<f32>"),
            ("e", "f32"),
            ("f", "vec4<u32>"),
            ("g", "mat4x2<f32>"),
        ]);
        let mut prev_end = 0;
        for e in l.iter() {
            let align = e.ty().align_of();
            assert_eq!(e.offset % align, 0, "{}", e.name());
            assert!(e.offset >= prev_end);
            assert!(e.offset < prev_end + align, "{} not the smallest offset", e.name());
            prev_end = e.end();
        }
        assert_eq!(l.total_size() % l.max_align(), 0);
        assert!(l.total_size() >= prev_end);
    }

    #[test]
    fn layout_is_deterministic() {
        let pairs = [("a", "f32"), ("b", "vec3<f32>"), ("c", "mat4x4<f32>")];
        assert_eq!(layout(&pairs), layout(&pairs));
    }

    // ── edge cases ────────────────────────────────────────────────────────

    #[test]
    fn empty_layout_is_zero_sized() {
        let l = StructSpec::new().build().unwrap();
        assert!(l.is_empty());
        assert_eq!(l.max_align(), 1);
        assert_eq!(l.total_size(), 0);
    }

    #[test]
    fn duplicate_field_is_rejected() {
        let err = StructLayout::from_pairs([("a", "f32"), ("b", "u32"), ("a", "i32")]).unwrap_err();
        assert_eq!(err, LayoutError::DuplicateField("a".into()));
    }

    #[test]
    fn unsupported_type_is_rejected_eagerly() {
        let err = StructSpec::new().field("a", "f32").field("b", "vec3<f64>").build().unwrap_err();
        assert_eq!(err, LayoutError::UnsupportedType("vec3<f64>".into()));
    }

    #[test]
    fn invalid_field_names_are_rejected() {
        for name in ["", "_", "__x", "1abc", "has space", "a-b"] {
            let err = FieldSpec::new(name, "f32").unwrap_err();
            assert_eq!(err, LayoutError::InvalidIdentifier(name.into()));
        }
        assert!(FieldSpec::new("_private", "f32").is_ok());
        assert!(FieldSpec::new("mousePos2", "f32").is_ok());
    }

    #[test]
    fn keywords_and_reserved_words_are_rejected() {
        for name in ["var", "struct", "fn", "let", "loop", "const_assert", "self", "mod", "NULL"] {
            assert_eq!(
                FieldSpec::new(name, "f32").unwrap_err(),
                LayoutError::InvalidIdentifier(name.into())
            );
        }
        // Only exact matches are reserved.
        assert!(FieldSpec::new("vars", "f32").is_ok());
        assert!(FieldSpec::new("Loop", "f32").is_ok());
    }

    #[test]
    fn spec_from_iterator_keeps_order() {
        let spec: StructSpec = [("z", "f32"), ("a", "vec2<f32>")].into_iter().collect();
        let l = spec.build().unwrap();
        let names: Vec<_> = l.iter().map(LayoutEntry::name).collect();
        assert_eq!(names, ["z", "a"]);
        assert_eq!(l.get("a").unwrap().offset, 8);
    }
}
