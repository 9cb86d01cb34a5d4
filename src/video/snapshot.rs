//! The immutable description of everything a single draw call needs from the
//! graphics pipeline.

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use cgmath::Matrix4;
use serde::{Deserialize, Deserializer};
use smallvec::SmallVec;

use crate::utils::hash_value::HashValue;

impl_handle!(ProgramHandle);
impl_handle!(TextureHandle);
impl_handle!(BufferHandle);

/// Uniform variable of shader program. Each matrix is supplied in column major order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum UniformValue {
    I32(i32),
    F32(f32),
    Vector2f([f32; 2]),
    Vector3f([f32; 3]),
    Vector4f([f32; 4]),
    Matrix4f([[f32; 4]; 4]),
}

impl UniformValue {
    fn rank(&self) -> u8 {
        match *self {
            UniformValue::I32(_) => 0,
            UniformValue::F32(_) => 1,
            UniformValue::Vector2f(_) => 2,
            UniformValue::Vector3f(_) => 3,
            UniformValue::Vector4f(_) => 4,
            UniformValue::Matrix4f(_) => 5,
        }
    }
}

// Floats are ordered with the IEEE-754 total order, so `Eq` and `Ord` hold for every
// value including NaNs and signed zeros.
fn cmp_floats(lhs: &[f32], rhs: &[f32]) -> Ordering {
    lhs.iter()
        .zip(rhs)
        .map(|(a, b)| a.total_cmp(b))
        .find(|v| *v != Ordering::Equal)
        .unwrap_or_else(|| lhs.len().cmp(&rhs.len()))
}

fn cmp_matrices(lhs: &[[f32; 4]; 4], rhs: &[[f32; 4]; 4]) -> Ordering {
    lhs.iter()
        .zip(rhs.iter())
        .map(|(a, b)| cmp_floats(a, b))
        .find(|v| *v != Ordering::Equal)
        .unwrap_or(Ordering::Equal)
}

fn hash_floats<H: Hasher>(v: &[f32], state: &mut H) {
    for f in v {
        f.to_bits().hash(state);
    }
}

impl Ord for UniformValue {
    fn cmp(&self, other: &Self) -> Ordering {
        use self::UniformValue::*;

        match (self, other) {
            (I32(a), I32(b)) => a.cmp(b),
            (F32(a), F32(b)) => a.total_cmp(b),
            (Vector2f(a), Vector2f(b)) => cmp_floats(a, b),
            (Vector3f(a), Vector3f(b)) => cmp_floats(a, b),
            (Vector4f(a), Vector4f(b)) => cmp_floats(a, b),
            (Matrix4f(a), Matrix4f(b)) => cmp_matrices(a, b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for UniformValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for UniformValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for UniformValue {}

impl Hash for UniformValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            UniformValue::I32(v) => v.hash(state),
            UniformValue::F32(v) => v.to_bits().hash(state),
            UniformValue::Vector2f(v) => hash_floats(v, state),
            UniformValue::Vector3f(v) => hash_floats(v, state),
            UniformValue::Vector4f(v) => hash_floats(v, state),
            UniformValue::Matrix4f(v) => v.iter().for_each(|c| hash_floats(c, state)),
        }
    }
}

impl From<i32> for UniformValue {
    fn from(v: i32) -> Self {
        UniformValue::I32(v)
    }
}

impl From<f32> for UniformValue {
    fn from(v: f32) -> Self {
        UniformValue::F32(v)
    }
}

impl From<[f32; 2]> for UniformValue {
    fn from(v: [f32; 2]) -> Self {
        UniformValue::Vector2f(v)
    }
}

impl From<[f32; 3]> for UniformValue {
    fn from(v: [f32; 3]) -> Self {
        UniformValue::Vector3f(v)
    }
}

impl From<[f32; 4]> for UniformValue {
    fn from(v: [f32; 4]) -> Self {
        UniformValue::Vector4f(v)
    }
}

impl From<Matrix4<f32>> for UniformValue {
    fn from(v: Matrix4<f32>) -> Self {
        UniformValue::Matrix4f(v.into())
    }
}

/// Specify whether front- or back-facing polygons can be culled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CullFace {
    Front,
    Back,
    FrontAndBack,
}

/// A pixel-wise comparison function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Comparison {
    Never,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
    Equal,
    NotEqual,
    Always,
}

/// Specifies how incoming RGBA values (source) and the RGBA in framebuffer (destination)
/// are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Equation {
    /// Adds source and destination. Source and destination are multiplied
    /// by blending parameters before addition.
    Add,
    /// Subtracts destination from source. Source and destination are
    /// multiplied by blending parameters before subtraction.
    Subtract,
    /// Subtracts source from destination. Source and destination are
    /// multiplied by blending parameters before subtraction.
    ReverseSubtract,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BlendValue {
    SourceColor,
    SourceAlpha,
    DestinationColor,
    DestinationAlpha,
}

/// Blend factors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BlendFactor {
    Zero,
    One,
    Value(BlendValue),
    OneMinusValue(BlendValue),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Blend {
    pub equation: Equation,
    pub src: BlendFactor,
    pub dst: BlendFactor,
}

impl Blend {
    /// The classic `src * alpha + dst * (1 - alpha)`.
    pub fn alpha() -> Self {
        Blend {
            equation: Equation::Add,
            src: BlendFactor::Value(BlendValue::SourceAlpha),
            dst: BlendFactor::OneMinusValue(BlendValue::SourceAlpha),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StencilOp {
    Keep,
    Zero,
    Replace,
    Increment,
    IncrementWrap,
    Decrement,
    DecrementWrap,
    Invert,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Stencil {
    pub func: Comparison,
    pub reference: i32,
    pub mask: u32,
    pub fail: StencilOp,
    pub depth_fail: StencilOp,
    pub pass: StencilOp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ColorMask {
    pub r: bool,
    pub g: bool,
    pub b: bool,
    pub a: bool,
}

impl ColorMask {
    pub fn all() -> Self {
        ColorMask {
            r: true,
            g: true,
            b: true,
            a: true,
        }
    }

    pub fn none() -> Self {
        ColorMask {
            r: false,
            g: false,
            b: false,
            a: false,
        }
    }
}

/// The fixed-function and per-fragment test state. `None` means the
/// corresponding test is disabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RenderState {
    pub blend: Option<Blend>,
    pub depth_test: Option<Comparison>,
    pub depth_write: bool,
    pub stencil: Option<Stencil>,
    pub cull_face: Option<CullFace>,
    pub color_mask: ColorMask,
}

impl Default for RenderState {
    /// The initial state of a freshly created OpenGL context.
    fn default() -> Self {
        RenderState {
            blend: None,
            depth_test: None,
            depth_write: true,
            stencil: None,
            cull_face: None,
            color_mask: ColorMask::all(),
        }
    }
}

impl RenderState {
    /// Depth tested, depth written and back faces culled.
    pub fn opaque() -> Self {
        RenderState {
            depth_test: Some(Comparison::LessOrEqual),
            depth_write: true,
            cull_face: Some(CullFace::Back),
            ..Default::default()
        }
    }

    /// Alpha blended, depth tested but never written.
    pub fn transparent() -> Self {
        RenderState {
            blend: Some(Blend::alpha()),
            depth_test: Some(Comparison::LessOrEqual),
            depth_write: false,
            ..Default::default()
        }
    }
}

/// The vertex and index data sources of a draw call.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct VertexSource {
    pub vertices: Option<BufferHandle>,
    pub indices: Option<BufferHandle>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Primitive {
    Points,
    Lines,
    LineStrip,
    Triangles,
    TriangleStrip,
}

impl Primitive {
    /// Returns the number of primitives assembled from `indices` vertices.
    pub fn assemble(self, indices: u32) -> u32 {
        match self {
            Primitive::Points => indices,
            Primitive::Lines => indices / 2,
            Primitive::LineStrip => indices.saturating_sub(1),
            Primitive::Triangles => indices / 3,
            Primitive::TriangleStrip => indices.saturating_sub(2),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum IndexFormat {
    U16,
    U32,
}

impl IndexFormat {
    pub fn stride(self) -> usize {
        match self {
            IndexFormat::U16 => 2,
            IndexFormat::U32 => 4,
        }
    }
}

/// The parameters of an array or indexed draw call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DrawParams {
    Arrays {
        primitive: Primitive,
        first: u32,
        count: u32,
    },
    Elements {
        primitive: Primitive,
        format: IndexFormat,
        /// Offset into index buffer, in indices.
        offset: u32,
        count: u32,
    },
}

impl Default for DrawParams {
    fn default() -> Self {
        DrawParams::Arrays {
            primitive: Primitive::Triangles,
            first: 0,
            count: 3,
        }
    }
}

impl DrawParams {
    pub fn primitive(&self) -> Primitive {
        match *self {
            DrawParams::Arrays { primitive, .. } => primitive,
            DrawParams::Elements { primitive, .. } => primitive,
        }
    }

    pub fn count(&self) -> u32 {
        match *self {
            DrawParams::Arrays { count, .. } => count,
            DrawParams::Elements { count, .. } => count,
        }
    }
}

/// Whether an entry writes its color over the framebuffer, or blends with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OpacityClass {
    Opaque,
    Blended,
}

/// A `Snapshot` is the complete graphics state of one renderable unit at draw
/// time. It is a plain value: two snapshots are equal iff every field is, and the
/// ordering is a total order over all fields (floats by their IEEE-754 total order).
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    /// The world matrix of renderable, column major.
    ///
    /// This is not a piece of pipeline state, the state cache never looks at it.
    /// It reaches the program only through the model uniform of `Renderable`.
    pub transform: [[f32; 4]; 4],
    pub program: Option<ProgramHandle>,
    pub vertices: VertexSource,
    pub state: RenderState,
    uniforms: SmallVec<[(HashValue<str>, UniformValue); 4]>,
    textures: SmallVec<[Option<TextureHandle>; 4]>,
}

impl Default for Snapshot {
    fn default() -> Self {
        Snapshot {
            transform: IDENTITY,
            program: None,
            vertices: VertexSource::default(),
            state: RenderState::default(),
            uniforms: SmallVec::new(),
            textures: SmallVec::new(),
        }
    }
}

/// The serialized form of `Snapshot`. Uniforms and textures are normalized again
/// when it is read back, so hand-written or foreign input keeps the lookup order.
#[derive(Deserialize)]
#[serde(rename = "Snapshot")]
struct SnapshotData {
    transform: [[f32; 4]; 4],
    program: Option<ProgramHandle>,
    vertices: VertexSource,
    state: RenderState,
    uniforms: Vec<(HashValue<str>, UniformValue)>,
    textures: Vec<Option<TextureHandle>>,
}

impl<'de> Deserialize<'de> for Snapshot {
    fn deserialize<D>(deserializer: D) -> ::std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let data = SnapshotData::deserialize(deserializer)?;

        let mut snapshot = Snapshot {
            transform: data.transform,
            program: data.program,
            vertices: data.vertices,
            state: data.state,
            ..Default::default()
        };

        // Later assignments of the same field win, as with `set_uniform`.
        for (field, value) in data.uniforms {
            snapshot.set_uniform(field, value);
        }

        for (unit, texture) in data.textures.into_iter().enumerate() {
            snapshot.set_texture(unit, texture);
        }

        Ok(snapshot)
    }
}

const IDENTITY: [[f32; 4]; 4] = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
    [0.0, 0.0, 0.0, 1.0],
];

impl Snapshot {
    pub fn new() -> Self {
        Default::default()
    }

    #[inline]
    pub fn with_program<T: Into<Option<ProgramHandle>>>(mut self, program: T) -> Self {
        self.program = program.into();
        self
    }

    #[inline]
    pub fn with_state(mut self, state: RenderState) -> Self {
        self.state = state;
        self
    }

    #[inline]
    pub fn with_vertices(mut self, vertices: VertexSource) -> Self {
        self.vertices = vertices;
        self
    }

    #[inline]
    pub fn with_uniform<F, V>(mut self, field: F, value: V) -> Self
    where
        F: Into<HashValue<str>>,
        V: Into<UniformValue>,
    {
        self.set_uniform(field, value);
        self
    }

    #[inline]
    pub fn with_texture<T: Into<Option<TextureHandle>>>(mut self, unit: usize, texture: T) -> Self {
        self.set_texture(unit, texture);
        self
    }

    /// Binds the named field with `UniformValue`. Uniforms are kept sorted by their
    /// field, so the order of assignments never affects equality.
    pub fn set_uniform<F, V>(&mut self, field: F, value: V)
    where
        F: Into<HashValue<str>>,
        V: Into<UniformValue>,
    {
        let field = field.into();
        let value = value.into();

        match self.uniforms.binary_search_by(|v| v.0.cmp(&field)) {
            Ok(i) => self.uniforms[i].1 = value,
            Err(i) => self.uniforms.insert(i, (field, value)),
        }
    }

    /// Binds a texture to sampler unit. Units that are never assigned are left
    /// as they are when this snapshot is applied.
    pub fn set_texture<T: Into<Option<TextureHandle>>>(&mut self, unit: usize, texture: T) {
        if self.textures.len() <= unit {
            self.textures.resize(unit + 1, None);
        }

        self.textures[unit] = texture.into();
        while let Some(None) = self.textures.last() {
            self.textures.pop();
        }
    }

    /// Sets the world matrix. It is only visible to the program when the owning
    /// `Renderable` names a model uniform.
    #[inline]
    pub fn set_transform<T: Into<[[f32; 4]; 4]>>(&mut self, transform: T) {
        self.transform = transform.into();
    }

    #[inline]
    pub fn uniforms(&self) -> &[(HashValue<str>, UniformValue)] {
        &self.uniforms
    }

    #[inline]
    pub fn uniform<F: Into<HashValue<str>>>(&self, field: F) -> Option<UniformValue> {
        let field = field.into();
        self.uniforms
            .binary_search_by(|v| v.0.cmp(&field))
            .ok()
            .map(|i| self.uniforms[i].1)
    }

    #[inline]
    pub fn textures(&self) -> &[Option<TextureHandle>] {
        &self.textures
    }

    #[inline]
    pub fn opacity(&self) -> OpacityClass {
        if self.state.blend.is_some() {
            OpacityClass::Blended
        } else {
            OpacityClass::Opaque
        }
    }

    /// Compares the pipeline state in the order the state cache applies it, and
    /// ignores the world transform. Entries that are equal under this ordering
    /// could be drawn back to back without a single state change.
    pub fn state_cmp(&self, other: &Snapshot) -> Ordering {
        self.program
            .cmp(&other.program)
            .then_with(|| self.textures.as_slice().cmp(other.textures.as_slice()))
            .then_with(|| self.vertices.cmp(&other.vertices))
            .then_with(|| self.state.cmp(&other.state))
            .then_with(|| self.uniforms.as_slice().cmp(other.uniforms.as_slice()))
    }
}

impl Ord for Snapshot {
    fn cmp(&self, other: &Self) -> Ordering {
        self.state_cmp(other)
            .then_with(|| cmp_matrices(&self.transform, &other.transform))
    }
}

impl PartialOrd for Snapshot {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Snapshot {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Snapshot {}

impl Hash for Snapshot {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.transform.iter().for_each(|c| hash_floats(c, state));
        self.program.hash(state);
        self.vertices.hash(state);
        self.state.hash(state);
        self.uniforms.as_slice().hash(state);
        self.textures.as_slice().hash(state);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::utils::handle::Handle;

    #[test]
    fn uniforms_are_order_independent() {
        let a = Snapshot::new()
            .with_uniform("u_Color", [1.0f32, 0.0, 0.0, 1.0])
            .with_uniform("u_Time", 0.5f32);

        let b = Snapshot::new()
            .with_uniform("u_Time", 0.5f32)
            .with_uniform("u_Color", [1.0f32, 0.0, 0.0, 1.0]);

        assert_eq!(a, b);
        assert_eq!(a.uniforms().len(), 2);
        assert_eq!(a.uniform("u_Time"), Some(UniformValue::F32(0.5)));
        assert_eq!(a.uniform("u_Missing"), None);
    }

    #[test]
    fn deserialize_unsorted_uniforms() {
        let texture = TextureHandle::from(Handle::new(1, 1));
        let snapshot = Snapshot::new()
            .with_uniform("u_A", 1i32)
            .with_uniform("u_B", 2i32)
            .with_texture(0, texture);

        let mut value = serde_json::to_value(&snapshot).unwrap();
        value["uniforms"].as_array_mut().unwrap().reverse();
        value["textures"]
            .as_array_mut()
            .unwrap()
            .push(serde_json::Value::Null);

        let v: Snapshot = serde_json::from_value(value).unwrap();
        assert_eq!(v, snapshot);
        assert_eq!(v.uniform("u_A"), Some(UniformValue::I32(1)));
        assert_eq!(v.uniform("u_B"), Some(UniformValue::I32(2)));
        assert_eq!(v.textures().len(), 1);
    }

    #[test]
    fn float_total_order() {
        assert_ne!(UniformValue::F32(0.0), UniformValue::F32(-0.0));
        assert_eq!(UniformValue::F32(::std::f32::NAN), UniformValue::F32(::std::f32::NAN));
        assert!(UniformValue::F32(1.0) < UniformValue::F32(2.0));
        assert!(UniformValue::I32(100) < UniformValue::F32(-100.0));
    }

    #[test]
    fn trailing_empty_texture_units() {
        let texture = TextureHandle::from(Handle::new(1, 1));

        let mut a = Snapshot::new().with_texture(0, texture);
        a.set_texture(3, None::<TextureHandle>);
        assert_eq!(a.textures().len(), 1);
        assert_eq!(a, Snapshot::new().with_texture(0, texture));

        let b = Snapshot::new().with_texture(2, texture);
        assert_eq!(b.textures(), &[None, None, Some(texture)]);
    }

    #[test]
    fn state_order() {
        let p1 = ProgramHandle::from(Handle::new(1, 1));
        let p2 = ProgramHandle::from(Handle::new(2, 1));

        let mut a = Snapshot::new().with_program(p1);
        let b = Snapshot::new().with_program(p2);
        assert_eq!(a.state_cmp(&b), Ordering::Less);

        a.set_transform(Matrix4::from_scale(2.0));
        let c = Snapshot::new().with_program(p1);
        assert_eq!(a.state_cmp(&c), Ordering::Equal);
        assert_ne!(a, c);
    }

    #[test]
    fn opacity() {
        let opaque = Snapshot::new().with_state(RenderState::opaque());
        let blended = Snapshot::new().with_state(RenderState::transparent());
        assert_eq!(opaque.opacity(), OpacityClass::Opaque);
        assert_eq!(blended.opacity(), OpacityClass::Blended);
        assert!(OpacityClass::Opaque < OpacityClass::Blended);
    }

    #[test]
    fn assemble() {
        assert_eq!(Primitive::Triangles.assemble(6), 2);
        assert_eq!(Primitive::TriangleStrip.assemble(6), 4);
        assert_eq!(Primitive::LineStrip.assemble(0), 0);
    }
}
