//! The state cache keeps track of what has been applied to the native context, and
//! turns a `Snapshot` into the minimal list of native calls that reach it.
//!
//! Axes are always applied in the same order:
//!
//! 1. program, binding a different program forgets every uniform;
//! 2. uniforms of the bound program;
//! 3. texture units, each selected with `active_texture` before binding;
//! 4. vertex buffer, then index buffer;
//! 5. blend, depth test, depth write, stencil, cull face and color mask.
//!
//! Texture units and uniforms that a snapshot does not list are left untouched.

use smallvec::SmallVec;

use crate::errors::*;
use crate::utils::hash::FastHashMap;
use crate::utils::hash_value::HashValue;
use crate::video::backends::call::NativeCall;
use crate::video::backends::{Capability, Visitor};
use crate::video::snapshot::*;

/// An orthogonal piece of native state that the cache tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StateAxis {
    Program,
    Uniform,
    Texture(u32),
    VertexBuffer,
    IndexBuffer,
    Blend,
    DepthTest,
    DepthWrite,
    Stencil,
    CullFace,
    ColorMask,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Native calls that were issued.
    pub issued: usize,
    /// Native calls that were skipped since the state was already in effect.
    pub suppressed: usize,
    pub resets: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Entry<T> {
    Unknown,
    Known(T),
}

impl<T: PartialEq> Entry<T> {
    #[inline]
    fn is(&self, v: &T) -> bool {
        match self {
            Entry::Known(ref current) => current == v,
            Entry::Unknown => false,
        }
    }
}

type StencilFunc = (Comparison, i32, u32);
type StencilOps = (StencilOp, StencilOp, StencilOp);

/// The belief of currently applied native state.
#[derive(Debug, Clone)]
pub struct StateCache {
    program: Entry<Option<ProgramHandle>>,
    uniforms: FastHashMap<HashValue<str>, UniformValue>,
    active_unit: Entry<u32>,
    textures: SmallVec<[Entry<Option<TextureHandle>>; 8]>,
    vertex_buffer: Entry<Option<BufferHandle>>,
    index_buffer: Entry<Option<BufferHandle>>,
    blend: Entry<bool>,
    blend_equation: Entry<Equation>,
    blend_func: Entry<(BlendFactor, BlendFactor)>,
    depth_test: Entry<bool>,
    depth_func: Entry<Comparison>,
    depth_write: Entry<bool>,
    stencil: Entry<bool>,
    stencil_func: Entry<StencilFunc>,
    stencil_op: Entry<StencilOps>,
    cull: Entry<bool>,
    cull_face: Entry<CullFace>,
    color_mask: Entry<ColorMask>,
    max_texture_units: usize,
    stats: CacheStats,
}

struct Delta<'a> {
    visitor: &'a mut dyn Visitor,
    calls: SmallVec<[NativeCall; 8]>,
    suppressed: usize,
}

impl<'a> Delta<'a> {
    #[inline]
    fn issue(&mut self, call: NativeCall) {
        call.dispatch(&mut *self.visitor);
        self.calls.push(call);
    }

    /// Records `value` into `entry`, returns true if the native call is required.
    #[inline]
    fn update<T: PartialEq>(&mut self, entry: &mut Entry<T>, value: T) -> bool {
        if entry.is(&value) {
            self.suppressed += 1;
            false
        } else {
            *entry = Entry::Known(value);
            true
        }
    }

    fn toggle(&mut self, entry: &mut Entry<bool>, capability: Capability, enable: bool) {
        if self.update(entry, enable) {
            if enable {
                self.issue(NativeCall::Enable(capability));
            } else {
                self.issue(NativeCall::Disable(capability));
            }
        }
    }
}

impl StateCache {
    /// Creates a cache that knows nothing about the native context.
    pub fn new(max_texture_units: usize) -> Self {
        StateCache {
            program: Entry::Unknown,
            uniforms: FastHashMap::default(),
            active_unit: Entry::Unknown,
            textures: SmallVec::new(),
            vertex_buffer: Entry::Unknown,
            index_buffer: Entry::Unknown,
            blend: Entry::Unknown,
            blend_equation: Entry::Unknown,
            blend_func: Entry::Unknown,
            depth_test: Entry::Unknown,
            depth_func: Entry::Unknown,
            depth_write: Entry::Unknown,
            stencil: Entry::Unknown,
            stencil_func: Entry::Unknown,
            stencil_op: Entry::Unknown,
            cull: Entry::Unknown,
            cull_face: Entry::Unknown,
            color_mask: Entry::Unknown,
            max_texture_units,
            stats: CacheStats::default(),
        }
    }

    #[inline]
    pub fn max_texture_units(&self) -> usize {
        self.max_texture_units
    }

    #[inline]
    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Forgets everything about the native context. The next `apply` issues a call for
    /// every axis of its snapshot.
    pub fn reset(&mut self) {
        let mut stats = self.stats;
        stats.resets += 1;

        *self = StateCache::new(self.max_texture_units);
        self.stats = stats;
    }

    /// Forgets the applied program without touching the native context, so the next
    /// `verify` reports a desync.
    #[cfg(test)]
    pub(crate) fn corrupt(&mut self) {
        self.program = Entry::Unknown;
    }

    /// Issues the native calls that are required to reach `snapshot`, and returns them in
    /// the order they were issued.
    pub fn apply(
        &mut self,
        visitor: &mut dyn Visitor,
        snapshot: &Snapshot,
    ) -> Result<SmallVec<[NativeCall; 8]>> {
        let units = snapshot.textures().len();
        if units > self.max_texture_units {
            return Err(Error::TooManyTextureUnits(units, self.max_texture_units));
        }

        let mut delta = Delta {
            visitor,
            calls: SmallVec::new(),
            suppressed: 0,
        };

        if delta.update(&mut self.program, snapshot.program) {
            delta.issue(NativeCall::BindProgram(snapshot.program));
            self.uniforms.clear();
        }

        // Uniforms make no sense without a program.
        if snapshot.program.is_some() {
            for &(field, value) in snapshot.uniforms() {
                if self.uniforms.get(&field) == Some(&value) {
                    delta.suppressed += 1;
                } else {
                    self.uniforms.insert(field, value);
                    delta.issue(NativeCall::SetUniform(field, value));
                }
            }
        }

        if self.textures.len() < units {
            self.textures.resize(units, Entry::Unknown);
        }

        for (unit, &texture) in snapshot.textures().iter().enumerate() {
            if delta.update(&mut self.textures[unit], texture) {
                let unit = unit as u32;
                if delta.update(&mut self.active_unit, unit) {
                    delta.issue(NativeCall::ActiveTexture(unit));
                }

                delta.issue(NativeCall::BindTexture(texture));
            }
        }

        let vs = snapshot.vertices;
        if delta.update(&mut self.vertex_buffer, vs.vertices) {
            delta.issue(NativeCall::BindVertexBuffer(vs.vertices));
        }

        if delta.update(&mut self.index_buffer, vs.indices) {
            delta.issue(NativeCall::BindIndexBuffer(vs.indices));
        }

        let state = &snapshot.state;
        delta.toggle(&mut self.blend, Capability::Blend, state.blend.is_some());
        if let Some(blend) = state.blend {
            if delta.update(&mut self.blend_equation, blend.equation) {
                delta.issue(NativeCall::BlendEquation(blend.equation));
            }

            if delta.update(&mut self.blend_func, (blend.src, blend.dst)) {
                delta.issue(NativeCall::BlendFunc(blend.src, blend.dst));
            }
        }

        delta.toggle(
            &mut self.depth_test,
            Capability::DepthTest,
            state.depth_test.is_some(),
        );

        if let Some(func) = state.depth_test {
            if delta.update(&mut self.depth_func, func) {
                delta.issue(NativeCall::DepthFunc(func));
            }
        }

        if delta.update(&mut self.depth_write, state.depth_write) {
            delta.issue(NativeCall::DepthMask(state.depth_write));
        }

        delta.toggle(
            &mut self.stencil,
            Capability::StencilTest,
            state.stencil.is_some(),
        );

        if let Some(s) = state.stencil {
            if delta.update(&mut self.stencil_func, (s.func, s.reference, s.mask)) {
                delta.issue(NativeCall::StencilFunc(s.func, s.reference, s.mask));
            }

            if delta.update(&mut self.stencil_op, (s.fail, s.depth_fail, s.pass)) {
                delta.issue(NativeCall::StencilOp(s.fail, s.depth_fail, s.pass));
            }
        }

        delta.toggle(&mut self.cull, Capability::CullFace, state.cull_face.is_some());
        if let Some(face) = state.cull_face {
            if delta.update(&mut self.cull_face, face) {
                delta.issue(NativeCall::CullFace(face));
            }
        }

        if delta.update(&mut self.color_mask, state.color_mask) {
            delta.issue(NativeCall::ColorMask(state.color_mask));
        }

        self.stats.issued += delta.calls.len();
        self.stats.suppressed += delta.suppressed;
        Ok(delta.calls)
    }

    /// Checks that every axis of `snapshot` is what the cache believes to be applied.
    pub fn verify(&self, snapshot: &Snapshot) -> Result<()> {
        check(self.program.is(&snapshot.program), StateAxis::Program)?;

        if snapshot.program.is_some() {
            let uniforms = snapshot
                .uniforms()
                .iter()
                .all(|&(field, ref value)| self.uniforms.get(&field) == Some(value));
            check(uniforms, StateAxis::Uniform)?;
        }

        for (unit, texture) in snapshot.textures().iter().enumerate() {
            let applied = self.textures.get(unit).map(|v| v.is(texture));
            check(applied == Some(true), StateAxis::Texture(unit as u32))?;
        }

        let vs = snapshot.vertices;
        check(self.vertex_buffer.is(&vs.vertices), StateAxis::VertexBuffer)?;
        check(self.index_buffer.is(&vs.indices), StateAxis::IndexBuffer)?;

        let state = &snapshot.state;
        let blend = match state.blend {
            Some(b) => {
                self.blend.is(&true)
                    && self.blend_equation.is(&b.equation)
                    && self.blend_func.is(&(b.src, b.dst))
            }
            None => self.blend.is(&false),
        };
        check(blend, StateAxis::Blend)?;

        let depth_test = match state.depth_test {
            Some(func) => self.depth_test.is(&true) && self.depth_func.is(&func),
            None => self.depth_test.is(&false),
        };
        check(depth_test, StateAxis::DepthTest)?;
        check(self.depth_write.is(&state.depth_write), StateAxis::DepthWrite)?;

        let stencil = match state.stencil {
            Some(s) => {
                self.stencil.is(&true)
                    && self.stencil_func.is(&(s.func, s.reference, s.mask))
                    && self.stencil_op.is(&(s.fail, s.depth_fail, s.pass))
            }
            None => self.stencil.is(&false),
        };
        check(stencil, StateAxis::Stencil)?;

        let cull = match state.cull_face {
            Some(face) => self.cull.is(&true) && self.cull_face.is(&face),
            None => self.cull.is(&false),
        };
        check(cull, StateAxis::CullFace)?;
        check(self.color_mask.is(&state.color_mask), StateAxis::ColorMask)
    }
}

#[inline]
fn check(applied: bool, axis: StateAxis) -> Result<()> {
    if applied {
        Ok(())
    } else {
        Err(Error::StateCacheDesync(axis))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::utils::handle::Handle;
    use crate::video::backends::headless::HeadlessVisitor;

    fn program(i: u32) -> ProgramHandle {
        Handle::new(i, 1).into()
    }

    fn texture(i: u32) -> TextureHandle {
        Handle::new(i, 1).into()
    }

    fn base() -> Snapshot {
        Snapshot::new()
            .with_program(program(1))
            .with_state(RenderState::opaque())
            .with_uniform("u_Color", [1.0f32, 1.0, 1.0, 1.0])
            .with_texture(0, texture(1))
    }

    #[test]
    fn idempotent() {
        let mut visitor = HeadlessVisitor::new();
        let mut cache = StateCache::new(8);

        let first = cache.apply(&mut visitor, &base()).unwrap();
        assert!(!first.is_empty());
        assert_eq!(visitor.trace().as_slice(), first.as_slice());

        let second = cache.apply(&mut visitor, &base()).unwrap();
        assert!(second.is_empty());
        assert_eq!(visitor.len(), first.len());
        assert_eq!(cache.stats().issued, first.len());
    }

    #[test]
    fn single_axis() {
        let mut visitor = HeadlessVisitor::new();
        let mut cache = StateCache::new(8);
        cache.apply(&mut visitor, &base()).unwrap();

        let mut s = base();
        s.state.depth_write = false;
        let calls = cache.apply(&mut visitor, &s).unwrap();
        assert_eq!(calls.as_slice(), &[NativeCall::DepthMask(false)]);

        s.state.cull_face = Some(CullFace::Front);
        let calls = cache.apply(&mut visitor, &s).unwrap();
        assert_eq!(calls.as_slice(), &[NativeCall::CullFace(CullFace::Front)]);

        s.state.cull_face = None;
        let calls = cache.apply(&mut visitor, &s).unwrap();
        assert_eq!(calls.as_slice(), &[NativeCall::Disable(Capability::CullFace)]);

        // Re-enabling remembers the face that is still in effect.
        s.state.cull_face = Some(CullFace::Front);
        let calls = cache.apply(&mut visitor, &s).unwrap();
        assert_eq!(calls.as_slice(), &[NativeCall::Enable(Capability::CullFace)]);

        s.set_uniform("u_Color", [0.0f32, 0.0, 0.0, 1.0]);
        let calls = cache.apply(&mut visitor, &s).unwrap();
        assert_eq!(calls.len(), 1);
        match calls[0] {
            NativeCall::SetUniform(..) => {}
            _ => panic!("expected a uniform update, got {:?}", calls[0]),
        }
    }

    #[test]
    fn texture_units() {
        let mut visitor = HeadlessVisitor::new();
        let mut cache = StateCache::new(2);

        let s = Snapshot::new().with_texture(1, texture(2));
        let calls = cache.apply(&mut visitor, &s).unwrap();
        assert!(calls.contains(&NativeCall::ActiveTexture(1)));
        assert!(calls.contains(&NativeCall::BindTexture(Some(texture(2)))));
        assert!(calls.contains(&NativeCall::BindTexture(None)));

        let s = Snapshot::new().with_texture(0, texture(3)).with_texture(1, texture(2));
        let calls = cache.apply(&mut visitor, &s).unwrap();
        assert_eq!(
            calls.as_slice(),
            &[
                NativeCall::ActiveTexture(0),
                NativeCall::BindTexture(Some(texture(3))),
            ]
        );

        let s = Snapshot::new().with_texture(2, texture(2));
        match cache.apply(&mut visitor, &s) {
            Err(Error::TooManyTextureUnits(3, 2)) => {}
            v => panic!("unexpected {:?}", v),
        }
    }

    #[test]
    fn program_forgets_uniforms() {
        let mut visitor = HeadlessVisitor::new();
        let mut cache = StateCache::new(8);
        cache.apply(&mut visitor, &base()).unwrap();

        let other = base().with_program(program(2));
        let calls = cache.apply(&mut visitor, &other).unwrap();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0], NativeCall::BindProgram(Some(program(2))));

        // Unbound program never receives uniforms.
        let none = base().with_program(None::<ProgramHandle>);
        let calls = cache.apply(&mut visitor, &none).unwrap();
        assert_eq!(calls.as_slice(), &[NativeCall::BindProgram(None)]);
    }

    #[test]
    fn reset() {
        let mut visitor = HeadlessVisitor::new();
        let mut cache = StateCache::new(8);

        let first = cache.apply(&mut visitor, &base()).unwrap();
        cache.reset();

        let again = cache.apply(&mut visitor, &base()).unwrap();
        assert_eq!(first, again);
        assert_eq!(cache.stats().resets, 1);
    }

    #[test]
    fn verify() {
        let mut visitor = HeadlessVisitor::new();
        let mut cache = StateCache::new(8);

        assert_eq!(
            cache.verify(&base()),
            Err(Error::StateCacheDesync(StateAxis::Program))
        );

        cache.apply(&mut visitor, &base()).unwrap();
        assert_eq!(cache.verify(&base()), Ok(()));

        cache.depth_write = Entry::Known(false);
        assert_eq!(
            cache.verify(&base()),
            Err(Error::StateCacheDesync(StateAxis::DepthWrite))
        );

        cache.textures[0] = Entry::Unknown;
        assert_eq!(
            cache.verify(&base()),
            Err(Error::StateCacheDesync(StateAxis::Texture(0)))
        );
    }
}
