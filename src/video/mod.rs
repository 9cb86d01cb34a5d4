//! The native side of renderer: state snapshots and the bindings that turn them
//! into OpenGL-family calls.

pub mod backends;
pub mod snapshot;

pub mod prelude {
    pub use super::backends::call::{CallTrace, NativeCall};
    pub use super::backends::headless::HeadlessVisitor;
    pub use super::backends::{Capability, Extension, NativeError, Visitor};
    pub use super::snapshot::{
        Blend, BlendFactor, BlendValue, BufferHandle, ColorMask, Comparison, CullFace,
        DrawParams, Equation, IndexFormat, OpacityClass, Primitive, ProgramHandle, RenderState,
        Snapshot, Stencil, StencilOp, TextureHandle, UniformValue, VertexSource,
    };
}
