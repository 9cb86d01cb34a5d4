//! The backend of renderer, which should be responsible for only one thing:
//! submitting state changes and draw-calls using low-level OpenGL video APIs.

pub mod call;
pub mod headless;

#[cfg(feature = "gl")]
pub mod gl;

use std::fmt;

use crate::utils::hash_value::HashValue;

use super::snapshot::*;

/// The toggles controlled with `glEnable`/`glDisable`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capability {
    Blend,
    DepthTest,
    StencilTest,
    CullFace,
}

/// Optional features of a binding. Nothing in renderer depends on them, they are
/// probed for diagnostics only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Extension {
    VertexArrayObject,
    DebugOutput,
    Robustness,
    AnisotropicFiltering,
}

/// Errors reported by the native error query, after a call has been issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NativeError {
    InvalidEnum,
    InvalidValue,
    InvalidOperation,
    InvalidFramebufferOperation,
    OutOfMemory,
    ContextLost,
    Unknown(u32),
}

impl fmt::Display for NativeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            NativeError::InvalidEnum => write!(f, "invalid enum"),
            NativeError::InvalidValue => write!(f, "invalid value"),
            NativeError::InvalidOperation => write!(f, "invalid operation"),
            NativeError::InvalidFramebufferOperation => write!(f, "invalid framebuffer operation"),
            NativeError::OutOfMemory => write!(f, "out of memory"),
            NativeError::ContextLost => write!(f, "context lost"),
            NativeError::Unknown(code) => write!(f, "unknown error {:#x}", code),
        }
    }
}

/// The narrow set of native calls renderer ever makes. Every method maps onto
/// exactly one OpenGL-family call and reports nothing; failures are observed through
/// `last_error` afterwards.
pub trait Visitor {
    /// Binds a shader program, or unbinds with `None`.
    fn bind_program(&mut self, program: Option<ProgramHandle>);

    /// Updates the uniform of the currently bound program.
    fn set_uniform(&mut self, field: HashValue<str>, value: &UniformValue);

    /// Selects the texture unit that `bind_texture` targets.
    fn active_texture(&mut self, unit: u32);

    fn bind_texture(&mut self, texture: Option<TextureHandle>);

    fn bind_vertex_buffer(&mut self, buffer: Option<BufferHandle>);

    fn bind_index_buffer(&mut self, buffer: Option<BufferHandle>);

    fn enable(&mut self, capability: Capability);

    fn disable(&mut self, capability: Capability);

    fn blend_equation(&mut self, equation: Equation);

    fn blend_func(&mut self, src: BlendFactor, dst: BlendFactor);

    fn depth_func(&mut self, func: Comparison);

    fn depth_mask(&mut self, write: bool);

    fn stencil_func(&mut self, func: Comparison, reference: i32, mask: u32);

    fn stencil_op(&mut self, fail: StencilOp, depth_fail: StencilOp, pass: StencilOp);

    fn cull_face(&mut self, face: CullFace);

    fn color_mask(&mut self, mask: ColorMask);

    fn draw_arrays(&mut self, primitive: Primitive, first: u32, count: u32);

    fn draw_elements(&mut self, primitive: Primitive, format: IndexFormat, offset: u32, count: u32);

    /// Returns and clears the first error raised since last query.
    fn last_error(&mut self) -> Option<NativeError>;

    /// Probes an optional feature of this binding.
    fn supports(&self, _: Extension) -> bool {
        false
    }
}
