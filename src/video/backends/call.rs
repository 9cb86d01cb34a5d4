//! A native call as a plain value, so it could be queued, compared and persisted.

use std::slice::Iter;

use crate::errors::*;
use crate::utils::hash_value::HashValue;
use crate::video::snapshot::*;

use super::{Capability, Visitor};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum NativeCall {
    BindProgram(Option<ProgramHandle>),
    SetUniform(HashValue<str>, UniformValue),
    ActiveTexture(u32),
    BindTexture(Option<TextureHandle>),
    BindVertexBuffer(Option<BufferHandle>),
    BindIndexBuffer(Option<BufferHandle>),
    Enable(Capability),
    Disable(Capability),
    BlendEquation(Equation),
    BlendFunc(BlendFactor, BlendFactor),
    DepthFunc(Comparison),
    DepthMask(bool),
    StencilFunc(Comparison, i32, u32),
    StencilOp(StencilOp, StencilOp, StencilOp),
    CullFace(CullFace),
    ColorMask(ColorMask),
    DrawArrays(Primitive, u32, u32),
    DrawElements(Primitive, IndexFormat, u32, u32),
}

impl NativeCall {
    /// Forwards this call to the binding.
    pub fn dispatch(&self, visitor: &mut dyn Visitor) {
        match *self {
            NativeCall::BindProgram(v) => visitor.bind_program(v),
            NativeCall::SetUniform(field, ref value) => visitor.set_uniform(field, value),
            NativeCall::ActiveTexture(unit) => visitor.active_texture(unit),
            NativeCall::BindTexture(v) => visitor.bind_texture(v),
            NativeCall::BindVertexBuffer(v) => visitor.bind_vertex_buffer(v),
            NativeCall::BindIndexBuffer(v) => visitor.bind_index_buffer(v),
            NativeCall::Enable(v) => visitor.enable(v),
            NativeCall::Disable(v) => visitor.disable(v),
            NativeCall::BlendEquation(v) => visitor.blend_equation(v),
            NativeCall::BlendFunc(src, dst) => visitor.blend_func(src, dst),
            NativeCall::DepthFunc(v) => visitor.depth_func(v),
            NativeCall::DepthMask(v) => visitor.depth_mask(v),
            NativeCall::StencilFunc(func, reference, mask) => {
                visitor.stencil_func(func, reference, mask)
            }
            NativeCall::StencilOp(fail, depth_fail, pass) => {
                visitor.stencil_op(fail, depth_fail, pass)
            }
            NativeCall::CullFace(v) => visitor.cull_face(v),
            NativeCall::ColorMask(v) => visitor.color_mask(v),
            NativeCall::DrawArrays(primitive, first, count) => {
                visitor.draw_arrays(primitive, first, count)
            }
            NativeCall::DrawElements(primitive, format, offset, count) => {
                visitor.draw_elements(primitive, format, offset, count)
            }
        }
    }

    #[inline]
    pub fn is_draw(&self) -> bool {
        match *self {
            NativeCall::DrawArrays(..) | NativeCall::DrawElements(..) => true,
            _ => false,
        }
    }

    /// The call that issues the draw described by `params`.
    pub fn draw(params: DrawParams) -> Self {
        match params {
            DrawParams::Arrays {
                primitive,
                first,
                count,
            } => NativeCall::DrawArrays(primitive, first, count),
            DrawParams::Elements {
                primitive,
                format,
                offset,
                count,
            } => NativeCall::DrawElements(primitive, format, offset, count),
        }
    }
}

/// An ordered record of native calls. Two bindings that received the same calls
/// produce byte-identical traces.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallTrace {
    calls: Vec<NativeCall>,
}

impl CallTrace {
    pub fn new() -> Self {
        Default::default()
    }

    #[inline]
    pub fn push(&mut self, call: NativeCall) {
        self.calls.push(call);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.calls.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    #[inline]
    pub fn iter(&self) -> Iter<NativeCall> {
        self.calls.iter()
    }

    #[inline]
    pub fn as_slice(&self) -> &[NativeCall] {
        &self.calls
    }

    /// Counts the calls that satisfy the predicate.
    pub fn count<F: Fn(&NativeCall) -> bool>(&self, func: F) -> usize {
        self.calls.iter().filter(|v| func(v)).count()
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }

    /// Replays the whole trace into another binding.
    pub fn replay(&self, visitor: &mut dyn Visitor) {
        for v in &self.calls {
            v.dispatch(visitor);
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(bincode::deserialize(bytes)?)
    }
}

impl<'a> IntoIterator for &'a CallTrace {
    type Item = &'a NativeCall;
    type IntoIter = Iter<'a, NativeCall>;

    fn into_iter(self) -> Self::IntoIter {
        self.calls.iter()
    }
}

impl From<Vec<NativeCall>> for CallTrace {
    fn from(calls: Vec<NativeCall>) -> Self {
        CallTrace { calls }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::video::backends::headless::HeadlessVisitor;

    #[test]
    fn dispatch() {
        let calls = vec![
            NativeCall::Enable(Capability::DepthTest),
            NativeCall::DepthFunc(Comparison::Less),
            NativeCall::SetUniform("u_Time".into(), UniformValue::F32(1.0)),
            NativeCall::DrawArrays(Primitive::Triangles, 0, 3),
        ];

        let mut visitor = HeadlessVisitor::new();
        let trace = CallTrace::from(calls.clone());
        trace.replay(&mut visitor);

        assert_eq!(visitor.trace().as_slice(), calls.as_slice());
        assert_eq!(trace.count(NativeCall::is_draw), 1);
    }

    #[test]
    fn persist() {
        let trace = CallTrace::from(vec![
            NativeCall::BlendFunc(
                BlendFactor::Value(BlendValue::SourceAlpha),
                BlendFactor::OneMinusValue(BlendValue::SourceAlpha),
            ),
            NativeCall::DrawElements(Primitive::Triangles, IndexFormat::U16, 0, 6),
        ]);

        let json = trace.to_json().unwrap();
        assert_eq!(CallTrace::from_json(&json).unwrap(), trace);

        let bytes = trace.to_bytes().unwrap();
        assert_eq!(CallTrace::from_bytes(&bytes).unwrap(), trace);
        assert_eq!(bytes, CallTrace::from_json(&json).unwrap().to_bytes().unwrap());

        assert!(CallTrace::from_json("{").is_err());
    }
}
