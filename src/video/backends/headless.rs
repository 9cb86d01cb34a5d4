use std::sync::{Arc, Mutex};

use crate::utils::hash::FastHashSet;
use crate::utils::hash_value::HashValue;
use crate::video::snapshot::*;

use super::call::{CallTrace, NativeCall};
use super::{Capability, Extension, NativeError, Visitor};

#[derive(Debug, Default)]
struct Recording {
    trace: CallTrace,
    draws: usize,
    faults: Vec<(usize, NativeError)>,
    error: Option<NativeError>,
    extensions: FastHashSet<Extension>,
}

impl Recording {
    fn push(&mut self, call: NativeCall) {
        if call.is_draw() {
            let nth = self.draws;
            self.draws += 1;

            if let Some(i) = self.faults.iter().position(|v| v.0 == nth) {
                let (_, err) = self.faults.remove(i);
                self.raise(err);
            }
        }

        self.trace.push(call);
    }

    fn raise(&mut self, err: NativeError) {
        // Like `glGetError`, only the first error is kept until it is queried.
        if self.error.is_none() {
            self.error = Some(err);
        }
    }
}

/// A binding that touches no GPU at all. It records every call it receives into a
/// `CallTrace`, and could be scripted to raise native errors.
///
/// Clones share the same recording, so a test could keep one handle while the
/// renderer owns another.
#[derive(Debug, Default, Clone)]
pub struct HeadlessVisitor {
    recording: Arc<Mutex<Recording>>,
}

impl HeadlessVisitor {
    pub fn new() -> Self {
        Default::default()
    }

    /// Raises `err` right after the `nth` (zero based, counted since creation) draw
    /// call has been issued.
    pub fn fail_draw(&self, nth: usize, err: NativeError) {
        self.recording.lock().unwrap().faults.push((nth, err));
    }

    /// Raises `err` immediately, as if the previous call failed.
    pub fn set_error(&self, err: NativeError) {
        self.recording.lock().unwrap().raise(err);
    }

    pub fn enable_extension(&self, extension: Extension) {
        self.recording.lock().unwrap().extensions.insert(extension);
    }

    /// Returns a copy of all the calls recorded so far.
    pub fn trace(&self) -> CallTrace {
        self.recording.lock().unwrap().trace.clone()
    }

    /// Takes the calls recorded so far, leaving an empty trace.
    pub fn take_trace(&self) -> CallTrace {
        let mut recording = self.recording.lock().unwrap();
        ::std::mem::replace(&mut recording.trace, CallTrace::new())
    }

    pub fn count<F: Fn(&NativeCall) -> bool>(&self, func: F) -> usize {
        self.recording.lock().unwrap().trace.count(func)
    }

    pub fn len(&self) -> usize {
        self.recording.lock().unwrap().trace.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    fn record(&mut self, call: NativeCall) {
        self.recording.lock().unwrap().push(call);
    }
}

impl Visitor for HeadlessVisitor {
    fn bind_program(&mut self, program: Option<ProgramHandle>) {
        self.record(NativeCall::BindProgram(program));
    }

    fn set_uniform(&mut self, field: HashValue<str>, value: &UniformValue) {
        self.record(NativeCall::SetUniform(field, *value));
    }

    fn active_texture(&mut self, unit: u32) {
        self.record(NativeCall::ActiveTexture(unit));
    }

    fn bind_texture(&mut self, texture: Option<TextureHandle>) {
        self.record(NativeCall::BindTexture(texture));
    }

    fn bind_vertex_buffer(&mut self, buffer: Option<BufferHandle>) {
        self.record(NativeCall::BindVertexBuffer(buffer));
    }

    fn bind_index_buffer(&mut self, buffer: Option<BufferHandle>) {
        self.record(NativeCall::BindIndexBuffer(buffer));
    }

    fn enable(&mut self, capability: Capability) {
        self.record(NativeCall::Enable(capability));
    }

    fn disable(&mut self, capability: Capability) {
        self.record(NativeCall::Disable(capability));
    }

    fn blend_equation(&mut self, equation: Equation) {
        self.record(NativeCall::BlendEquation(equation));
    }

    fn blend_func(&mut self, src: BlendFactor, dst: BlendFactor) {
        self.record(NativeCall::BlendFunc(src, dst));
    }

    fn depth_func(&mut self, func: Comparison) {
        self.record(NativeCall::DepthFunc(func));
    }

    fn depth_mask(&mut self, write: bool) {
        self.record(NativeCall::DepthMask(write));
    }

    fn stencil_func(&mut self, func: Comparison, reference: i32, mask: u32) {
        self.record(NativeCall::StencilFunc(func, reference, mask));
    }

    fn stencil_op(&mut self, fail: StencilOp, depth_fail: StencilOp, pass: StencilOp) {
        self.record(NativeCall::StencilOp(fail, depth_fail, pass));
    }

    fn cull_face(&mut self, face: CullFace) {
        self.record(NativeCall::CullFace(face));
    }

    fn color_mask(&mut self, mask: ColorMask) {
        self.record(NativeCall::ColorMask(mask));
    }

    fn draw_arrays(&mut self, primitive: Primitive, first: u32, count: u32) {
        self.record(NativeCall::DrawArrays(primitive, first, count));
    }

    fn draw_elements(&mut self, primitive: Primitive, format: IndexFormat, offset: u32, count: u32) {
        self.record(NativeCall::DrawElements(primitive, format, offset, count));
    }

    fn last_error(&mut self) -> Option<NativeError> {
        self.recording.lock().unwrap().error.take()
    }

    fn supports(&self, extension: Extension) -> bool {
        self.recording
            .lock()
            .unwrap()
            .extensions
            .contains(&extension)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn shared_recording() {
        let shared = HeadlessVisitor::new();
        let mut visitor = shared.clone();

        visitor.enable(Capability::Blend);
        visitor.draw_arrays(Primitive::Points, 0, 1);

        assert_eq!(shared.len(), 2);
        assert_eq!(shared.count(NativeCall::is_draw), 1);
        assert_eq!(shared.take_trace().len(), 2);
        assert!(shared.is_empty());
    }

    #[test]
    fn scripted_errors() {
        let shared = HeadlessVisitor::new();
        let mut visitor = shared.clone();
        shared.fail_draw(1, NativeError::InvalidOperation);

        visitor.draw_arrays(Primitive::Triangles, 0, 3);
        assert_eq!(visitor.last_error(), None);

        visitor.draw_arrays(Primitive::Triangles, 0, 3);
        assert_eq!(visitor.last_error(), Some(NativeError::InvalidOperation));
        assert_eq!(visitor.last_error(), None);

        shared.set_error(NativeError::OutOfMemory);
        shared.set_error(NativeError::ContextLost);
        assert_eq!(visitor.last_error(), Some(NativeError::OutOfMemory));
    }

    #[test]
    fn extensions() {
        let visitor = HeadlessVisitor::new();
        assert!(!visitor.supports(Extension::DebugOutput));
        visitor.enable_extension(Extension::DebugOutput);
        assert!(visitor.supports(Extension::DebugOutput));
    }
}
