use std::ffi::CString;
use std::os::raw::c_void;

use gl;
use gl::types::*;

use crate::errors::*;
use crate::utils::hash::FastHashMap;
use crate::utils::hash_value::HashValue;
use crate::video::snapshot::*;

use super::super::{Capability, Extension, NativeError, Visitor};
use super::capabilities::Capabilities;
use super::types;

#[derive(Debug, Clone)]
struct GLProgramData {
    id: GLuint,
    uniforms: FastHashMap<HashValue<str>, GLint>,
}

/// The OpenGL binding. Programs, textures and buffers are created by the application,
/// and registered here with the handles that snapshots refer to.
#[derive(Debug)]
pub struct GLVisitor {
    capabilities: Capabilities,
    programs: FastHashMap<ProgramHandle, GLProgramData>,
    textures: FastHashMap<TextureHandle, GLuint>,
    buffers: FastHashMap<BufferHandle, GLuint>,
    binded_program: Option<ProgramHandle>,
    error: Option<NativeError>,
}

impl GLVisitor {
    /// Loads the function pointers with `loader`, and probes the capabilities of current
    /// context.
    ///
    /// # Unsafe
    ///
    /// The context that `loader` resolves symbols from must be current on this thread, for
    /// as long as the visitor is used.
    pub unsafe fn new<F>(loader: F) -> Result<Self>
    where
        F: FnMut(&'static str) -> *const c_void,
    {
        gl::load_with(loader);

        let capabilities = Capabilities::parse()?;
        info!("GLVisitor {:#?}", capabilities);

        Ok(GLVisitor {
            capabilities,
            programs: FastHashMap::default(),
            textures: FastHashMap::default(),
            buffers: FastHashMap::default(),
            binded_program: None,
            error: None,
        })
    }

    #[inline]
    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    /// Registers a linked program, resolving the locations of `uniforms` up front.
    pub unsafe fn insert_program<'a, T>(&mut self, handle: ProgramHandle, id: GLuint, uniforms: T) -> Result<()>
    where
        T: IntoIterator<Item = &'a str>,
    {
        let mut data = GLProgramData {
            id,
            uniforms: FastHashMap::default(),
        };

        for name in uniforms {
            let c_name = CString::new(name.as_bytes())
                .map_err(|_| Error::Backend(format!("Uniform name {:?} contains nul.", name)))?;
            let location = gl::GetUniformLocation(id, c_name.as_ptr());
            if let Some(err) = types::native_error(gl::GetError()) {
                return Err(Error::Backend(format!("Failed to query {}: {}.", name, err)));
            }

            data.uniforms.insert(name.into(), location);
        }

        self.programs.insert(handle, data);
        Ok(())
    }

    pub fn insert_texture(&mut self, handle: TextureHandle, id: GLuint) {
        self.textures.insert(handle, id);
    }

    pub fn insert_buffer(&mut self, handle: BufferHandle, id: GLuint) {
        self.buffers.insert(handle, id);
    }

    pub fn remove_program(&mut self, handle: ProgramHandle) {
        self.programs.remove(&handle);
        if self.binded_program == Some(handle) {
            self.binded_program = None;
        }
    }

    pub fn remove_texture(&mut self, handle: TextureHandle) {
        self.textures.remove(&handle);
    }

    pub fn remove_buffer(&mut self, handle: BufferHandle) {
        self.buffers.remove(&handle);
    }

    fn raise(&mut self, err: NativeError) {
        if self.error.is_none() {
            self.error = Some(err);
        }
    }

    fn buffer(&mut self, buffer: Option<BufferHandle>) -> GLuint {
        match buffer {
            Some(handle) => match self.buffers.get(&handle) {
                Some(&id) => id,
                None => {
                    self.raise(NativeError::InvalidValue);
                    0
                }
            },
            None => 0,
        }
    }

    fn toggle(&mut self, capability: Capability, enable: bool) {
        unsafe {
            if enable {
                gl::Enable(capability.into());
            } else {
                gl::Disable(capability.into());
            }
        }
    }
}

impl Visitor for GLVisitor {
    fn bind_program(&mut self, program: Option<ProgramHandle>) {
        let id = match program {
            Some(handle) => match self.programs.get(&handle) {
                Some(data) => data.id,
                None => return self.raise(NativeError::InvalidValue),
            },
            None => 0,
        };

        unsafe { gl::UseProgram(id) };
        self.binded_program = program;
    }

    fn set_uniform(&mut self, field: HashValue<str>, value: &UniformValue) {
        let location = match self.binded_program.and_then(|v| self.programs.get(&v)) {
            Some(data) => data.uniforms.get(&field).cloned().unwrap_or(-1),
            None => return self.raise(NativeError::InvalidOperation),
        };

        // Uniforms that the program does not declare are silently ignored, the same as
        // a location of -1.
        if location < 0 {
            return;
        }

        unsafe {
            match *value {
                UniformValue::I32(v) => gl::Uniform1i(location, v),
                UniformValue::F32(v) => gl::Uniform1f(location, v),
                UniformValue::Vector2f(v) => gl::Uniform2f(location, v[0], v[1]),
                UniformValue::Vector3f(v) => gl::Uniform3f(location, v[0], v[1], v[2]),
                UniformValue::Vector4f(v) => gl::Uniform4f(location, v[0], v[1], v[2], v[3]),
                UniformValue::Matrix4f(v) => {
                    gl::UniformMatrix4fv(location, 1, gl::FALSE, v[0].as_ptr())
                }
            }
        }
    }

    fn active_texture(&mut self, unit: u32) {
        if unit >= self.capabilities.max_combined_texture_image_units {
            return self.raise(NativeError::InvalidEnum);
        }

        unsafe { gl::ActiveTexture(gl::TEXTURE0 + unit) };
    }

    fn bind_texture(&mut self, texture: Option<TextureHandle>) {
        let id = match texture {
            Some(handle) => match self.textures.get(&handle) {
                Some(&id) => id,
                None => return self.raise(NativeError::InvalidValue),
            },
            None => 0,
        };

        unsafe { gl::BindTexture(gl::TEXTURE_2D, id) };
    }

    fn bind_vertex_buffer(&mut self, buffer: Option<BufferHandle>) {
        let id = self.buffer(buffer);
        unsafe { gl::BindBuffer(gl::ARRAY_BUFFER, id) };
    }

    fn bind_index_buffer(&mut self, buffer: Option<BufferHandle>) {
        let id = self.buffer(buffer);
        unsafe { gl::BindBuffer(gl::ELEMENT_ARRAY_BUFFER, id) };
    }

    fn enable(&mut self, capability: Capability) {
        self.toggle(capability, true);
    }

    fn disable(&mut self, capability: Capability) {
        self.toggle(capability, false);
    }

    fn blend_equation(&mut self, equation: Equation) {
        unsafe { gl::BlendEquation(equation.into()) };
    }

    fn blend_func(&mut self, src: BlendFactor, dst: BlendFactor) {
        unsafe { gl::BlendFunc(src.into(), dst.into()) };
    }

    fn depth_func(&mut self, func: Comparison) {
        unsafe { gl::DepthFunc(func.into()) };
    }

    fn depth_mask(&mut self, write: bool) {
        unsafe { gl::DepthMask(types::boolean(write)) };
    }

    fn stencil_func(&mut self, func: Comparison, reference: i32, mask: u32) {
        unsafe { gl::StencilFunc(func.into(), reference, mask) };
    }

    fn stencil_op(&mut self, fail: StencilOp, depth_fail: StencilOp, pass: StencilOp) {
        unsafe { gl::StencilOp(fail.into(), depth_fail.into(), pass.into()) };
    }

    fn cull_face(&mut self, face: CullFace) {
        unsafe { gl::CullFace(face.into()) };
    }

    fn color_mask(&mut self, mask: ColorMask) {
        unsafe {
            gl::ColorMask(
                types::boolean(mask.r),
                types::boolean(mask.g),
                types::boolean(mask.b),
                types::boolean(mask.a),
            )
        };
    }

    fn draw_arrays(&mut self, primitive: Primitive, first: u32, count: u32) {
        unsafe { gl::DrawArrays(primitive.into(), first as GLint, count as GLsizei) };
    }

    fn draw_elements(&mut self, primitive: Primitive, format: IndexFormat, offset: u32, count: u32) {
        let offset = offset as usize * format.stride();
        unsafe {
            gl::DrawElements(
                primitive.into(),
                count as GLsizei,
                format.into(),
                offset as *const c_void,
            )
        };
    }

    fn last_error(&mut self) -> Option<NativeError> {
        let native = unsafe { types::native_error(gl::GetError()) };
        self.error.take().or(native)
    }

    fn supports(&self, extension: Extension) -> bool {
        self.capabilities.supports(extension)
    }
}
