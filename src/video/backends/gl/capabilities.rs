use std::cmp;
use std::ffi;

use gl;
use gl::types::*;

use crate::errors::*;

use super::super::Extension;

/// Describes a version.
///
/// A version can only be compared to another version if they belong to the same API.
/// For example, both `Version::GL(3, 0) >= Version::ES(3, 0)` and `Version::ES(3, 0) >=
/// Version::GL(3, 0)` return `false`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Version {
    /// Regular OpenGL.
    GL(u8, u8),
    /// OpenGL embedded system.
    ES(u8, u8),
}

impl PartialOrd for Version {
    #[inline]
    fn partial_cmp(&self, other: &Version) -> Option<cmp::Ordering> {
        let (es1, major1, minor1) = match *self {
            Version::GL(major, minor) => (false, major, minor),
            Version::ES(major, minor) => (true, major, minor),
        };

        let (es2, major2, minor2) = match *other {
            Version::GL(major, minor) => (false, major, minor),
            Version::ES(major, minor) => (true, major, minor),
        };

        if es1 != es2 {
            None
        } else {
            Some(major1.cmp(&major2).then(minor1.cmp(&minor2)))
        }
    }
}

impl Version {
    /// Parses the string returned by `glGetString(GL_VERSION)`.
    pub fn from_str(desc: &str) -> Result<Version> {
        let (es, desc) = if desc.starts_with("OpenGL ES ") {
            (true, &desc[10..])
        } else if desc.starts_with("OpenGL ES-") {
            (true, &desc[13..])
        } else {
            (false, desc)
        };

        let malformed = || Error::Backend(format!("Malformed version string {:?}.", desc));

        let number = desc.split(' ').next().ok_or_else(malformed)?;
        let mut iter = number.split('.');
        let major = iter
            .next()
            .and_then(|v| v.parse().ok())
            .ok_or_else(malformed)?;
        let minor = iter
            .next()
            .and_then(|v| v.parse().ok())
            .ok_or_else(malformed)?;

        if es {
            Ok(Version::ES(major, minor))
        } else {
            Ok(Version::GL(major, minor))
        }
    }

    /// Obtains the OpenGL version of the current context using the loaded functions.
    ///
    /// # Unsafe
    ///
    /// You must ensure that the functions belong to the current context, otherwise you will get
    /// an undefined behavior.
    pub unsafe fn parse() -> Result<Version> {
        Version::from_str(&parse_str(gl::VERSION)?)
    }
}

macro_rules! extensions {
    ($($string:expr => $field:ident,)+) => {
        /// Contains data about the list of extensions.
        #[derive(Debug, Default, Clone, Copy)]
        pub struct Extensions {
            $(
                pub $field: bool,
            )+
        }

        impl Extensions {
            /// Collects the extension strings of current context.
            ///
            /// *Safety*: the OpenGL context corresponding to `gl` must be current in the thread.
            pub unsafe fn parse(version: Version) -> Result<Extensions> {
                let strings: Vec<String> = if version >= Version::GL(3, 0) || version >= Version::ES(3, 0) {
                    let mut num_extensions = 0;
                    gl::GetIntegerv(gl::NUM_EXTENSIONS, &mut num_extensions);
                    (0 .. num_extensions).filter_map(|i| {
                        let ext = gl::GetStringi(gl::EXTENSIONS, i as GLuint);
                        to_string(ext).ok()
                    }).collect()
                } else {
                    parse_str(gl::EXTENSIONS)?.split(' ').map(|e| e.to_owned()).collect()
                };

                Ok(Extensions::from_strings(strings.iter().map(|v| v.as_str())))
            }

            pub fn from_strings<'a, T: Iterator<Item = &'a str>>(strings: T) -> Extensions {
                let mut extensions = Extensions::default();
                for extension in strings {
                    match extension {
                        $(
                            $string => extensions.$field = true,
                        )+
                        _ => ()
                    }
                }

                extensions
            }
        }
    }
}

extensions! {
    "GL_ARB_vertex_array_object" => gl_arb_vertex_array_object,
    "GL_APPLE_vertex_array_object" => gl_apple_vertex_array_object,
    "GL_OES_vertex_array_object" => gl_oes_vertex_array_object,
    "GL_KHR_debug" => gl_khr_debug,
    "GL_ARB_debug_output" => gl_arb_debug_output,
    "GL_ARB_robustness" => gl_arb_robustness,
    "GL_KHR_robustness" => gl_khr_robustness,
    "GL_EXT_texture_filter_anisotropic" => gl_ext_texture_filter_anisotropic,
    "GL_ARB_texture_filter_anisotropic" => gl_arb_texture_filter_anisotropic,
}

/// Represents the capabilities of the context.
///
/// Contrary to the state, these values never change.
#[derive(Debug)]
pub struct Capabilities {
    pub version: Version,
    /// The company responsible for this GL implementation.
    pub vendor: String,
    /// The name of the renderer. This name is typically specific to a particular
    /// configuration of a hardware platform.
    pub renderer: String,
    pub extensions: Extensions,
    /// Maximum number of textures that can be bound to a program.
    pub max_combined_texture_image_units: u32,
}

impl Capabilities {
    pub unsafe fn parse() -> Result<Capabilities> {
        let version = Version::parse()?;
        let extensions = Extensions::parse(version)?;

        let mut units = 0;
        gl::GetIntegerv(gl::MAX_COMBINED_TEXTURE_IMAGE_UNITS, &mut units);

        Ok(Capabilities {
            version,
            vendor: parse_str(gl::VENDOR)?,
            renderer: parse_str(gl::RENDERER)?,
            extensions,
            max_combined_texture_image_units: cmp::max(units, 0) as u32,
        })
    }

    pub fn supports(&self, extension: Extension) -> bool {
        let exts = &self.extensions;
        match extension {
            Extension::VertexArrayObject => {
                self.version >= Version::GL(3, 0)
                    || self.version >= Version::ES(3, 0)
                    || exts.gl_arb_vertex_array_object
                    || exts.gl_apple_vertex_array_object
                    || exts.gl_oes_vertex_array_object
            }
            Extension::DebugOutput => {
                self.version >= Version::GL(4, 3) || exts.gl_khr_debug || exts.gl_arb_debug_output
            }
            Extension::Robustness => exts.gl_arb_robustness || exts.gl_khr_robustness,
            Extension::AnisotropicFiltering => {
                self.version >= Version::GL(4, 6)
                    || exts.gl_ext_texture_filter_anisotropic
                    || exts.gl_arb_texture_filter_anisotropic
            }
        }
    }
}

unsafe fn parse_str(id: GLenum) -> Result<String> {
    to_string(gl::GetString(id))
}

unsafe fn to_string(s: *const GLubyte) -> Result<String> {
    if s.is_null() {
        return Err(Error::Backend("Queried a null string.".into()));
    }

    let bytes = ffi::CStr::from_ptr(s as *const _).to_bytes().to_vec();
    String::from_utf8(bytes).map_err(|_| Error::Backend("String is unformaled.".into()))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn version() {
        assert_eq!(Version::from_str("4.1 Metal - 76.3").unwrap(), Version::GL(4, 1));
        assert_eq!(
            Version::from_str("OpenGL ES 3.0 (WebGL 2.0)").unwrap(),
            Version::ES(3, 0)
        );
        assert!(Version::from_str("OpenGL").is_err());

        assert!(Version::GL(3, 3) > Version::GL(3, 0));
        assert!(Version::GL(2, 1) < Version::GL(3, 0));
        assert_eq!(Version::GL(3, 0).partial_cmp(&Version::ES(3, 0)), None);
    }

    #[test]
    fn extensions() {
        let strings = ["GL_KHR_debug", "GL_EXT_unknown", "GL_ARB_robustness"];
        let exts = Extensions::from_strings(strings.iter().cloned());
        assert!(exts.gl_khr_debug);
        assert!(exts.gl_arb_robustness);
        assert!(!exts.gl_arb_vertex_array_object);

        let caps = Capabilities {
            version: Version::GL(2, 1),
            vendor: String::new(),
            renderer: String::new(),
            extensions: exts,
            max_combined_texture_image_units: 8,
        };

        assert!(caps.supports(Extension::DebugOutput));
        assert!(caps.supports(Extension::Robustness));
        assert!(!caps.supports(Extension::VertexArrayObject));
        assert!(!caps.supports(Extension::AnisotropicFiltering));
    }
}
