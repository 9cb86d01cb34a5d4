use crate::renderer::cache::StateAxis;
use crate::scene::NodeHandle;
use crate::video::backends::NativeError;

#[derive(Debug, Clone, PartialEq, Fail)]
pub enum Error {
    #[fail(
        display = "{} can not be parented to {}, the graph would become cyclic.",
        child, parent
    )]
    StructuralViolation {
        child: NodeHandle,
        parent: NodeHandle,
    },
    #[fail(display = "{} is not a child of {}.", child, parent)]
    NotAChild {
        child: NodeHandle,
        parent: NodeHandle,
    },
    #[fail(display = "{} is invalid.", _0)]
    NodeInvalid(NodeHandle),
    #[fail(display = "State cache diverged from the applied snapshot at {:?}.", _0)]
    StateCacheDesync(StateAxis),
    #[fail(display = "Native call failed at queue entry {}: {}.", index, error)]
    NativeCall { index: usize, error: NativeError },
    #[fail(display = "The graphics context has been lost.")]
    ContextLost,
    #[fail(
        display = "Snapshot binds {} texture units while only {} are available.",
        _0, _1
    )]
    TooManyTextureUnits(usize, usize),
    #[fail(display = "Skips queue entry {}. {}", index, cause)]
    SkippedEntry { index: usize, cause: Box<Error> },
    #[fail(display = "[GL] {}", _0)]
    Backend(String),
    #[fail(display = "Failed to parse settings: {}", _0)]
    Settings(String),
    #[fail(display = "Failed to (de)serialize call trace: {}", _0)]
    Trace(String),
}

pub type Result<T> = ::std::result::Result<T, Error>;

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Error {
        Error::Trace(format!("{}", err))
    }
}

impl From<bincode::Error> for Error {
    fn from(err: bincode::Error) -> Error {
        Error::Trace(format!("{}", err))
    }
}
