//! The OpenGL binding. Context creation stays with the application, the visitor only
//! needs a way to resolve function pointers of a current context.

pub mod capabilities;
pub mod types;
pub mod visitor;

pub use self::visitor::GLVisitor;
