//! Import system
//!
//! Identifiers resolve through the module cache first, then through an
//! ordered chain of finders: the builtin finder, every registered finder in
//! registration order, and finally the path finder that loads unmodified
//! source.

mod builtin;
mod cache;
mod error;
mod finder;
pub mod locate;
mod namespace;
mod path_finder;
mod system;

pub use builtin::BuiltinFinder;
pub use cache::ModuleCache;
pub use error::ImportError;
pub use finder::{Finder, ModuleHandle};
pub use locate::{locate, Location};
pub use namespace::{ModuleRef, ModuleState, Namespace};
pub use path_finder::PathFinder;
pub use system::ImportSystem;
