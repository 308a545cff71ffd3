//! In-memory cache of parsed class-file metadata, scoped per loader domain,
//! used to answer type-hierarchy and name-prefix queries while classes are
//! woven on the fly.
//!
//! The cache sits on the critical path of a class-loading hook, so it never
//! uses the loading facility it hooks: resolution works from raw class
//! bytes where possible, falls back to already-loaded representations, and
//! only ever issues non-initializing loads. Loader domains are held through
//! weak keys so the cache puts no lifetime floor under them.

mod cache;
mod classpath;
mod descriptor;
mod error;
mod ir;
mod loader;
mod reader;
#[cfg(test)]
mod test_harness;

pub use cache::ParsedTypeCache;
pub use classpath::ClasspathDomain;
pub use error::Error;
pub use ir::{ParsedMethod, ParsedType};
pub use loader::{DomainHandle, LoadedType, LoaderDomain, ParseContext, ReflectedType};
pub use reader::parse_class_bytes;
