use std::fmt;
use std::io;
use std::sync::Arc;

use crate::ir::ParsedMethod;

/// Shared handle to a loader domain. The bootstrap domain has no handle and
/// is represented by `None` wherever a handle is optional.
pub type DomainHandle = Arc<dyn LoaderDomain>;

/// Capability interface for a type-defining scope (the class-loader role).
///
/// The cache only ever talks to loader domains through this trait; real
/// loaders and test doubles implement it separately. Implementations must
/// not trigger type initialization: resolution happens inside a
/// class-loading hook and must not re-enter it.
pub trait LoaderDomain: Send + Sync + 'static {
    /// Class-file bytes for a slash-form resource path, if this domain can
    /// produce them.
    fn resource_bytes(&self, resource_path: &str) -> io::Result<Option<Vec<u8>>>;

    /// Non-forcing probe: is a type with this name already defined somewhere
    /// reachable from this domain, and if so, where?
    fn find_loaded(&self, type_name: &str) -> Option<Arc<dyn LoadedType>>;

    /// Name-based, non-initializing load. Only used when a type has neither
    /// resource bytes nor a loaded representation.
    fn force_load(&self, type_name: &str) -> Option<Arc<dyn LoadedType>>;

    /// Identity used in log messages.
    fn describe(&self) -> String {
        "<loader domain>".to_string()
    }
}

/// An already-defined type observed through a loader domain.
pub trait LoadedType: Send + Sync {
    /// The domain that actually defined the type; absent means bootstrap.
    fn defining_domain(&self) -> Option<DomainHandle>;

    /// Structural summary taken from the runtime representation.
    fn reflect(&self) -> ReflectedType;
}

/// Structural tuple reflected from a loaded type. The requested name is
/// supplied by the caller, so it is not repeated here.
#[derive(Clone, Debug)]
pub struct ReflectedType {
    pub is_interface: bool,
    pub super_name: Option<String>,
    pub interface_names: Vec<String>,
    pub methods: Vec<ParsedMethod>,
}

/// Origin of a hierarchy walk, carried for log-message construction only.
#[derive(Clone, Debug)]
pub struct ParseContext {
    class_name: String,
    code_location: Option<String>,
}

impl ParseContext {
    pub fn new(class_name: impl Into<String>, code_location: Option<String>) -> Self {
        Self {
            class_name: class_name.into(),
            code_location,
        }
    }
}

impl fmt::Display for ParseContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code_location {
            Some(code_location) => write!(f, "{} ({})", self.class_name, code_location),
            None => write!(f, "{}", self.class_name),
        }
    }
}
