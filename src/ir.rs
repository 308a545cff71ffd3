use jclassfile::methods::MethodFlags;

pub(crate) const JAVA_LANG_OBJECT: &str = "java.lang.Object";

/// Immutable record of a single declared method.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ParsedMethod {
    name: String,
    parameter_descriptors: Vec<String>,
    return_descriptor: String,
    access_flags: u16,
}

impl ParsedMethod {
    pub fn new(
        name: String,
        parameter_descriptors: Vec<String>,
        return_descriptor: String,
        access_flags: u16,
    ) -> Self {
        Self {
            name,
            parameter_descriptors,
            return_descriptor,
            access_flags,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parameter type descriptors in declaration order.
    pub fn parameter_descriptors(&self) -> &[String] {
        &self.parameter_descriptors
    }

    pub fn return_descriptor(&self) -> &str {
        &self.return_descriptor
    }

    pub fn access_flags(&self) -> u16 {
        self.access_flags
    }

    pub fn is_public(&self) -> bool {
        self.has_flag(MethodFlags::ACC_PUBLIC)
    }

    pub fn is_static(&self) -> bool {
        self.has_flag(MethodFlags::ACC_STATIC)
    }

    pub fn is_abstract(&self) -> bool {
        self.has_flag(MethodFlags::ACC_ABSTRACT)
    }

    pub fn is_native(&self) -> bool {
        self.has_flag(MethodFlags::ACC_NATIVE)
    }

    pub fn is_synthetic(&self) -> bool {
        self.has_flag(MethodFlags::ACC_SYNTHETIC)
    }

    /// Render in descriptor form, e.g. `f(Ljava/lang/String;)V`.
    pub fn signature(&self) -> String {
        format!(
            "{}({}){}",
            self.name,
            self.parameter_descriptors.concat(),
            self.return_descriptor
        )
    }

    fn has_flag(&self, flag: MethodFlags) -> bool {
        MethodFlags::from_bits_truncate(self.access_flags).contains(flag)
    }
}

/// Immutable structural summary of one type: canonical name, super-type,
/// interfaces, and declared (not inherited) methods.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ParsedType {
    interface: bool,
    name: String,
    super_name: Option<String>,
    interface_names: Vec<String>,
    methods: Vec<ParsedMethod>,
}

impl ParsedType {
    /// A `java.lang.Object` (or self-referential) super-type is stored as
    /// absent, and duplicate interface names are dropped keeping the first
    /// occurrence.
    pub fn new(
        interface: bool,
        name: String,
        super_name: Option<String>,
        interface_names: Vec<String>,
        methods: Vec<ParsedMethod>,
    ) -> Self {
        let super_name =
            super_name.filter(|super_name| super_name != JAVA_LANG_OBJECT && *super_name != name);
        let mut seen = std::collections::HashSet::new();
        let interface_names = interface_names
            .into_iter()
            .filter(|interface_name| seen.insert(interface_name.clone()))
            .collect();
        Self {
            interface,
            name,
            super_name,
            interface_names,
            methods,
        }
    }

    pub fn is_interface(&self) -> bool {
        self.interface
    }

    /// Canonical (dotted) type name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Absent for `java.lang.Object` and for interfaces, which carry no
    /// super-type in the record.
    pub fn super_name(&self) -> Option<&str> {
        self.super_name.as_deref()
    }

    /// Declared interface names in declaration order, without duplicates.
    pub fn interface_names(&self) -> &[String] {
        &self.interface_names
    }

    /// Declared methods only; inherited methods are resolved through the
    /// type hierarchy.
    pub fn methods(&self) -> &[ParsedMethod] {
        &self.methods
    }
}
