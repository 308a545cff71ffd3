use jclassfile::class_file::{self, ClassFlags};
use jclassfile::constant_pool::ConstantPool;

use crate::descriptor::split_method_descriptor;
use crate::error::Error;
use crate::ir::{ParsedMethod, ParsedType};

/// Parse the structural prefix of a class file into a [`ParsedType`].
///
/// Only the header, constant pool, and member tables are consumed; method
/// bodies, annotations, and other attributes are ignored. Internal
/// (slash-form) names are normalized to canonical dotted names at this
/// boundary.
pub fn parse_class_bytes(data: &[u8]) -> Result<ParsedType, Error> {
    let class_file = class_file::parse(data).map_err(Error::malformed)?;
    let constant_pool = class_file.constant_pool();

    let mut visitor = TypeVisitor::default();
    let name = resolve_class_name(constant_pool, class_file.this_class())?;
    let super_name = if class_file.super_class() == 0 {
        None
    } else {
        Some(resolve_class_name(constant_pool, class_file.super_class())?)
    };
    let mut interface_names = Vec::with_capacity(class_file.interfaces().len());
    for &interface_index in class_file.interfaces() {
        interface_names.push(resolve_class_name(constant_pool, interface_index)?);
    }
    visitor.visit(
        class_file.access_flags().contains(ClassFlags::ACC_INTERFACE),
        name,
        super_name,
        interface_names,
    );

    for method in class_file.methods() {
        let method_name = resolve_utf8(constant_pool, method.name_index())?;
        let descriptor = resolve_utf8(constant_pool, method.descriptor_index())?;
        let (parameter_descriptors, return_descriptor) = split_method_descriptor(&descriptor)?;
        visitor.visit_method(
            method_name,
            parameter_descriptors,
            return_descriptor,
            method.access_flags().bits(),
        );
    }

    Ok(visitor.build())
}

/// Convert an internal (slash-form) name to its canonical dotted form.
pub(crate) fn from_internal(internal_name: &str) -> String {
    internal_name.replace('/', ".")
}

/// Accumulates reader callbacks and produces the immutable record.
#[derive(Default)]
struct TypeVisitor {
    interface: bool,
    name: String,
    super_name: Option<String>,
    interface_names: Vec<String>,
    methods: Vec<ParsedMethod>,
}

impl TypeVisitor {
    fn visit(
        &mut self,
        interface: bool,
        internal_name: String,
        super_internal_name: Option<String>,
        interface_internal_names: Vec<String>,
    ) {
        self.interface = interface;
        self.name = from_internal(&internal_name);
        self.super_name = super_internal_name
            .map(|super_internal_name| from_internal(&super_internal_name));
        self.interface_names = interface_internal_names
            .iter()
            .map(|interface_internal_name| from_internal(interface_internal_name))
            .collect();
    }

    fn visit_method(
        &mut self,
        name: String,
        parameter_descriptors: Vec<String>,
        return_descriptor: String,
        access_flags: u16,
    ) {
        self.methods.push(ParsedMethod::new(
            name,
            parameter_descriptors,
            return_descriptor,
            access_flags,
        ));
    }

    fn build(self) -> ParsedType {
        ParsedType::new(
            self.interface,
            self.name,
            self.super_name,
            self.interface_names,
            self.methods,
        )
    }
}

fn resolve_class_name(constant_pool: &[ConstantPool], class_index: u16) -> Result<String, Error> {
    let entry = constant_pool
        .get(class_index as usize)
        .ok_or_else(|| Error::malformed(format!("missing class entry at {class_index}")))?;
    match entry {
        ConstantPool::Class { name_index } => resolve_utf8(constant_pool, *name_index),
        _ => Err(Error::malformed(format!(
            "unexpected class entry at {class_index}"
        ))),
    }
}

fn resolve_utf8(constant_pool: &[ConstantPool], index: u16) -> Result<String, Error> {
    let entry = constant_pool
        .get(index as usize)
        .ok_or_else(|| Error::malformed(format!("missing utf8 entry at {index}")))?;
    match entry {
        ConstantPool::Utf8 { value } => Ok(value.clone()),
        _ => Err(Error::malformed(format!("unexpected utf8 entry at {index}"))),
    }
}
