use std::collections::{HashMap, HashSet};
use std::io;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::loader::{DomainHandle, LoadedType, LoaderDomain, ReflectedType};

/// Minimal class-file writer for cache and reader tests. Emits only the
/// structural prefix the reader consumes: constant pool, class header,
/// interfaces, and method table entries without attributes.
pub(crate) struct ClassFileBuilder {
    cp: Vec<CpEntry>,
    access_flags: u16,
    this_class: u16,
    super_class: u16,
    interfaces: Vec<u16>,
    methods: Vec<MethodSpec>,
}

impl ClassFileBuilder {
    pub(crate) fn new(class_name: &str, super_name: &str) -> Self {
        Self::with_access(0x0021, class_name, super_name)
    }

    pub(crate) fn interface(class_name: &str) -> Self {
        Self::with_access(0x0601, class_name, "java/lang/Object")
    }

    fn with_access(access_flags: u16, class_name: &str, super_name: &str) -> Self {
        let mut builder = Self {
            cp: Vec::new(),
            access_flags,
            this_class: 0,
            super_class: 0,
            interfaces: Vec::new(),
            methods: Vec::new(),
        };
        builder.this_class = builder.add_class(class_name);
        builder.super_class = builder.add_class(super_name);
        builder
    }

    pub(crate) fn add_interface(&mut self, name: &str) {
        let class_index = self.add_class(name);
        self.interfaces.push(class_index);
    }

    pub(crate) fn add_method(&mut self, access_flags: u16, name: &str, descriptor: &str) {
        let name_index = self.add_utf8(name);
        let descriptor_index = self.add_utf8(descriptor);
        self.methods.push(MethodSpec {
            access_flags,
            name_index,
            descriptor_index,
        });
    }

    fn add_utf8(&mut self, value: &str) -> u16 {
        self.cp.push(CpEntry::Utf8(value.to_string()));
        self.cp.len() as u16
    }

    fn add_class(&mut self, name: &str) -> u16 {
        let name_index = self.add_utf8(name);
        self.cp.push(CpEntry::Class(name_index));
        self.cp.len() as u16
    }

    pub(crate) fn finish(self) -> Vec<u8> {
        let mut bytes = Vec::new();
        write_u32(&mut bytes, 0xCAFEBABE);
        write_u16(&mut bytes, 0);
        write_u16(&mut bytes, 52);
        write_u16(&mut bytes, (self.cp.len() + 1) as u16);
        for entry in &self.cp {
            entry.write(&mut bytes);
        }
        write_u16(&mut bytes, self.access_flags);
        write_u16(&mut bytes, self.this_class);
        write_u16(&mut bytes, self.super_class);
        write_u16(&mut bytes, self.interfaces.len() as u16);
        for interface_index in &self.interfaces {
            write_u16(&mut bytes, *interface_index);
        }
        write_u16(&mut bytes, 0);
        write_u16(&mut bytes, self.methods.len() as u16);
        for method in &self.methods {
            write_u16(&mut bytes, method.access_flags);
            write_u16(&mut bytes, method.name_index);
            write_u16(&mut bytes, method.descriptor_index);
            write_u16(&mut bytes, 0);
        }
        write_u16(&mut bytes, 0);
        bytes
    }
}

/// Method entry for generated class files.
struct MethodSpec {
    access_flags: u16,
    name_index: u16,
    descriptor_index: u16,
}

/// Constant pool entries needed by generated class files.
enum CpEntry {
    Utf8(String),
    Class(u16),
}

impl CpEntry {
    fn write(&self, bytes: &mut Vec<u8>) {
        match self {
            CpEntry::Utf8(value) => {
                bytes.push(1);
                write_u16(bytes, value.len() as u16);
                bytes.extend_from_slice(value.as_bytes());
            }
            CpEntry::Class(name_index) => {
                bytes.push(7);
                write_u16(bytes, *name_index);
            }
        }
    }
}

fn write_u16(bytes: &mut Vec<u8>, value: u16) {
    bytes.extend_from_slice(&value.to_be_bytes());
}

fn write_u32(bytes: &mut Vec<u8>, value: u32) {
    bytes.extend_from_slice(&value.to_be_bytes());
}

/// Public-method class with a `java.lang.Object` super, for cache tests.
pub(crate) fn simple_class_bytes(
    internal_name: &str,
    interfaces: &[&str],
    methods: &[&str],
) -> Vec<u8> {
    let mut builder = ClassFileBuilder::new(internal_name, "java/lang/Object");
    for interface in interfaces {
        builder.add_interface(interface);
    }
    for method in methods {
        builder.add_method(0x0001, method, "()V");
    }
    builder.finish()
}

/// Interface with abstract methods, for cache tests.
pub(crate) fn interface_bytes(internal_name: &str, methods: &[&str]) -> Vec<u8> {
    let mut builder = ClassFileBuilder::interface(internal_name);
    for method in methods {
        builder.add_method(0x0401, method, "()V");
    }
    builder.finish()
}

/// In-memory loader domain with scripted resources, loaded types, and
/// injectable resource failures.
pub(crate) struct FakeDomain {
    name: &'static str,
    resources: Mutex<HashMap<String, Vec<u8>>>,
    failing: Mutex<HashSet<String>>,
    loaded: Mutex<HashMap<String, Arc<dyn LoadedType>>>,
    forced: Mutex<HashMap<String, Arc<dyn LoadedType>>>,
}

impl FakeDomain {
    pub(crate) fn new(name: &'static str) -> Self {
        Self {
            name,
            resources: Mutex::new(HashMap::new()),
            failing: Mutex::new(HashSet::new()),
            loaded: Mutex::new(HashMap::new()),
            forced: Mutex::new(HashMap::new()),
        }
    }

    pub(crate) fn put_resource(&self, resource_path: &str, bytes: Vec<u8>) {
        self.resources.lock().insert(resource_path.to_string(), bytes);
    }

    pub(crate) fn fail_resource(&self, resource_path: &str) {
        self.failing.lock().insert(resource_path.to_string());
    }

    pub(crate) fn clear_failure(&self, resource_path: &str) {
        self.failing.lock().remove(resource_path);
    }

    pub(crate) fn put_loaded(&self, type_name: &str, loaded: Arc<dyn LoadedType>) {
        self.loaded.lock().insert(type_name.to_string(), loaded);
    }

    pub(crate) fn put_forced(&self, type_name: &str, loaded: Arc<dyn LoadedType>) {
        self.forced.lock().insert(type_name.to_string(), loaded);
    }
}

impl LoaderDomain for FakeDomain {
    fn resource_bytes(&self, resource_path: &str) -> io::Result<Option<Vec<u8>>> {
        if self.failing.lock().contains(resource_path) {
            return Err(io::Error::other(format!(
                "injected failure for {resource_path}"
            )));
        }
        Ok(self.resources.lock().get(resource_path).cloned())
    }

    fn find_loaded(&self, type_name: &str) -> Option<Arc<dyn LoadedType>> {
        self.loaded.lock().get(type_name).cloned()
    }

    fn force_load(&self, type_name: &str) -> Option<Arc<dyn LoadedType>> {
        self.forced.lock().get(type_name).cloned()
    }

    fn describe(&self) -> String {
        self.name.to_string()
    }
}

/// Scripted loaded-type handle.
pub(crate) struct FakeLoadedType {
    defining: Option<DomainHandle>,
    reflected: ReflectedType,
}

impl FakeLoadedType {
    /// A loaded type defined by the given domain; reflection is never
    /// consulted because the defining domain can serve bytes.
    pub(crate) fn defined_by(domain: DomainHandle) -> Self {
        Self {
            defining: Some(domain),
            reflected: ReflectedType {
                is_interface: false,
                super_name: None,
                interface_names: Vec::new(),
                methods: Vec::new(),
            },
        }
    }

    /// A bootstrap-defined loaded type backed only by reflection.
    pub(crate) fn reflecting(reflected: ReflectedType) -> Self {
        Self {
            defining: None,
            reflected,
        }
    }
}

impl LoadedType for FakeLoadedType {
    fn defining_domain(&self) -> Option<DomainHandle> {
        self.defining.clone()
    }

    fn reflect(&self) -> ReflectedType {
        self.reflected.clone()
    }
}
