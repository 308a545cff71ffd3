use std::fs::{self, File};
use std::io::{self, Read};
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;
use zip::result::ZipError;
use zip::ZipArchive;

use crate::loader::{DomainHandle, LoadedType, LoaderDomain};

/// Loader domain backed by classpath entries: directories of `.class` files
/// and jar archives.
///
/// Lookups are lazy; nothing is enumerated up front. An optional parent
/// domain is consulted first, mirroring loader delegation. A classpath
/// domain has no runtime type registry, so `find_loaded` and `force_load`
/// always come back empty and resolution works purely from resource bytes.
pub struct ClasspathDomain {
    name: String,
    parent: Option<DomainHandle>,
    entries: Vec<ClasspathEntry>,
}

enum ClasspathEntry {
    Dir(PathBuf),
    Jar {
        path: PathBuf,
        archive: Mutex<ZipArchive<File>>,
    },
}

impl ClasspathDomain {
    pub fn new(name: impl Into<String>, parent: Option<DomainHandle>) -> Self {
        Self {
            name: name.into(),
            parent,
            entries: Vec::new(),
        }
    }

    /// Register a directory holding `.class` files laid out by package.
    pub fn add_class_dir(&mut self, dir: impl Into<PathBuf>) {
        self.entries.push(ClasspathEntry::Dir(dir.into()));
    }

    /// Register a jar archive. The archive directory is read once here;
    /// entry contents are read on demand.
    pub fn add_jar(&mut self, path: impl Into<PathBuf>) -> io::Result<()> {
        let path = path.into();
        let file = File::open(&path)?;
        let archive = ZipArchive::new(file).map_err(io::Error::other)?;
        self.entries.push(ClasspathEntry::Jar {
            path,
            archive: Mutex::new(archive),
        });
        Ok(())
    }

    fn local_resource_bytes(&self, resource_path: &str) -> io::Result<Option<Vec<u8>>> {
        for entry in &self.entries {
            match entry {
                ClasspathEntry::Dir(root) => {
                    let path = root.join(resource_path);
                    if path.is_file() {
                        return fs::read(&path).map(Some);
                    }
                }
                ClasspathEntry::Jar { path, archive } => {
                    let mut archive = archive.lock();
                    match archive.by_name(resource_path) {
                        Ok(mut entry) => {
                            let mut data = Vec::with_capacity(entry.size() as usize);
                            entry.read_to_end(&mut data).map_err(|err| {
                                io::Error::new(
                                    err.kind(),
                                    format!("{}:{resource_path}: {err}", path.display()),
                                )
                            })?;
                            return Ok(Some(data));
                        }
                        Err(ZipError::FileNotFound) => {}
                        Err(err) => {
                            return Err(io::Error::other(format!("{}: {err}", path.display())))
                        }
                    };
                }
            }
        }
        Ok(None)
    }
}

impl LoaderDomain for ClasspathDomain {
    fn resource_bytes(&self, resource_path: &str) -> io::Result<Option<Vec<u8>>> {
        if let Some(parent) = &self.parent {
            if let Some(bytes) = parent.resource_bytes(resource_path)? {
                return Ok(Some(bytes));
            }
        }
        self.local_resource_bytes(resource_path)
    }

    fn find_loaded(&self, _type_name: &str) -> Option<Arc<dyn LoadedType>> {
        None
    }

    fn force_load(&self, _type_name: &str) -> Option<Arc<dyn LoadedType>> {
        None
    }

    fn describe(&self) -> String {
        self.name.clone()
    }
}
