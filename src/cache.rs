use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Weak};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, error, warn};

use crate::error::Error;
use crate::ir::{ParsedMethod, ParsedType, JAVA_LANG_OBJECT};
use crate::loader::{DomainHandle, LoadedType, LoaderDomain, ParseContext, ReflectedType};
use crate::reader;

type TypeMap = DashMap<String, Arc<ParsedType>>;

/// One loader domain's parsed types, held through a weak key.
struct DomainSlot {
    domain: Weak<dyn LoaderDomain>,
    types: Arc<TypeMap>,
}

/// Process-wide cache of parsed types, scoped per loader domain.
///
/// Domain slots are weak-keyed so the cache puts no lifetime floor under
/// loader domains: when a domain handle is released everywhere else, its
/// slot and parsed types are dropped on the next cache access. The weak
/// reference points directly at the domain handle rather than any wrapper,
/// so reachability of the handle itself is what keeps a slot alive.
///
/// The bootstrap domain has no handle to key on; its types live in a
/// dedicated map that lasts for the process.
pub struct ParsedTypeCache {
    domain_slots: Mutex<HashMap<usize, DomainSlot>>,
    bootstrap_types: Arc<TypeMap>,
    // upper-cased name -> canonical name, for prefix search; accumulates
    // across all domains and is not pruned when a domain is collected
    type_name_uppers: RwLock<BTreeMap<String, String>>,
    // optional resource channel standing in for the bootstrap domain
    system: Option<DomainHandle>,
}

impl ParsedTypeCache {
    pub fn new() -> Self {
        Self {
            domain_slots: Mutex::new(HashMap::new()),
            bootstrap_types: Arc::new(TypeMap::new()),
            type_name_uppers: RwLock::new(BTreeMap::new()),
            system: None,
        }
    }

    /// A cache whose bootstrap-level byte access and load probes go through
    /// `system`, the way system resources back the bootstrap loader.
    pub fn with_system_domain(system: DomainHandle) -> Self {
        Self {
            system: Some(system),
            ..Self::new()
        }
    }

    /// Returns up to `limit` cached type names containing `partial`
    /// case-insensitively, ordered alphabetically by upper-cased name.
    pub fn matching_type_names(&self, partial: &str, limit: usize) -> Vec<String> {
        if limit == 0 {
            return Vec::new();
        }
        let partial_upper = partial.to_uppercase();
        let mut type_names = Vec::new();
        for (type_name_upper, type_name) in self.type_name_uppers.read().iter() {
            if type_name_upper.contains(&partial_upper) && !type_names.contains(type_name) {
                type_names.push(type_name.clone());
                if type_names.len() == limit {
                    break;
                }
            }
        }
        type_names
    }

    /// Returns up to `limit` method names declared by cached types named
    /// `type_name` and containing `partial` case-insensitively, sorted
    /// alphabetically (case-insensitive).
    pub fn matching_method_names(
        &self,
        type_name: &str,
        partial: &str,
        limit: usize,
    ) -> Vec<String> {
        let partial_upper = partial.to_uppercase();
        let mut method_names = BTreeSet::new();
        for parsed_type in self.matching_parsed_types(type_name) {
            for method in parsed_type.methods() {
                if method.name().to_uppercase().contains(&partial_upper) {
                    method_names.insert(method.name().to_string());
                }
            }
        }
        let mut sorted: Vec<String> = method_names.into_iter().collect();
        sorted.sort_by(|left, right| {
            left.to_uppercase()
                .cmp(&right.to_uppercase())
                .then_with(|| left.cmp(right))
        });
        sorted.truncate(limit);
        sorted
    }

    /// Returns the full method records named exactly `method_name` on cached
    /// types named `type_name`, in domain-iteration then declaration order.
    pub fn matching_parsed_methods(&self, type_name: &str, method_name: &str) -> Vec<ParsedMethod> {
        let mut parsed_methods = Vec::new();
        for parsed_type in self.matching_parsed_types(type_name) {
            for method in parsed_type.methods() {
                if method.name() == method_name {
                    parsed_methods.push(method.clone());
                }
            }
        }
        parsed_methods
    }

    /// Donate a type parsed elsewhere in the pipeline. The first install for
    /// a `(domain, name)` pair wins; later donations of the same name are
    /// discarded.
    pub fn add(&self, parsed_type: ParsedType, loader: Option<&DomainHandle>) {
        let types = self.types_for(loader);
        let type_name = parsed_type.name().to_string();
        install(&types, &type_name, Arc::new(parsed_type));
        self.record_type_name(&type_name);
    }

    /// Resolve one type name against a loader domain, parsing and caching on
    /// a miss.
    pub fn get_parsed_type(
        &self,
        type_name: &str,
        loader: Option<&DomainHandle>,
    ) -> Result<Arc<ParsedType>, Error> {
        self.get_or_create_parsed_type(type_name, loader)
    }

    /// Flattened depth-first walk over super-type and interface edges:
    /// the type itself, then its super chain, then its declared interfaces.
    ///
    /// The returned list may contain duplicates when an interface is
    /// reachable along more than one branch; de-duplication is skipped to
    /// keep the walk cheap, and callers tolerate it. A branch whose type
    /// cannot be resolved is simply cut; the walk itself never fails.
    pub fn type_hierarchy(
        &self,
        type_name: Option<&str>,
        loader: Option<&DomainHandle>,
        context: &ParseContext,
    ) -> Vec<Arc<ParsedType>> {
        let Some(type_name) = type_name else {
            return Vec::new();
        };
        if type_name == JAVA_LANG_OBJECT {
            return Vec::new();
        }
        self.super_types(type_name, loader, context)
    }

    fn super_types(
        &self,
        type_name: &str,
        loader: Option<&DomainHandle>,
        context: &ParseContext,
    ) -> Vec<Arc<ParsedType>> {
        let parsed_type = match self.get_or_create_parsed_type(type_name, loader) {
            Ok(parsed_type) => parsed_type,
            Err(Error::TypeNotFound(_)) => {
                // a missing ancestor is advisory only: code referencing it
                // would fail at execution anyway
                debug!("type not found '{type_name}' while weaving {context}");
                return Vec::new();
            }
            Err(err) => {
                error!("cannot resolve '{type_name}' while weaving {context}: {err}");
                return Vec::new();
            }
        };
        let mut super_types = vec![parsed_type.clone()];
        if let Some(super_name) = parsed_type.super_name() {
            super_types.extend(self.super_types(super_name, loader, context));
        }
        for interface_name in parsed_type.interface_names() {
            super_types.extend(self.super_types(interface_name, loader, context));
        }
        super_types
    }

    fn get_or_create_parsed_type(
        &self,
        type_name: &str,
        loader: Option<&DomainHandle>,
    ) -> Result<Arc<ParsedType>, Error> {
        // probe without forcing a load: a type requested on one domain may
        // have been defined by a parent, and caching it there both avoids a
        // duplicate record and gives a parsing path when the requesting
        // domain cannot produce the bytes
        let loaded = self
            .probe_domain(loader)
            .and_then(|domain| domain.find_loaded(type_name));
        let effective = match &loaded {
            Some(loaded) => loaded.defining_domain(),
            None => loader.cloned(),
        };
        let types = self.types_for(effective.as_ref());
        if let Some(existing) = types.get(type_name) {
            return Ok(existing.value().clone());
        }
        let created = self.create_parsed_type(type_name, effective.as_ref(), loaded)?;
        let installed = install(&types, type_name, created);
        self.record_type_name(type_name);
        Ok(installed)
    }

    fn create_parsed_type(
        &self,
        type_name: &str,
        domain: Option<&DomainHandle>,
        loaded: Option<Arc<dyn LoadedType>>,
    ) -> Result<Arc<ParsedType>, Error> {
        let resource_path = format!("{}.class", type_name.replace('.', "/"));
        if let Some(bytes) = self.resource_bytes(type_name, domain, &resource_path)? {
            return reader::parse_class_bytes(&bytes).map(Arc::new);
        }
        // some domains hide class bytes; fall back to the representation
        // that is already defined
        if let Some(loaded) = loaded {
            warn!(
                "no resource '{resource_path}' in loader domain '{}', synthesizing \
                 '{type_name}' from its loaded representation; the type was not woven",
                describe_domain(domain)
            );
            return Ok(Arc::new(from_reflection(type_name, loaded.reflect())));
        }
        // last resort: force a name-based, non-initializing load and reflect
        // over the result
        let Some(forced) = self
            .probe_domain(domain)
            .and_then(|domain| domain.force_load(type_name))
        else {
            return Err(Error::TypeNotFound(type_name.to_string()));
        };
        if let Some(existing) = self
            .types_for(forced.defining_domain().as_ref())
            .get(type_name)
        {
            // already parsed under its defining domain, so weaving was not
            // bypassed after all
            return Ok(existing.value().clone());
        }
        warn!(
            "no resource '{resource_path}' in loader domain '{}'; '{type_name}' was \
             loaded during weaving of a dependent type and was not woven itself",
            describe_domain(domain)
        );
        Ok(Arc::new(from_reflection(type_name, forced.reflect())))
    }

    fn resource_bytes(
        &self,
        type_name: &str,
        domain: Option<&DomainHandle>,
        resource_path: &str,
    ) -> Result<Option<Vec<u8>>, Error> {
        let Some(channel) = self.probe_domain(domain) else {
            return Ok(None);
        };
        channel
            .resource_bytes(resource_path)
            .map_err(|source| Error::ResourceIo {
                name: type_name.to_string(),
                source,
            })
    }

    /// The domain to direct probes and byte access at: the handle itself, or
    /// the system channel when the bootstrap domain is addressed.
    fn probe_domain(&self, domain: Option<&DomainHandle>) -> Option<DomainHandle> {
        domain.cloned().or_else(|| self.system.clone())
    }

    fn types_for(&self, domain: Option<&DomainHandle>) -> Arc<TypeMap> {
        let Some(domain) = domain else {
            return self.bootstrap_types.clone();
        };
        let key = Arc::as_ptr(domain) as *const () as usize;
        let mut slots = self.domain_slots.lock();
        // released domains are swept here; sweeping before the lookup also
        // keeps a reused address from ever aliasing a dead slot
        slots.retain(|_, slot| slot.domain.strong_count() > 0);
        let slot = slots.entry(key).or_insert_with(|| DomainSlot {
            domain: Arc::downgrade(domain),
            types: Arc::new(TypeMap::new()),
        });
        slot.types.clone()
    }

    /// Cached types named `type_name` across the bootstrap map and every
    /// live domain slot. Never parses.
    fn matching_parsed_types(&self, type_name: &str) -> Vec<Arc<ParsedType>> {
        let mut parsed_types = Vec::new();
        if let Some(parsed_type) = self.bootstrap_types.get(type_name) {
            parsed_types.push(parsed_type.value().clone());
        }
        let domain_types: Vec<Arc<TypeMap>> = {
            let mut slots = self.domain_slots.lock();
            slots.retain(|_, slot| slot.domain.strong_count() > 0);
            slots.values().map(|slot| slot.types.clone()).collect()
        };
        for types in domain_types {
            if let Some(parsed_type) = types.get(type_name) {
                parsed_types.push(parsed_type.value().clone());
            }
        }
        parsed_types
    }

    fn record_type_name(&self, type_name: &str) {
        self.type_name_uppers
            .write()
            .insert(type_name.to_uppercase(), type_name.to_string());
    }
}

impl Default for ParsedTypeCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Compare-and-set install: the first record in wins, so readers only ever
/// observe one parsed type per `(domain, name)`. A loser's freshly parsed
/// record is discarded.
fn install(types: &TypeMap, type_name: &str, parsed_type: Arc<ParsedType>) -> Arc<ParsedType> {
    match types.entry(type_name.to_string()) {
        Entry::Occupied(entry) => entry.get().clone(),
        Entry::Vacant(entry) => {
            entry.insert(parsed_type.clone());
            parsed_type
        }
    }
}

fn from_reflection(type_name: &str, reflected: ReflectedType) -> ParsedType {
    ParsedType::new(
        reflected.is_interface,
        type_name.to_string(),
        reflected.super_name,
        reflected.interface_names,
        reflected.methods,
    )
}

fn describe_domain(domain: Option<&DomainHandle>) -> String {
    match domain {
        Some(domain) => domain.describe(),
        None => "<bootstrap>".to_string(),
    }
}
