//! Collects the packages an attribute tree references and assembles a
//! collision-free import block.

use crate::error::{CodegenError, Result};
use crate::expr::{Attribute, DataType, join_import_path};
use crate::naming::package_alias;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// A single import line. `name` is the alias; the collector leaves it unset
/// unless type-location metadata supplied one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ImportSpec {
    pub path: String,
    pub name: Option<String>,
}

impl ImportSpec {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: None,
        }
    }

    pub fn named(path: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: Some(name.into()),
        }
    }
}

/// Walks `attribute` and returns every package needed to name its types, in
/// first-seen order. Located user types contribute their override; other
/// user types contribute the generated package of their owning service under
/// `root`. Types declared locally (no service) contribute nothing.
pub fn collect_imports(attribute: &Attribute, root: &str) -> Vec<ImportSpec> {
    let mut collector = ImportCollector {
        root,
        visited: HashSet::new(),
        seen: HashSet::new(),
        specs: Vec::new(),
    };
    collector.walk(attribute);
    collector.specs
}

struct ImportCollector<'a> {
    root: &'a str,
    visited: HashSet<String>,
    seen: HashSet<ImportSpec>,
    specs: Vec<ImportSpec>,
}

impl ImportCollector<'_> {
    fn push(&mut self, spec: ImportSpec) {
        if self.seen.insert(spec.clone()) {
            self.specs.push(spec);
        }
    }

    fn walk(&mut self, attribute: &Attribute) {
        match &attribute.ty {
            None | Some(DataType::Primitive(_)) => {}
            Some(DataType::Object(fields)) | Some(DataType::Union(fields)) => {
                for field in fields {
                    self.walk(&field.attribute);
                }
            }
            Some(DataType::Array(element)) => self.walk(element),
            Some(DataType::Map(key, value)) => {
                self.walk(key);
                self.walk(value);
            }
            Some(DataType::User(ut)) => {
                if !self.visited.insert(ut.name.clone()) {
                    return;
                }
                if let Some(location) = &ut.location {
                    self.push(ImportSpec::named(
                        location.package_path.clone(),
                        location.package_name.clone(),
                    ));
                } else if let Some(service) = &ut.service {
                    self.push(ImportSpec::new(join_import_path(self.root, service)));
                }
                let body = ut.attribute.borrow();
                self.walk(&body);
            }
        }
    }
}

/// Pending imports keyed by path, kept sorted so alias assignment is
/// deterministic. Every explicit alias recorded for a path is kept: Go
/// accepts one path imported under several names, and bodies may spell any
/// of them. An unaliased request is covered by any explicit alias.
#[derive(Debug, Default, Clone)]
pub struct PendingImports {
    entries: BTreeMap<String, BTreeSet<String>>,
}

impl PendingImports {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, spec: ImportSpec) {
        let aliases = self.entries.entry(spec.path).or_default();
        if let Some(name) = spec.name {
            aliases.insert(name);
        }
    }

    pub fn extend(&mut self, specs: impl IntoIterator<Item = ImportSpec>) {
        for spec in specs {
            self.add(spec);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Assigns aliases so that every import in the block has a unique one.
#[derive(Debug, Default)]
pub struct ImportBlock {
    specs: Vec<ImportSpec>,
    aliases: HashMap<String, String>,
}

impl ImportBlock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a pre-assigned alias. Claiming an alias another path already
    /// holds is a generator bug.
    pub fn add_named(&mut self, path: &str, alias: &str) -> Result<()> {
        self.reserve(path, alias)?;
        let spec = ImportSpec::named(path, alias);
        if !self.specs.contains(&spec) {
            self.specs.push(spec);
        }
        Ok(())
    }

    /// Adds `path` under an alias derived from its last segment, suffixed
    /// with a counter from 2 on collision. Returns the alias in use.
    pub fn add(&mut self, path: &str) -> String {
        if let Some(alias) = self.alias_of(path) {
            return alias;
        }
        let base = package_alias(path.rsplit('/').next().unwrap_or(path));
        let mut alias = base.clone();
        let mut counter = 2;
        while self.aliases.contains_key(&alias) {
            alias = format!("{base}{counter}");
            counter += 1;
        }
        self.aliases.insert(alias.clone(), path.to_string());
        self.specs.push(ImportSpec::named(path, alias.clone()));
        alias
    }

    /// First alias `path` was imported under.
    pub fn alias_of(&self, path: &str) -> Option<String> {
        self.specs
            .iter()
            .find(|spec| spec.path == path)
            .and_then(|spec| spec.name.clone())
    }

    pub fn into_specs(self) -> Vec<ImportSpec> {
        self.specs
    }

    fn reserve(&mut self, path: &str, alias: &str) -> Result<()> {
        match self.aliases.get(alias) {
            Some(existing) if existing != path => Err(CodegenError::ImportAliasCollision {
                alias: alias.to_string(),
                existing: existing.clone(),
                path: path.to_string(),
            }),
            Some(_) => Ok(()),
            None => {
                self.aliases.insert(alias.to_string(), path.to_string());
                Ok(())
            }
        }
    }
}

/// Builds the final import block: `first` leads, the pending imports follow
/// in path order. An unaliased request for `first.path` is already covered.
/// Explicit aliases are reserved before any alias is derived so a derived
/// alias never steals one.
pub fn assemble_imports(first: ImportSpec, pending: &PendingImports) -> Result<Vec<ImportSpec>> {
    let mut block = ImportBlock::new();
    match &first.name {
        Some(alias) => block.add_named(&first.path, alias)?,
        None => {
            block.add(&first.path);
        }
    }

    let rest = pending
        .entries
        .iter()
        .filter(|(path, aliases)| **path != first.path || !aliases.is_empty());

    for (path, aliases) in rest.clone() {
        for alias in aliases {
            block.reserve(path, alias)?;
        }
    }
    for (path, aliases) in rest {
        if aliases.is_empty() {
            block.add(path);
        }
        for alias in aliases {
            block.add_named(path, alias)?;
        }
    }
    Ok(block.into_specs())
}
