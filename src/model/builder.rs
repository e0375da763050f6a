//! Two-phase construction of a [`ReferenceManual`].
//!
//! Loaders accumulate symbols with the `add_*` methods, which check each
//! document on its own. [`ManualBuilder::build`] then validates the whole
//! graph (supertypes, inheritance, cross-references), derives the reverse
//! relations and the anchor index, and hands out the frozen manual.

use super::*;
use crate::error::{RefmanError, Result};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Default)]
pub struct ManualBuilder {
    functions: IndexMap<String, Function>,
    objects: IndexMap<String, Object>,
    modules: IndexMap<String, Module>,
    /// Qualified symbol name → document it was declared in.
    origins: HashMap<String, PathBuf>,
}

impl ManualBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_module(&mut self, module: Module, origin: &Path) -> Result<()> {
        check_info(&module.info, "module", origin)?;
        self.claim(&module.path(), origin)?;
        debug!(module = %module.info.name, "module declared");
        self.modules.insert(
            module.info.name.clone(),
            Module {
                functions: Vec::new(),
                objects: Vec::new(),
                ..module
            },
        );
        Ok(())
    }

    pub fn add_function(&mut self, function: Function, origin: &Path) -> Result<()> {
        check_info(&function.info, "function", origin)?;
        let path = function.path();
        check_signature(&function.signature, &path, origin)?;
        let key = function.key();
        if let Some(module) = &function.module {
            self.module_mut(module, &path, origin)?
                .functions
                .push(key.clone());
        }
        self.claim(&path, origin)?;
        debug!(function = %path, "function declared");
        self.functions.insert(key, function);
        Ok(())
    }

    pub fn add_object(&mut self, object: Object, origin: &Path) -> Result<()> {
        check_info(&object.info, "object", origin)?;
        let path = object.path();
        match (&object.module, object.kind) {
            (Some(_), ObjectKind::ModuleProvided) | (None, ObjectKind::Elementary | ObjectKind::ReturnValue) => {}
            (Some(_), kind) => {
                return Err(RefmanError::schema(
                    origin,
                    format!("module object `{}` cannot be {}", path, kind),
                ))
            }
            (None, kind) => {
                return Err(RefmanError::schema(
                    origin,
                    format!("`{}` is {} but belongs to no module", path, kind),
                ))
            }
        }
        if let Some(extends) = &object.extends {
            let (module, name) = split_qualified(extends);
            if !module.map_or(true, is_valid_name) || !is_valid_name(name) {
                return Err(RefmanError::schema(
                    origin,
                    format!("invalid supertype `{}` for `{}`", extends, path),
                ));
            }
        }
        let mut seen = HashSet::new();
        for method in &object.methods {
            check_info(&method.info, "method", origin)?;
            let method_path = object.method_path(method);
            if !seen.insert(method.info.name.as_str()) {
                return Err(RefmanError::schema(
                    origin,
                    format!("duplicate method `{}`", method_path),
                ));
            }
            check_signature(&method.signature, &method_path, origin)?;
        }

        let key = object.key();
        if let Some(module) = &object.module {
            self.module_mut(module, &path, origin)?
                .objects
                .push(key.clone());
        }
        self.claim(&path, origin)?;
        for method in &object.methods {
            self.origins
                .insert(object.method_path(method).to_string(), origin.to_path_buf());
        }
        debug!(object = %path, methods = object.methods.len(), "object declared");
        self.objects.insert(key, object);
        Ok(())
    }

    /// Validate the accumulated symbols and freeze them.
    pub fn build(mut self) -> Result<ReferenceManual> {
        self.resolve_supertypes()?;
        let ancestors = self.ancestor_chains()?;
        self.link_subtypes();
        self.inherit_arguments()?;
        let anchors = self.anchor_index();
        self.check_cross_references(&anchors)?;
        self.link_return_types();
        self.propagate_lifecycles();

        info!(
            functions = self.functions.len(),
            objects = self.objects.len(),
            modules = self.modules.len(),
            anchors = anchors.len(),
            "reference manual frozen"
        );

        Ok(ReferenceManual {
            functions: self.functions,
            objects: self.objects,
            modules: self.modules,
            ancestors,
            anchors,
        })
    }

    fn claim(&mut self, path: &SymbolPath, origin: &Path) -> Result<()> {
        let name = path.to_string();
        if let Some(first) = self.origins.get(&name) {
            return Err(RefmanError::schema(
                origin,
                format!(
                    "duplicate {} `{}` (first declared in {})",
                    path.kind,
                    name,
                    first.display()
                ),
            ));
        }
        self.origins.insert(name, origin.to_path_buf());
        Ok(())
    }

    fn module_mut(&mut self, name: &str, symbol: &SymbolPath, origin: &Path) -> Result<&mut Module> {
        self.modules
            .get_mut(name)
            .ok_or_else(|| RefmanError::Reference {
                file: origin.to_path_buf(),
                symbol: symbol.to_string(),
                target: SymbolPath::module(name).to_string(),
            })
    }

    fn origin(&self, path: &SymbolPath) -> PathBuf {
        self.origins.get(&path.to_string()).cloned().unwrap_or_default()
    }

    fn exists(&self, path: &SymbolPath) -> bool {
        match path.kind {
            SymbolKind::Function => path
                .function_key()
                .is_some_and(|key| self.functions.contains_key(&key)),
            SymbolKind::Object => path
                .object_key()
                .is_some_and(|key| self.objects.contains_key(&key)),
            SymbolKind::Method => path
                .object_key()
                .and_then(|key| self.objects.get(&key))
                .is_some_and(|object| object.method(&path.name).is_some()),
            SymbolKind::Module => self.modules.contains_key(&path.name),
        }
    }

    fn resolve_supertypes(&mut self) -> Result<()> {
        let mut resolved = Vec::new();
        for (key, object) in &self.objects {
            let Some(raw) = &object.extends else { continue };
            let target = find_object_key(&self.objects, raw, object.module.as_deref())
                .ok_or_else(|| RefmanError::Reference {
                    file: self.origin(&object.path()),
                    symbol: object.path().to_string(),
                    target: format!("@{}", raw),
                })?;
            resolved.push((key.clone(), target.to_string()));
        }
        for (key, target) in resolved {
            if let Some(object) = self.objects.get_mut(&key) {
                object.extends = Some(target);
            }
        }
        Ok(())
    }

    /// Walk every supertype chain once, memoizing resolved chains.
    fn ancestor_chains(&self) -> Result<IndexMap<String, Vec<String>>> {
        let mut chains: IndexMap<String, Vec<String>> = IndexMap::new();

        for start in self.objects.keys() {
            if chains.contains_key(start) {
                continue;
            }
            let mut walk: Vec<&str> = Vec::new();
            let mut visited: HashSet<&str> = HashSet::new();
            let mut current = start.as_str();
            loop {
                if !visited.insert(current) {
                    let pos = walk.iter().position(|k| *k == current).unwrap_or(0);
                    let mut chain: Vec<String> =
                        walk[pos..].iter().map(|k| format!("@{}", k)).collect();
                    chain.push(format!("@{}", current));
                    let (module, name) = split_qualified(current);
                    return Err(RefmanError::Cycle {
                        file: self.origin(&SymbolPath::object(module, name)),
                        relation: "supertype",
                        chain,
                    });
                }
                walk.push(current);
                if chains.contains_key(current) {
                    break;
                }
                match self.objects.get(current).and_then(|o| o.extends.as_deref()) {
                    Some(parent) => current = parent,
                    None => break,
                }
            }

            // The last element is either a root or already resolved.
            let last = walk.len() - 1;
            let mut ancestors = chains.get(walk[last]).cloned().unwrap_or_default();
            chains
                .entry(walk[last].to_string())
                .or_insert_with(|| ancestors.clone());
            for i in (0..last).rev() {
                ancestors.insert(0, walk[i + 1].to_string());
                chains.insert(walk[i].to_string(), ancestors.clone());
            }
        }

        Ok(self
            .objects
            .keys()
            .map(|key| (key.clone(), chains.get(key).cloned().unwrap_or_default()))
            .collect())
    }

    fn link_subtypes(&mut self) {
        let pairs: Vec<(String, String)> = self
            .objects
            .iter()
            .filter_map(|(key, o)| o.extends.clone().map(|parent| (parent, key.clone())))
            .collect();
        for (parent, child) in pairs {
            if let Some(object) = self.objects.get_mut(&parent) {
                object.extended_by.push(child);
            }
        }
    }

    fn inherit_arguments(&mut self) -> Result<()> {
        let mut raw: IndexMap<String, Signature> = IndexMap::new();
        for function in self.functions.values() {
            raw.insert(function.path().to_string(), function.signature.clone());
        }
        for object in self.objects.values() {
            for method in &object.methods {
                raw.insert(object.method_path(method).to_string(), method.signature.clone());
            }
        }
        if raw.values().all(|sig| sig.inherit.is_empty()) {
            return Ok(());
        }

        let mut memo = HashMap::new();
        for name in raw.keys() {
            resolve_signature(name, &raw, &mut memo, &mut Vec::new(), &self.origins)?;
        }

        for function in self.functions.values_mut() {
            if let Some(sig) = memo.remove(&function.path().to_string()) {
                function.signature = sig;
            }
        }
        for object in self.objects.values_mut() {
            let module = object.module.clone();
            let name = object.info.name.clone();
            for method in &mut object.methods {
                let path = SymbolPath::method(module.as_deref(), &name, &method.info.name);
                if let Some(sig) = memo.remove(&path.to_string()) {
                    method.signature = sig;
                }
            }
        }
        Ok(())
    }

    /// Every `[[target]]` must name an existing symbol, and text that is
    /// rendered may only link to symbols that are rendered too.
    fn check_cross_references(&self, anchors: &IndexMap<String, Anchor>) -> Result<()> {
        let mut texts: Vec<(SymbolPath, Vec<&str>)> = Vec::new();
        for function in self.functions.values() {
            let mut t: Vec<&str> = function.info.texts().collect();
            t.extend(signature_texts(&function.signature));
            texts.push((function.path(), t));
        }
        for object in self.objects.values() {
            texts.push((object.path(), object.info.texts().collect()));
            for method in &object.methods {
                let mut t: Vec<&str> = method.info.texts().collect();
                t.extend(signature_texts(&method.signature));
                texts.push((object.method_path(method), t));
            }
        }
        for module in self.modules.values() {
            texts.push((module.path(), module.info.texts().collect()));
        }

        for (symbol, chunks) in texts {
            for chunk in chunks {
                for target in xref::references(chunk) {
                    let path: SymbolPath = target.parse().map_err(|e| {
                        RefmanError::schema(&self.origin(&symbol), format!("{} in `{}`", e, symbol))
                    })?;
                    if !self.exists(&path) {
                        return Err(RefmanError::Reference {
                            file: self.origin(&symbol),
                            symbol: symbol.to_string(),
                            target,
                        });
                    }
                    if anchors.contains_key(&symbol.to_string())
                        && !anchors.contains_key(&path.to_string())
                    {
                        return Err(RefmanError::HiddenReference {
                            file: self.origin(&symbol),
                            symbol: symbol.to_string(),
                            target,
                        });
                    }
                }
            }
        }
        Ok(())
    }

    fn link_return_types(&mut self) {
        let mut links: Vec<(String, String)> = Vec::new();
        for function in self.functions.values() {
            for name in function.signature.returns.names() {
                if let Some(key) = find_object_key(&self.objects, name, function.module.as_deref()) {
                    links.push((key.to_string(), function.path().to_string()));
                }
            }
        }
        for object in self.objects.values() {
            for method in &object.methods {
                for name in method.signature.returns.names() {
                    if let Some(key) = find_object_key(&self.objects, name, object.module.as_deref()) {
                        links.push((key.to_string(), object.method_path(method).to_string()));
                    }
                }
            }
        }
        for (key, returner) in links {
            if let Some(object) = self.objects.get_mut(&key) {
                if !object.returned_by.contains(&returner) {
                    object.returned_by.push(returner);
                }
            }
        }
    }

    fn propagate_lifecycles(&mut self) {
        for module in self.modules.values_mut() {
            module.info.effective = module.info.lifecycle();
        }
        let modules = &self.modules;
        let owner = |module: &Option<String>| {
            module
                .as_ref()
                .and_then(|m| modules.get(m))
                .map(|m| m.info.effective.clone())
                .unwrap_or_default()
        };
        for function in self.functions.values_mut() {
            function.info.effective = function.info.lifecycle().within(&owner(&function.module));
        }
        for object in self.objects.values_mut() {
            let effective = object.info.lifecycle().within(&owner(&object.module));
            for method in &mut object.methods {
                method.info.effective = method.info.lifecycle().within(&effective);
            }
            object.info.effective = effective;
        }
    }

    /// Anchors of every visible symbol: top-level functions, top-level
    /// objects with their methods, then each module with its members.
    fn anchor_index(&self) -> IndexMap<String, Anchor> {
        fn add(anchors: &mut IndexMap<String, Anchor>, path: SymbolPath) {
            anchors.insert(path.to_string(), path.anchor());
        }
        fn add_object(anchors: &mut IndexMap<String, Anchor>, object: &Object) {
            if object.info.hidden {
                return;
            }
            add(anchors, object.path());
            for method in object.methods.iter().filter(|m| !m.info.hidden) {
                add(anchors, object.method_path(method));
            }
        }

        let mut anchors = IndexMap::new();
        for function in self.functions.values() {
            if function.module.is_none() && !function.info.hidden {
                add(&mut anchors, function.path());
            }
        }
        for object in self.objects.values().filter(|o| o.module.is_none()) {
            add_object(&mut anchors, object);
        }
        for module in self.modules.values().filter(|m| !m.info.hidden) {
            add(&mut anchors, module.path());
            for function in module.functions.iter().filter_map(|k| self.functions.get(k)) {
                if !function.info.hidden {
                    add(&mut anchors, function.path());
                }
            }
            for object in module.objects.iter().filter_map(|k| self.objects.get(k)) {
                add_object(&mut anchors, object);
            }
        }
        anchors
    }
}

fn check_info(info: &SymbolInfo, what: &str, origin: &Path) -> Result<()> {
    if !is_valid_name(&info.name) {
        return Err(RefmanError::schema(
            origin,
            format!("invalid {} name `{}`", what, info.name),
        ));
    }
    if info.summary.trim().is_empty() {
        return Err(RefmanError::schema(
            origin,
            format!("{} `{}` has an empty summary", what, info.name),
        ));
    }
    Ok(())
}

fn check_signature(sig: &Signature, symbol: &SymbolPath, origin: &Path) -> Result<()> {
    let fail = |message: String| Err(RefmanError::schema(origin, format!("{}: {}", symbol, message)));

    let mut names = HashSet::new();
    for arg in sig.arguments() {
        if !is_valid_name(&arg.name) {
            return fail(format!("invalid argument name `{}`", arg.name));
        }
        if !names.insert(arg.name.as_str()) {
            return fail(format!("duplicate argument `{}`", arg.name));
        }
        if arg.required && arg.default.is_some() {
            return fail(format!("argument `{}` is required but has a default", arg.name));
        }
    }
    let mut optional_seen = false;
    for arg in &sig.posargs {
        if !arg.required {
            optional_seen = true;
        } else if optional_seen {
            return fail(format!(
                "required positional argument `{}` follows an optional one",
                arg.name
            ));
        }
    }
    if let Some(varargs) = &sig.varargs {
        if let (Some(min), Some(max)) = (varargs.min, varargs.max) {
            if min > max {
                return fail(format!("varargs bounds {}..{} are inverted", min, max));
            }
        }
    }
    if sig.inherit.posargs.is_some() && !sig.posargs.is_empty() {
        return fail("declares both posargs and posargs_inherit".to_string());
    }
    if sig.inherit.varargs.is_some() && sig.varargs.is_some() {
        return fail("declares both varargs and varargs_inherit".to_string());
    }
    if let Some(bad) = sig
        .inherit
        .targets()
        .find(|t| t.parse::<SymbolPath>().is_err())
    {
        return fail(format!("malformed inheritance target `{}`", bad));
    }
    Ok(())
}

fn signature_texts(sig: &Signature) -> impl Iterator<Item = &str> {
    sig.returns_description
        .iter()
        .map(String::as_str)
        .chain(sig.arguments().map(|a| a.description.as_str()))
}

/// Resolve inherited arguments of `name`, following inheritance targets
/// depth-first. `visiting` holds the current inheritance path.
fn resolve_signature(
    name: &str,
    raw: &IndexMap<String, Signature>,
    memo: &mut HashMap<String, Signature>,
    visiting: &mut Vec<String>,
    origins: &HashMap<String, PathBuf>,
) -> Result<Signature> {
    if let Some(sig) = memo.get(name) {
        return Ok(sig.clone());
    }
    if let Some(pos) = visiting.iter().position(|n| n == name) {
        let mut chain = visiting[pos..].to_vec();
        chain.push(name.to_string());
        return Err(RefmanError::Cycle {
            file: origins.get(name).cloned().unwrap_or_default(),
            relation: "argument inheritance",
            chain,
        });
    }
    let mut sig = raw.get(name).cloned().unwrap_or_default();
    let inherit = sig.inherit.clone();

    visiting.push(name.to_string());
    if let Some(target) = &inherit.posargs {
        sig.posargs = resolve_target(name, target, raw, memo, visiting, origins)?.posargs;
    }
    if let Some(target) = &inherit.varargs {
        sig.varargs = resolve_target(name, target, raw, memo, visiting, origins)?.varargs;
    }
    for target in &inherit.kwargs {
        let parent = resolve_target(name, target, raw, memo, visiting, origins)?;
        for (key, arg) in parent.kwargs {
            sig.kwargs.entry(key).or_insert(arg);
        }
    }
    visiting.pop();

    memo.insert(name.to_string(), sig.clone());
    Ok(sig)
}

fn resolve_target(
    owner: &str,
    target: &str,
    raw: &IndexMap<String, Signature>,
    memo: &mut HashMap<String, Signature>,
    visiting: &mut Vec<String>,
    origins: &HashMap<String, PathBuf>,
) -> Result<Signature> {
    let key = target
        .parse::<SymbolPath>()
        .ok()
        .filter(|p| matches!(p.kind, SymbolKind::Function | SymbolKind::Method))
        .map(|p| p.to_string())
        .filter(|k| raw.contains_key(k));
    match key {
        Some(key) => resolve_signature(&key, raw, memo, visiting, origins),
        None => Err(RefmanError::Reference {
            file: origins.get(owner).cloned().unwrap_or_default(),
            symbol: owner.to_string(),
            target: target.to_string(),
        }),
    }
}
