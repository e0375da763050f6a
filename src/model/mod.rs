//! Reference-manual data model, shared by every backend.
//!
//! A [`ReferenceManual`] is produced once per run by a loader through
//! [`ManualBuilder`] and is read-only from then on. Every generator borrows
//! it immutably.

mod builder;
mod path;
mod types;
mod version;
pub mod xref;

pub use builder::ManualBuilder;
pub use path::{
    is_valid_name, qualify, split_qualified, Anchor, SymbolKind, SymbolPath, MANUAL_PAGE,
};
pub use types::TypeExpr;
pub use version::{Lifecycle, Version};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Fields every documented symbol carries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SymbolInfo {
    pub name: String,
    /// One-line summary.
    pub summary: String,
    /// Long description; may contain `[[target]]` cross-references.
    pub description: String,
    pub since: Option<Version>,
    pub deprecated: Option<Version>,
    pub example: Option<String>,
    pub notes: Vec<String>,
    pub warnings: Vec<String>,
    /// Kept for validation, never rendered.
    pub hidden: bool,
    /// Own lifecycle combined with the lifecycles of all owners.
    /// Filled in when the manual is frozen.
    pub effective: Lifecycle,
}

impl SymbolInfo {
    pub fn lifecycle(&self) -> Lifecycle {
        Lifecycle::new(self.since.clone(), self.deprecated.clone())
    }

    /// All free text that may hold cross-references.
    fn texts(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.summary.as_str())
            .chain(std::iter::once(self.description.as_str()))
            .chain(self.notes.iter().map(String::as_str))
            .chain(self.warnings.iter().map(String::as_str))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Argument {
    pub name: String,
    pub ty: TypeExpr,
    pub required: bool,
    pub default: Option<String>,
    pub description: String,
    pub since: Option<Version>,
    pub deprecated: Option<Version>,
}

impl Argument {
    fn parameter(&self) -> String {
        match (&self.default, self.required) {
            (Some(default), _) => format!("{}: {} = {}", self.name, self.ty, default),
            (None, true) => format!("{}: {}", self.name, self.ty),
            (None, false) => format!("{}?: {}", self.name, self.ty),
        }
    }
}

/// A variadic argument together with its arity bounds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VarArgument {
    pub argument: Argument,
    pub min: Option<u32>,
    pub max: Option<u32>,
}

/// Functions and methods whose arguments are copied into a signature.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArgumentInherit {
    pub posargs: Option<String>,
    pub varargs: Option<String>,
    pub kwargs: Vec<String>,
}

impl ArgumentInherit {
    pub fn is_empty(&self) -> bool {
        self.posargs.is_none() && self.varargs.is_none() && self.kwargs.is_empty()
    }

    fn targets(&self) -> impl Iterator<Item = &str> {
        self.posargs
            .iter()
            .chain(self.varargs.iter())
            .chain(self.kwargs.iter())
            .map(String::as_str)
    }
}

/// Calling convention shared by functions and methods.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Signature {
    pub returns: TypeExpr,
    pub returns_description: Option<String>,
    /// Positional arguments in declaration order; optional ones last.
    pub posargs: Vec<Argument>,
    pub varargs: Option<VarArgument>,
    pub kwargs: IndexMap<String, Argument>,
    pub inherit: ArgumentInherit,
}

impl Signature {
    /// Parameters as written in a signature line: `bar: str`,
    /// `opt?: bool`, `mode: str = 'auto'`, `*sources: file`. A bare `*`
    /// separates keyword arguments when there are no varargs.
    pub fn parameters(&self) -> Vec<String> {
        let mut params: Vec<String> = self.posargs.iter().map(Argument::parameter).collect();
        match &self.varargs {
            Some(v) => params.push(format!("*{}: {}", v.argument.name, v.argument.ty)),
            None if !self.kwargs.is_empty() => params.push("*".to_string()),
            None => {}
        }
        params.extend(self.kwargs.values().map(Argument::parameter));
        params
    }

    /// One-line form: `name(bar: str) -> int`.
    pub fn render(&self, name: &str) -> String {
        format!("{}({}) -> {}", name, self.parameters().join(", "), self.returns)
    }

    fn arguments(&self) -> impl Iterator<Item = &Argument> {
        self.posargs
            .iter()
            .chain(self.varargs.iter().map(|v| &v.argument))
            .chain(self.kwargs.values())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Function {
    pub info: SymbolInfo,
    pub module: Option<String>,
    pub signature: Signature,
}

impl Function {
    pub fn key(&self) -> String {
        qualify(self.module.as_deref(), &self.info.name)
    }

    pub fn path(&self) -> SymbolPath {
        SymbolPath::function(self.module.as_deref(), &self.info.name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Method {
    pub info: SymbolInfo,
    pub signature: Signature,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectKind {
    #[default]
    Elementary,
    ModuleProvided,
    ReturnValue,
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ObjectKind::Elementary => "elementary",
            ObjectKind::ModuleProvided => "module-provided",
            ObjectKind::ReturnValue => "return-value",
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Object {
    pub info: SymbolInfo,
    pub kind: ObjectKind,
    pub module: Option<String>,
    /// Supertype as written by the author; resolved to an object key on freeze.
    pub extends: Option<String>,
    pub methods: Vec<Method>,
    /// Qualified names of functions and methods returning this object.
    pub returned_by: Vec<String>,
    /// Keys of direct subtypes.
    pub extended_by: Vec<String>,
}

impl Object {
    pub fn key(&self) -> String {
        qualify(self.module.as_deref(), &self.info.name)
    }

    pub fn path(&self) -> SymbolPath {
        SymbolPath::object(self.module.as_deref(), &self.info.name)
    }

    pub fn method(&self, name: &str) -> Option<&Method> {
        self.methods.iter().find(|m| m.info.name == name)
    }

    pub fn method_path(&self, method: &Method) -> SymbolPath {
        SymbolPath::method(self.module.as_deref(), &self.info.name, &method.info.name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub info: SymbolInfo,
    /// Function keys in declaration order.
    pub functions: Vec<String>,
    /// Object keys in declaration order.
    pub objects: Vec<String>,
}

impl Module {
    pub fn path(&self) -> SymbolPath {
        SymbolPath::module(&self.info.name)
    }
}

/// A symbol looked up by path.
#[derive(Debug, Clone, Copy)]
pub enum SymbolRef<'a> {
    Function(&'a Function),
    Method(&'a Object, &'a Method),
    Object(&'a Object),
    Module(&'a Module),
}

impl<'a> SymbolRef<'a> {
    pub fn info(&self) -> &'a SymbolInfo {
        match *self {
            SymbolRef::Function(f) => &f.info,
            SymbolRef::Method(_, m) => &m.info,
            SymbolRef::Object(o) => &o.info,
            SymbolRef::Module(m) => &m.info,
        }
    }
}

/// The frozen model root.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReferenceManual {
    functions: IndexMap<String, Function>,
    objects: IndexMap<String, Object>,
    modules: IndexMap<String, Module>,
    /// Object key → resolved ancestor keys, nearest first.
    ancestors: IndexMap<String, Vec<String>>,
    /// Qualified name → anchor, for every visible symbol, in manual order.
    anchors: IndexMap<String, Anchor>,
}

impl ReferenceManual {
    pub fn functions(&self) -> impl Iterator<Item = &Function> {
        self.functions.values()
    }

    pub fn objects(&self) -> impl Iterator<Item = &Object> {
        self.objects.values()
    }

    pub fn modules(&self) -> impl Iterator<Item = &Module> {
        self.modules.values()
    }

    pub fn function(&self, key: &str) -> Option<&Function> {
        self.functions.get(key)
    }

    pub fn object(&self, key: &str) -> Option<&Object> {
        self.objects.get(key)
    }

    pub fn module(&self, name: &str) -> Option<&Module> {
        self.modules.get(name)
    }

    pub fn top_level_functions(&self) -> impl Iterator<Item = &Function> {
        self.functions().filter(|f| f.module.is_none())
    }

    pub fn top_level_objects(&self) -> impl Iterator<Item = &Object> {
        self.objects().filter(|o| o.module.is_none())
    }

    /// Resolved supertype chain of an object, nearest ancestor first.
    pub fn ancestors(&self, object_key: &str) -> &[String] {
        self.ancestors
            .get(object_key)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn lookup(&self, path: &SymbolPath) -> Option<SymbolRef<'_>> {
        match path.kind {
            SymbolKind::Function => self
                .functions
                .get(&path.function_key()?)
                .map(SymbolRef::Function),
            SymbolKind::Object => self.objects.get(&path.object_key()?).map(SymbolRef::Object),
            SymbolKind::Method => {
                let object = self.objects.get(&path.object_key()?)?;
                object
                    .method(&path.name)
                    .map(|method| SymbolRef::Method(object, method))
            }
            SymbolKind::Module => self.modules.get(&path.name).map(SymbolRef::Module),
        }
    }

    /// Anchor of a visible symbol. Hidden symbols have none.
    pub fn anchor(&self, path: &SymbolPath) -> Option<&Anchor> {
        self.anchors.get(&path.to_string())
    }

    /// Every visible symbol's qualified name and anchor, in manual order.
    pub fn anchors(&self) -> impl Iterator<Item = (&str, &Anchor)> {
        self.anchors.iter().map(|(name, anchor)| (name.as_str(), anchor))
    }

    /// Resolve a type name written inside `module` (or at top level) to an
    /// object key. Unqualified names prefer the enclosing module.
    pub fn resolve_object(&self, name: &str, module: Option<&str>) -> Option<&Object> {
        find_object_key(&self.objects, name, module).and_then(|key| self.objects.get(key))
    }
}

fn find_object_key<'a>(
    objects: &'a IndexMap<String, Object>,
    name: &str,
    module: Option<&str>,
) -> Option<&'a str> {
    let candidates = match module {
        Some(m) if !name.contains("::") => vec![qualify(Some(m), name), name.to_string()],
        _ => vec![name.to_string()],
    };
    candidates
        .iter()
        .find_map(|key| objects.get_key_value(key).map(|(k, _)| k.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arg(name: &str, ty: &str, required: bool, default: Option<&str>) -> Argument {
        Argument {
            name: name.to_string(),
            ty: ty.parse().unwrap(),
            required,
            default: default.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn one_line_signature() {
        let sig = Signature {
            returns: "int".parse().unwrap(),
            posargs: vec![arg("bar", "str", true, None)],
            ..Default::default()
        };
        assert_eq!(sig.render("foo"), "foo(bar: str) -> int");
    }

    #[test]
    fn optional_variadic_and_keyword_parameters() {
        let mut sig = Signature {
            posargs: vec![arg("name", "str", true, None), arg("opt", "bool", false, None)],
            varargs: Some(VarArgument {
                argument: arg("sources", "str | file", false, None),
                min: None,
                max: None,
            }),
            ..Default::default()
        };
        sig.kwargs
            .insert("mode".to_string(), arg("mode", "str", false, Some("'auto'")));
        assert_eq!(
            sig.render("build"),
            "build(name: str, opt?: bool, *sources: str | file, mode: str = 'auto') -> void"
        );

        sig.varargs = None;
        assert_eq!(
            sig.parameters(),
            vec!["name: str", "opt?: bool", "*", "mode: str = 'auto'"]
        );
    }

    #[test]
    fn lookup_methods_by_path() {
        let mut builder = ManualBuilder::new();
        builder
            .add_object(
                Object {
                    info: SymbolInfo {
                        name: "str".to_string(),
                        summary: "A string.".to_string(),
                        ..Default::default()
                    },
                    methods: vec![Method {
                        info: SymbolInfo {
                            name: "join".to_string(),
                            summary: "Join.".to_string(),
                            ..Default::default()
                        },
                        signature: Signature::default(),
                    }],
                    ..Default::default()
                },
                std::path::Path::new("str.yaml"),
            )
            .unwrap();
        let manual = builder.build().unwrap();

        let join = manual.lookup(&"str.join".parse().unwrap()).unwrap();
        assert_eq!(join.info().name, "join");
        assert!(manual.lookup(&"str.split".parse().unwrap()).is_none());
        assert!(manual.lookup(&"join".parse().unwrap()).is_none());
    }
}
