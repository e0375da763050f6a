//! Loader for a tree of per-symbol YAML documents.
//!
//! ```text
//! functions/*.yaml                 top-level functions
//! elementary/*.yaml                elementary objects
//! objects/*.yaml                   return-value objects
//! modules/<dir>/module.yaml        module document
//! modules/<dir>/functions/*.yaml   module functions
//! modules/<dir>/objects/*.yaml     module-provided objects
//! ```
//!
//! Files are declared in file-name order within each directory.

use crate::error::{RefmanError, Result};
use crate::loader::Loader;
use crate::model::*;
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Document extensions, in the order they are globbed.
const EXTENSIONS: &[&str] = &["yaml", "yml"];

pub struct YamlLoader {
    root: PathBuf,
    inputs: Vec<PathBuf>,
}

impl YamlLoader {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            inputs: Vec::new(),
        }
    }

    fn read<T: DeserializeOwned>(&mut self, path: &Path) -> Result<T> {
        let content = fs::read_to_string(path).map_err(|e| RefmanError::io(path, e))?;
        self.inputs.push(path.to_path_buf());
        debug!(file = %path.display(), "parsing description");
        serde_yaml::from_str(&content).map_err(|e| RefmanError::schema(path, e.to_string()))
    }

    fn load_functions(
        &mut self,
        builder: &mut ManualBuilder,
        dir: &Path,
        module: Option<&str>,
    ) -> Result<()> {
        for path in documents(dir)? {
            let doc: CallableDoc = self.read(&path)?;
            let (info, signature) = doc.into_parts(&path)?;
            let function = Function {
                info,
                module: module.map(str::to_string),
                signature,
            };
            builder.add_function(function, &path)?;
        }
        Ok(())
    }

    fn load_objects(
        &mut self,
        builder: &mut ManualBuilder,
        dir: &Path,
        kind: ObjectKind,
        module: Option<&str>,
    ) -> Result<()> {
        for path in documents(dir)? {
            let doc: ObjectDoc = self.read(&path)?;
            let object = doc.into_object(kind, module, &path)?;
            builder.add_object(object, &path)?;
        }
        Ok(())
    }

    fn load_module(&mut self, builder: &mut ManualBuilder, dir: &Path) -> Result<()> {
        let path = dir.join("module.yaml");
        if !path.is_file() {
            return Err(RefmanError::schema(dir, "module directory without module.yaml"));
        }
        let doc: ModuleDoc = self.read(&path)?;
        let module = doc.into_module();
        let name = module.info.name.clone();
        builder.add_module(module, &path)?;

        self.load_functions(builder, &dir.join("functions"), Some(&name))?;
        self.load_objects(
            builder,
            &dir.join("objects"),
            ObjectKind::ModuleProvided,
            Some(&name),
        )
    }
}

impl Loader for YamlLoader {
    fn load(&mut self) -> Result<ReferenceManual> {
        if !self.root.is_dir() {
            return Err(RefmanError::io(
                &self.root,
                io::Error::new(io::ErrorKind::NotFound, "description directory not found"),
            ));
        }
        self.inputs.clear();
        let root = self.root.clone();
        let mut builder = ManualBuilder::new();

        self.load_functions(&mut builder, &root.join("functions"), None)?;
        self.load_objects(&mut builder, &root.join("elementary"), ObjectKind::Elementary, None)?;
        self.load_objects(&mut builder, &root.join("objects"), ObjectKind::ReturnValue, None)?;
        for dir in subdirectories(&root.join("modules"))? {
            self.load_module(&mut builder, &dir)?;
        }

        if self.inputs.is_empty() {
            warn!(root = %root.display(), "no description documents found");
        }
        info!(documents = self.inputs.len(), root = %root.display(), "descriptions loaded");
        builder.build()
    }

    fn input_files(&self) -> &[PathBuf] {
        &self.inputs
    }
}

/// Documents directly inside `dir`, sorted by file name. A missing
/// directory holds no documents.
fn documents(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let base = glob::Pattern::escape(&dir.to_string_lossy());
    let mut files = Vec::new();
    for ext in EXTENSIONS {
        let pattern = format!("{}/*.{}", base, ext);
        let matches = glob::glob(&pattern)
            .map_err(|e| RefmanError::schema(dir, format!("invalid glob pattern: {}", e)))?;
        files.extend(matches.filter_map(|r| r.ok()).filter(|p| p.is_file()));
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

fn subdirectories(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let entries = fs::read_dir(dir).map_err(|e| RefmanError::io(dir, e))?;
    let mut dirs: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|p| p.is_dir())
        .collect();
    dirs.sort();
    Ok(dirs)
}

// -- Document shapes ----------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CallableDoc {
    name: String,
    summary: String,
    #[serde(default)]
    description: String,
    since: Option<Version>,
    deprecated: Option<Version>,
    example: Option<String>,
    #[serde(default)]
    notes: Vec<String>,
    #[serde(default)]
    warnings: Vec<String>,
    #[serde(default)]
    hidden: bool,
    returns: TypeExpr,
    returns_description: Option<String>,
    #[serde(default)]
    posargs: IndexMap<String, ArgDoc>,
    #[serde(default)]
    optargs: IndexMap<String, ArgDoc>,
    varargs: Option<VarargsDoc>,
    #[serde(default)]
    kwargs: IndexMap<String, ArgDoc>,
    posargs_inherit: Option<String>,
    varargs_inherit: Option<String>,
    #[serde(default)]
    kwargs_inherit: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ArgDoc {
    #[serde(rename = "type")]
    ty: TypeExpr,
    #[serde(default)]
    description: String,
    required: Option<bool>,
    default: Option<serde_yaml::Value>,
    since: Option<Version>,
    deprecated: Option<Version>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct VarargsDoc {
    name: String,
    #[serde(rename = "type")]
    ty: TypeExpr,
    #[serde(default)]
    description: String,
    min_varargs: Option<u32>,
    max_varargs: Option<u32>,
    since: Option<Version>,
    deprecated: Option<Version>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ObjectDoc {
    name: String,
    summary: String,
    #[serde(default)]
    description: String,
    since: Option<Version>,
    deprecated: Option<Version>,
    example: Option<String>,
    #[serde(default)]
    notes: Vec<String>,
    #[serde(default)]
    warnings: Vec<String>,
    #[serde(default)]
    hidden: bool,
    extends: Option<String>,
    #[serde(default)]
    methods: Vec<CallableDoc>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ModuleDoc {
    name: String,
    summary: String,
    #[serde(default)]
    description: String,
    since: Option<Version>,
    deprecated: Option<Version>,
    #[serde(default)]
    notes: Vec<String>,
    #[serde(default)]
    warnings: Vec<String>,
    #[serde(default)]
    hidden: bool,
}

impl CallableDoc {
    fn into_parts(self, file: &Path) -> Result<(SymbolInfo, Signature)> {
        let mut posargs = Vec::with_capacity(self.posargs.len() + self.optargs.len());
        for (name, arg) in self.posargs {
            let required = arg.required.unwrap_or(true);
            posargs.push(arg.into_argument(name, required));
        }
        for (name, arg) in self.optargs {
            if arg.required == Some(true) {
                return Err(RefmanError::schema(
                    file,
                    format!("{}: optional argument `{}` marked required", self.name, name),
                ));
            }
            posargs.push(arg.into_argument(name, false));
        }
        let kwargs = self
            .kwargs
            .into_iter()
            .map(|(name, arg)| {
                let required = arg.required.unwrap_or(false);
                (name.clone(), arg.into_argument(name, required))
            })
            .collect();
        let varargs = self.varargs.map(|v| VarArgument {
            argument: Argument {
                name: v.name,
                ty: v.ty,
                required: v.min_varargs.is_some_and(|min| min > 0),
                default: None,
                description: v.description,
                since: v.since,
                deprecated: v.deprecated,
            },
            min: v.min_varargs,
            max: v.max_varargs,
        });

        let info = SymbolInfo {
            name: self.name,
            summary: self.summary,
            description: self.description,
            since: self.since,
            deprecated: self.deprecated,
            example: self.example,
            notes: self.notes,
            warnings: self.warnings,
            hidden: self.hidden,
            effective: Lifecycle::default(),
        };
        let signature = Signature {
            returns: self.returns,
            returns_description: self.returns_description,
            posargs,
            varargs,
            kwargs,
            inherit: ArgumentInherit {
                posargs: self.posargs_inherit,
                varargs: self.varargs_inherit,
                kwargs: self.kwargs_inherit,
            },
        };
        Ok((info, signature))
    }
}

impl ArgDoc {
    fn into_argument(self, name: String, required: bool) -> Argument {
        Argument {
            name,
            ty: self.ty,
            required,
            default: self.default.map(|value| scalar_text(&value)),
            description: self.description,
            since: self.since,
            deprecated: self.deprecated,
        }
    }
}

impl ObjectDoc {
    fn into_object(self, kind: ObjectKind, module: Option<&str>, file: &Path) -> Result<Object> {
        let methods = self
            .methods
            .into_iter()
            .map(|doc| doc.into_parts(file).map(|(info, signature)| Method { info, signature }))
            .collect::<Result<Vec<_>>>()?;
        Ok(Object {
            info: SymbolInfo {
                name: self.name,
                summary: self.summary,
                description: self.description,
                since: self.since,
                deprecated: self.deprecated,
                example: self.example,
                notes: self.notes,
                warnings: self.warnings,
                hidden: self.hidden,
                effective: Lifecycle::default(),
            },
            kind,
            module: module.map(str::to_string),
            extends: self.extends,
            methods,
            returned_by: Vec::new(),
            extended_by: Vec::new(),
        })
    }
}

impl ModuleDoc {
    fn into_module(self) -> Module {
        Module {
            info: SymbolInfo {
                name: self.name,
                summary: self.summary,
                description: self.description,
                since: self.since,
                deprecated: self.deprecated,
                example: None,
                notes: self.notes,
                warnings: self.warnings,
                hidden: self.hidden,
                effective: Lifecycle::default(),
            },
            functions: Vec::new(),
            objects: Vec::new(),
        }
    }
}

/// Display text of a default value written as any YAML scalar.
fn scalar_text(value: &serde_yaml::Value) -> String {
    match value {
        serde_yaml::Value::String(s) => s.clone(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::Null => "null".to_string(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn load(root: &Path) -> Result<ReferenceManual> {
        YamlLoader::new(root).load()
    }

    const FOO: &str = "\
name: foo
summary: Does foo.
since: '1.0'
returns: int
posargs:
  bar:
    type: str
    description: The bar.
optargs:
  baz:
    type: bool
    default: false
kwargs:
  mode:
    type: str
    default: \"'auto'\"
";

    #[test]
    fn loads_function_signature() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "functions/foo.yaml", FOO);
        let manual = load(dir.path()).unwrap();

        let foo = manual.function("foo").unwrap();
        assert_eq!(foo.info.since, Some("1.0".parse().unwrap()));
        assert_eq!(foo.signature.returns.to_string(), "int");
        let posargs: Vec<(&str, bool)> = foo
            .signature
            .posargs
            .iter()
            .map(|a| (a.name.as_str(), a.required))
            .collect();
        assert_eq!(posargs, vec![("bar", true), ("baz", false)]);
        assert_eq!(foo.signature.posargs[1].default.as_deref(), Some("false"));
        assert_eq!(foo.signature.kwargs["mode"].default.as_deref(), Some("'auto'"));
        assert!(!foo.signature.kwargs["mode"].required);
    }

    #[test]
    fn declaration_order_is_file_name_order() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "modules/fs/module.yaml", "name: fs\nsummary: Files.\n");
        write(
            dir.path(),
            "modules/fs/functions/zeta.yaml",
            "name: zeta\nsummary: Z.\nreturns: void\n",
        );
        write(
            dir.path(),
            "modules/fs/functions/alpha.yaml",
            "name: alpha\nsummary: A.\nreturns: void\n",
        );
        let manual = load(dir.path()).unwrap();
        assert_eq!(manual.module("fs").unwrap().functions, vec!["fs::alpha", "fs::zeta"]);
    }

    #[test]
    fn object_kinds_follow_directories() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "elementary/str.yaml", "name: str\nsummary: A string.\n");
        write(
            dir.path(),
            "objects/exe.yaml",
            "name: exe\nsummary: An executable.\nmethods:\n  - name: path\n    summary: Its path.\n    returns: str\n",
        );
        let manual = load(dir.path()).unwrap();
        let kinds: Vec<(&str, ObjectKind)> = manual
            .objects()
            .map(|o| (o.info.name.as_str(), o.kind))
            .collect();
        assert_eq!(
            kinds,
            vec![("str", ObjectKind::Elementary), ("exe", ObjectKind::ReturnValue)]
        );
        assert_eq!(manual.object("str").unwrap().returned_by, vec!["exe.path"]);
    }

    #[test]
    fn unknown_field_is_schema_error() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "functions/foo.yaml",
            "name: foo\nsummary: x\nreturns: void\ncolour: red\n",
        );
        let err = load(dir.path()).unwrap_err();
        assert!(matches!(err, RefmanError::Schema { .. }), "{err}");
        assert!(err.to_string().contains("colour"));
    }

    #[test]
    fn missing_field_names_the_file() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "functions/foo.yaml", "name: foo\nreturns: void\n");
        let err = load(dir.path()).unwrap_err();
        assert!(err.to_string().contains("foo.yaml"), "{err}");
        assert!(err.to_string().contains("summary"), "{err}");
    }

    #[test]
    fn bad_type_expression() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "functions/foo.yaml",
            "name: foo\nsummary: x\nreturns: list[str\n",
        );
        assert!(matches!(load(dir.path()).unwrap_err(), RefmanError::Schema { .. }));
    }

    #[test]
    fn required_optarg_is_rejected() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "functions/foo.yaml",
            "name: foo\nsummary: x\nreturns: void\noptargs:\n  a:\n    type: str\n    required: true\n",
        );
        assert!(matches!(load(dir.path()).unwrap_err(), RefmanError::Schema { .. }));
    }

    #[test]
    fn module_without_document() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "modules/fs/functions/copy.yaml",
            "name: copy\nsummary: x\nreturns: void\n",
        );
        let err = load(dir.path()).unwrap_err();
        assert!(err.to_string().contains("module.yaml"), "{err}");
    }

    #[test]
    fn missing_root_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = load(&dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, RefmanError::Io { .. }));
    }

    #[test]
    fn input_files_are_recorded() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "functions/foo.yaml", FOO);
        write(dir.path(), "functions/notes.txt", "ignored");
        let mut loader = YamlLoader::new(dir.path());
        loader.load().unwrap();
        assert_eq!(loader.input_files(), &[dir.path().join("functions/foo.yaml")]);
    }

    #[test]
    fn repeated_loads_are_equal() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "functions/foo.yaml", FOO);
        write(dir.path(), "elementary/str.yaml", "name: str\nsummary: A string.\n");
        assert_eq!(load(dir.path()).unwrap(), load(dir.path()).unwrap());
    }
}
