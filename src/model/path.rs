//! Qualified symbol names and the anchors derived from them.
//!
//! The qualified-name syntax doubles as the target syntax of link directives:
//!
//! | Symbol                 | Qualified name   |
//! |------------------------|------------------|
//! | function               | `foo`            |
//! | module function        | `fs::copy`       |
//! | object                 | `@str`           |
//! | module object          | `@fs::file`      |
//! | method                 | `str.join`       |
//! | module object method   | `fs::file.read`  |
//! | module                 | `#fs`            |

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

static RE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

/// Page that aggregates every top-level function and object.
pub const MANUAL_PAGE: &str = "Reference-manual";

/// Check that `name` is a valid symbol name.
pub fn is_valid_name(name: &str) -> bool {
    RE_NAME.is_match(name)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SymbolKind {
    Function,
    Method,
    Object,
    Module,
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SymbolKind::Function => "function",
            SymbolKind::Method => "method",
            SymbolKind::Object => "object",
            SymbolKind::Module => "module",
        })
    }
}

/// Identity of a documented symbol: its kind plus its qualified name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolPath {
    pub kind: SymbolKind,
    pub module: Option<String>,
    /// Owning object, for methods only.
    pub object: Option<String>,
    pub name: String,
}

impl SymbolPath {
    pub fn function(module: Option<&str>, name: &str) -> Self {
        Self {
            kind: SymbolKind::Function,
            module: module.map(str::to_string),
            object: None,
            name: name.to_string(),
        }
    }

    pub fn object(module: Option<&str>, name: &str) -> Self {
        Self {
            kind: SymbolKind::Object,
            module: module.map(str::to_string),
            object: None,
            name: name.to_string(),
        }
    }

    pub fn method(module: Option<&str>, object: &str, name: &str) -> Self {
        Self {
            kind: SymbolKind::Method,
            module: module.map(str::to_string),
            object: Some(object.to_string()),
            name: name.to_string(),
        }
    }

    pub fn module(name: &str) -> Self {
        Self {
            kind: SymbolKind::Module,
            module: None,
            object: None,
            name: name.to_string(),
        }
    }

    /// Module that owns this symbol; a module owns itself.
    pub fn owning_module(&self) -> Option<&str> {
        match self.kind {
            SymbolKind::Module => Some(&self.name),
            _ => self.module.as_deref(),
        }
    }

    /// Key of the object this path names or belongs to (`str`, `fs::file`).
    pub fn object_key(&self) -> Option<String> {
        let object = match self.kind {
            SymbolKind::Object => Some(self.name.as_str()),
            SymbolKind::Method => self.object.as_deref(),
            _ => None,
        }?;
        Some(qualify(self.module.as_deref(), object))
    }

    /// Key of a function (`foo`, `fs::copy`).
    pub fn function_key(&self) -> Option<String> {
        match self.kind {
            SymbolKind::Function => Some(qualify(self.module.as_deref(), &self.name)),
            _ => None,
        }
    }

    /// Human-facing label: `foo()`, `str.join()`, `str`, `fs`.
    pub fn label(&self) -> String {
        let prefix = self.module.as_deref().map(|m| format!("{}::", m)).unwrap_or_default();
        match self.kind {
            SymbolKind::Function => format!("{}{}()", prefix, self.name),
            SymbolKind::Method => format!(
                "{}{}.{}()",
                prefix,
                self.object.as_deref().unwrap_or_default(),
                self.name
            ),
            SymbolKind::Object => format!("{}{}", prefix, self.name),
            SymbolKind::Module => self.name.clone(),
        }
    }

    /// The stable anchor of this symbol. Depends on nothing but the path.
    pub fn anchor(&self) -> Anchor {
        let page = match self.owning_module() {
            Some(module) => format!("{}_module_{}", MANUAL_PAGE, module),
            None => MANUAL_PAGE.to_string(),
        };
        let mut segments = vec![self.kind.to_string()];
        if self.kind != SymbolKind::Module {
            segments.extend(self.module.iter().cloned());
        }
        segments.extend(self.object.iter().cloned());
        segments.push(self.name.clone());
        Anchor {
            page,
            id: segments.join("-"),
        }
    }
}

/// Join a module and a member name into a map key.
pub fn qualify(module: Option<&str>, name: &str) -> String {
    match module {
        Some(m) => format!("{}::{}", m, name),
        None => name.to_string(),
    }
}

/// Split a `module::name` key into its parts.
pub fn split_qualified(key: &str) -> (Option<&str>, &str) {
    match key.split_once("::") {
        Some((module, name)) => (Some(module), name),
        None => (None, key),
    }
}

impl fmt::Display for SymbolPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let module = self.module.as_deref();
        match self.kind {
            SymbolKind::Function => f.write_str(&qualify(module, &self.name)),
            SymbolKind::Object => write!(f, "@{}", qualify(module, &self.name)),
            SymbolKind::Method => write!(
                f,
                "{}.{}",
                qualify(module, self.object.as_deref().unwrap_or_default()),
                self.name
            ),
            SymbolKind::Module => write!(f, "#{}", self.name),
        }
    }
}

impl FromStr for SymbolPath {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || format!("malformed symbol reference `{}`", s);
        let check = |name: &str| if is_valid_name(name) { Ok(()) } else { Err(bad()) };

        if let Some(name) = s.strip_prefix('#') {
            check(name)?;
            return Ok(SymbolPath::module(name));
        }
        let (is_object, rest) = match s.strip_prefix('@') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        let (module, rest) = match rest.split_once("::") {
            Some((module, rest)) => {
                check(module)?;
                (Some(module), rest)
            }
            None => (None, rest),
        };
        if is_object {
            check(rest)?;
            return Ok(SymbolPath::object(module, rest));
        }
        match rest.split_once('.') {
            Some((object, method)) => {
                check(object)?;
                check(method)?;
                Ok(SymbolPath::method(module, object, method))
            }
            None => {
                check(rest)?;
                Ok(SymbolPath::function(module, rest))
            }
        }
    }
}

/// Link target of a documented symbol: a generated page plus an element id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Anchor {
    /// Generated page stem, without extension.
    pub page: String,
    pub id: String,
}

impl Anchor {
    pub fn page_file(&self) -> String {
        format!("{}.md", self.page)
    }
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.page_file(), self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(s: &str) -> SymbolPath {
        s.parse().unwrap()
    }

    #[test]
    fn parse_every_form() {
        assert_eq!(p("foo"), SymbolPath::function(None, "foo"));
        assert_eq!(p("fs::copy"), SymbolPath::function(Some("fs"), "copy"));
        assert_eq!(p("@str"), SymbolPath::object(None, "str"));
        assert_eq!(p("@fs::file"), SymbolPath::object(Some("fs"), "file"));
        assert_eq!(p("str.join"), SymbolPath::method(None, "str", "join"));
        assert_eq!(
            p("fs::file.read"),
            SymbolPath::method(Some("fs"), "file", "read")
        );
        assert_eq!(p("#fs"), SymbolPath::module("fs"));
    }

    #[test]
    fn display_is_inverse_of_parse() {
        for s in ["foo", "fs::copy", "@str", "@fs::file", "str.join", "fs::file.read", "#fs"] {
            assert_eq!(p(s).to_string(), s);
        }
    }

    #[test]
    fn malformed_references() {
        for bad in ["", "@", "#", "a.b.c", "a::b::c", "1abc", "foo bar", "@a.b", "#a::b", "a-b"] {
            assert!(bad.parse::<SymbolPath>().is_err(), "accepted `{}`", bad);
        }
    }

    #[test]
    fn anchors_are_unique_per_kind() {
        assert_eq!(p("str").anchor().id, "function-str");
        assert_eq!(p("@str").anchor().id, "object-str");
        assert_eq!(p("str.join").anchor().id, "method-str-join");
        assert_eq!(p("fs::file.read").anchor().id, "method-fs-file-read");
        assert_eq!(p("#fs").anchor().id, "module-fs");
    }

    #[test]
    fn anchor_pages() {
        assert_eq!(p("foo").anchor().to_string(), "Reference-manual.md#function-foo");
        assert_eq!(
            p("fs::copy").anchor().to_string(),
            "Reference-manual_module_fs.md#function-fs-copy"
        );
        assert_eq!(p("#fs").anchor().page, "Reference-manual_module_fs");
    }

    #[test]
    fn labels() {
        assert_eq!(p("foo").label(), "foo()");
        assert_eq!(p("fs::file.read").label(), "fs::file.read()");
        assert_eq!(p("@str").label(), "str");
        assert_eq!(p("#fs").label(), "fs");
    }
}
