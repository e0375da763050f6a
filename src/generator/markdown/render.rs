//! GitHub-flavored markdown rendering of reference blocks and pages.

use super::links::Resolver;
use crate::error::{RefmanError, Result};
use crate::model::xref::{self, Expand};
use crate::model::*;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Signatures longer than this are broken into one parameter per line.
const SIGNATURE_WIDTH: usize = 80;

/// Renders content for one output page.
pub struct PageRenderer<'a> {
    links: &'a Resolver<'a>,
    /// Output page, relative to the output root.
    page: PathBuf,
    /// Page named in errors.
    source: PathBuf,
}

impl<'a> PageRenderer<'a> {
    pub fn new(links: &'a Resolver<'a>, page: &Path, source: &Path) -> Self {
        Self {
            links,
            page: page.to_path_buf(),
            source: source.to_path_buf(),
        }
    }

    /// Expand the directives of a static page.
    pub fn static_page(&self, content: &str) -> Result<String> {
        xref::expand(content, &mut Directives(self))
    }

    /// The page aggregating top-level functions and objects.
    pub fn manual_page(&self) -> Result<String> {
        let manual = self.links.manual();
        let mut lines: Vec<String> = vec!["# Reference manual\n".to_string()];

        let functions: Vec<&Function> = manual
            .top_level_functions()
            .filter(|f| !f.info.hidden)
            .collect();
        let objects: Vec<&Object> = manual
            .top_level_objects()
            .filter(|o| !o.info.hidden)
            .collect();
        self.function_section(&mut lines, &functions)?;
        self.object_section(&mut lines, &objects)?;

        Ok(finish_page(lines))
    }

    /// The page of one module.
    pub fn module_page(&self, module: &Module) -> Result<String> {
        let manual = self.links.manual();
        let mut lines: Vec<String> = Vec::new();
        self.module_intro(&mut lines, module, 1)?;

        let functions: Vec<&Function> = module
            .functions
            .iter()
            .filter_map(|key| manual.function(key))
            .filter(|f| !f.info.hidden)
            .collect();
        let objects: Vec<&Object> = module
            .objects
            .iter()
            .filter_map(|key| manual.object(key))
            .filter(|o| !o.info.hidden)
            .collect();
        self.function_section(&mut lines, &functions)?;
        self.object_section(&mut lines, &objects)?;

        Ok(finish_page(lines))
    }

    fn function_section(&self, lines: &mut Vec<String>, functions: &[&Function]) -> Result<()> {
        if functions.is_empty() {
            return Ok(());
        }
        lines.push("## Functions\n".to_string());
        self.index(lines, functions.iter().map(|f| f.path()));
        for function in functions {
            lines.push(self.function(function, 3)?);
            lines.push(String::new());
        }
        Ok(())
    }

    fn object_section(&self, lines: &mut Vec<String>, objects: &[&Object]) -> Result<()> {
        if objects.is_empty() {
            return Ok(());
        }
        lines.push("## Objects\n".to_string());
        self.index(lines, objects.iter().map(|o| o.path()));
        for object in objects {
            lines.push(self.object(object, 3)?);
            lines.push(String::new());
        }
        Ok(())
    }

    // -- Blocks -----------------------------------------------------------------

    fn block(&self, symbol: SymbolRef<'a>, level: usize) -> Result<String> {
        match symbol {
            SymbolRef::Function(function) => self.function(function, level),
            SymbolRef::Method(object, method) => self.method(object, method, level),
            SymbolRef::Object(object) => self.object(object, level),
            SymbolRef::Module(module) => {
                let mut lines = Vec::new();
                self.module_intro(&mut lines, module, level)?;
                let manual = self.links.manual();
                let members = module
                    .functions
                    .iter()
                    .filter_map(|key| manual.function(key))
                    .map(|f| f.path())
                    .chain(
                        module
                            .objects
                            .iter()
                            .filter_map(|key| manual.object(key))
                            .map(|o| o.path()),
                    );
                self.index(&mut lines, members);
                Ok(finish(lines))
            }
        }
    }

    fn function(&self, function: &Function, level: usize) -> Result<String> {
        let mut lines = Vec::new();
        let path = function.path();
        self.heading(&mut lines, &path, &path.label(), level);
        self.signature(&mut lines, &function.key(), &function.signature);
        self.info(&mut lines, &function.info, function.module.as_deref())?;
        self.arguments(&mut lines, &function.signature, function.module.as_deref(), level)?;
        self.example(&mut lines, &function.info, level);
        Ok(finish(lines))
    }

    fn method(&self, object: &Object, method: &Method, level: usize) -> Result<String> {
        let mut lines = Vec::new();
        let path = object.method_path(method);
        self.heading(&mut lines, &path, &path.label(), level);
        let name = format!("{}.{}", object.info.name, method.info.name);
        self.signature(&mut lines, &name, &method.signature);
        self.info(&mut lines, &method.info, object.module.as_deref())?;
        self.arguments(&mut lines, &method.signature, object.module.as_deref(), level)?;
        self.example(&mut lines, &method.info, level);
        Ok(finish(lines))
    }

    fn object(&self, object: &Object, level: usize) -> Result<String> {
        let manual = self.links.manual();
        let module = object.module.as_deref();
        let sub = "#".repeat(level + 1);
        let mut lines = Vec::new();
        let path = object.path();
        self.heading(&mut lines, &path, &format!("`{}`", path.label()), level);
        self.info(&mut lines, &object.info, module)?;

        // Facts
        lines.push(format!("* Kind: {}", object.kind));
        if let Some(parent) = &object.extends {
            let (m, name) = split_qualified(parent);
            lines.push(format!("* Extends: {}", self.scoped(&SymbolPath::object(m, name), module)));
        }
        let subtypes: Vec<String> = object
            .extended_by
            .iter()
            .map(|key| {
                let (m, name) = split_qualified(key);
                SymbolPath::object(m, name)
            })
            .filter_map(|p| self.scoped_link(&p, module))
            .collect();
        if !subtypes.is_empty() {
            lines.push(format!("* Extended by: {}", subtypes.join(", ")));
        }
        let returners: Vec<String> = object
            .returned_by
            .iter()
            .filter_map(|name| name.parse::<SymbolPath>().ok())
            .filter_map(|p| self.scoped_link(&p, module))
            .collect();
        if !returners.is_empty() {
            lines.push(format!("* Returned by: {}", returners.join(", ")));
        }
        lines.push(String::new());

        self.example(&mut lines, &object.info, level);

        let visible: Vec<&Method> = object.methods.iter().filter(|m| !m.info.hidden).collect();
        if !visible.is_empty() {
            lines.push(format!("{} Methods\n", sub));
            self.index(&mut lines, visible.iter().map(|m| object.method_path(m)));
        }

        // Methods of ancestors not overridden along the way.
        let mut seen: HashSet<&str> = object.methods.iter().map(|m| m.info.name.as_str()).collect();
        for key in manual.ancestors(&object.key()) {
            let Some(ancestor) = manual.object(key) else { continue };
            let inherited: Vec<&Method> = ancestor
                .methods
                .iter()
                .filter(|m| seen.insert(m.info.name.as_str()))
                .filter(|m| !m.info.hidden)
                .collect();
            if inherited.is_empty() || !self.links.in_scope(&ancestor.path(), module) {
                continue;
            }
            lines.push(format!(
                "{} Methods inherited from `{}`\n",
                sub,
                ancestor.path().label()
            ));
            for method in inherited {
                let path = ancestor.method_path(method);
                let Some(link) = self.links.link(&path, &self.page) else { continue };
                lines.push(format!("* {}{}", link, lifecycle_note(&method.info.effective)));
            }
            lines.push(String::new());
        }

        for method in visible {
            lines.push(self.method(object, method, level + 1)?);
            lines.push(String::new());
        }
        Ok(finish(lines))
    }

    fn module_intro(&self, lines: &mut Vec<String>, module: &Module, level: usize) -> Result<()> {
        let path = module.path();
        self.heading(lines, &path, &format!("The `{}` module", module.info.name), level);
        self.info(lines, &module.info, Some(&module.info.name))
    }

    // -- Pieces -------------------------------------------------------------------

    fn heading(&self, lines: &mut Vec<String>, path: &SymbolPath, label: &str, level: usize) {
        lines.push(format!("<a id=\"{}\"></a>", path.anchor().id));
        lines.push(format!("{} {}\n", "#".repeat(level), label));
    }

    fn signature(&self, lines: &mut Vec<String>, name: &str, signature: &Signature) {
        let one_line = signature.render(name);
        let params = signature.parameters();
        lines.push("```".to_string());
        if one_line.chars().count() <= SIGNATURE_WIDTH || params.is_empty() {
            lines.push(one_line);
        } else {
            lines.push(format!("{}(", name));
            for param in params {
                lines.push(format!("    {},", param));
            }
            lines.push(format!(") -> {}", signature.returns));
        }
        lines.push("```\n".to_string());
    }

    fn info(&self, lines: &mut Vec<String>, info: &SymbolInfo, module: Option<&str>) -> Result<()> {
        lines.push(format!("{}\n", self.text(&info.summary, module)?));
        if !info.description.trim().is_empty() {
            lines.push(format!("{}\n", self.text(&info.description, module)?));
        }
        if let Some(since) = &info.effective.since {
            admonition(lines, "NOTE", &format!("Since {}", since));
        }
        if let Some(deprecated) = &info.effective.deprecated {
            admonition(lines, "WARNING", &format!("Deprecated since {}", deprecated));
        }
        for warning in &info.warnings {
            admonition(lines, "WARNING", &self.text(warning, module)?);
        }
        for note in &info.notes {
            admonition(lines, "NOTE", &self.text(note, module)?);
        }
        Ok(())
    }

    fn arguments(
        &self,
        lines: &mut Vec<String>,
        signature: &Signature,
        module: Option<&str>,
        level: usize,
    ) -> Result<()> {
        let sub = "#".repeat(level + 1);

        let mut rows = Vec::new();
        for arg in &signature.posargs {
            rows.push(self.row(&format!("`{}`", arg.name), arg, None, module)?);
        }
        if let Some(varargs) = &signature.varargs {
            let name = format!("`*{}`", varargs.argument.name);
            rows.push(self.row(&name, &varargs.argument, Some(varargs), module)?);
        }
        table(lines, &format!("{} Arguments\n", sub), rows);

        let mut rows = Vec::new();
        for arg in signature.kwargs.values() {
            rows.push(self.row(&format!("`{}`", arg.name), arg, None, module)?);
        }
        table(lines, &format!("{} Keyword arguments\n", sub), rows);

        if signature.returns != TypeExpr::default() || signature.returns_description.is_some() {
            lines.push(format!("{} Returns\n", sub));
            lines.push(format!("{}\n", self.type_text(&signature.returns, module)));
            if let Some(description) = &signature.returns_description {
                lines.push(format!("{}\n", self.text(description, module)?));
            }
        }
        Ok(())
    }

    fn row(
        &self,
        name: &str,
        arg: &Argument,
        varargs: Option<&VarArgument>,
        module: Option<&str>,
    ) -> Result<String> {
        let mut tags = vec![if arg.required { "required" } else { "optional" }.to_string()];
        if let Some(default) = &arg.default {
            tags.push(format!("default: `{}`", default));
        }
        if let Some(v) = varargs {
            if let Some(min) = v.min {
                tags.push(format!("min {}", min));
            }
            if let Some(max) = v.max {
                tags.push(format!("max {}", max));
            }
        }
        if let Some(since) = &arg.since {
            tags.push(format!("since {}", since));
        }
        if let Some(deprecated) = &arg.deprecated {
            tags.push(format!("deprecated since {}", deprecated));
        }
        Ok(format!(
            "| {} | {} | {} | {} |",
            name,
            self.type_text(&arg.ty, module),
            cell(&self.text(&arg.description, module)?),
            cell(&tags.join(", "))
        ))
    }

    fn example(&self, lines: &mut Vec<String>, info: &SymbolInfo, level: usize) {
        if let Some(example) = &info.example {
            lines.push(format!("{} Example\n", "#".repeat(level + 1)));
            lines.push("```".to_string());
            lines.push(unindent(example.trim_end()));
            lines.push("```\n".to_string());
        }
    }

    fn index(&self, lines: &mut Vec<String>, paths: impl Iterator<Item = SymbolPath>) {
        let mut any = false;
        for path in paths {
            if let Some(link) = self.links.link(&path, &self.page) {
                lines.push(format!("* {}", link));
                any = true;
            }
        }
        if any {
            lines.push(String::new());
        }
    }

    /// A type expression with documented object names linked. Brackets and
    /// bars are escaped so the result is safe inside table cells.
    fn type_text(&self, ty: &TypeExpr, module: Option<&str>) -> String {
        match ty {
            TypeExpr::Named(name) => self
                .links
                .manual()
                .resolve_object(name, module)
                .and_then(|object| self.scoped_link_text(&object.path(), name, module))
                .unwrap_or_else(|| name.clone()),
            TypeExpr::List(inner) => format!("list\\[{}\\]", self.type_text(inner, module)),
            TypeExpr::Dict(inner) => format!("dict\\[{}\\]", self.type_text(inner, module)),
            TypeExpr::Union(alts) => alts
                .iter()
                .map(|alt| self.type_text(alt, module))
                .collect::<Vec<_>>()
                .join(" \\| "),
        }
    }

    /// Link to `path` when it may be linked from a block of `module`,
    /// otherwise its label in code.
    fn scoped(&self, path: &SymbolPath, module: Option<&str>) -> String {
        self.scoped_link(path, module)
            .unwrap_or_else(|| format!("`{}`", path.label()))
    }

    fn scoped_link(&self, path: &SymbolPath, module: Option<&str>) -> Option<String> {
        if !self.links.in_scope(path, module) {
            return None;
        }
        self.links.link(path, &self.page)
    }

    fn scoped_link_text(&self, path: &SymbolPath, text: &str, module: Option<&str>) -> Option<String> {
        if !self.links.in_scope(path, module) {
            return None;
        }
        let target = self.links.target(path)?;
        Some(format!("[{}]({})", text, self.links.href(target, &self.page)))
    }

    /// Symbol text with `[[...]]` expanded. Targets out of scope for a
    /// block of `module` stay as plain labels.
    fn text(&self, text: &str, module: Option<&str>) -> Result<String> {
        xref::expand(text.trim(), &mut Links(self, module))
    }

    fn dangling(&self, target: &str) -> RefmanError {
        RefmanError::DanglingLink {
            page: self.source.clone(),
            target: target.to_string(),
        }
    }

    /// Resolve a directive target to a symbol rendered in this run.
    fn resolve(&self, target: &str) -> Result<(SymbolPath, SymbolRef<'a>)> {
        let path: SymbolPath = target.parse().map_err(|_| self.dangling(target))?;
        if self.links.target(&path).is_none() {
            return Err(self.dangling(target));
        }
        let symbol = self
            .links
            .manual()
            .lookup(&path)
            .ok_or_else(|| self.dangling(target))?;
        Ok((path, symbol))
    }

    fn link(&self, target: &str) -> Result<String> {
        let (path, _) = self.resolve(target)?;
        self.links
            .link(&path, &self.page)
            .ok_or_else(|| self.dangling(target))
    }
}

/// Expands links only; used for symbol text.
struct Links<'r, 'a>(&'r PageRenderer<'a>, Option<&'r str>);

impl Expand for Links<'_, '_> {
    type Error = RefmanError;

    fn link(&mut self, target: &str) -> Result<String> {
        let path: SymbolPath = target.parse().map_err(|_| self.0.dangling(target))?;
        Ok(self.0.scoped(&path, self.1))
    }
}

/// Expands links and block inserts; used for static pages.
struct Directives<'r, 'a>(&'r PageRenderer<'a>);

impl Expand for Directives<'_, '_> {
    type Error = RefmanError;

    fn link(&mut self, target: &str) -> Result<String> {
        self.0.link(target)
    }

    fn insert(&mut self, target: &str) -> Result<Option<String>> {
        let (_, symbol) = self.0.resolve(target)?;
        self.0.block(symbol, 3).map(Some)
    }
}

fn admonition(lines: &mut Vec<String>, kind: &str, text: &str) {
    lines.push(format!("> [!{}]", kind));
    for line in text.lines() {
        if line.is_empty() {
            lines.push(">".to_string());
        } else {
            lines.push(format!("> {}", line));
        }
    }
    lines.push(String::new());
}

fn table(lines: &mut Vec<String>, title: &str, rows: Vec<String>) {
    if rows.is_empty() {
        return;
    }
    lines.push(title.to_string());
    lines.push("| Name | Type | Description | Tags |".to_string());
    lines.push("| ---- | ---- | ----------- | ---- |".to_string());
    lines.extend(rows);
    lines.push(String::new());
}

/// Make text fit in a single table cell.
fn cell(text: &str) -> String {
    text.split('\n')
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .replace('|', "\\|")
}

fn lifecycle_note(lifecycle: &Lifecycle) -> String {
    let mut notes = Vec::new();
    if let Some(since) = &lifecycle.since {
        notes.push(format!("since {}", since));
    }
    if let Some(deprecated) = &lifecycle.deprecated {
        notes.push(format!("deprecated since {}", deprecated));
    }
    if notes.is_empty() {
        String::new()
    } else {
        format!(" ({})", notes.join(", "))
    }
}

fn finish(lines: Vec<String>) -> String {
    lines.join("\n").trim_end().to_string()
}

fn finish_page(lines: Vec<String>) -> String {
    let mut page = finish(lines);
    page.push('\n');
    page
}

/// Remove common leading indentation from a multi-line string.
fn unindent(text: &str) -> String {
    let lines: Vec<&str> = text.split('\n').collect();

    // Skip leading blank lines
    let start = lines.iter().position(|l| !l.trim().is_empty()).unwrap_or(0);
    if start >= lines.len() {
        return text.to_string();
    }

    let min_indent = lines[start..]
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start_matches(' ').len())
        .min()
        .unwrap_or(0);

    lines[start..]
        .iter()
        .map(|l| if l.len() >= min_indent { &l[min_indent..] } else { l.trim_start() })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn info(name: &str) -> SymbolInfo {
        SymbolInfo {
            name: name.to_string(),
            summary: format!("About {}.", name),
            ..Default::default()
        }
    }

    fn arg(name: &str, ty: &str) -> Argument {
        Argument {
            name: name.to_string(),
            ty: ty.parse().unwrap(),
            required: true,
            ..Default::default()
        }
    }

    fn manual() -> ReferenceManual {
        let origin = Path::new("test.yaml");
        let mut builder = ManualBuilder::new();

        let mut foo = Function {
            info: info("foo"),
            ..Default::default()
        };
        foo.info.since = Some("1.0".parse().unwrap());
        foo.info.description = "Pairs well with [[@str]].".to_string();
        foo.signature.returns = "int".parse().unwrap();
        foo.signature.posargs.push(arg("bar", "str"));
        builder.add_function(foo, origin).unwrap();

        let mut base = Object {
            info: info("base"),
            ..Default::default()
        };
        let mut old = Method {
            info: info("old"),
            ..Default::default()
        };
        old.info.deprecated = Some("2.0".parse().unwrap());
        base.methods.push(old);
        base.methods.push(Method {
            info: info("join"),
            ..Default::default()
        });
        builder.add_object(base, origin).unwrap();

        let mut string = Object {
            info: info("str"),
            extends: Some("base".to_string()),
            ..Default::default()
        };
        let mut join = Method {
            info: info("join"),
            ..Default::default()
        };
        join.signature.returns = "str".parse().unwrap();
        join.signature.varargs = Some(VarArgument {
            argument: Argument {
                name: "parts".to_string(),
                ty: "list[str] | str".parse().unwrap(),
                description: "Parts | pieces.".to_string(),
                ..Default::default()
            },
            min: Some(1),
            max: None,
        });
        string.methods.push(join);
        builder.add_object(string, origin).unwrap();

        builder
            .add_module(
                Module {
                    info: info("fs"),
                    ..Default::default()
                },
                origin,
            )
            .unwrap();
        let mut copy = Function {
            info: info("copy"),
            module: Some("fs".to_string()),
            ..Default::default()
        };
        copy.signature.returns = "str".parse().unwrap();
        builder.add_function(copy, origin).unwrap();

        builder.build().unwrap()
    }

    fn block(manual: &ReferenceManual, modules: bool, target: &str) -> Result<String> {
        let links = Resolver::new(manual, modules, Path::new(""));
        let renderer = PageRenderer::new(&links, Path::new("index.md"), Path::new("index.md"));
        renderer.static_page(&format!("::refman[{}]", target))
    }

    #[test]
    fn function_block() {
        let manual = manual();
        assert_eq!(
            block(&manual, true, "foo").unwrap(),
            "<a id=\"function-foo\"></a>\n\
             ### foo()\n\
             \n\
             ```\n\
             foo(bar: str) -> int\n\
             ```\n\
             \n\
             About foo.\n\
             \n\
             Pairs well with [`str`](Reference-manual.md#object-str).\n\
             \n\
             > [!NOTE]\n\
             > Since 1.0\n\
             \n\
             #### Arguments\n\
             \n\
             | Name | Type | Description | Tags |\n\
             | ---- | ---- | ----------- | ---- |\n\
             | `bar` | [str](Reference-manual.md#object-str) |  | required |\n\
             \n\
             #### Returns\n\
             \n\
             int"
        );
    }

    #[test]
    fn variadic_row_escapes_cells() {
        let manual = manual();
        let text = block(&manual, true, "str.join").unwrap();
        assert!(text.contains(
            "| `*parts` | list\\[[str](Reference-manual.md#object-str)\\] \\| [str](Reference-manual.md#object-str) | Parts \\| pieces. | optional, min 1 |"
        ), "{text}");
        assert!(text.contains("str.join(*parts: list[str] | str) -> str"));
    }

    #[test]
    fn object_lists_inherited_methods() {
        let manual = manual();
        let text = block(&manual, true, "@str").unwrap();
        assert!(text.contains("* Extends: [`base`](Reference-manual.md#object-base)"), "{text}");
        assert!(text.contains("* Returned by: [`str.join()`](Reference-manual.md#method-str-join)"));
        assert!(text.contains("#### Methods inherited from `base`\n\n* [`base.old()`](Reference-manual.md#method-base-old) (deprecated since 2.0)\n"));
        assert!(!text.contains("base.join"), "overridden method listed: {text}");
        assert!(text.contains("<a id=\"method-str-join\"></a>\n#### str.join()"));
    }

    #[test]
    fn links_to_the_same_page_use_fragments() {
        let manual = manual();
        let links = Resolver::new(&manual, true, Path::new(""));
        let page = PageRenderer::new(&links, Path::new("Reference-manual.md"), Path::new("Reference-manual.md"))
            .manual_page()
            .unwrap();
        assert!(page.starts_with("# Reference manual\n\n## Functions\n\n* [`foo()`](#function-foo)\n"));
        assert!(page.contains("Pairs well with [`str`](#object-str)."));
        assert!(!page.contains("copy"), "module function on the manual page");
    }

    #[test]
    fn module_targets_are_gated() {
        let manual = manual();
        assert!(block(&manual, true, "fs::copy").is_ok());
        let err = block(&manual, false, "fs::copy").unwrap_err();
        assert!(matches!(err, RefmanError::DanglingLink { ref target, .. } if target == "fs::copy"));
    }

    #[test]
    fn description_links_follow_the_block_scope() {
        let origin = Path::new("test.yaml");
        let mut builder = ManualBuilder::new();
        builder
            .add_module(
                Module {
                    info: info("fs"),
                    ..Default::default()
                },
                origin,
            )
            .unwrap();
        let mut copy = Function {
            info: info("copy"),
            module: Some("fs".to_string()),
            ..Default::default()
        };
        copy.info.description = "Inverse of [[fs::move]], see [[foo]].".to_string();
        builder.add_function(copy, origin).unwrap();
        let moved = Function {
            info: info("move"),
            module: Some("fs".to_string()),
            ..Default::default()
        };
        builder.add_function(moved, origin).unwrap();
        let mut foo = Function {
            info: info("foo"),
            ..Default::default()
        };
        foo.info.description = "See [[fs::copy]].".to_string();
        builder.add_function(foo, origin).unwrap();
        let manual = builder.build().unwrap();

        for modules in [true, false] {
            let text = block(&manual, modules, "foo").unwrap();
            assert!(text.contains("\nSee `fs::copy()`.\n"), "{text}");
        }
        let text = block(&manual, true, "fs::copy").unwrap();
        assert!(
            text.contains(
                "Inverse of [`fs::move()`](Reference-manual_module_fs.md#function-fs-move), \
                 see [`foo()`](Reference-manual.md#function-foo)."
            ),
            "{text}"
        );
    }

    #[test]
    fn unknown_and_malformed_targets_dangle() {
        let manual = manual();
        for target in ["nope", "not a name", "@foo"] {
            assert!(matches!(
                block(&manual, true, target),
                Err(RefmanError::DanglingLink { .. })
            ));
        }
    }

    #[test]
    fn long_signatures_wrap() {
        let links_manual = manual();
        let links = Resolver::new(&links_manual, true, Path::new(""));
        let renderer = PageRenderer::new(&links, Path::new("x.md"), Path::new("x.md"));
        let mut sig = Signature::default();
        for name in ["first_argument", "second_argument", "third_argument"] {
            sig.posargs.push(arg(name, "list[str | file]"));
        }
        let mut lines = Vec::new();
        renderer.signature(&mut lines, "long_function_name", &sig);
        assert_eq!(
            lines.join("\n"),
            "```\nlong_function_name(\n    first_argument: list[str | file],\n    second_argument: list[str | file],\n    third_argument: list[str | file],\n) -> void\n```\n"
        );
    }

    #[test]
    fn unindent_examples() {
        assert_eq!(unindent("  a\n    b\n  c"), "a\n  b\nc");
        assert_eq!(unindent("\n  a\n  b"), "a\nb");
    }

    #[test]
    fn cells_are_single_line() {
        assert_eq!(cell("one\n  two | three\n"), "one two \\| three");
    }
}
