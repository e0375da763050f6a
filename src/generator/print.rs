//! Human-readable dump of a manual, for inspecting what was loaded.

use crate::error::{RefmanError, Result};
use crate::generator::Generator;
use crate::model::*;
use console::{Style, Term};
use std::path::Path;

pub struct PrintGenerator<'a> {
    manual: &'a ReferenceManual,
    heading: Style,
    name: Style,
    dim: Style,
    warn: Style,
}

impl<'a> PrintGenerator<'a> {
    /// `force_color` styles the dump even when stdout is not a terminal.
    pub fn new(manual: &'a ReferenceManual, force_color: bool) -> Self {
        let style = |s: Style| if force_color { s.force_styling(true) } else { s };
        Self {
            manual,
            heading: style(Style::new().cyan().bold()),
            name: style(Style::new().bold()),
            dim: style(Style::new().dim()),
            warn: style(Style::new().yellow()),
        }
    }

    /// The full dump as text; styled when colors are enabled for stdout.
    pub fn render(&self) -> String {
        let mut lines: Vec<String> = Vec::new();
        let manual = self.manual;

        self.section(&mut lines, "Functions");
        for function in manual.top_level_functions() {
            self.function(&mut lines, function, 1);
        }

        self.section(&mut lines, "Objects");
        for object in manual.top_level_objects() {
            self.object(&mut lines, object, 1);
        }

        self.section(&mut lines, "Modules");
        for module in manual.modules() {
            lines.push(format!(
                "  {}{}",
                self.name.apply_to(&module.info.name),
                self.flags(&module.info)
            ));
            self.info(&mut lines, &module.info, 2);
            for function in module.functions.iter().filter_map(|k| manual.function(k)) {
                self.function(&mut lines, function, 2);
            }
            for object in module.objects.iter().filter_map(|k| manual.object(k)) {
                self.object(&mut lines, object, 2);
            }
        }

        let mut out = lines.join("\n");
        out.push('\n');
        out
    }

    fn section(&self, lines: &mut Vec<String>, title: &str) {
        if !lines.is_empty() {
            lines.push(String::new());
        }
        lines.push(self.heading.apply_to(format!("=== {} ===", title)).to_string());
    }

    fn function(&self, lines: &mut Vec<String>, function: &Function, depth: usize) {
        let indent = "  ".repeat(depth);
        lines.push(format!(
            "{}{}{}",
            indent,
            self.name.apply_to(function.signature.render(&function.info.name)),
            self.flags(&function.info)
        ));
        self.info(lines, &function.info, depth + 1);
    }

    fn object(&self, lines: &mut Vec<String>, object: &Object, depth: usize) {
        let indent = "  ".repeat(depth);
        let mut header = format!("{}{} [{}]", indent, self.name.apply_to(&object.info.name), object.kind);
        if let Some(parent) = &object.extends {
            header.push_str(&format!(" extends {}", parent));
        }
        header.push_str(&self.flags(&object.info));
        lines.push(header);
        self.info(lines, &object.info, depth + 1);

        let ancestors = self.manual.ancestors(&object.key());
        if !ancestors.is_empty() {
            lines.push(format!(
                "{}  {}",
                indent,
                self.dim.apply_to(format!("ancestors: {}", ancestors.join(" -> ")))
            ));
        }
        if !object.returned_by.is_empty() {
            lines.push(format!(
                "{}  {}",
                indent,
                self.dim.apply_to(format!("returned by: {}", object.returned_by.join(", ")))
            ));
        }
        for method in &object.methods {
            lines.push(format!(
                "{}  .{}{}",
                indent,
                self.name.apply_to(method.signature.render(&method.info.name)),
                self.flags(&method.info)
            ));
            self.info(lines, &method.info, depth + 2);
        }
    }

    fn info(&self, lines: &mut Vec<String>, info: &SymbolInfo, depth: usize) {
        let indent = "  ".repeat(depth);
        lines.push(format!("{}{}", indent, info.summary.trim()));
        let effective = &info.effective;
        if let Some(since) = &effective.since {
            lines.push(format!("{}{}", indent, self.dim.apply_to(format!("since {}", since))));
        }
        if let Some(deprecated) = &effective.deprecated {
            lines.push(format!(
                "{}{}",
                indent,
                self.warn.apply_to(format!("deprecated since {}", deprecated))
            ));
        }
    }

    fn flags(&self, info: &SymbolInfo) -> String {
        if info.hidden {
            format!(" {}", self.dim.apply_to("(hidden)"))
        } else {
            String::new()
        }
    }
}

impl Generator for PrintGenerator<'_> {
    fn generate(&mut self) -> Result<()> {
        Term::stdout()
            .write_str(&self.render())
            .map_err(|e| RefmanError::io(Path::new("<stdout>"), e))
    }
}
