//! Sitemap parsing.
//!
//! One entry per line, nested by indentation (a tab counts as 4 columns).
//! Lines starting with `#` are comments. An entry is a page path relative
//! to the sitemap's directory, or [`PLACEHOLDER`], which marks where the
//! generated reference pages go.

use crate::error::{RefmanError, Result};
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Marks the position of the generated reference pages.
pub const PLACEHOLDER: &str = "@REFMAN_PLACEHOLDER@";

const TAB_WIDTH: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    /// A static page, relative to the sitemap's directory.
    Page(PathBuf),
    Placeholder,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub entry: Entry,
    /// 1-based line in the sitemap file.
    pub line: usize,
    pub children: Vec<Node>,
}

#[derive(Debug, Clone)]
pub struct Sitemap {
    pub file: PathBuf,
    pub roots: Vec<Node>,
}

/// A node together with where its output goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Visit<'a> {
    pub node: &'a Node,
    pub depth: usize,
    /// Output directory relative to the output root.
    pub dir: PathBuf,
}

impl Sitemap {
    pub fn load(path: &Path) -> Result<Sitemap> {
        let text = fs::read_to_string(path).map_err(|e| RefmanError::io(path, e))?;
        Sitemap::parse(&text, path)
    }

    pub fn parse(text: &str, file: &Path) -> Result<Sitemap> {
        let fail = |line: usize, message: String| RefmanError::Sitemap {
            file: file.to_path_buf(),
            line,
            message,
        };

        // (depth, entry, line)
        let mut flat: Vec<(usize, Entry, usize)> = Vec::new();
        let mut levels: Vec<usize> = Vec::new();
        let mut placeholder_line: Option<usize> = None;

        for (i, raw) in text.lines().enumerate() {
            let line = i + 1;
            let content = raw.trim();
            if content.is_empty() || content.starts_with('#') {
                continue;
            }
            let indent = indentation(raw);

            match levels.last() {
                None => levels.push(indent),
                Some(&top) if indent > top => levels.push(indent),
                Some(_) => {
                    while levels.last().is_some_and(|&top| top > indent) {
                        levels.pop();
                    }
                    if levels.last() != Some(&indent) {
                        return Err(fail(line, "indentation does not match any outer level".to_string()));
                    }
                }
            }

            let entry = if content == PLACEHOLDER {
                if let Some(first) = placeholder_line {
                    return Err(fail(
                        line,
                        format!("{} already appears on line {}", PLACEHOLDER, first),
                    ));
                }
                placeholder_line = Some(line);
                Entry::Placeholder
            } else {
                let page = PathBuf::from(content);
                if !is_plain_relative(&page) {
                    return Err(fail(line, format!("page path `{}` must stay below the sitemap", content)));
                }
                Entry::Page(page)
            };
            flat.push((levels.len() - 1, entry, line));
        }

        let mut pos = 0;
        let roots = build(&flat, &mut pos, 0);

        let sitemap = Sitemap {
            file: file.to_path_buf(),
            roots,
        };
        if let Some(node) = sitemap.visits().into_iter().map(|v| v.node).find(|n| {
            n.entry == Entry::Placeholder && !n.children.is_empty()
        }) {
            return Err(fail(node.line, format!("{} cannot have children", PLACEHOLDER)));
        }
        Ok(sitemap)
    }

    /// Directory holding the static pages.
    pub fn base_dir(&self) -> &Path {
        self.file.parent().unwrap_or_else(|| Path::new(""))
    }

    /// Every node, depth-first in declared order.
    pub fn visits(&self) -> Vec<Visit<'_>> {
        fn walk<'a>(nodes: &'a [Node], depth: usize, dir: &Path, out: &mut Vec<Visit<'a>>) {
            for node in nodes {
                out.push(Visit {
                    node,
                    depth,
                    dir: dir.to_path_buf(),
                });
                if let Entry::Page(page) = &node.entry {
                    let stem = page.file_stem().map(PathBuf::from).unwrap_or_default();
                    walk(&node.children, depth + 1, &dir.join(stem), out);
                }
            }
        }

        let mut out = Vec::new();
        walk(&self.roots, 0, Path::new(""), &mut out);
        out
    }

    /// The sitemap with the placeholder replaced by `generated` (file names
    /// of the generated pages) and static pages reduced to their file names.
    pub fn render(&self, generated: &[String]) -> String {
        let mut out = String::new();
        for visit in self.visits() {
            let indent = " ".repeat(visit.depth * TAB_WIDTH);
            match &visit.node.entry {
                Entry::Page(page) => {
                    let name = page.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
                    out.push_str(&format!("{}{}\n", indent, name));
                }
                Entry::Placeholder => {
                    for name in generated {
                        out.push_str(&format!("{}{}\n", indent, name));
                    }
                }
            }
        }
        out
    }
}

fn indentation(line: &str) -> usize {
    line.chars()
        .take_while(|c| c.is_whitespace())
        .map(|c| if c == '\t' { TAB_WIDTH } else { 1 })
        .sum()
}

fn is_plain_relative(path: &Path) -> bool {
    path.components().all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
        && path.file_name().is_some()
}

fn build(flat: &[(usize, Entry, usize)], pos: &mut usize, depth: usize) -> Vec<Node> {
    let mut nodes = Vec::new();
    while let Some((d, entry, line)) = flat.get(*pos) {
        if *d != depth {
            break;
        }
        *pos += 1;
        let children = build(flat, pos, depth + 1);
        nodes.push(Node {
            entry: entry.clone(),
            line: *line,
            children,
        });
    }
    nodes
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(text: &str) -> Result<Sitemap> {
        Sitemap::parse(text, Path::new("docs/sitemap.txt"))
    }

    fn outline(sitemap: &Sitemap) -> Vec<(usize, String, String)> {
        sitemap
            .visits()
            .iter()
            .map(|v| {
                let entry = match &v.node.entry {
                    Entry::Page(p) => p.display().to_string(),
                    Entry::Placeholder => PLACEHOLDER.to_string(),
                };
                (v.depth, entry, v.dir.display().to_string())
            })
            .collect()
    }

    #[test]
    fn nesting_and_output_dirs() {
        let sitemap = parse(
            "index.md\n\
             \tmanual.md\n\
             \t\tsyntax.md\n\
             \t\t@REFMAN_PLACEHOLDER@\n\
             \tfaq.md\n",
        )
        .unwrap();
        assert_eq!(
            outline(&sitemap),
            vec![
                (0, "index.md".into(), "".into()),
                (1, "manual.md".into(), "index".into()),
                (2, "syntax.md".into(), "index/manual".into()),
                (2, PLACEHOLDER.into(), "index/manual".into()),
                (1, "faq.md".into(), "index".into()),
            ]
        );
        assert_eq!(sitemap.base_dir(), Path::new("docs"));
    }

    #[test]
    fn comments_blank_lines_and_mixed_indent() {
        let sitemap = parse("# site\nindex.md\n\n    a.md\n\tb.md\n").unwrap();
        assert_eq!(sitemap.roots[0].children.len(), 2);
        assert_eq!(sitemap.roots[0].children[1].line, 5);
    }

    #[test]
    fn dedent_to_unknown_level() {
        let err = parse("index.md\n    a.md\n  b.md\n").unwrap_err();
        match err {
            RefmanError::Sitemap { line, .. } => assert_eq!(line, 3),
            other => panic!("expected sitemap error, got {other}"),
        }
    }

    #[test]
    fn second_placeholder() {
        let err = parse("index.md\n    @REFMAN_PLACEHOLDER@\n    @REFMAN_PLACEHOLDER@\n").unwrap_err();
        assert!(err.to_string().contains("already appears on line 2"), "{err}");
    }

    #[test]
    fn placeholder_must_be_leaf() {
        let err = parse("@REFMAN_PLACEHOLDER@\n    a.md\n").unwrap_err();
        assert!(matches!(err, RefmanError::Sitemap { line: 1, .. }), "{err}");
    }

    #[test]
    fn escaping_paths_are_rejected() {
        assert!(parse("../secret.md\n").is_err());
        assert!(parse("/etc/passwd\n").is_err());
        assert!(parse("guide/intro.md\n").is_ok());
    }

    #[test]
    fn render_replaces_placeholder() {
        let sitemap = parse("index.md\n\tguide/intro.md\n\t@REFMAN_PLACEHOLDER@\n").unwrap();
        let generated = vec![
            "Reference-manual.md".to_string(),
            "Reference-manual_module_fs.md".to_string(),
        ];
        assert_eq!(
            sitemap.render(&generated),
            "index.md\n    intro.md\n    Reference-manual.md\n    Reference-manual_module_fs.md\n"
        );
    }
}
