//! Resolution of symbol references to relative hrefs.

use crate::error::{RefmanError, Result};
use crate::model::xref::{self, Expand};
use crate::model::{ReferenceManual, SymbolPath, SymbolRef};
use indexmap::IndexMap;
use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

/// Where the block of a rendered symbol lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Output page, relative to the output root.
    pub page: PathBuf,
    pub id: String,
}

pub struct Resolver<'a> {
    manual: &'a ReferenceManual,
    /// Keyed by qualified name, in manual order.
    targets: IndexMap<String, Target>,
}

impl<'a> Resolver<'a> {
    /// Symbols resolve to the generated reference pages under `refdir`.
    pub fn new(manual: &'a ReferenceManual, modules: bool, refdir: &Path) -> Self {
        let targets = manual
            .anchors()
            .filter(|(name, _)| modules || !module_owned(name))
            .map(|(name, anchor)| {
                let target = Target {
                    page: refdir.join(anchor.page_file()),
                    id: anchor.id.clone(),
                };
                (name.to_string(), target)
            })
            .collect();
        Self { manual, targets }
    }

    /// Symbols resolve to the static page that inserts their block; symbols
    /// inserted nowhere do not resolve.
    pub fn inserted(
        manual: &'a ReferenceManual,
        modules: bool,
        placements: &IndexMap<String, PathBuf>,
    ) -> Self {
        let targets = manual
            .anchors()
            .filter(|(name, _)| modules || !module_owned(name))
            .filter_map(|(name, anchor)| {
                let page = placements.get(name)?;
                let target = Target {
                    page: page.clone(),
                    id: anchor.id.clone(),
                };
                Some((name.to_string(), target))
            })
            .collect();
        Self { manual, targets }
    }

    pub fn manual(&self) -> &'a ReferenceManual {
        self.manual
    }

    /// Location of `path` if its block is written in this run.
    pub fn target(&self, path: &SymbolPath) -> Option<&Target> {
        self.targets.get(&path.to_string())
    }

    /// Href of `target` as seen from `page` (relative to the output root).
    pub fn href(&self, target: &Target, page: &Path) -> String {
        if target.page == page {
            format!("#{}", target.id)
        } else {
            format!("{}#{}", relative_href(page, &target.page), target.id)
        }
    }

    /// Markdown link to `path` from `page`, labelled with the symbol's label.
    pub fn link(&self, path: &SymbolPath, page: &Path) -> Option<String> {
        let target = self.target(path)?;
        Some(format!("[`{}`]({})", path.label(), self.href(target, page)))
    }

    /// Whether a symbol rendered in a block owned by `module` may link to
    /// `path`. Only top-level symbols and symbols of the same module
    /// qualify, so pages do not change when module pages are gated.
    pub fn in_scope(&self, path: &SymbolPath, module: Option<&str>) -> bool {
        let owner = path.owning_module();
        (owner.is_none() || owner == module) && self.target(path).is_some()
    }

    /// Link-definition lines for every resolvable symbol, in manual order.
    pub fn link_defs(&self) -> String {
        let mut out = String::new();
        for (name, target) in &self.targets {
            out.push_str(&format!("[{}]: {}#{}\n", name, to_slash(&target.page), target.id));
        }
        out
    }
}

fn module_owned(name: &str) -> bool {
    name.parse::<SymbolPath>()
        .map(|path| path.owning_module().is_some())
        .unwrap_or(false)
}

/// A static page as read from the sitemap.
pub struct StaticPage<'p> {
    /// Output path, relative to the output root.
    pub out: &'p Path,
    pub source: &'p Path,
    pub content: &'p str,
}

/// Output page of every block inserted by `::refman[...]` on a static page,
/// keyed by qualified name. An object block places its visible methods too.
///
/// A symbol inserted twice on one page fails. With `exclusive`, inserting a
/// symbol on two different pages fails as well.
pub fn placements<'p>(
    manual: &ReferenceManual,
    modules: bool,
    pages: impl IntoIterator<Item = StaticPage<'p>>,
    exclusive: bool,
) -> Result<IndexMap<String, PathBuf>> {
    let mut placed = IndexMap::new();
    for page in pages {
        let mut inserts = Inserts {
            manual,
            modules,
            exclusive,
            page: &page,
            seen: HashSet::new(),
            placed: &mut placed,
        };
        xref::expand(page.content, &mut inserts)?;
    }
    Ok(placed)
}

struct Inserts<'r, 'p> {
    manual: &'r ReferenceManual,
    modules: bool,
    exclusive: bool,
    page: &'r StaticPage<'p>,
    seen: HashSet<String>,
    placed: &'r mut IndexMap<String, PathBuf>,
}

impl Inserts<'_, '_> {
    fn duplicate(&self, target: String, first: &Path) -> RefmanError {
        RefmanError::DuplicateInsert {
            page: self.page.source.to_path_buf(),
            target,
            first: first.to_path_buf(),
        }
    }
}

impl Expand for Inserts<'_, '_> {
    type Error = RefmanError;

    fn link(&mut self, _target: &str) -> Result<String> {
        Ok(String::new())
    }

    /// Unresolvable targets are left to the renderer, which reports them.
    fn insert(&mut self, target: &str) -> Result<Option<String>> {
        let Ok(path) = target.parse::<SymbolPath>() else {
            return Ok(None);
        };
        if (!self.modules && path.owning_module().is_some()) || self.manual.anchor(&path).is_none() {
            return Ok(None);
        }
        let mut paths = vec![path.clone()];
        if let Some(SymbolRef::Object(object)) = self.manual.lookup(&path) {
            paths.extend(
                object
                    .methods
                    .iter()
                    .filter(|m| !m.info.hidden)
                    .map(|m| object.method_path(m)),
            );
        }

        for path in paths {
            let name = path.to_string();
            if !self.seen.insert(name.clone()) {
                return Err(self.duplicate(name, self.page.out));
            }
            match self.placed.get(&name) {
                Some(first) if self.exclusive && first != self.page.out => {
                    let first = first.clone();
                    return Err(self.duplicate(name, &first));
                }
                Some(_) => {}
                None => {
                    self.placed.insert(name, self.page.out.to_path_buf());
                }
            }
        }
        Ok(None)
    }
}

/// Relative link from the page `from` to the file `to`, both relative to
/// the same root.
pub fn relative_href(from: &Path, to: &Path) -> String {
    let from_dir: Vec<Component> = from.parent().map(|p| p.components().collect()).unwrap_or_default();
    let to_parts: Vec<Component> = to.components().collect();
    let common = from_dir
        .iter()
        .zip(&to_parts)
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<String> = vec!["..".to_string(); from_dir.len() - common];
    parts.extend(
        to_parts[common..]
            .iter()
            .map(|c| c.as_os_str().to_string_lossy().into_owned()),
    );
    parts.join("/")
}

pub fn to_slash(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
