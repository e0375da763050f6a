//! Markdown generator: walks the sitemap, expands directives and writes the
//! reference pages.
//!
//! Every page is rendered in memory first. Files are only written once the
//! whole site rendered without error.

mod links;
mod render;
pub mod sitemap;

pub use links::{relative_href, Resolver, Target};
pub use sitemap::{Entry, Sitemap, PLACEHOLDER};

use crate::error::{RefmanError, Result};
use crate::generator::{Generator, GeneratorOptions};
use crate::model::{Module, ReferenceManual, MANUAL_PAGE};
use indexmap::IndexMap;
use links::StaticPage;
use render::PageRenderer;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// File name of the regenerated sitemap in the output directory.
pub const SITEMAP_FILE: &str = "sitemap.txt";

pub struct MarkdownGenerator<'a> {
    manual: &'a ReferenceManual,
    out: PathBuf,
    sitemap: PathBuf,
    link_defs: Option<PathBuf>,
    modules: bool,
    /// Link-definition file contents; set by `render`.
    link_lines: String,
    inputs: Vec<PathBuf>,
}

impl<'a> MarkdownGenerator<'a> {
    pub fn new(manual: &'a ReferenceManual, options: &GeneratorOptions) -> Self {
        Self {
            manual,
            out: options.out.clone(),
            sitemap: options.sitemap.clone(),
            link_defs: options.link_defs.clone(),
            modules: options.modules,
            link_lines: String::new(),
            inputs: Vec::new(),
        }
    }

    /// Render every output file without touching the output directory.
    /// Keys are paths relative to the output root.
    pub fn render(&mut self) -> Result<IndexMap<PathBuf, String>> {
        self.inputs.clear();
        let sitemap = Sitemap::load(&self.sitemap)?;
        self.inputs.push(self.sitemap.clone());
        let visits = sitemap.visits();

        // Static pages, keyed by their index in `visits`.
        let mut statics: Vec<(usize, PathBuf, PathBuf, String)> = Vec::new();
        for (i, visit) in visits.iter().enumerate() {
            let Entry::Page(page) = &visit.node.entry else { continue };
            let source = sitemap.base_dir().join(page);
            let content = fs::read_to_string(&source).map_err(|e| {
                if e.kind() == io::ErrorKind::NotFound {
                    RefmanError::Sitemap {
                        file: self.sitemap.clone(),
                        line: visit.node.line,
                        message: format!("page `{}` not found", source.display()),
                    }
                } else {
                    RefmanError::io(&source, e)
                }
            })?;
            self.inputs.push(source.clone());
            let file_name = page.file_name().map(PathBuf::from).unwrap_or_default();
            statics.push((i, visit.dir.join(file_name), source, content));
        }

        let placeholder = visits.iter().find(|v| v.node.entry == Entry::Placeholder);
        let placements = links::placements(
            self.manual,
            self.modules,
            statics.iter().map(|(_, out, source, content)| StaticPage {
                out,
                source,
                content,
            }),
            placeholder.is_none(),
        )?;
        let refdir = placeholder.map(|v| v.dir.clone()).unwrap_or_default();
        let resolver = match placeholder {
            Some(_) => Resolver::new(self.manual, self.modules, &refdir),
            None => {
                info!(
                    sitemap = %self.sitemap.display(),
                    inserted = placements.len(),
                    "no {} in sitemap, symbols link to the pages inserting them", PLACEHOLDER
                );
                Resolver::inserted(self.manual, self.modules, &placements)
            }
        };
        let generated = if placeholder.is_some() {
            self.generated_pages()
        } else {
            Vec::new()
        };

        let mut files: IndexMap<PathBuf, String> = IndexMap::new();
        let mut statics = statics.into_iter().peekable();
        for (i, visit) in visits.iter().enumerate() {
            match &visit.node.entry {
                Entry::Page(_) => {
                    let Some((_, out, source, content)) = statics.next_if(|(j, ..)| *j == i) else {
                        continue;
                    };
                    let rendered = PageRenderer::new(&resolver, &out, &source).static_page(&content)?;
                    debug!(page = %out.display(), "static page rendered");
                    add_file(&mut files, out, rendered, &self.sitemap, visit.node.line)?;
                }
                Entry::Placeholder => {
                    for (name, module) in &generated {
                        let out = refdir.join(name);
                        let renderer = PageRenderer::new(&resolver, &out, &out);
                        let rendered = match module {
                            Some(module) => renderer.module_page(module)?,
                            None => renderer.manual_page()?,
                        };
                        debug!(page = %out.display(), "reference page rendered");
                        add_file(&mut files, out, rendered, &self.sitemap, visit.node.line)?;
                    }
                }
            }
        }

        add_file(
            &mut files,
            PathBuf::from(SITEMAP_FILE),
            sitemap.render(&generated.iter().map(|(name, _)| name.clone()).collect::<Vec<_>>()),
            &self.sitemap,
            0,
        )?;
        self.link_lines = resolver.link_defs();
        Ok(files)
    }

    /// File names of the generated reference pages, in sitemap order, with
    /// the module each one documents.
    fn generated_pages(&self) -> Vec<(String, Option<&'a Module>)> {
        let mut pages = vec![(format!("{}.md", MANUAL_PAGE), None)];
        if self.modules {
            pages.extend(
                self.manual
                    .modules()
                    .filter(|m| !m.info.hidden)
                    .map(|m| (m.path().anchor().page_file(), Some(m))),
            );
        }
        pages
    }
}

impl Generator for MarkdownGenerator<'_> {
    fn generate(&mut self) -> Result<()> {
        let files = self.render()?;

        let mut writer = Rollback::default();
        let result = files
            .iter()
            .try_for_each(|(rel, content)| writer.write(&self.out.join(rel), content))
            .and_then(|()| match &self.link_defs {
                Some(path) => writer.write(path, &self.link_lines),
                None => Ok(()),
            });
        if let Err(err) = result {
            writer.undo();
            return Err(err);
        }

        info!(
            pages = files.len() - 1,
            out = %self.out.display(),
            link_defs = self.link_defs.is_some(),
            "markdown generated"
        );
        Ok(())
    }

    fn input_files(&self) -> Vec<PathBuf> {
        self.inputs.clone()
    }
}

fn add_file(
    files: &mut IndexMap<PathBuf, String>,
    path: PathBuf,
    content: String,
    sitemap: &Path,
    line: usize,
) -> Result<()> {
    if files.contains_key(&path) {
        return Err(RefmanError::Sitemap {
            file: sitemap.to_path_buf(),
            line,
            message: format!("output `{}` is produced twice", path.display()),
        });
    }
    files.insert(path, content);
    Ok(())
}

/// Writes files while remembering how to restore the previous state.
#[derive(Default)]
struct Rollback {
    /// Written files with their previous contents.
    files: Vec<(PathBuf, Option<Vec<u8>>)>,
    /// Directories created, outermost first.
    dirs: Vec<PathBuf>,
}

impl Rollback {
    fn write(&mut self, path: &Path, content: &str) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            self.create_dirs(parent)?;
        }
        let previous = match fs::read(path) {
            Ok(bytes) => Some(bytes),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => return Err(RefmanError::io(path, e)),
        };
        self.files.push((path.to_path_buf(), previous));
        fs::write(path, content).map_err(|e| RefmanError::io(path, e))
    }

    fn create_dirs(&mut self, dir: &Path) -> Result<()> {
        let missing: Vec<PathBuf> = dir
            .ancestors()
            .take_while(|d| !d.as_os_str().is_empty() && !d.exists())
            .map(Path::to_path_buf)
            .collect();
        if missing.is_empty() {
            return Ok(());
        }
        fs::create_dir_all(dir).map_err(|e| RefmanError::io(dir, e))?;
        self.dirs.extend(missing.into_iter().rev());
        Ok(())
    }

    /// Best effort: restore overwritten files, delete new ones and remove
    /// the directories created on the way.
    fn undo(self) {
        for (path, previous) in self.files.into_iter().rev() {
            let _ = match previous {
                Some(bytes) => fs::write(&path, bytes),
                None => fs::remove_file(&path),
            };
        }
        for dir in self.dirs.into_iter().rev() {
            let _ = fs::remove_dir(&dir);
        }
    }
}
