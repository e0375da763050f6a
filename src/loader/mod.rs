//! Loaders turn description documents into a frozen manual.

pub mod yaml;

use crate::error::Result;
use crate::model::ReferenceManual;
use crate::registry::Registry;
use std::path::{Path, PathBuf};

/// A source of description documents.
pub trait Loader {
    /// Parse, validate and freeze the manual.
    fn load(&mut self) -> Result<ReferenceManual>;

    /// Files consulted by the last [`Loader::load`].
    fn input_files(&self) -> &[PathBuf];
}

#[derive(Debug, Clone)]
pub struct LoaderOptions {
    /// Root directory of the description documents.
    pub root: PathBuf,
}

impl LoaderOptions {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }
}

pub type LoaderFactory = fn(&LoaderOptions) -> Box<dyn Loader>;

/// Every built-in loader.
pub fn registry() -> Registry<LoaderFactory> {
    let mut registry: Registry<LoaderFactory> = Registry::new("loader");
    registry.register("yaml", yaml_loader);
    registry
}

fn yaml_loader(options: &LoaderOptions) -> Box<dyn Loader> {
    Box::new(yaml::YamlLoader::new(&options.root))
}
