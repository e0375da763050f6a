//! Generator module, trait-based backend dispatch.

pub mod markdown;
pub mod pickle;
pub mod print;

use crate::error::Result;
use crate::model::ReferenceManual;
use crate::registry::Registry;
use std::path::PathBuf;

/// A backend turning a frozen manual into artifacts.
pub trait Generator {
    fn generate(&mut self) -> Result<()>;

    /// Files read by the generator besides the manual itself.
    fn input_files(&self) -> Vec<PathBuf> {
        Vec::new()
    }
}

#[derive(Debug, Clone, Default)]
pub struct GeneratorOptions {
    /// Output directory (markdown) or file (pickle).
    pub out: PathBuf,
    pub sitemap: PathBuf,
    pub link_defs: Option<PathBuf>,
    /// Generate one page per module.
    pub modules: bool,
    pub force_color: bool,
}

pub type GeneratorFactory =
    for<'a> fn(&'a ReferenceManual, &GeneratorOptions) -> Box<dyn Generator + 'a>;

/// Every built-in generator.
pub fn registry() -> Registry<GeneratorFactory> {
    let mut registry: Registry<GeneratorFactory> = Registry::new("generator");
    registry
        .register("print", print_generator)
        .register("pickle", pickle_generator)
        .register("md", markdown_generator);
    registry
}

fn print_generator<'a>(
    manual: &'a ReferenceManual,
    options: &GeneratorOptions,
) -> Box<dyn Generator + 'a> {
    Box::new(print::PrintGenerator::new(manual, options.force_color))
}

fn pickle_generator<'a>(
    manual: &'a ReferenceManual,
    options: &GeneratorOptions,
) -> Box<dyn Generator + 'a> {
    Box::new(pickle::PickleGenerator::new(manual, &options.out))
}

fn markdown_generator<'a>(
    manual: &'a ReferenceManual,
    options: &GeneratorOptions,
) -> Box<dyn Generator + 'a> {
    Box::new(markdown::MarkdownGenerator::new(manual, options))
}
