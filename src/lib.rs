//! Reference-manual generator.
//!
//! A [`loader`] turns a tree of per-symbol description documents into a
//! frozen [`model::ReferenceManual`]; a [`generator`] renders it as
//! markdown pages, a text dump or a binary snapshot.

pub mod depfile;
pub mod error;
pub mod generator;
pub mod loader;
pub mod model;
pub mod registry;

pub use error::{RefmanError, Result};
