//! Named backend factories.

use crate::error::{RefmanError, Result};
use indexmap::IndexMap;

/// Maps backend names to factories of type `F`.
pub struct Registry<F> {
    kind: &'static str,
    factories: IndexMap<&'static str, F>,
}

impl<F: Copy> Registry<F> {
    /// An empty registry; `kind` names the backend family in errors.
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            factories: IndexMap::new(),
        }
    }

    pub fn register(&mut self, name: &'static str, factory: F) -> &mut Self {
        self.factories.insert(name, factory);
        self
    }

    pub fn get(&self, name: &str) -> Result<F> {
        self.factories
            .get(name)
            .copied()
            .ok_or_else(|| RefmanError::UnknownBackend {
                kind: self.kind,
                name: name.to_string(),
                available: self.names().map(str::to_string).collect(),
            })
    }

    /// Registered names, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.factories.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one() -> u32 {
        1
    }

    fn two() -> u32 {
        2
    }

    #[test]
    fn lookup_by_name() {
        let mut registry: Registry<fn() -> u32> = Registry::new("number");
        registry.register("one", one).register("two", two);
        assert_eq!(registry.get("two").unwrap()(), 2);
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["one", "two"]);
    }

    #[test]
    fn unknown_name() {
        let mut registry: Registry<fn() -> u32> = Registry::new("number");
        registry.register("one", one);
        match registry.get("three") {
            Err(RefmanError::UnknownBackend {
                kind,
                name,
                available,
            }) => {
                assert_eq!(kind, "number");
                assert_eq!(name, "three");
                assert_eq!(available, vec!["one"]);
            }
            _ => panic!("expected UnknownBackend"),
        }
    }
}
