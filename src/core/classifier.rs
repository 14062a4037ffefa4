use std::collections::HashSet;

use super::{Category, DllName};

/// Sorts non-bundled library names into [`Category`] buckets using the
/// reference name sets.
#[derive(Debug, Clone, Default)]
pub struct LibraryClassifier {
    system: HashSet<DllName>,
    runtime: HashSet<DllName>,
}

impl LibraryClassifier {
    pub fn new<S, R>(system: S, runtime: R) -> Self
    where
        S: IntoIterator,
        S::Item: Into<DllName>,
        R: IntoIterator,
        R::Item: Into<DllName>,
    {
        Self {
            system: system.into_iter().map(Into::into).collect(),
            runtime: runtime.into_iter().map(Into::into).collect(),
        }
    }

    pub fn system_count(&self) -> usize {
        self.system.len()
    }

    pub fn runtime_count(&self) -> usize {
        self.runtime.len()
    }

    pub fn classify(&self, name: &DllName) -> Category {
        if self.system.contains(name) {
            return Category::System;
        }
        if self.runtime.contains(name) {
            return Category::CompilerRuntime;
        }
        if !name.has_extension() {
            return self.classify(&name.with_dll_extension());
        }
        Category::Unclassified
    }
}
