//! Root import resolution
//!
//! The report needs the project's own (non-transitive) imports split into
//! main and test sets. Scanning source trees is not this crate's job; the
//! shipped resolver trusts the manifest's declarations.

use crate::manifest::Manifest;

/// Resolves the root-level import names of a project
pub trait ImportResolver {
    /// Returns `(main_roots, test_roots)`, each sorted and de-duplicated
    fn resolve(&self) -> (Vec<String>, Vec<String>);
}

/// Resolver backed by the manifest's `import` and `testImport` lists
pub struct ManifestImports<'a> {
    manifest: &'a Manifest,
}

impl<'a> ManifestImports<'a> {
    pub fn new(manifest: &'a Manifest) -> Self {
        Self { manifest }
    }
}

impl ImportResolver for ManifestImports<'_> {
    fn resolve(&self) -> (Vec<String>, Vec<String>) {
        let roots = sorted_unique(self.manifest.imports.iter().map(|d| d.name.as_str()));
        let test_roots = sorted_unique(self.manifest.dev_imports.iter().map(|d| d.name.as_str()));
        (roots, test_roots)
    }
}

fn sorted_unique<'a>(names: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut out: Vec<String> = names
        .map(|n| n.trim_end_matches('/').to_string())
        .filter(|n| !n.is_empty())
        .collect();
    out.sort();
    out.dedup();
    out
}
