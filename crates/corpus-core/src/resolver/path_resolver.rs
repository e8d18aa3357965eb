//! Identifier resolution against the work catalog.
//!
//! An identifier names an entry through one of its keys: the relative source
//! path (`beethoven/opus18no3.mxl`), the corpus path without extension
//! (`handel/hwv56/movement1-01`) or the work (`bach/bwv846`). Exact key
//! matches win; otherwise any key ending in `/<identifier>` matches, which
//! covers bare stems like `altdeu10` and partial paths like `hwv56/movement1-01`.

use crate::catalog::{WorkCatalog, WorkEntry, WorkLocation};
use crate::error::{CorpusError, Result};
use crate::resolver::selector::{extension_allowed, normalize_identifier, MovementSelector};
use tracing::debug;

/// Resolves identifiers, composers and extensions to work locations.
///
/// All results follow catalog order.
pub struct PathResolver<'a> {
    catalog: &'a WorkCatalog,
}

impl<'a> PathResolver<'a> {
    pub fn new(catalog: &'a WorkCatalog) -> Self {
        Self { catalog }
    }

    /// Every entry the identifier names, after movement and extension filtering.
    pub fn matching_entries(
        &self,
        identifier: &str,
        movement: Option<&MovementSelector>,
        extensions: &[&str],
    ) -> Vec<&'a WorkEntry> {
        let id = normalize_identifier(identifier);
        if id.is_empty() {
            return Vec::new();
        }

        let candidates: Vec<&WorkEntry> = self
            .catalog
            .entries()
            .iter()
            .filter(|e| extension_allowed(extensions, &e.extension))
            .filter(|e| movement.map_or(true, |m| m.matches(e.movement.as_ref())))
            .collect();

        let exact: Vec<&WorkEntry> = candidates
            .iter()
            .copied()
            .filter(|e| e.identifier_keys().contains(&id.as_str()))
            .collect();
        if !exact.is_empty() {
            return exact;
        }

        let suffix = format!("/{}", id);
        let mut matches: Vec<&WorkEntry> = candidates
            .into_iter()
            .filter(|e| e.identifier_keys().iter().any(|k| k.ends_with(&suffix)))
            .collect();

        // A bare catalogue number (`bwv846`) prefers the collection that owns the prefix.
        if !id.contains('/') {
            if let Some(owner) = self
                .catalog
                .collections()
                .iter()
                .find(|c| c.claims_identifier(&id))
            {
                matches.sort_by_key(|e| e.collection != owner.name);
            }
        }

        matches
    }

    /// First matching location in catalog order.
    pub fn get_work(
        &self,
        identifier: &str,
        movement: Option<&MovementSelector>,
        extensions: &[&str],
    ) -> Result<WorkLocation> {
        match self.matching_entries(identifier, movement, extensions).first() {
            Some(entry) => Ok(entry.location.clone()),
            None => {
                debug!(
                    "No work for {:?} (movement={:?}, extensions={:?})",
                    identifier, movement, extensions
                );
                Err(CorpusError::NotFound {
                    identifier: identifier.to_string(),
                })
            }
        }
    }

    /// Every matching location; empty when nothing matches.
    pub fn get_work_list(
        &self,
        identifier: &str,
        movement: Option<&MovementSelector>,
        extensions: &[&str],
    ) -> Vec<WorkLocation> {
        self.matching_entries(identifier, movement, extensions)
            .into_iter()
            .map(|e| e.location.clone())
            .collect()
    }

    /// Local and virtual locations whose corpus path starts with `<composer>/`.
    pub fn get_composer(&self, composer: &str, extensions: &[&str]) -> Vec<WorkLocation> {
        let prefix = format!("{}/", normalize_identifier(composer));
        self.catalog
            .entries()
            .iter()
            .filter(|e| e.corpus_path.starts_with(&prefix))
            .filter(|e| extension_allowed(extensions, &e.extension))
            .map(|e| e.location.clone())
            .collect()
    }

    /// Every local location with one of the given extensions (all local files when empty).
    pub fn get_paths(&self, extensions: &[&str]) -> Vec<WorkLocation> {
        self.catalog
            .local_entries()
            .filter(|e| extension_allowed(extensions, &e.extension))
            .map(|e| e.location.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Collection, FileSystemStorage, VirtualCorpus, VirtualWork};
    use std::path::Path;
    use tempfile::TempDir;

    const FILES: &[&str] = &[
        "bach/bwv846/movement1.mxl",
        "bach/bwv846/movement2.mxl",
        "bach/artOfFugue_bwv1080/movement1.zip",
        "bach/artOfFugue_bwv1080/movement1.md",
        "bach/artOfFugue_bwv1080/movement2.md",
        "beethoven/opus18no1/movement1.mxl",
        "beethoven/opus18no1/movement1.zip",
        "beethoven/opus18no1/movement2.mxl",
        "beethoven/opus18no3.mxl",
        "essenFolksong/altdeu10.abc",
        "handel/hwv56/movement1-01.md",
        "handel/hwv56/movement1-02.md",
        "handel/hwv56/movement2-01.md",
        "josquin/fortunaDunGranTempo.abc",
    ];

    fn fixture() -> (TempDir, WorkCatalog) {
        let temp = TempDir::new().unwrap();
        for relative in FILES {
            let path = temp.path().join(relative);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, b"").unwrap();
        }

        let mut virtual_corpus = VirtualCorpus::new();
        virtual_corpus.register(
            VirtualWork::new("bach/bwv773", "http://example.org/inven02.krn", "J.S. Bach").unwrap(),
        );

        let collections = ["bach", "beethoven", "essenFolksong", "handel", "josquin"]
            .into_iter()
            .map(|name| match name {
                "bach" => Collection::new(name).with_alias("bwv"),
                _ => Collection::new(name),
            })
            .collect();

        let catalog =
            WorkCatalog::scan(temp.path(), collections, &virtual_corpus, &FileSystemStorage).unwrap();
        (temp, catalog)
    }

    #[test]
    fn test_get_work_round_trips_relative_paths() {
        let (_temp, catalog) = fixture();
        let resolver = PathResolver::new(&catalog);

        for relative in FILES {
            let location = resolver.get_work(relative, None, &[]).unwrap();
            assert!(location.ends_with(relative), "{} -> {}", relative, location);
        }
    }

    #[test]
    fn test_get_work_by_stem() {
        let (_temp, catalog) = fixture();
        let resolver = PathResolver::new(&catalog);

        let location = resolver.get_work("altdeu10", None, &[]).unwrap();
        assert!(location.ends_with("essenFolksong/altdeu10.abc"));

        let location = resolver.get_work("fortunaDunGranTempo", None, &[]).unwrap();
        assert!(location.ends_with("josquin/fortunaDunGranTempo.abc"));

        let location = resolver.get_work("hwv56/movement1-01", None, &[]).unwrap();
        assert!(location.ends_with("handel/hwv56/movement1-01.md"));
    }

    #[test]
    fn test_get_work_picks_first_in_catalog_order() {
        let (_temp, catalog) = fixture();
        let resolver = PathResolver::new(&catalog);

        let location = resolver.get_work("bach/bwv846", None, &[]).unwrap();
        assert!(location.ends_with("bach/bwv846/movement1.mxl"));
    }

    #[test]
    fn test_get_work_not_found() {
        let (_temp, catalog) = fixture();
        let resolver = PathResolver::new(&catalog);

        let err = resolver.get_work("bach/bwv9999", None, &[]).unwrap_err();
        assert!(matches!(err, CorpusError::NotFound { .. }));

        let err = resolver
            .get_work("bach/bwv846", Some(&MovementSelector::Number(3)), &[])
            .unwrap_err();
        assert!(matches!(err, CorpusError::NotFound { .. }));
    }

    #[test]
    fn test_get_work_list_movements() {
        let (_temp, catalog) = fixture();
        let resolver = PathResolver::new(&catalog);

        assert_eq!(resolver.get_work_list("bwv846", None, &[]).len(), 2);
        assert_eq!(resolver.get_work_list("bwv846", Some(&MovementSelector::Number(1)), &[]).len(), 1);
        assert_eq!(resolver.get_work_list("bwv846", Some(&MovementSelector::Number(2)), &[]).len(), 1);

        // two editions of the same movement
        assert_eq!(
            resolver.get_work_list("beethoven/opus18no1", Some(&MovementSelector::Number(1)), &[]).len(),
            2
        );
    }

    #[test]
    fn test_get_work_list_composite_movements() {
        let (_temp, catalog) = fixture();
        let resolver = PathResolver::new(&catalog);

        assert_eq!(resolver.get_work_list("handel/hwv56", None, &[".md"]).len(), 3);
        assert_eq!(
            resolver.get_work_list("handel/hwv56", Some(&MovementSelector::Range(1, 1)), &[".md"]).len(),
            1
        );
        assert_eq!(
            resolver.get_work_list("handel/hwv56", Some(&MovementSelector::from("1-01")), &[".md"]).len(),
            1
        );
        assert_eq!(resolver.get_work_list("handel/hwv56", Some(&MovementSelector::Number(1)), &[]).len(), 2);
    }

    #[test]
    fn test_get_work_list_extension_filter() {
        let (_temp, catalog) = fixture();
        let resolver = PathResolver::new(&catalog);

        assert_eq!(resolver.get_work_list("bach/artOfFugue_bwv1080", None, &[]).len(), 3);
        assert_eq!(
            resolver
                .get_work_list("bach/artOfFugue_bwv1080", Some(&MovementSelector::Number(1)), &[".zip"])
                .len(),
            1
        );
        assert_eq!(
            resolver
                .get_work_list("bach/artOfFugue_bwv1080", None, &["md", "zip"])
                .len(),
            3
        );
        assert!(resolver.get_work_list("nothing/here", None, &[]).is_empty());
    }

    #[test]
    fn test_backslash_identifiers() {
        let (_temp, catalog) = fixture();
        let resolver = PathResolver::new(&catalog);

        assert_eq!(resolver.get_work_list("bach\\bwv846", None, &[]).len(), 2);
    }

    #[test]
    fn test_resolution_is_case_sensitive() {
        let (_temp, catalog) = fixture();
        let resolver = PathResolver::new(&catalog);

        assert!(resolver.get_work_list("BACH/bwv846", None, &[]).is_empty());
    }

    #[test]
    fn test_get_composer_includes_virtual() {
        let (_temp, catalog) = fixture();
        let resolver = PathResolver::new(&catalog);

        let bach = resolver.get_composer("bach", &[]);
        assert_eq!(bach.len(), 6);
        assert!(bach.last().unwrap().is_remote());

        assert_eq!(resolver.get_composer("bach", &["md"]).len(), 2);
        assert_eq!(resolver.get_composer("essenFolksong", &["abc"]).len(), 1);
        assert!(resolver.get_composer("nobody", &[]).is_empty());

        // stable across calls
        assert_eq!(resolver.get_composer("bach", &[]), bach);
    }

    #[test]
    fn test_get_paths_local_only() {
        let (_temp, catalog) = fixture();
        let resolver = PathResolver::new(&catalog);

        assert_eq!(resolver.get_paths(&[".md"]).len(), 5);
        assert!(resolver.get_paths(&[".krn"]).is_empty());
        assert_eq!(resolver.get_paths(&[]).len(), FILES.len());
        assert!(resolver
            .get_paths(&[])
            .iter()
            .all(|l| l.as_local().map(Path::is_file).unwrap_or(false)));
    }
}
