use std::collections::BTreeSet;

use super::models::Manifest;

/// Identifiers whose detail record must be (re-)fetched: every entry of `remote`
/// that is new or whose version differs from `local`.
///
/// Identifiers only known locally are never part of the plan; see [`stale`].
#[must_use]
pub fn plan(remote: &Manifest, local: &Manifest) -> BTreeSet<String> {
    remote
        .iter()
        .filter(|(identifier, version)| local.get(identifier) != Some(version.as_str()))
        .map(|(identifier, _)| identifier.clone())
        .collect()
}

/// Identifiers present locally that the remote manifest no longer lists.
#[must_use]
pub fn stale(remote: &Manifest, local: &Manifest) -> BTreeSet<String> {
    local
        .identifiers()
        .filter(|identifier| !remote.contains(identifier))
        .map(str::to_owned)
        .collect()
}

/// Manifest to persist after a cycle in which `failed` identifiers could not be fetched.
///
/// A failed entry keeps its previous local version (or stays absent) so the next
/// cycle plans it again.
#[must_use]
pub fn settle(remote: &Manifest, local: &Manifest, failed: &BTreeSet<String>) -> Manifest {
    remote
        .iter()
        .filter_map(|(identifier, version)| {
            if failed.contains(identifier) {
                local
                    .get(identifier)
                    .map(|previous| (identifier.clone(), previous.to_owned()))
            } else {
                Some((identifier.clone(), version.clone()))
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest(entries: &[(&str, &str)]) -> Manifest {
        entries.iter().copied().collect()
    }

    fn ids(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn identical_manifests_need_no_work() {
        let m = manifest(&[("A", "1.0"), ("B", "2.0")]);
        assert!(plan(&m, &m).is_empty());
    }

    #[test]
    fn cold_start_fetches_everything() {
        let remote = manifest(&[("A", "1.0"), ("B", "2.0"), ("C/iOS", "3")]);
        assert_eq!(plan(&remote, &Manifest::new()), ids(&["A", "B", "C/iOS"]));
    }

    #[test]
    fn new_identifier_is_planned() {
        let local = manifest(&[("A", "1.0")]);
        let remote = manifest(&[("A", "1.0"), ("B", "2.0")]);
        assert_eq!(plan(&remote, &local), ids(&["B"]));
    }

    #[test]
    fn changed_version_is_planned() {
        let local = manifest(&[("A", "1.0")]);
        let remote = manifest(&[("A", "1.1")]);
        assert_eq!(plan(&remote, &local), ids(&["A"]));
    }

    #[test]
    fn versions_compare_by_equality_only() {
        let local = manifest(&[("A", "2.0")]);
        let remote = manifest(&[("A", "1.0")]);
        assert_eq!(plan(&remote, &local), ids(&["A"]));
    }

    #[test]
    fn removed_upstream_is_neither_planned_nor_deleted() {
        let local = manifest(&[("A", "1.0"), ("B", "1.0")]);
        let remote = manifest(&[("A", "1.0")]);

        assert!(plan(&remote, &local).is_empty());
        assert_eq!(stale(&remote, &local), ids(&["B"]));
    }

    #[test]
    fn plan_is_exactly_the_differing_remote_keys() {
        let local = manifest(&[("A", "1"), ("B", "1"), ("D", "9")]);
        let remote = manifest(&[("A", "1"), ("B", "2"), ("C", "1")]);

        let planned = plan(&remote, &local);

        assert_eq!(planned, ids(&["B", "C"]));
        for identifier in &planned {
            assert!(remote.contains(identifier));
            assert_ne!(local.get(identifier), remote.get(identifier));
        }
        for (identifier, version) in &remote {
            if !planned.contains(identifier) {
                assert_eq!(local.get(identifier), Some(version.as_str()));
            }
        }
    }

    #[test]
    fn settle_keeps_previous_version_for_failed_entries() {
        let local = manifest(&[("A", "1.0"), ("B", "1.0"), ("Gone", "1")]);
        let remote = manifest(&[("A", "1.1"), ("B", "2.0"), ("C", "1.0")]);

        let settled = settle(&remote, &local, &ids(&["B", "C"]));

        assert_eq!(settled, manifest(&[("A", "1.1"), ("B", "1.0")]));
        assert_eq!(plan(&remote, &settled), ids(&["B", "C"]));
    }

    #[test]
    fn settle_without_failures_mirrors_remote() {
        let local = manifest(&[("A", "1.0")]);
        let remote = manifest(&[("A", "1.1"), ("B", "1")]);

        assert_eq!(settle(&remote, &local, &BTreeSet::new()), remote);
    }
}
