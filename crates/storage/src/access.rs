/// Access filter (C8). Grounded in `original_source/karps/auth/deps.py`'s
/// `get_allowed_resources` boundary and spec §4.7 — the core consumes an
/// already-resolved set of resource ids the caller may read; how that set is
/// produced (JWT, API key, none) is out of scope here.
use std::collections::HashSet;

use schema::ResourceConfig;

use crate::error::{KarpsError, Result};

/// Drops (by returning an error) any `limited_access` resource not present
/// in `allowed_resources`. Resources that are not `limited_access` always
/// pass through regardless of `allowed_resources`.
pub fn check_access(resource: &ResourceConfig, allowed_resources: &HashSet<String>) -> Result<()> {
    if resource.limited_access && !allowed_resources.contains(&resource.resource_id) {
        return Err(KarpsError::access_denied(&resource.resource_id));
    }
    Ok(())
}

/// Filters `resources`, returning only those the caller may read. Unlike
/// [`check_access`], this silently drops rather than erroring — used when
/// the caller has requested a CSV of resources and restricted ones should be
/// excluded rather than fail the whole request. Callers that need the
/// stricter all-or-nothing behaviour should use [`check_access`] directly.
pub fn filter_allowed<'a>(
    resources: &'a [ResourceConfig],
    allowed_resources: &HashSet<String>,
) -> Vec<&'a ResourceConfig> {
    resources
        .iter()
        .filter(|r| !r.limited_access || allowed_resources.contains(&r.resource_id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use schema::{EntryWord, ResourceField};
    use std::collections::HashMap;

    fn resource(id: &str, limited: bool) -> ResourceConfig {
        ResourceConfig {
            resource_id: id.to_string(),
            fields: vec![ResourceField { name: "entry_word".into(), primary: true }],
            label: HashMap::new(),
            description: None,
            entry_word: EntryWord { field: "entry_word".into(), description: None },
            updated: None,
            size: None,
            link: None,
            tags: vec![],
            limited_access: limited,
        }
    }

    #[test]
    fn test_unrestricted_resource_always_passes() {
        let r = resource("ao", false);
        assert!(check_access(&r, &HashSet::new()).is_ok());
    }

    #[test]
    fn test_restricted_resource_denied_without_grant() {
        let r = resource("secret", true);
        let err = check_access(&r, &HashSet::new()).unwrap_err();
        assert!(matches!(err, KarpsError::CodeUser { code: 2, .. }));
    }

    #[test]
    fn test_restricted_resource_allowed_with_grant() {
        let r = resource("secret", true);
        let mut allowed = HashSet::new();
        allowed.insert("secret".to_string());
        assert!(check_access(&r, &allowed).is_ok());
    }

    #[test]
    fn test_filter_allowed_drops_restricted() {
        let resources = vec![resource("ao", false), resource("secret", true)];
        let allowed = HashSet::new();
        let kept = filter_allowed(&resources, &allowed);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].resource_id, "ao");
    }
}
