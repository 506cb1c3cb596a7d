/// Resolves the caller's `allowed_resources` set for the C8 access filter.
/// Grounded in `original_source/karps/auth/deps.py`'s `get_allowed_resources`
/// dependency boundary: authentication itself is out of core scope (spec
/// §1's Non-goals), but the HTTP façade needs something to hand `context` a
/// resolved set.
use std::collections::HashSet;

use axum::http::HeaderMap;

/// `None` means every resource is allowed (the resolver couldn't or didn't
/// need to restrict); `Some(set)` is the explicit grant list `context`
/// compares `limited_access` resources against.
pub trait AccessResolver: Send + Sync {
    fn resolve(&self, headers: &HeaderMap) -> Option<HashSet<String>>;
}

/// Default no-auth resolver: every caller may read every resource,
/// `limited_access` included. Suitable for a deployment that sits behind its
/// own auth layer at the network edge.
pub struct AllowAll;

impl AccessResolver for AllowAll {
    fn resolve(&self, _headers: &HeaderMap) -> Option<HashSet<String>> {
        None
    }
}
