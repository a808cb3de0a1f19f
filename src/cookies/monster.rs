use crate::cookies::canonicalcookie::CanonicalCookie;
use dashmap::DashMap;
use std::sync::Arc;
use time::OffsetDateTime;
use url::Url;

/// Maximum cookies per effective URI (Chromium's per-domain default).
pub const MAX_COOKIES_PER_URI: usize = 50;

/// Derive the effective URI for a request URL: the ASCII serialization of
/// its tuple origin (scheme, host and non-default port).
///
/// Returns `None` for URLs with an opaque origin such as `data:` or `file:`.
pub fn effective_uri(url: &Url) -> Option<String> {
    let origin = url.origin();
    if !origin.is_tuple() {
        return None;
    }
    Some(origin.ascii_serialization())
}

/// In-memory cookie index bucketed by effective URI.
/// Modeled after Chromium's `net::CookieMonster`.
pub struct CookieMonster {
    // Store: Map<EffectiveUri, List<Cookie>>
    // Using DashMap for lock-free concurrent reads.
    store: Arc<DashMap<String, Vec<CanonicalCookie>>>,
    max_cookies_per_uri: usize,
}

impl Default for CookieMonster {
    fn default() -> Self {
        Self::new()
    }
}

impl CookieMonster {
    pub fn new() -> Self {
        Self::with_limit(MAX_COOKIES_PER_URI)
    }

    /// Create an index that keeps at most `max_cookies_per_uri` cookies in
    /// each bucket, evicting the oldest first.
    pub fn with_limit(max_cookies_per_uri: usize) -> Self {
        Self {
            store: Arc::new(DashMap::new()),
            max_cookies_per_uri: max_cookies_per_uri.max(1),
        }
    }

    /// Add a cookie under the effective URI of `url`.
    ///
    /// Any cookie with the same identity is replaced. An already-expired
    /// cookie only removes its predecessor, which is how servers delete
    /// cookies. URLs without an effective URI are ignored.
    pub fn add(&self, url: &Url, cookie: CanonicalCookie) {
        let Some(key) = effective_uri(url) else {
            return;
        };

        let mut entry = self.store.entry(key.clone()).or_default();

        entry.retain(|c| !c.same_identity(&cookie));

        if !cookie.is_expired(OffsetDateTime::now_utc()) {
            // Enforce per-URI limit with LRU eviction
            while entry.len() >= self.max_cookies_per_uri {
                // Remove oldest cookie (by creation_time)
                if let Some(oldest_idx) = entry
                    .iter()
                    .enumerate()
                    .min_by_key(|(_, c)| c.creation_time)
                    .map(|(i, _)| i)
                {
                    entry.remove(oldest_idx);
                } else {
                    break;
                }
            }

            entry.push(cookie);
        }

        let now_empty = entry.is_empty();
        drop(entry); // Release shard lock before removing

        if now_empty {
            self.store.remove_if(&key, |_, cookies| cookies.is_empty());
        }
    }

    /// Remove the cookie with the same identity as `cookie` from the bucket
    /// of `url`. Returns true if a cookie was removed.
    pub fn remove(&self, url: &Url, cookie: &CanonicalCookie) -> bool {
        let Some(key) = effective_uri(url) else {
            return false;
        };

        let removed = match self.store.get_mut(&key) {
            Some(mut entry) => {
                let before = entry.len();
                entry.retain(|c| !c.same_identity(cookie));
                entry.len() != before
            }
            None => false,
        };

        self.store.remove_if(&key, |_, cookies| cookies.is_empty());
        removed
    }

    /// Clear all cookies. Returns true if the index held any.
    pub fn remove_all(&self) -> bool {
        let had_cookies = !self.store.is_empty();
        self.store.clear();
        had_cookies
    }

    /// Snapshot of the bucket for an effective URI, if it holds any cookies.
    pub fn cookies_for(&self, effective_uri: &str) -> Option<Vec<CanonicalCookie>> {
        self.store
            .get(effective_uri)
            .filter(|entry| !entry.is_empty())
            .map(|entry| entry.value().clone())
    }

    /// Replace a whole bucket, as read back from persistent storage.
    /// Empty buckets are dropped.
    pub(crate) fn restore_bucket(&self, effective_uri: String, cookies: Vec<CanonicalCookie>) {
        if cookies.is_empty() {
            self.store.remove(&effective_uri);
        } else {
            self.store.insert(effective_uri, cookies);
        }
    }

    /// Get cookies matching the URL with proper domain suffix matching.
    pub fn get(&self, url: &Url) -> Vec<CanonicalCookie> {
        let mut result = Vec::new();
        let host = url.host_str().unwrap_or("");
        let now = OffsetDateTime::now_utc();

        for entry in self.store.iter() {
            for cookie in entry.value().iter() {
                // Check domain match
                if !Self::domain_matches(&cookie.domain, host, cookie.host_only) {
                    continue;
                }

                // Check path
                if !Self::path_matches(&cookie.path, url.path()) {
                    continue;
                }

                // Check secure
                if cookie.secure && url.scheme() != "https" {
                    continue;
                }

                // Check expiry
                if cookie.is_expired(now) {
                    continue;
                }

                result.push(cookie.clone());
            }
        }

        // Sort by path length (longest first) then creation time
        result.sort_by(|a, b| {
            b.path
                .len()
                .cmp(&a.path.len())
                .then_with(|| a.creation_time.cmp(&b.creation_time))
        });

        result
    }

    /// Check if cookie domain matches request host.
    /// Implements RFC 6265 domain matching.
    fn domain_matches(cookie_domain: &str, request_host: &str, host_only: bool) -> bool {
        let cookie_domain = cookie_domain.trim_start_matches('.');

        if host_only {
            // Host-only cookie: exact match required
            return cookie_domain.eq_ignore_ascii_case(request_host);
        }

        if request_host.eq_ignore_ascii_case(cookie_domain) {
            return true;
        }

        // Check if request_host ends with .cookie_domain
        if request_host.len() > cookie_domain.len() {
            let split = request_host.len() - cookie_domain.len();
            if let Some(suffix) = request_host.get(split..) {
                if suffix.eq_ignore_ascii_case(cookie_domain) {
                    // Check that the character before is a dot
                    return request_host.as_bytes()[split - 1] == b'.';
                }
            }
        }

        false
    }

    /// Check if request path matches cookie path.
    /// Implements RFC 6265 path matching.
    fn path_matches(cookie_path: &str, request_path: &str) -> bool {
        if request_path == cookie_path {
            return true;
        }

        if request_path.starts_with(cookie_path) {
            // Cookie path is a prefix
            if cookie_path.ends_with('/') {
                return true;
            }
            // Check that the next character in request_path is '/'
            return request_path.as_bytes().get(cookie_path.len()) == Some(&b'/');
        }

        false
    }

    /// All cookies across every bucket.
    pub fn cookies(&self) -> Vec<CanonicalCookie> {
        self.store
            .iter()
            .flat_map(|entry| entry.value().clone())
            .collect()
    }

    /// Effective URIs with at least one cookie.
    pub fn urls(&self) -> Vec<String> {
        let mut urls: Vec<String> = self
            .store
            .iter()
            .filter(|entry| !entry.is_empty())
            .map(|entry| entry.key().clone())
            .collect();
        urls.sort();
        urls
    }

    /// Get total cookie count.
    pub fn len(&self) -> usize {
        self.store.iter().map(|e| e.value().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;

    fn make_test_cookie(name: &str, domain: &str) -> CanonicalCookie {
        let now = OffsetDateTime::now_utc();
        CanonicalCookie::new(name, "test_value", domain, "/", now, Some(now + Duration::days(30)))
    }

    #[test]
    fn test_effective_uri() {
        let url = Url::parse("https://Example.com/path?q=1").unwrap();
        assert_eq!(effective_uri(&url).as_deref(), Some("https://example.com"));

        let with_port = Url::parse("http://example.com:8080/a").unwrap();
        assert_eq!(
            effective_uri(&with_port).as_deref(),
            Some("http://example.com:8080")
        );

        let opaque = Url::parse("data:text/plain,hello").unwrap();
        assert_eq!(effective_uri(&opaque), None);
    }

    #[test]
    fn test_add_replaces_same_identity() {
        let jar = CookieMonster::new();
        let url = Url::parse("https://example.com/").unwrap();

        jar.add(&url, make_test_cookie("session", "example.com"));
        let mut updated = make_test_cookie("session", "example.com");
        updated.value = "new".to_string();
        jar.add(&url, updated);

        let bucket = jar.cookies_for("https://example.com").unwrap();
        assert_eq!(bucket.len(), 1);
        assert_eq!(bucket[0].value, "new");
    }

    #[test]
    fn test_expired_add_deletes_predecessor() {
        let jar = CookieMonster::new();
        let url = Url::parse("https://example.com/").unwrap();
        jar.add(&url, make_test_cookie("session", "example.com"));

        let now = OffsetDateTime::now_utc();
        let tombstone = CanonicalCookie::new(
            "session",
            "",
            "example.com",
            "/",
            now,
            Some(now - Duration::seconds(1)),
        );
        jar.add(&url, tombstone);

        assert!(jar.cookies_for("https://example.com").is_none());
        assert!(jar.urls().is_empty());
    }

    #[test]
    fn test_bucket_limit_evicts_oldest() {
        let jar = CookieMonster::with_limit(2);
        let url = Url::parse("https://example.com/").unwrap();
        let base = OffsetDateTime::now_utc();

        for (i, name) in ["a", "b", "c"].iter().enumerate() {
            let created = base + Duration::seconds(i as i64);
            jar.add(&url, CanonicalCookie::new(*name, "v", "example.com", "/", created, None));
        }

        let names: Vec<String> = jar
            .cookies_for("https://example.com")
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["b", "c"]);
    }

    #[test]
    fn test_remove_empties_bucket() {
        let jar = CookieMonster::new();
        let url = Url::parse("https://example.com/").unwrap();
        let cookie = make_test_cookie("session", "example.com");

        jar.add(&url, cookie.clone());
        assert!(jar.remove(&url, &cookie));
        assert!(!jar.remove(&url, &cookie));
        assert!(jar.cookies_for("https://example.com").is_none());
    }

    #[test]
    fn test_invalid_url_is_ignored() {
        let jar = CookieMonster::new();
        let url = Url::parse("data:text/plain,hi").unwrap();
        let cookie = make_test_cookie("session", "example.com");

        jar.add(&url, cookie.clone());
        assert!(jar.is_empty());
        assert!(!jar.remove(&url, &cookie));
    }

    #[test]
    fn test_remove_all_reports_change() {
        let jar = CookieMonster::new();
        let url = Url::parse("https://example.com/").unwrap();
        jar.add(&url, make_test_cookie("a", "example.com"));

        assert!(jar.remove_all());
        assert!(!jar.remove_all());
        assert_eq!(jar.len(), 0);
    }

    #[test]
    fn test_domain_cookie_matches_subdomain() {
        let jar = CookieMonster::new();
        let url = Url::parse("https://example.com/").unwrap();
        jar.add(&url, make_test_cookie("wide", "example.com").with_host_only(false));
        jar.add(&url, make_test_cookie("narrow", "example.com"));

        let sub = Url::parse("https://www.example.com/").unwrap();
        let names: Vec<String> = jar.get(&sub).into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["wide"]);
    }
}
