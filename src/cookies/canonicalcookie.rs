use time::OffsetDateTime;

/// Represents a cookie.
/// Modeled after Chromium's `net::CanonicalCookie`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalCookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
    pub creation_time: OffsetDateTime,
    pub expiration_time: Option<OffsetDateTime>,
    pub last_access_time: OffsetDateTime,
    pub secure: bool,
    pub http_only: bool,
    pub host_only: bool,
    pub same_site: SameSite,
    pub priority: CookiePriority,
    /// 0 for Netscape cookies, 1 for RFC 2965 cookies.
    pub version: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    Unspecified,
    NoRestriction,
    Lax,
    Strict,
}

impl SameSite {
    pub fn as_str(&self) -> &'static str {
        match self {
            SameSite::Unspecified => "unspecified",
            SameSite::NoRestriction => "no_restriction",
            SameSite::Lax => "lax",
            SameSite::Strict => "strict",
        }
    }

    /// Unrecognized values fall back to `Unspecified`.
    pub fn parse(value: &str) -> Self {
        match value {
            "no_restriction" => SameSite::NoRestriction,
            "lax" => SameSite::Lax,
            "strict" => SameSite::Strict,
            _ => SameSite::Unspecified,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CookiePriority {
    Low,
    Medium,
    High,
}

impl CookiePriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            CookiePriority::Low => "low",
            CookiePriority::Medium => "medium",
            CookiePriority::High => "high",
        }
    }

    /// Unrecognized values fall back to `Medium`.
    pub fn parse(value: &str) -> Self {
        match value {
            "low" => CookiePriority::Low,
            "high" => CookiePriority::High,
            _ => CookiePriority::Medium,
        }
    }
}

impl CanonicalCookie {
    pub fn new(
        name: impl Into<String>,
        value: impl Into<String>,
        domain: impl Into<String>,
        path: impl Into<String>,
        creation_time: OffsetDateTime,
        expiration_time: Option<OffsetDateTime>,
    ) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: domain.into(),
            path: path.into(),
            creation_time,
            expiration_time,
            last_access_time: creation_time,
            secure: false,
            http_only: false,
            host_only: true, // Default to host-only if not specified
            same_site: SameSite::Unspecified,
            priority: CookiePriority::Medium,
            version: 0,
        }
    }

    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn with_http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }

    pub fn with_host_only(mut self, host_only: bool) -> Self {
        self.host_only = host_only;
        self
    }

    pub fn is_expired(&self, current_time: OffsetDateTime) -> bool {
        if let Some(expiry) = self.expiration_time {
            expiry <= current_time
        } else {
            false // Session cookie
        }
    }

    pub fn is_session(&self) -> bool {
        self.expiration_time.is_none()
    }

    /// Same `(name, domain, path)` triple. Name and domain compare
    /// case-insensitively, path exactly.
    pub fn same_identity(&self, other: &CanonicalCookie) -> bool {
        self.name.eq_ignore_ascii_case(&other.name)
            && self
                .domain
                .trim_start_matches('.')
                .eq_ignore_ascii_case(other.domain.trim_start_matches('.'))
            && self.path == other.path
    }
}
