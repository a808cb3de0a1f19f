//! Cookie record codec.
//!
//! Converts between [`CanonicalCookie`] and the serializable [`CookieRecord`],
//! and between a bucket of cookies and its JSON wire form.
//!
//! Records are schema-tolerant: unknown fields are ignored and every field
//! added after the first release is optional, so entries written by a newer
//! version of this crate still load.

use crate::base::storeerror::StoreError;
use crate::cookies::canonicalcookie::{CanonicalCookie, CookiePriority, SameSite};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Attributes the host runtime is able to report about a cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformCapabilities {
    /// Whether the runtime can read a cookie's HttpOnly flag.
    pub http_only: bool,
}

impl PlatformCapabilities {
    /// Full capability set of this runtime.
    pub fn detect() -> Self {
        Self { http_only: true }
    }

    /// A runtime that cannot read the HttpOnly flag.
    pub fn without_http_only() -> Self {
        Self { http_only: false }
    }
}

impl Default for PlatformCapabilities {
    fn default() -> Self {
        Self::detect()
    }
}

/// Serializable representation of a cookie for persistence.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CookieRecord {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub domain: String,
    #[serde(default = "default_path")]
    pub path: String,
    #[serde(default)]
    pub secure: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_only: Option<bool>,
    /// Absent for session cookies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_unix_secs: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_subsec_nanos: Option<u32>,
    #[serde(default)]
    pub version: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_only: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub same_site: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_unix_secs: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_subsec_nanos: Option<u32>,
    /// Absent in older records; falls back to the creation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_access_unix_secs: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_access_subsec_nanos: Option<u32>,
}

fn default_path() -> String {
    "/".to_string()
}

/// Bidirectional cookie ↔ record conversion for one runtime.
#[derive(Debug, Clone, Copy, Default)]
pub struct CookieCodec {
    capabilities: PlatformCapabilities,
}

impl CookieCodec {
    pub fn new(capabilities: PlatformCapabilities) -> Self {
        Self { capabilities }
    }

    pub fn capabilities(&self) -> PlatformCapabilities {
        self.capabilities
    }

    /// Project every readable attribute of `cookie` onto a record.
    pub fn to_record(&self, cookie: &CanonicalCookie) -> CookieRecord {
        let (expires_unix_secs, expires_subsec_nanos) = match cookie.expiration_time {
            Some(t) => (Some(t.unix_timestamp()), Some(t.nanosecond())),
            None => (None, None),
        };
        CookieRecord {
            name: cookie.name.clone(),
            value: cookie.value.clone(),
            domain: cookie.domain.clone(),
            path: cookie.path.clone(),
            secure: cookie.secure,
            http_only: self.capabilities.http_only.then_some(cookie.http_only),
            expires_unix_secs,
            expires_subsec_nanos,
            version: cookie.version,
            host_only: Some(cookie.host_only),
            same_site: Some(cookie.same_site.as_str().to_string()),
            priority: Some(cookie.priority.as_str().to_string()),
            created_unix_secs: Some(cookie.creation_time.unix_timestamp()),
            created_subsec_nanos: Some(cookie.creation_time.nanosecond()),
            last_access_unix_secs: Some(cookie.last_access_time.unix_timestamp()),
            last_access_subsec_nanos: Some(cookie.last_access_time.nanosecond()),
        }
    }

    /// Rebuild a cookie from a record. Absent attributes keep the defaults of
    /// [`CanonicalCookie::new`].
    pub fn from_record(&self, record: CookieRecord) -> Result<CanonicalCookie, StoreError> {
        let creation_time = match record.created_unix_secs {
            Some(secs) => timestamp(secs, record.created_subsec_nanos, "created")?,
            None => OffsetDateTime::now_utc(),
        };
        let expiration_time = record
            .expires_unix_secs
            .map(|secs| timestamp(secs, record.expires_subsec_nanos, "expires"))
            .transpose()?;
        let last_access_time = record
            .last_access_unix_secs
            .map(|secs| timestamp(secs, record.last_access_subsec_nanos, "last_access"))
            .transpose()?;

        let mut cookie = CanonicalCookie::new(
            record.name,
            record.value,
            record.domain,
            record.path,
            creation_time,
            expiration_time,
        )
        .with_secure(record.secure);

        if let Some(http_only) = record.http_only {
            cookie.http_only = http_only;
        }
        if let Some(host_only) = record.host_only {
            cookie.host_only = host_only;
        }
        if let Some(same_site) = record.same_site.as_deref() {
            cookie.same_site = SameSite::parse(same_site);
        }
        if let Some(priority) = record.priority.as_deref() {
            cookie.priority = CookiePriority::parse(priority);
        }
        if let Some(last_access) = last_access_time {
            cookie.last_access_time = last_access;
        }
        cookie.version = record.version;

        Ok(cookie)
    }

    /// Encode a bucket as a JSON array of records.
    pub fn encode(&self, cookies: &[CanonicalCookie]) -> Result<String, StoreError> {
        let records: Vec<CookieRecord> = cookies.iter().map(|c| self.to_record(c)).collect();
        Ok(serde_json::to_string(&records)?)
    }

    /// Decode a JSON array of records back into a bucket.
    pub fn decode(&self, encoded: &str) -> Result<Vec<CanonicalCookie>, StoreError> {
        let value: serde_json::Value = serde_json::from_str(encoded)?;
        if !value.is_array() {
            return Err(StoreError::invalid_entry("expected an array of cookie records"));
        }

        let records: Vec<CookieRecord> = serde_json::from_value(value)?;
        records
            .into_iter()
            .map(|record| self.from_record(record))
            .collect()
    }
}

/// Rebuild an instant from whole seconds plus an optional sub-second part.
fn timestamp(
    secs: i64,
    subsec_nanos: Option<u32>,
    field: &str,
) -> Result<OffsetDateTime, StoreError> {
    let nanos = subsec_nanos.unwrap_or(0);
    if nanos >= 1_000_000_000 {
        return Err(StoreError::invalid_entry(format!(
            "{} sub-second nanos out of range: {}",
            field, nanos
        )));
    }
    let total = i128::from(secs) * 1_000_000_000 + i128::from(nanos);
    OffsetDateTime::from_unix_timestamp_nanos(total).map_err(|_| {
        StoreError::invalid_entry(format!("{} timestamp out of range: {}", field, secs))
    })
}
