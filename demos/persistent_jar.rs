use cookievault::cookies::canonicalcookie::CanonicalCookie;
use cookievault::cookies::persistence::{CookieStoreConfig, PersistentCookieStore};
use cookievault::storage::crypto::MasterKey;
use std::error::Error;
use time::{Duration, OffsetDateTime};
use url::Url;

fn main() -> Result<(), Box<dyn Error>> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("cookievault=debug"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let dir = tempfile::tempdir()?;
    let config = CookieStoreConfig {
        name: "demo".into(),
        database_path: Some(dir.path().join("cookies.db")),
        ..Default::default()
    };
    let key = MasterKey::generate();
    let url = Url::parse("https://httpbin.org/cookies")?;

    println!("--- Step 1: Storing cookies ---");
    {
        let jar = PersistentCookieStore::open_sqlite(&config, &key)?;
        let now = OffsetDateTime::now_utc();
        jar.add(
            &url,
            CanonicalCookie::new("session", "hello_cookievault", "httpbin.org", "/", now, None)
                .with_secure(true)
                .with_http_only(true),
        )?;
        jar.add(
            &url,
            CanonicalCookie::new(
                "theme",
                "dark",
                "httpbin.org",
                "/",
                now,
                Some(now + Duration::days(365)),
            ),
        )?;
        println!("Stored buckets: {:?}", jar.urls());
    }

    println!("\n--- Step 2: Reloading from disk ---");
    let jar = PersistentCookieStore::open_sqlite(&config, &key)?;
    for cookie in jar.get(&url) {
        println!(
            "{}={} (secure: {}, http_only: {})",
            cookie.name, cookie.value, cookie.secure, cookie.http_only
        );
    }

    println!("\n--- Step 3: Clearing ---");
    jar.remove_all()?;
    let jar = PersistentCookieStore::open_sqlite(&config, &key)?;
    println!("Cookies after clear: {}", jar.len());

    Ok(())
}
