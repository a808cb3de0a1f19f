//! # cookievault
//!
//! A persistent, encrypted cookie store.
//!
//! `cookievault` keeps an in-memory cookie index and durably mirrors it into
//! an encrypted key-value store, one entry per effective URI (scheme, host
//! and port). On startup the index is rebuilt from storage, skipping any
//! entry that no longer decodes.
//!
//! ## Features
//!
//! - **Cookie Index**: Effective-URI buckets with RFC 6265 domain/path matching
//! - **Write-Through Persistence**: Every add/remove rewrites exactly one entry
//! - **Encryption at Rest**: AES-256-GCM sealed SQLite rows with HMAC lookup ids
//! - **Corruption Tolerance**: Unreadable entries are logged and skipped
//! - **Thread Safety**: Mutations serialized per store name, lock-free reads
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use cookievault::cookies::persistence::PersistentCookieStore;
//! use cookievault::storage::memory::MemoryKeyValueStore;
//! use std::sync::Arc;
//!
//! let jar = PersistentCookieStore::open("default", Arc::new(MemoryKeyValueStore::new()))?;
//! jar.add(&url, cookie)?;
//! let matching = jar.get(&url);
//! ```
//!
//! ## Modules
//!
//! - [`base`] - Error types and error context helpers
//! - [`cookies`] - Cookie index, record codec, and persistent store
//! - [`storage`] - Key-value backing stores and entry encryption

pub mod base;
pub mod cookies;
pub mod storage;
