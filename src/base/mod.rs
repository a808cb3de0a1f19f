//! Base types and error handling.
//!
//! - [`StoreError`](storeerror::StoreError): error codes shared by the cookie
//!   store and its backing stores
//! - [`context`]: extension traits attaching operation context to errors

pub mod context;
pub mod storeerror;

#[cfg(test)]
mod tests;
