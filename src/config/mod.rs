//! Credential and configuration lookup.
//!
//! Groundwork reads its credentials from the process environment, layered on
//! top of an optional `.env` file. The store is read-only for the lifetime of
//! a setup run; descriptors reference secrets by key name and resolve them
//! through [`CredentialStore::lookup`] only at the point of use.

pub mod credentials;
pub mod env_file;

pub use credentials::{
    CloudCredentials, CredentialStore, DbAdminCredentials, EnvCredentials, GitHostCredentials,
};
pub use env_file::EnvFileParser;
