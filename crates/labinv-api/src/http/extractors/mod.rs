//! Request extractors: bearer-token auth, query strings, CSV uploads.

pub mod auth;
pub mod query;
pub mod upload;
