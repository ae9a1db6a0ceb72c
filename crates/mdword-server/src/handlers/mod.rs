//! HTTP request handlers.

pub(crate) mod convert;
pub(crate) mod files;
pub(crate) mod health;
