//! Permissions Module
//!
//! Compiles role-scoped insert, select, update and delete permissions on
//! tables against a field catalog, keeps their raw definitions and schema
//! dependencies in sync, and decides backend-only visibility per request.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod api;
pub mod config;
pub mod domain;
pub mod infra;
