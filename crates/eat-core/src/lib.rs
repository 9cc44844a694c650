//! EAT Core — domain models, role-based access control, field
//! redaction, audit diffing, and repository trait definitions.
//!
//! This crate has no I/O. The permission evaluator and redactor are
//! pure functions over role/grant/record data; persistence is
//! abstracted behind the traits in [`repository`].

pub mod audit;
pub mod error;
pub mod models;
pub mod rbac;
pub mod redact;
pub mod repository;
pub mod resource;
