//! EAT Inventory — the request-flow orchestration layer.
//!
//! Every operation follows the same shape: evaluate the actor's
//! permission, perform the mutation (which commits its audit entry in
//! the same transaction, inside `eat-db`), then redact restricted
//! fields from anything returned. No record leaves this crate without
//! passing through the redactor.

pub mod actor;
pub mod admin;
pub mod application;
pub mod service;

pub use actor::Actor;
pub use admin::AdminService;
pub use application::ApplicationService;
pub use service::ResourceService;
