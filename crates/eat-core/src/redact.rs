//! Field-level redaction of restricted attributes.
//!
//! Redaction is a single mandatory transformation stage applied by the
//! service layer before any record leaves it, rather than ad hoc
//! checks scattered across serializers. [`redact`] is pure and
//! idempotent: redacting an already-redacted record is a no-op.

use crate::models::role::Role;
use crate::rbac::{self, Capability};

/// Implemented by every record type carrying restricted attributes.
pub trait Redactable {
    /// Clear all restricted attributes in place.
    fn clear_restricted(&mut self);
}

/// Return `record` with restricted attributes cleared unless the
/// viewer's role carries the ViewSystemNotes capability. A missing
/// role always redacts.
pub fn redact<T: Redactable>(mut record: T, viewer: Option<Role>) -> T {
    if rbac::evaluate(viewer, Capability::ViewSystemNotes, None).is_denied() {
        record.clear_restricted();
    }
    record
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Sample {
        name: String,
        system_manager_notes: Option<String>,
    }

    impl Redactable for Sample {
        fn clear_restricted(&mut self) {
            self.system_manager_notes = None;
        }
    }

    fn sample() -> Sample {
        Sample {
            name: "payroll-db".into(),
            system_manager_notes: Some("secret".into()),
        }
    }

    #[test]
    fn business_viewer_loses_restricted_fields() {
        let redacted = redact(sample(), Some(Role::BusinessUser));
        assert_eq!(redacted.system_manager_notes, None);
        assert_eq!(redacted.name, "payroll-db");
    }

    #[test]
    fn systems_manager_sees_restricted_fields() {
        let redacted = redact(sample(), Some(Role::SystemsManager));
        assert_eq!(redacted.system_manager_notes.as_deref(), Some("secret"));
    }

    #[test]
    fn missing_role_redacts() {
        let redacted = redact(sample(), None);
        assert_eq!(redacted.system_manager_notes, None);
    }

    #[test]
    fn redaction_is_idempotent() {
        let once = redact(sample(), Some(Role::Technician));
        let twice = redact(once.clone(), Some(Role::Technician));
        assert_eq!(once, twice);
    }
}
