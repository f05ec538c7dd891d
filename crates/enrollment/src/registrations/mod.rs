//! Exam registration eligibility and lifecycle.
//!
//! A registration request is checked by the eligibility rules, numbered against the
//! student's earlier attempts for the subject, and written through an [`EnrollmentStore`]
//! that enforces the uniqueness constraints atomically. Outcome updates and catalog
//! mutations pass the subject ownership guard first.

mod catalog;
pub mod domain;
pub mod eligibility;
pub mod memory;
pub mod ownership;
pub mod repository;
pub mod router;
pub mod service;
pub mod validation;

#[cfg(test)]
mod tests;

pub use domain::{
    Exam, ExamDraft, ExamId, ExamKind, ExamRegistration, NewRegistration, OutcomePatch,
    Professor, ProfessorDraft, ProfessorId, RegistrationId, RegistrationStatus, Student,
    StudentDraft, StudentId, Subject, SubjectDraft, SubjectId,
};
pub use eligibility::{evaluate, IneligibleReason, Verdict};
pub use memory::InMemoryEnrollmentStore;
pub use ownership::{authorize_subject_owner, OwnershipViolation};
pub use repository::{
    Constraint, EnrollmentStore, RegistrationFilter, StoreError, TranscriptEntry,
};
pub use router::{registration_router, PROFESSOR_HEADER, STUDENT_HEADER};
pub use service::{EnrollmentError, EnrollmentService, RACED_REGISTRATION_REASON};
pub use validation::{GradingPolicy, ValidationError};
