use super::domain::{Professor, ProfessorId, Subject, SubjectId};

/// Raised when a professor tries to mutate data tied to a subject they do not own.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("professor {professor_id} does not own subject '{subject_name}' (owned by professor {owner_id})")]
pub struct OwnershipViolation {
    pub professor_id: ProfessorId,
    pub subject_id: SubjectId,
    pub subject_name: String,
    pub owner_id: ProfessorId,
}

/// Single ownership rule shared by exam, subject, and outcome mutations.
pub fn authorize_subject_owner(
    professor: &Professor,
    subject: &Subject,
) -> Result<(), OwnershipViolation> {
    if subject.owner_id == professor.id {
        return Ok(());
    }

    Err(OwnershipViolation {
        professor_id: professor.id,
        subject_id: subject.id,
        subject_name: subject.name.clone(),
        owner_id: subject.owner_id,
    })
}
