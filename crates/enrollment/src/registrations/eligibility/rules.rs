use super::super::domain::{Exam, ExamRegistration, RegistrationStatus, Student, Subject};
use super::policy::IneligibleReason;

/// Curriculum placement: department and year gates.
///
/// An unset department on either side acts as a wildcard, so the department gate only
/// fires when both the subject and the student name a department and they differ.
pub(crate) fn placement(student: &Student, subject: &Subject) -> Result<(), IneligibleReason> {
    if let (Some(required), Some(actual)) = (&subject.department, &student.department) {
        if required != actual {
            return Err(IneligibleReason::WrongDepartment {
                required: required.clone(),
                actual: actual.clone(),
            });
        }
    }

    if let Some(required) = subject.year {
        if student.year_of_study < required {
            return Err(IneligibleReason::InsufficientYear {
                required,
                actual: student.year_of_study,
            });
        }
    }

    Ok(())
}

/// Gates over the student's earlier registrations for the same subject.
pub(crate) fn history(exam: &Exam, prior: &[ExamRegistration]) -> Result<(), IneligibleReason> {
    let on_sitting = |status: RegistrationStatus| {
        prior
            .iter()
            .any(|registration| registration.exam_id == exam.id && registration.status == status)
    };
    let on_subject =
        |status: RegistrationStatus| prior.iter().any(|registration| registration.status == status);

    if on_sitting(RegistrationStatus::Applied) {
        return Err(IneligibleReason::AlreadyAppliedToSitting);
    }
    if on_sitting(RegistrationStatus::Failed) {
        return Err(IneligibleReason::AlreadyFailedSitting);
    }
    if on_subject(RegistrationStatus::Applied) {
        return Err(IneligibleReason::OpenApplicationForSubject);
    }
    if on_subject(RegistrationStatus::Passed) {
        return Err(IneligibleReason::SubjectAlreadyPassed);
    }

    Ok(())
}
