mod policy;
mod rules;

pub use policy::{IneligibleReason, Verdict};

pub(crate) use rules::placement;

use super::domain::{Exam, ExamRegistration, Student, Subject};

/// Decide whether `student` may register for `exam` right now.
///
/// `prior` must hold every registration of the student whose exam belongs to `subject`;
/// resolving them is the caller's job, this function performs no I/O. Gates run in a
/// fixed order and the first failure is reported.
pub fn evaluate(
    student: &Student,
    exam: &Exam,
    subject: &Subject,
    prior: &[ExamRegistration],
) -> Verdict {
    match rules::placement(student, subject).and_then(|()| rules::history(exam, prior)) {
        Ok(()) => Verdict::Eligible,
        Err(reason) => Verdict::Ineligible(reason),
    }
}
