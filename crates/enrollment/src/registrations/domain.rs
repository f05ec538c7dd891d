use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Identifier wrapper for enrolled students.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StudentId(pub u64);

/// Identifier wrapper for teaching staff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfessorId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectId(pub u64);

/// Identifier of a single exam sitting (one subject may have many).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExamId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegistrationId(pub u64);

macro_rules! display_id {
    ($($id:ty),+) => {
        $(impl fmt::Display for $id {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        })+
    };
}

display_id!(StudentId, ProfessorId, SubjectId, ExamId, RegistrationId);

/// Enrolled student as supplied by the identity layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: StudentId,
    pub username: String,
    pub name: String,
    pub index_number: String,
    pub year_of_study: u8,
    /// `None` marks an unaffiliated student, exempt from department gating.
    pub department: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Professor {
    pub id: ProfessorId,
    pub username: String,
    pub name: String,
}

/// Course offering owned by exactly one professor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub id: SubjectId,
    pub name: String,
    pub ects: u8,
    /// Minimum year of study admitted; `None` opens the subject to every year.
    pub year: Option<u8>,
    /// Restricts the subject to one department; `None` opens it to all.
    pub department: Option<String>,
    pub owner_id: ProfessorId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExamKind {
    Written,
    Oral,
}

impl ExamKind {
    pub const fn label(self) -> &'static str {
        match self {
            ExamKind::Written => "written",
            ExamKind::Oral => "oral",
        }
    }
}

/// A dated sitting of a subject's exam.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exam {
    pub id: ExamId,
    pub subject_id: SubjectId,
    pub date: NaiveDate,
    pub kind: ExamKind,
}

/// Status tracked through the registration lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationStatus {
    Applied,
    Passed,
    Failed,
}

impl RegistrationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            RegistrationStatus::Applied => "applied",
            RegistrationStatus::Passed => "passed",
            RegistrationStatus::Failed => "failed",
        }
    }
}

/// A student's registration for one exam sitting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamRegistration {
    pub id: RegistrationId,
    pub student_id: StudentId,
    pub exam_id: ExamId,
    /// Position of this registration among the student's registrations for the subject.
    pub attempt_number: u32,
    /// `0` while ungraded.
    pub grade: u8,
    pub points: u32,
    pub status: RegistrationStatus,
}

/// Registration as handed to the store; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRegistration {
    pub student_id: StudentId,
    pub exam_id: ExamId,
    pub attempt_number: u32,
}

impl NewRegistration {
    pub fn into_record(self, id: RegistrationId) -> ExamRegistration {
        ExamRegistration {
            id,
            student_id: self.student_id,
            exam_id: self.exam_id,
            attempt_number: self.attempt_number,
            grade: 0,
            points: 0,
            status: RegistrationStatus::Applied,
        }
    }
}

/// Partial outcome update recorded by the owning professor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<RegistrationStatus>,
}

impl OutcomePatch {
    pub fn is_empty(&self) -> bool {
        self.grade.is_none() && self.points.is_none() && self.status.is_none()
    }

    /// Overwrite only the fields carried by the patch.
    pub fn apply_to(&self, registration: &mut ExamRegistration) {
        if let Some(grade) = self.grade {
            registration.grade = grade;
        }
        if let Some(points) = self.points {
            registration.points = points;
        }
        if let Some(status) = self.status {
            registration.status = status;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentDraft {
    pub username: String,
    pub name: String,
    pub index_number: String,
    pub year_of_study: u8,
    #[serde(default)]
    pub department: Option<String>,
}

impl StudentDraft {
    pub fn into_student(self, id: StudentId) -> Student {
        Student {
            id,
            username: self.username,
            name: self.name,
            index_number: self.index_number,
            year_of_study: self.year_of_study,
            department: self.department,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfessorDraft {
    pub username: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectDraft {
    pub name: String,
    pub ects: u8,
    #[serde(default)]
    pub year: Option<u8>,
    #[serde(default)]
    pub department: Option<String>,
}

impl SubjectDraft {
    pub fn into_subject(self, id: SubjectId, owner_id: ProfessorId) -> Subject {
        Subject {
            id,
            name: self.name,
            ects: self.ects,
            year: self.year,
            department: self.department,
            owner_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamDraft {
    pub subject_id: SubjectId,
    pub date: NaiveDate,
    pub kind: ExamKind,
}

impl ExamDraft {
    pub fn into_exam(self, id: ExamId) -> Exam {
        Exam {
            id,
            subject_id: self.subject_id,
            date: self.date,
            kind: self.kind,
        }
    }
}
