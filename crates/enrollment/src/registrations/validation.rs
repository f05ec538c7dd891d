use serde::{Deserialize, Serialize};

use super::domain::{OutcomePatch, StudentDraft, SubjectDraft};

/// Field-level validation failures raised before anything reaches the store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field} must be between {min} and {max} characters")]
    Length {
        field: &'static str,
        min: usize,
        max: usize,
    },
    #[error("{field} must be between {min} and {max} (found {found})")]
    Range {
        field: &'static str,
        min: u32,
        max: u32,
        found: u32,
    },
    #[error("grade {found} is outside the grading scale (0 or {lowest}..={highest})")]
    Grade { found: u8, lowest: u8, highest: u8 },
}

const DEFAULT_LOWEST_GRADE: u8 = 5;
const DEFAULT_PASSING_GRADE: u8 = 6;
const DEFAULT_HIGHEST_GRADE: u8 = 10;

/// Grading scale applied to outcome updates and transcripts.
///
/// A grade of `0` always means "not graded yet" and is accepted regardless of the scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradingPolicy {
    pub lowest_grade: u8,
    pub passing_grade: u8,
    pub highest_grade: u8,
}

impl Default for GradingPolicy {
    fn default() -> Self {
        Self {
            lowest_grade: DEFAULT_LOWEST_GRADE,
            passing_grade: DEFAULT_PASSING_GRADE,
            highest_grade: DEFAULT_HIGHEST_GRADE,
        }
    }
}

impl GradingPolicy {
    /// Build a policy, returning `None` when the bounds are not ordered.
    pub fn new(lowest_grade: u8, passing_grade: u8, highest_grade: u8) -> Option<Self> {
        if lowest_grade == 0 || lowest_grade > passing_grade || passing_grade > highest_grade {
            return None;
        }

        Some(Self {
            lowest_grade,
            passing_grade,
            highest_grade,
        })
    }

    pub fn is_passing(&self, grade: u8) -> bool {
        grade >= self.passing_grade && grade <= self.highest_grade
    }

    pub fn validate_patch(&self, patch: &OutcomePatch) -> Result<(), ValidationError> {
        match patch.grade {
            Some(grade) if grade != 0 && !(self.lowest_grade..=self.highest_grade).contains(&grade) => {
                Err(ValidationError::Grade {
                    found: grade,
                    lowest: self.lowest_grade,
                    highest: self.highest_grade,
                })
            }
            _ => Ok(()),
        }
    }
}

pub(crate) fn validate_student(draft: &StudentDraft) -> Result<(), ValidationError> {
    check_length("username", &draft.username, 3, 100)?;
    check_length("name", &draft.name, 2, 100)?;
    check_length("index_number", &draft.index_number, 3, 20)?;
    check_range("year_of_study", draft.year_of_study.into(), 1, 10)?;
    if let Some(department) = &draft.department {
        check_length("department", department, 1, 50)?;
    }
    Ok(())
}

pub(crate) fn validate_subject(draft: &SubjectDraft) -> Result<(), ValidationError> {
    check_length("name", &draft.name, 2, 100)?;
    check_range("ects", draft.ects.into(), 1, 30)?;
    if let Some(year) = draft.year {
        check_range("year", year.into(), 1, 4)?;
    }
    if let Some(department) = &draft.department {
        check_length("department", department, 1, 50)?;
    }
    Ok(())
}

fn check_length(
    field: &'static str,
    value: &str,
    min: usize,
    max: usize,
) -> Result<(), ValidationError> {
    let length = value.trim().chars().count();
    if length < min || length > max {
        return Err(ValidationError::Length { field, min, max });
    }
    Ok(())
}

fn check_range(field: &'static str, value: u32, min: u32, max: u32) -> Result<(), ValidationError> {
    if value < min || value > max {
        return Err(ValidationError::Range {
            field,
            min,
            max,
            found: value,
        });
    }
    Ok(())
}
