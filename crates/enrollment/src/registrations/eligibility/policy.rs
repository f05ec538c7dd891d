use serde::{Deserialize, Serialize};

/// Eligibility verdict for a single registration request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Eligible,
    Ineligible(IneligibleReason),
}

impl Verdict {
    pub fn is_eligible(&self) -> bool {
        matches!(self, Verdict::Eligible)
    }
}

/// Enumerates the gates a registration request can fail, in evaluation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum IneligibleReason {
    WrongDepartment { required: String, actual: String },
    InsufficientYear { required: u8, actual: u8 },
    AlreadyAppliedToSitting,
    AlreadyFailedSitting,
    OpenApplicationForSubject,
    SubjectAlreadyPassed,
}

impl IneligibleReason {
    pub fn summary(&self) -> &'static str {
        match self {
            IneligibleReason::WrongDepartment { .. } => "wrong department",
            IneligibleReason::InsufficientYear { .. } => "insufficient year",
            IneligibleReason::AlreadyAppliedToSitting => "already applied to this sitting",
            IneligibleReason::AlreadyFailedSitting => {
                "already failed this sitting, wait for new sitting"
            }
            IneligibleReason::OpenApplicationForSubject => {
                "already has an open application for this subject"
            }
            IneligibleReason::SubjectAlreadyPassed => "subject already passed",
        }
    }

    /// Longer explanation for logs and audit trails.
    pub fn detail(&self) -> String {
        match self {
            IneligibleReason::WrongDepartment { required, actual } => format!(
                "subject is restricted to department '{required}', student belongs to '{actual}'"
            ),
            IneligibleReason::InsufficientYear { required, actual } => {
                format!("subject requires year {required}, student is in year {actual}")
            }
            other => other.summary().to_string(),
        }
    }
}
