use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::models::courseworks::entities::CourseworkBrief;
use crate::models::users::entities::UserBrief;

/// 选题状态
///
/// 生命周期：assigned → in_progress → submitted → reviewed → completed | failed
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/assignment.ts")]
pub enum AssignmentStatus {
    Assigned,
    InProgress,
    Submitted,
    Reviewed,
    Completed,
    Failed,
}

impl AssignmentStatus {
    pub const ALL: [AssignmentStatus; 6] = [
        AssignmentStatus::Assigned,
        AssignmentStatus::InProgress,
        AssignmentStatus::Submitted,
        AssignmentStatus::Reviewed,
        AssignmentStatus::Completed,
        AssignmentStatus::Failed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AssignmentStatus::Assigned => "assigned",
            AssignmentStatus::InProgress => "in_progress",
            AssignmentStatus::Submitted => "submitted",
            AssignmentStatus::Reviewed => "reviewed",
            AssignmentStatus::Completed => "completed",
            AssignmentStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, AssignmentStatus::Completed | AssignmentStatus::Failed)
    }

    /// 通用状态更新允许的迁移；相同状态视为无操作，总是允许
    pub fn can_transition_to(&self, next: AssignmentStatus) -> bool {
        use AssignmentStatus::*;

        if *self == next {
            return true;
        }
        match self {
            Assigned => matches!(next, InProgress | Submitted | Failed),
            InProgress => matches!(next, Assigned | Submitted | Failed),
            Submitted => matches!(next, InProgress | Reviewed | Failed),
            Reviewed => matches!(next, InProgress | Completed | Failed),
            Completed | Failed => false,
        }
    }
}

impl<'de> Deserialize<'de> for AssignmentStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Display for AssignmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AssignmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AssignmentStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("Invalid assignment status: '{s}'"))
    }
}

/// 学生选题记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/assignment.ts")]
pub struct StudentCoursework {
    pub id: i64,
    pub student_id: i64,
    pub coursework_id: i64,
    pub status: AssignmentStatus,
    /// 2..=5
    pub grade: Option<i32>,
    pub feedback: Option<String>,
    pub submitted_at: Option<chrono::DateTime<chrono::Utc>>,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// 选题记录连同学生、课题的简要信息，供响应构建使用
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/assignment.ts")]
pub struct AssignmentDetail {
    #[serde(flatten)]
    #[ts(flatten)]
    pub assignment: StudentCoursework,
    pub student: UserBrief,
    pub coursework: CourseworkBrief,
}

#[cfg(test)]
mod tests {
    use super::AssignmentStatus::*;
    use super::*;

    #[test]
    fn test_parse_all_statuses() {
        for status in AssignmentStatus::ALL {
            assert_eq!(status.as_str().parse::<AssignmentStatus>(), Ok(status));
        }
        assert!("archived".parse::<AssignmentStatus>().is_err());
        assert!("Assigned".parse::<AssignmentStatus>().is_err());
    }

    #[test]
    fn test_forward_transitions() {
        assert!(Assigned.can_transition_to(InProgress));
        assert!(InProgress.can_transition_to(Submitted));
        assert!(Submitted.can_transition_to(Reviewed));
        assert!(Reviewed.can_transition_to(Completed));
        assert!(Reviewed.can_transition_to(Failed));
    }

    #[test]
    fn test_rejected_transitions() {
        assert!(!Completed.can_transition_to(Assigned));
        assert!(!Failed.can_transition_to(InProgress));
        assert!(!Assigned.can_transition_to(Reviewed));
        assert!(!Assigned.can_transition_to(Completed));
        assert!(!Submitted.can_transition_to(Completed));
    }

    #[test]
    fn test_terminal_states_only_allow_self() {
        for status in AssignmentStatus::ALL {
            assert!(status.can_transition_to(status));
            if status.is_terminal() {
                let others = AssignmentStatus::ALL.into_iter().filter(|s| *s != status);
                for next in others {
                    assert!(!status.can_transition_to(next), "{status} -> {next}");
                }
            }
        }
    }

    #[test]
    fn test_serde_snake_case() {
        assert_eq!(serde_json::to_string(&InProgress).unwrap(), "\"in_progress\"");
        let parsed: AssignmentStatus = serde_json::from_str("\"reviewed\"").unwrap();
        assert_eq!(parsed, Reviewed);
    }
}
