use serde::{Deserialize, Serialize};
use ts_rs::TS;

// 课题难度
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/coursework.ts")]
pub enum DifficultyLevel {
    Easy,
    Medium,
    Hard,
}

impl<'de> Deserialize<'de> for DifficultyLevel {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Display for DifficultyLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DifficultyLevel::Easy => write!(f, "easy"),
            DifficultyLevel::Medium => write!(f, "medium"),
            DifficultyLevel::Hard => write!(f, "hard"),
        }
    }
}

impl std::str::FromStr for DifficultyLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "easy" => Ok(DifficultyLevel::Easy),
            "medium" => Ok(DifficultyLevel::Medium),
            "hard" => Ok(DifficultyLevel::Hard),
            _ => Err(format!(
                "Invalid difficulty level: '{s}'. Supported levels: easy, medium, hard"
            )),
        }
    }
}

// 课题实体
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/coursework.ts")]
pub struct Coursework {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub requirements: Option<String>,
    pub subject_id: i64,
    pub teacher_id: i64,
    /// 名额上限，恒 >= 1
    pub max_students: i32,
    pub difficulty_level: DifficultyLevel,
    /// 为 false 时不接受新的选题
    pub is_available: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl Coursework {
    /// 按当前选题人数计算剩余名额
    pub fn free_slots(&self, enrolled: u64) -> u64 {
        (self.max_students.max(0) as u64).saturating_sub(enrolled)
    }

    pub fn has_capacity(&self, enrolled: u64) -> bool {
        enrolled < self.max_students.max(0) as u64
    }
}

// 嵌入在选题详情中的课题简要信息
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/coursework.ts")]
pub struct CourseworkBrief {
    pub id: i64,
    pub title: String,
    pub subject_id: i64,
    pub teacher_id: i64,
}

impl From<&Coursework> for CourseworkBrief {
    fn from(cw: &Coursework) -> Self {
        Self {
            id: cw.id,
            title: cw.title.clone(),
            subject_id: cw.subject_id,
            teacher_id: cw.teacher_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coursework(max_students: i32) -> Coursework {
        let now = chrono::Utc::now();
        Coursework {
            id: 1,
            title: "Compiler".into(),
            description: "Build a toy compiler end to end".into(),
            requirements: None,
            subject_id: 1,
            teacher_id: 2,
            max_students,
            difficulty_level: DifficultyLevel::Hard,
            is_available: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_capacity() {
        let cw = coursework(2);
        assert!(cw.has_capacity(0));
        assert!(cw.has_capacity(1));
        assert!(!cw.has_capacity(2));
        assert_eq!(cw.free_slots(1), 1);
        assert_eq!(cw.free_slots(5), 0);
    }

    #[test]
    fn test_difficulty_parse() {
        assert_eq!("medium".parse::<DifficultyLevel>(), Ok(DifficultyLevel::Medium));
        assert!("extreme".parse::<DifficultyLevel>().is_err());
    }
}
