//! 课题进度汇总
//!
//! 对单个课题下的全部选题记录做一次纯读折叠：总数、按状态分桶计数、逐个学生摘要。

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::entities::{AssignmentDetail, AssignmentStatus};
use crate::models::courseworks::entities::Coursework;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/assignment.ts")]
pub struct StudentCourseworkSummary {
    pub student_id: i64,
    pub student_name: String,
    pub status: AssignmentStatus,
    pub assigned_at: chrono::DateTime<chrono::Utc>,
    pub submitted_at: Option<chrono::DateTime<chrono::Utc>>,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
    pub grade: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/assignment.ts")]
pub struct CourseworkProgressReport {
    pub coursework_id: i64,
    pub coursework_title: String,
    pub total_students: i64,
    pub assigned_students: i64,
    pub in_progress_count: i64,
    pub submitted_count: i64,
    pub reviewed_count: i64,
    pub completed_count: i64,
    pub failed_count: i64,
    pub students: Vec<StudentCourseworkSummary>,
}

impl CourseworkProgressReport {
    /// 折叠课题的选题记录；学生摘要按选题时间、记录 id 排序
    pub fn from_records(coursework: &Coursework, records: &[AssignmentDetail]) -> Self {
        let mut report = Self {
            coursework_id: coursework.id,
            coursework_title: coursework.title.clone(),
            total_students: 0,
            assigned_students: 0,
            in_progress_count: 0,
            submitted_count: 0,
            reviewed_count: 0,
            completed_count: 0,
            failed_count: 0,
            students: Vec::with_capacity(records.len()),
        };

        for record in records {
            let a = &record.assignment;
            report.total_students += 1;
            let bucket = match a.status {
                AssignmentStatus::Assigned => &mut report.assigned_students,
                AssignmentStatus::InProgress => &mut report.in_progress_count,
                AssignmentStatus::Submitted => &mut report.submitted_count,
                AssignmentStatus::Reviewed => &mut report.reviewed_count,
                AssignmentStatus::Completed => &mut report.completed_count,
                AssignmentStatus::Failed => &mut report.failed_count,
            };
            *bucket += 1;

            report.students.push(StudentCourseworkSummary {
                student_id: a.student_id,
                student_name: record.student.full_name.clone(),
                status: a.status,
                assigned_at: a.created_at,
                submitted_at: a.submitted_at,
                completed_at: a.completed_at,
                grade: a.grade,
            });
        }

        report
            .students
            .sort_by(|x, y| x.assigned_at.cmp(&y.assigned_at).then(x.student_id.cmp(&y.student_id)));
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::assignments::entities::StudentCoursework;
    use crate::models::courseworks::entities::{CourseworkBrief, DifficultyLevel};
    use crate::models::users::entities::UserBrief;
    use chrono::{TimeZone, Utc};

    fn coursework() -> Coursework {
        let now = Utc::now();
        Coursework {
            id: 7,
            title: "Distributed cache".into(),
            description: "Design and build a small distributed cache".into(),
            requirements: None,
            subject_id: 1,
            teacher_id: 2,
            max_students: 5,
            difficulty_level: DifficultyLevel::Medium,
            is_available: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn record(id: i64, student_id: i64, status: AssignmentStatus, ts: i64) -> AssignmentDetail {
        let at = Utc.timestamp_opt(ts, 0).unwrap();
        let cw = coursework();
        AssignmentDetail {
            assignment: StudentCoursework {
                id,
                student_id,
                coursework_id: cw.id,
                status,
                grade: (status == AssignmentStatus::Completed).then_some(5),
                feedback: None,
                submitted_at: None,
                completed_at: None,
                created_at: at,
                updated_at: at,
            },
            student: UserBrief {
                id: student_id,
                email: format!("s{student_id}@example.com"),
                full_name: format!("Student {student_id}"),
            },
            coursework: CourseworkBrief::from(&cw),
        }
    }

    #[test]
    fn test_empty_report() {
        let report = CourseworkProgressReport::from_records(&coursework(), &[]);
        assert_eq!(report.coursework_id, 7);
        assert_eq!(report.coursework_title, "Distributed cache");
        assert_eq!(report.total_students, 0);
        assert!(report.students.is_empty());
    }

    #[test]
    fn test_buckets_cover_every_status() {
        let records: Vec<_> = AssignmentStatus::ALL
            .into_iter()
            .enumerate()
            .map(|(i, s)| record(i as i64 + 1, i as i64 + 10, s, 1_700_000_000 + i as i64))
            .collect();
        let report = CourseworkProgressReport::from_records(&coursework(), &records);

        assert_eq!(report.total_students, 6);
        assert_eq!(report.assigned_students, 1);
        assert_eq!(report.in_progress_count, 1);
        assert_eq!(report.submitted_count, 1);
        assert_eq!(report.reviewed_count, 1);
        assert_eq!(report.completed_count, 1);
        assert_eq!(report.failed_count, 1);
        let bucket_sum = report.assigned_students
            + report.in_progress_count
            + report.submitted_count
            + report.reviewed_count
            + report.completed_count
            + report.failed_count;
        assert_eq!(bucket_sum, report.total_students);
    }

    #[test]
    fn test_summaries_are_ordered_and_carry_fields() {
        let records = vec![
            record(3, 30, AssignmentStatus::Completed, 1_700_000_300),
            record(1, 10, AssignmentStatus::Assigned, 1_700_000_100),
            record(2, 20, AssignmentStatus::Submitted, 1_700_000_200),
        ];
        let report = CourseworkProgressReport::from_records(&coursework(), &records);

        let ids: Vec<_> = report.students.iter().map(|s| s.student_id).collect();
        assert_eq!(ids, vec![10, 20, 30]);
        assert_eq!(report.students[0].student_name, "Student 10");
        assert_eq!(report.students[2].grade, Some(5));
    }

    #[test]
    fn test_fold_is_deterministic() {
        let records = vec![
            record(1, 10, AssignmentStatus::Assigned, 1_700_000_100),
            record(2, 20, AssignmentStatus::Reviewed, 1_700_000_100),
        ];
        let a = CourseworkProgressReport::from_records(&coursework(), &records);
        let b = CourseworkProgressReport::from_records(&coursework(), &records);
        assert_eq!(a, b);
    }
}
