//! 选题流程核心
//!
//! 选题（含名额与重复校验）、状态流转、退选与进度汇总。
//! 只接收普通标识与值，认证与按角色鉴权由上层 handler 负责。
//! 每次存储调用都受单次操作时限约束，流程本身不做重试。

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::errors::{CourseforgeError, Result};
use crate::models::assignments::entities::{AssignmentDetail, AssignmentStatus, StudentCoursework};
use crate::models::assignments::progress::CourseworkProgressReport;
use crate::models::assignments::responses::CanAssignResponse;
use crate::storage::Storage;
use crate::utils::validate::validate_grade;

/// 在时限内等待一次存储调用，超时折算为 `Timeout`
pub(crate) async fn within_deadline<T, F>(deadline: Duration, action: &str, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(deadline, fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => {
            if e.is_transient() {
                error!("{} failed: {}", action, e.format_simple());
            }
            Err(e)
        }
        Err(_) => {
            error!("{} exceeded deadline of {:?}", action, deadline);
            Err(CourseforgeError::timeout(format!(
                "{action} did not finish within {} ms",
                deadline.as_millis()
            )))
        }
    }
}

fn rejected(err: CourseforgeError) -> CourseforgeError {
    warn!("Workflow precondition rejected: {}", err.format_simple());
    err
}

#[derive(Clone)]
pub struct AssignmentWorkflow {
    storage: Arc<dyn Storage>,
    deadline: Duration,
}

impl AssignmentWorkflow {
    pub fn new(storage: Arc<dyn Storage>, deadline: Duration) -> Self {
        Self { storage, deadline }
    }

    async fn bounded<T, F>(&self, action: &str, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        within_deadline(self.deadline, action, fut).await
    }

    // 选题前置条件：未持有选题、课题存在、开放、仍有名额
    async fn check_preconditions(&self, student_id: i64, coursework_id: i64) -> Result<()> {
        if self
            .bounded(
                "get_assignment_by_student",
                self.storage.get_assignment_by_student(student_id),
            )
            .await?
            .is_some()
        {
            return Err(CourseforgeError::already_assigned(format!(
                "Student {student_id} already holds an assignment"
            )));
        }

        let (coursework, enrolled) = self
            .bounded(
                "get_coursework_with_enrollment_count",
                self.storage.get_coursework_with_enrollment_count(coursework_id),
            )
            .await?
            .ok_or_else(|| {
                CourseforgeError::not_found(format!("Coursework {coursework_id} not found"))
            })?;

        if !coursework.is_available {
            return Err(CourseforgeError::coursework_unavailable(format!(
                "Coursework {coursework_id} is not open for enrollment"
            )));
        }
        if !coursework.has_capacity(enrolled) {
            return Err(CourseforgeError::capacity_exceeded(format!(
                "Coursework {coursework_id} is full ({enrolled}/{})",
                coursework.max_students
            )));
        }
        Ok(())
    }

    /// 学生选题，成功后状态为 assigned
    pub async fn assign_student(
        &self,
        student_id: i64,
        coursework_id: i64,
    ) -> Result<AssignmentDetail> {
        self.check_preconditions(student_id, coursework_id)
            .await
            .map_err(|e| if e.is_transient() { e } else { rejected(e) })?;

        // 存储层在事务内再次校验，并发冲突同样以领域错误返回
        let created = self
            .bounded(
                "create_assignment",
                self.storage.create_assignment(student_id, coursework_id),
            )
            .await
            .map_err(|e| if e.is_transient() { e } else { rejected(e) })?;

        info!(
            "Student {} assigned to coursework {} (assignment {})",
            student_id, coursework_id, created.id
        );
        self.detail(created.id).await
    }

    /// 选题预检，不产生写入
    pub async fn can_assign(&self, student_id: i64, coursework_id: i64) -> Result<CanAssignResponse> {
        match self.check_preconditions(student_id, coursework_id).await {
            Ok(()) => Ok(CanAssignResponse {
                can_assign: true,
                reason: None,
            }),
            Err(
                e @ (CourseforgeError::AlreadyAssigned(_)
                | CourseforgeError::CapacityExceeded(_)
                | CourseforgeError::CourseworkUnavailable(_)),
            ) => Ok(CanAssignResponse {
                can_assign: false,
                reason: Some(e.message().to_string()),
            }),
            Err(e) => Err(e),
        }
    }

    pub async fn detail(&self, id: i64) -> Result<AssignmentDetail> {
        self.bounded("get_assignment_detail", self.storage.get_assignment_detail(id))
            .await?
            .ok_or_else(|| CourseforgeError::not_found(format!("Assignment {id} not found")))
    }

    pub async fn get_student_assignment(&self, student_id: i64) -> Result<AssignmentDetail> {
        let assignment = self.live_assignment_of(student_id).await?;
        self.detail(assignment.id).await
    }

    async fn live_assignment_of(&self, student_id: i64) -> Result<StudentCoursework> {
        self.bounded(
            "get_assignment_by_student",
            self.storage.get_assignment_by_student(student_id),
        )
        .await?
        .ok_or_else(|| {
            CourseforgeError::not_found(format!("Student {student_id} has no assignment"))
        })
    }

    async fn reload(&self, id: i64) -> Result<StudentCoursework> {
        self.bounded("get_assignment_by_id", self.storage.get_assignment_by_id(id))
            .await?
            .ok_or_else(|| CourseforgeError::not_found(format!("Assignment {id} not found")))
    }

    fn ensure_touched(touched: bool, id: i64) -> Result<()> {
        if touched {
            Ok(())
        } else {
            Err(rejected(CourseforgeError::not_found(format!(
                "Assignment {id} not found"
            ))))
        }
    }

    /// 标记已提交并记录提交时间
    pub async fn submit(&self, id: i64) -> Result<StudentCoursework> {
        let now = chrono::Utc::now();
        let touched = self
            .bounded(
                "set_assignment_submitted",
                self.storage.set_assignment_submitted(id, now),
            )
            .await?;
        Self::ensure_touched(touched, id)?;
        info!("Assignment {} submitted", id);
        self.reload(id).await
    }

    /// 评分，成绩须在 2..=5；越界时不做任何写入
    pub async fn grade(
        &self,
        id: i64,
        grade: i32,
        feedback: Option<String>,
    ) -> Result<StudentCoursework> {
        validate_grade(grade).map_err(|msg| rejected(CourseforgeError::invalid_grade(msg)))?;

        let touched = self
            .bounded(
                "set_assignment_grade",
                self.storage.set_assignment_grade(id, grade, feedback),
            )
            .await?;
        Self::ensure_touched(touched, id)?;
        info!("Assignment {} reviewed with grade {}", id, grade);
        self.reload(id).await
    }

    /// 标记完成并记录完成时间
    pub async fn complete(&self, id: i64) -> Result<StudentCoursework> {
        let now = chrono::Utc::now();
        let touched = self
            .bounded(
                "set_assignment_completed",
                self.storage.set_assignment_completed(id, now),
            )
            .await?;
        Self::ensure_touched(touched, id)?;
        info!("Assignment {} completed", id);
        self.reload(id).await
    }

    /// 通用状态修改：先校验枚举成员，再按流转表校验
    pub async fn update_status(&self, id: i64, status: &str) -> Result<StudentCoursework> {
        let next: AssignmentStatus = status
            .parse()
            .map_err(|msg: String| rejected(CourseforgeError::invalid_status(msg)))?;

        let current = self.reload(id).await?;
        if !current.status.can_transition_to(next) {
            return Err(rejected(CourseforgeError::invalid_transition(format!(
                "Cannot move assignment {id} from {} to {next}",
                current.status
            ))));
        }
        if current.status == next {
            return Ok(current);
        }

        let touched = self
            .bounded(
                "update_assignment_status",
                self.storage.update_assignment_status(id, next),
            )
            .await?;
        Self::ensure_touched(touched, id)?;
        info!("Assignment {} moved from {} to {}", id, current.status, next);
        self.reload(id).await
    }

    /// 退选：删除学生当前的选题，释放名额；返回被删除的记录
    pub async fn unassign(&self, student_id: i64) -> Result<StudentCoursework> {
        let assignment = self
            .live_assignment_of(student_id)
            .await
            .map_err(|e| if e.is_transient() { e } else { rejected(e) })?;

        let touched = self
            .bounded(
                "delete_assignment",
                self.storage.delete_assignment(assignment.id),
            )
            .await?;
        Self::ensure_touched(touched, assignment.id)?;
        info!(
            "Student {} unassigned from coursework {}",
            student_id, assignment.coursework_id
        );
        Ok(assignment)
    }

    /// 课题进度汇总，纯读
    pub async fn progress(&self, coursework_id: i64) -> Result<CourseworkProgressReport> {
        let coursework = self
            .bounded(
                "get_coursework_by_id",
                self.storage.get_coursework_by_id(coursework_id),
            )
            .await?
            .ok_or_else(|| {
                CourseforgeError::not_found(format!("Coursework {coursework_id} not found"))
            })?;

        let records = self
            .bounded(
                "list_assignments_by_coursework",
                self.storage.list_assignments_by_coursework(coursework_id),
            )
            .await?;

        Ok(CourseworkProgressReport::from_records(&coursework, &records))
    }

    /// 教师名下全部课题的选题记录
    pub async fn teacher_assignments(&self, teacher_id: i64) -> Result<Vec<AssignmentDetail>> {
        self.bounded(
            "list_assignments_by_teacher",
            self.storage.list_assignments_by_teacher(teacher_id),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::courseworks::entities::DifficultyLevel;
    use crate::models::courseworks::requests::CreateCourseworkRequest;
    use crate::models::subjects::requests::CreateSubjectRequest;
    use crate::models::users::{entities::UserRole, requests::CreateUserRequest};
    use crate::storage::sea_orm_storage::SeaOrmStorage;

    struct Fixture {
        workflow: AssignmentWorkflow,
        storage: Arc<dyn Storage>,
        teacher_id: i64,
        subject_id: i64,
    }

    impl Fixture {
        async fn new() -> Self {
            let storage: Arc<dyn Storage> = Arc::new(SeaOrmStorage::in_memory().await);
            let teacher = storage
                .create_user(user_request("teacher@example.com", UserRole::Teacher))
                .await
                .unwrap();
            let subject = storage
                .create_subject(CreateSubjectRequest {
                    name: "Compilers".into(),
                    code: "CS330".into(),
                    description: None,
                    semester: 5,
                })
                .await
                .unwrap();
            Self {
                workflow: AssignmentWorkflow::new(storage.clone(), Duration::from_secs(5)),
                storage,
                teacher_id: teacher.id,
                subject_id: subject.id,
            }
        }

        async fn student(&self, n: u32) -> i64 {
            self.storage
                .create_user(user_request(&format!("s{n}@example.com"), UserRole::Student))
                .await
                .unwrap()
                .id
        }

        async fn coursework(&self, max_students: i32) -> i64 {
            self.storage
                .create_coursework(
                    self.teacher_id,
                    CreateCourseworkRequest {
                        title: "Register allocation".into(),
                        description: "Implement linear scan register allocation".into(),
                        requirements: None,
                        subject_id: self.subject_id,
                        teacher_id: None,
                        max_students,
                        difficulty_level: DifficultyLevel::Hard,
                    },
                )
                .await
                .unwrap()
                .id
        }
    }

    fn user_request(email: &str, role: UserRole) -> CreateUserRequest {
        CreateUserRequest {
            email: email.into(),
            password: "hashed".into(),
            first_name: "First".into(),
            last_name: "Last".into(),
            role,
        }
    }

    #[tokio::test]
    async fn test_capacity_bound() {
        let fx = Fixture::new().await;
        let cw = fx.coursework(1).await;
        let x = fx.student(1).await;
        let y = fx.student(2).await;

        let detail = fx.workflow.assign_student(x, cw).await.unwrap();
        assert_eq!(detail.assignment.status, AssignmentStatus::Assigned);
        assert_eq!(detail.coursework.id, cw);

        let err = fx.workflow.assign_student(y, cw).await.unwrap_err();
        assert!(matches!(err, CourseforgeError::CapacityExceeded(_)));
        let report = fx.workflow.progress(cw).await.unwrap();
        assert_eq!(report.total_students, 1);
    }

    #[tokio::test]
    async fn test_single_assignment_per_student() {
        let fx = Fixture::new().await;
        let first = fx.coursework(2).await;
        let second = fx.coursework(2).await;
        let x = fx.student(1).await;

        fx.workflow.assign_student(x, first).await.unwrap();
        let err = fx.workflow.assign_student(x, second).await.unwrap_err();
        assert!(matches!(err, CourseforgeError::AlreadyAssigned(_)));
        assert_eq!(fx.workflow.progress(second).await.unwrap().total_students, 0);
    }

    #[tokio::test]
    async fn test_unknown_and_closed_coursework() {
        let fx = Fixture::new().await;
        let cw = fx.coursework(2).await;
        let x = fx.student(1).await;

        let err = fx.workflow.assign_student(x, cw + 99).await.unwrap_err();
        assert!(matches!(err, CourseforgeError::NotFound(_)));

        fx.storage.set_coursework_available(cw, false).await.unwrap();
        let err = fx.workflow.assign_student(x, cw).await.unwrap_err();
        assert!(matches!(err, CourseforgeError::CourseworkUnavailable(_)));
    }

    #[tokio::test]
    async fn test_can_assign_reports_reason() {
        let fx = Fixture::new().await;
        let cw = fx.coursework(1).await;
        let x = fx.student(1).await;
        let y = fx.student(2).await;

        assert!(fx.workflow.can_assign(x, cw).await.unwrap().can_assign);
        fx.workflow.assign_student(x, cw).await.unwrap();

        let verdict = fx.workflow.can_assign(y, cw).await.unwrap();
        assert!(!verdict.can_assign);
        assert!(verdict.reason.unwrap().contains("full"));
        assert!(matches!(
            fx.workflow.can_assign(y, cw + 10).await,
            Err(CourseforgeError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_out_of_range_grade_leaves_row_untouched() {
        let fx = Fixture::new().await;
        let cw = fx.coursework(2).await;
        let x = fx.student(1).await;
        let id = fx.workflow.assign_student(x, cw).await.unwrap().assignment.id;
        let before = fx.storage.get_assignment_by_id(id).await.unwrap().unwrap();

        for grade in [1, 6, -3] {
            let err = fx.workflow.grade(id, grade, Some("nope".into())).await.unwrap_err();
            assert!(matches!(err, CourseforgeError::InvalidGrade(_)));
        }
        let after = fx.storage.get_assignment_by_id(id).await.unwrap().unwrap();
        assert_eq!(before, after);

        // 评分校验先于存在性检查
        let err = fx.workflow.grade(id + 50, 9, None).await.unwrap_err();
        assert!(matches!(err, CourseforgeError::InvalidGrade(_)));
    }

    #[tokio::test]
    async fn test_progress_is_repeatable() {
        let fx = Fixture::new().await;
        let cw = fx.coursework(3).await;
        for n in 1..=2 {
            let s = fx.student(n).await;
            fx.workflow.assign_student(s, cw).await.unwrap();
        }
        let first = fx.workflow.progress(cw).await.unwrap();
        let second = fx.workflow.progress(cw).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_unassign_then_reassign_elsewhere() {
        let fx = Fixture::new().await;
        let first = fx.coursework(1).await;
        let second = fx.coursework(1).await;
        let x = fx.student(1).await;

        fx.workflow.assign_student(x, first).await.unwrap();
        let released = fx.workflow.unassign(x).await.unwrap();
        assert_eq!(released.coursework_id, first);

        let detail = fx.workflow.assign_student(x, second).await.unwrap();
        assert_eq!(detail.coursework.id, second);
        assert_eq!(fx.workflow.progress(first).await.unwrap().total_students, 0);

        let err = fx.workflow.unassign(fx.student(2).await).await.unwrap_err();
        assert!(matches!(err, CourseforgeError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_submit_grade_complete_flow() {
        let fx = Fixture::new().await;
        let cw = fx.coursework(2).await;
        let x = fx.student(1).await;
        let id = fx.workflow.assign_student(x, cw).await.unwrap().assignment.id;

        let submitted = fx.workflow.submit(id).await.unwrap();
        assert_eq!(submitted.status, AssignmentStatus::Submitted);
        assert!(submitted.submitted_at.is_some());

        let reviewed = fx.workflow.grade(id, 4, Some("good".into())).await.unwrap();
        assert_eq!(reviewed.status, AssignmentStatus::Reviewed);
        assert_eq!(reviewed.grade, Some(4));
        assert_eq!(reviewed.feedback.as_deref(), Some("good"));

        let completed = fx.workflow.complete(id).await.unwrap();
        assert_eq!(completed.status, AssignmentStatus::Completed);
        assert!(completed.completed_at.is_some());
        assert_eq!(completed.grade, Some(4));
    }

    #[tokio::test]
    async fn test_specialized_ops_on_missing_assignment() {
        let fx = Fixture::new().await;
        assert!(matches!(
            fx.workflow.submit(404).await,
            Err(CourseforgeError::NotFound(_))
        ));
        assert!(matches!(
            fx.workflow.grade(404, 3, None).await,
            Err(CourseforgeError::NotFound(_))
        ));
        assert!(matches!(
            fx.workflow.complete(404).await,
            Err(CourseforgeError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_progress_buckets() {
        let fx = Fixture::new().await;
        let cw = fx.coursework(3).await;
        let mut ids = Vec::new();
        for n in 1..=3 {
            let s = fx.student(n).await;
            ids.push(fx.workflow.assign_student(s, cw).await.unwrap().assignment.id);
        }
        fx.workflow.submit(ids[1]).await.unwrap();
        fx.workflow.complete(ids[2]).await.unwrap();

        let report = fx.workflow.progress(cw).await.unwrap();
        assert_eq!(report.total_students, 3);
        assert_eq!(report.assigned_students, 1);
        assert_eq!(report.submitted_count, 1);
        assert_eq!(report.completed_count, 1);
        assert_eq!(report.students.len(), 3);

        assert!(matches!(
            fx.workflow.progress(cw + 100).await,
            Err(CourseforgeError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_update_status_validation_order() {
        let fx = Fixture::new().await;
        let cw = fx.coursework(2).await;
        let x = fx.student(1).await;
        let id = fx.workflow.assign_student(x, cw).await.unwrap().assignment.id;

        assert!(matches!(
            fx.workflow.update_status(id + 1, "bogus").await,
            Err(CourseforgeError::InvalidStatus(_))
        ));
        assert!(matches!(
            fx.workflow.update_status(id + 1, "in_progress").await,
            Err(CourseforgeError::NotFound(_))
        ));

        let moved = fx.workflow.update_status(id, "in_progress").await.unwrap();
        assert_eq!(moved.status, AssignmentStatus::InProgress);
        assert!(moved.submitted_at.is_none());

        assert!(matches!(
            fx.workflow.update_status(id, "completed").await,
            Err(CourseforgeError::InvalidTransition(_))
        ));

        fx.workflow.complete(id).await.unwrap();
        assert!(matches!(
            fx.workflow.update_status(id, "assigned").await,
            Err(CourseforgeError::InvalidTransition(_))
        ));
        let same = fx.workflow.update_status(id, "completed").await.unwrap();
        assert_eq!(same.status, AssignmentStatus::Completed);
    }

    #[tokio::test]
    async fn test_teacher_assignments() {
        let fx = Fixture::new().await;
        let cw = fx.coursework(2).await;
        let x = fx.student(1).await;
        fx.workflow.assign_student(x, cw).await.unwrap();

        let items = fx.workflow.teacher_assignments(fx.teacher_id).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].student.id, x);
        assert!(fx.workflow.teacher_assignments(x).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_deadline_expiry_is_timeout() {
        let err = within_deadline(
            Duration::from_millis(10),
            "never_finishes",
            std::future::pending::<Result<()>>(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, CourseforgeError::Timeout(_)));
        assert!(err.is_transient());

        let ok = within_deadline(Duration::from_millis(10), "ready", async { Ok(7) })
            .await
            .unwrap();
        assert_eq!(ok, 7);
    }
}
