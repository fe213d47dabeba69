use std::sync::Arc;

use crate::models::{
    assignments::entities::{AssignmentDetail, AssignmentStatus, StudentCoursework},
    courseworks::{
        entities::Coursework,
        requests::{CourseworkListQuery, CreateCourseworkRequest, UpdateCourseworkRequest},
        responses::CourseworkListResponse,
    },
    subjects::{
        entities::{Subject, SubjectTeacher},
        requests::{CreateSubjectRequest, SubjectListQuery, UpdateSubjectRequest},
        responses::SubjectListResponse,
    },
    users::{
        entities::User,
        requests::{CreateUserRequest, UpdateUserRequest, UserListQuery},
        responses::UserListResponse,
    },
};

use crate::errors::Result;

pub mod sea_orm_storage;

#[async_trait::async_trait]
pub trait Storage: Send + Sync {
    /// 用户管理方法
    // 创建用户（password 字段须为已哈希的值）
    async fn create_user(&self, user: CreateUserRequest) -> Result<User>;
    // 通过ID获取用户信息
    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>>;
    // 通过邮箱获取用户信息
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;
    // 列出用户
    async fn list_users_with_pagination(&self, query: UserListQuery) -> Result<UserListResponse>;
    // 更新用户信息
    async fn update_user(&self, id: i64, update: UpdateUserRequest) -> Result<Option<User>>;
    // 删除用户
    async fn delete_user(&self, id: i64) -> Result<bool>;
    // 统计用户数量
    async fn count_users(&self) -> Result<u64>;

    /// 学科管理方法
    async fn create_subject(&self, subject: CreateSubjectRequest) -> Result<Subject>;
    async fn get_subject_by_id(&self, id: i64) -> Result<Option<Subject>>;
    async fn get_subject_by_code(&self, code: &str) -> Result<Option<Subject>>;
    async fn list_subjects_with_pagination(
        &self,
        query: SubjectListQuery,
    ) -> Result<SubjectListResponse>;
    async fn update_subject(&self, id: i64, update: UpdateSubjectRequest)
    -> Result<Option<Subject>>;
    async fn delete_subject(&self, id: i64) -> Result<bool>;
    // 学科教师名单；重复加入返回 Conflict，is_lead 为真时替换原负责人
    async fn add_subject_teacher(&self, subject_id: i64, teacher_id: i64, is_lead: bool)
    -> Result<()>;
    async fn remove_subject_teacher(&self, subject_id: i64, teacher_id: i64) -> Result<bool>;
    // 教师不在名单中时返回 false
    async fn set_subject_lead_teacher(&self, subject_id: i64, teacher_id: i64) -> Result<bool>;
    async fn list_subject_teachers(&self, subject_id: i64) -> Result<Vec<SubjectTeacher>>;
    async fn list_subjects_by_teacher(&self, teacher_id: i64) -> Result<Vec<Subject>>;

    /// 课题管理方法
    // 创建课题，teacher_id 由服务层确定
    async fn create_coursework(
        &self,
        teacher_id: i64,
        coursework: CreateCourseworkRequest,
    ) -> Result<Coursework>;
    async fn get_coursework_by_id(&self, id: i64) -> Result<Option<Coursework>>;
    // 课题及其当前存活的选题人数
    async fn get_coursework_with_enrollment_count(
        &self,
        id: i64,
    ) -> Result<Option<(Coursework, u64)>>;
    async fn list_courseworks_with_pagination(
        &self,
        query: CourseworkListQuery,
    ) -> Result<CourseworkListResponse>;
    // 可选课题（is_available 且仍有名额），附带当前人数
    async fn list_available_courseworks(
        &self,
        subject_id: Option<i64>,
    ) -> Result<Vec<(Coursework, u64)>>;
    async fn update_coursework(
        &self,
        id: i64,
        update: UpdateCourseworkRequest,
    ) -> Result<Option<Coursework>>;
    async fn set_coursework_available(&self, id: i64, available: bool) -> Result<bool>;
    async fn delete_coursework(&self, id: i64) -> Result<bool>;

    /// 选题管理方法
    // 学生当前存活的选题记录
    async fn get_assignment_by_student(&self, student_id: i64)
    -> Result<Option<StudentCoursework>>;
    async fn get_assignment_by_id(&self, id: i64) -> Result<Option<StudentCoursework>>;
    async fn get_assignment_detail(&self, id: i64) -> Result<Option<AssignmentDetail>>;
    // 在事务内复核唯一性与名额后插入，状态为 assigned
    async fn create_assignment(
        &self,
        student_id: i64,
        coursework_id: i64,
    ) -> Result<StudentCoursework>;
    async fn update_assignment_status(&self, id: i64, status: AssignmentStatus) -> Result<bool>;
    // 一次写入 reviewed 状态、成绩与评语
    async fn set_assignment_grade(
        &self,
        id: i64,
        grade: i32,
        feedback: Option<String>,
    ) -> Result<bool>;
    // 一次写入 submitted 状态与提交时间
    async fn set_assignment_submitted(
        &self,
        id: i64,
        at: chrono::DateTime<chrono::Utc>,
    ) -> Result<bool>;
    // 一次写入 completed 状态与完成时间
    async fn set_assignment_completed(
        &self,
        id: i64,
        at: chrono::DateTime<chrono::Utc>,
    ) -> Result<bool>;
    // 软删除，释放名额
    async fn delete_assignment(&self, id: i64) -> Result<bool>;
    async fn list_assignments_by_coursework(
        &self,
        coursework_id: i64,
    ) -> Result<Vec<AssignmentDetail>>;
    async fn list_assignments_by_teacher(&self, teacher_id: i64) -> Result<Vec<AssignmentDetail>>;

    /// 数据库连通性检查
    async fn ping(&self) -> Result<()>;
}

pub async fn create_storage() -> Result<Arc<dyn Storage>> {
    let storage = sea_orm_storage::SeaOrmStorage::new_async().await?;
    Ok(Arc::new(storage))
}
