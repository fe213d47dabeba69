//! SeaORM 存储实现
//!
//! 统一的数据库存储层，支持 SQLite、PostgreSQL 和 MySQL。

mod assignments;
mod courseworks;
mod subject_teachers;
mod subjects;
mod users;

use crate::config::AppConfig;
use crate::errors::{CourseforgeError, Result};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection};
use std::time::Duration;
use tracing::info;

/// SeaORM 存储实现
#[derive(Clone)]
pub struct SeaOrmStorage {
    pub(crate) db: DatabaseConnection,
}

impl SeaOrmStorage {
    /// 按全局配置创建存储实例
    pub async fn new_async() -> Result<Self> {
        let config = AppConfig::get();
        Self::connect(
            &config.database.url,
            config.database.pool_size,
            config.database.timeout,
        )
        .await
    }

    /// 连接数据库并运行迁移
    pub async fn connect(url: &str, pool_size: u32, timeout_secs: u64) -> Result<Self> {
        let db_url = Self::build_database_url(url)?;

        // 根据数据库类型选择连接方式
        let db = if db_url.starts_with("sqlite:") {
            Self::connect_sqlite(&db_url, pool_size, timeout_secs).await?
        } else {
            Self::connect_generic(&db_url, pool_size, timeout_secs).await?
        };

        Migrator::up(&db, None)
            .await
            .map_err(|e| CourseforgeError::database_operation(format!("数据库迁移失败: {e}")))?;

        info!("SeaORM storage ready, database: {}", db_url);

        Ok(Self { db })
    }

    /// SQLite 专用连接（WAL + pragma 优化）
    async fn connect_sqlite(
        url: &str,
        pool_size: u32,
        timeout_secs: u64,
    ) -> Result<DatabaseConnection> {
        use sea_orm::SqlxSqliteConnector;
        use sea_orm::sqlx::sqlite::{
            SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
        };
        use std::str::FromStr;

        let opt = SqliteConnectOptions::from_str(url)
            .map_err(|e| CourseforgeError::database_config(format!("SQLite URL 解析失败: {e}")))?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(5))
            .pragma("cache_size", "-64000")
            .pragma("temp_store", "memory");

        let pool = SqlitePoolOptions::new()
            .max_connections(pool_size.max(1))
            .min_connections(1)
            .test_before_acquire(true)
            .acquire_timeout(Duration::from_secs(timeout_secs))
            // 内存库随连接关闭而消失，不回收空闲连接
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(opt)
            .await
            .map_err(|e| {
                CourseforgeError::database_connection(format!("SQLite 连接失败: {e}"))
            })?;

        Ok(SqlxSqliteConnector::from_sqlx_sqlite_pool(pool))
    }

    /// 通用连接（PostgreSQL、MySQL 等）
    async fn connect_generic(
        url: &str,
        pool_size: u32,
        timeout_secs: u64,
    ) -> Result<DatabaseConnection> {
        let mut opt = ConnectOptions::new(url);
        opt.max_connections(pool_size)
            .min_connections(1)
            .connect_timeout(Duration::from_secs(timeout_secs))
            .acquire_timeout(Duration::from_secs(timeout_secs))
            .idle_timeout(Duration::from_secs(600))
            .max_lifetime(Duration::from_secs(1800))
            .sqlx_logging(false)
            .sqlx_logging_level(tracing::log::LevelFilter::Debug);

        Database::connect(opt)
            .await
            .map_err(|e| CourseforgeError::database_connection(format!("无法连接到数据库: {e}")))
    }

    /// 从 URL 自动推断数据库类型并构建连接 URL
    fn build_database_url(url: &str) -> Result<String> {
        if url.starts_with("sqlite:") {
            Ok(url.to_string())
        } else if url.ends_with(".db") || url.ends_with(".sqlite") {
            Ok(format!("sqlite://{url}?mode=rwc"))
        } else if url == ":memory:" {
            Ok("sqlite::memory:".to_string())
        } else if url.starts_with("postgres://")
            || url.starts_with("postgresql://")
            || url.starts_with("mysql://")
            || url.starts_with("mariadb://")
        {
            Ok(url.to_string())
        } else {
            Err(CourseforgeError::database_config(format!(
                "无法从 URL 推断数据库类型: {url}. 支持: sqlite://, postgres://, mysql://, 或 .db/.sqlite 文件路径"
            )))
        }
    }

    /// 单连接内存库，测试专用
    #[cfg(test)]
    pub(crate) async fn in_memory() -> Self {
        Self::connect("sqlite::memory:", 1, 5)
            .await
            .expect("in-memory sqlite should open")
    }
}

// Storage trait 实现
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
use crate::storage::Storage;
use async_trait::async_trait;

#[async_trait]
impl Storage for SeaOrmStorage {
    // 用户模块
    async fn create_user(&self, user: CreateUserRequest) -> Result<User> {
        self.create_user_impl(user).await
    }

    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>> {
        self.get_user_by_id_impl(id).await
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.get_user_by_email_impl(email).await
    }

    async fn list_users_with_pagination(&self, query: UserListQuery) -> Result<UserListResponse> {
        self.list_users_with_pagination_impl(query).await
    }

    async fn update_user(&self, id: i64, update: UpdateUserRequest) -> Result<Option<User>> {
        self.update_user_impl(id, update).await
    }

    async fn delete_user(&self, id: i64) -> Result<bool> {
        self.delete_user_impl(id).await
    }

    async fn count_users(&self) -> Result<u64> {
        self.count_users_impl().await
    }

    // 学科模块
    async fn create_subject(&self, subject: CreateSubjectRequest) -> Result<Subject> {
        self.create_subject_impl(subject).await
    }

    async fn get_subject_by_id(&self, id: i64) -> Result<Option<Subject>> {
        self.get_subject_by_id_impl(id).await
    }

    async fn get_subject_by_code(&self, code: &str) -> Result<Option<Subject>> {
        self.get_subject_by_code_impl(code).await
    }

    async fn list_subjects_with_pagination(
        &self,
        query: SubjectListQuery,
    ) -> Result<SubjectListResponse> {
        self.list_subjects_with_pagination_impl(query).await
    }

    async fn update_subject(
        &self,
        id: i64,
        update: UpdateSubjectRequest,
    ) -> Result<Option<Subject>> {
        self.update_subject_impl(id, update).await
    }

    async fn delete_subject(&self, id: i64) -> Result<bool> {
        self.delete_subject_impl(id).await
    }

    async fn add_subject_teacher(
        &self,
        subject_id: i64,
        teacher_id: i64,
        is_lead: bool,
    ) -> Result<()> {
        self.add_subject_teacher_impl(subject_id, teacher_id, is_lead)
            .await
    }

    async fn remove_subject_teacher(&self, subject_id: i64, teacher_id: i64) -> Result<bool> {
        self.remove_subject_teacher_impl(subject_id, teacher_id).await
    }

    async fn set_subject_lead_teacher(&self, subject_id: i64, teacher_id: i64) -> Result<bool> {
        self.set_subject_lead_teacher_impl(subject_id, teacher_id)
            .await
    }

    async fn list_subject_teachers(&self, subject_id: i64) -> Result<Vec<SubjectTeacher>> {
        self.list_subject_teachers_impl(subject_id).await
    }

    async fn list_subjects_by_teacher(&self, teacher_id: i64) -> Result<Vec<Subject>> {
        self.list_subjects_by_teacher_impl(teacher_id).await
    }

    // 课题模块
    async fn create_coursework(
        &self,
        teacher_id: i64,
        coursework: CreateCourseworkRequest,
    ) -> Result<Coursework> {
        self.create_coursework_impl(teacher_id, coursework).await
    }

    async fn get_coursework_by_id(&self, id: i64) -> Result<Option<Coursework>> {
        self.get_coursework_by_id_impl(id).await
    }

    async fn get_coursework_with_enrollment_count(
        &self,
        id: i64,
    ) -> Result<Option<(Coursework, u64)>> {
        self.get_coursework_with_enrollment_count_impl(id).await
    }

    async fn list_courseworks_with_pagination(
        &self,
        query: CourseworkListQuery,
    ) -> Result<CourseworkListResponse> {
        self.list_courseworks_with_pagination_impl(query).await
    }

    async fn list_available_courseworks(
        &self,
        subject_id: Option<i64>,
    ) -> Result<Vec<(Coursework, u64)>> {
        self.list_available_courseworks_impl(subject_id).await
    }

    async fn update_coursework(
        &self,
        id: i64,
        update: UpdateCourseworkRequest,
    ) -> Result<Option<Coursework>> {
        self.update_coursework_impl(id, update).await
    }

    async fn set_coursework_available(&self, id: i64, available: bool) -> Result<bool> {
        self.set_coursework_available_impl(id, available).await
    }

    async fn delete_coursework(&self, id: i64) -> Result<bool> {
        self.delete_coursework_impl(id).await
    }

    // 选题模块
    async fn get_assignment_by_student(
        &self,
        student_id: i64,
    ) -> Result<Option<StudentCoursework>> {
        self.get_assignment_by_student_impl(student_id).await
    }

    async fn get_assignment_by_id(&self, id: i64) -> Result<Option<StudentCoursework>> {
        self.get_assignment_by_id_impl(id).await
    }

    async fn get_assignment_detail(&self, id: i64) -> Result<Option<AssignmentDetail>> {
        self.get_assignment_detail_impl(id).await
    }

    async fn create_assignment(
        &self,
        student_id: i64,
        coursework_id: i64,
    ) -> Result<StudentCoursework> {
        self.create_assignment_impl(student_id, coursework_id).await
    }

    async fn update_assignment_status(&self, id: i64, status: AssignmentStatus) -> Result<bool> {
        self.update_assignment_status_impl(id, status).await
    }

    async fn set_assignment_grade(
        &self,
        id: i64,
        grade: i32,
        feedback: Option<String>,
    ) -> Result<bool> {
        self.set_assignment_grade_impl(id, grade, feedback).await
    }

    async fn set_assignment_submitted(
        &self,
        id: i64,
        at: chrono::DateTime<chrono::Utc>,
    ) -> Result<bool> {
        self.set_assignment_submitted_impl(id, at).await
    }

    async fn set_assignment_completed(
        &self,
        id: i64,
        at: chrono::DateTime<chrono::Utc>,
    ) -> Result<bool> {
        self.set_assignment_completed_impl(id, at).await
    }

    async fn delete_assignment(&self, id: i64) -> Result<bool> {
        self.delete_assignment_impl(id).await
    }

    async fn list_assignments_by_coursework(
        &self,
        coursework_id: i64,
    ) -> Result<Vec<AssignmentDetail>> {
        self.list_assignments_by_coursework_impl(coursework_id)
            .await
    }

    async fn list_assignments_by_teacher(&self, teacher_id: i64) -> Result<Vec<AssignmentDetail>> {
        self.list_assignments_by_teacher_impl(teacher_id).await
    }

    async fn ping(&self) -> Result<()> {
        self.db
            .execute_unprepared("SELECT 1")
            .await
            .map_err(|e| CourseforgeError::database_connection(format!("数据库不可用: {e}")))?;
        Ok(())
    }
}
