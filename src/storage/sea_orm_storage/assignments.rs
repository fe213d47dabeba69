//! 选题记录的存储实现
//!
//! 存活记录满足 `deleted_at IS NULL`，并且 `active_student_id = student_id`。
//! 撤销只做软删除：写入 `deleted_at`，同时清空 `active_student_id` 以释放唯一索引。

use std::collections::HashMap;

use super::SeaOrmStorage;
use super::courseworks::count_live_enrollments;
use crate::entity::courseworks::Entity as Courseworks;
use crate::entity::student_courseworks::{
    ActiveModel, Column, Entity as StudentCourseworks, Model,
};
use crate::entity::users::Entity as Users;
use crate::errors::{CourseforgeError, Result};
use crate::models::{
    assignments::entities::{AssignmentDetail, AssignmentStatus, StudentCoursework},
    courseworks::entities::CourseworkBrief,
    users::entities::UserBrief,
};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbBackend, EntityTrait, JoinType,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set, SqlErr, TransactionTrait, Value,
};

fn db_err(action: &str, e: sea_orm::DbErr) -> CourseforgeError {
    CourseforgeError::database_operation(format!("{action}: {e}"))
}

impl SeaOrmStorage {
    pub async fn get_assignment_by_student_impl(
        &self,
        student_id: i64,
    ) -> Result<Option<StudentCoursework>> {
        let result = StudentCourseworks::find()
            .filter(Column::StudentId.eq(student_id))
            .filter(Column::DeletedAt.is_null())
            .one(&self.db)
            .await
            .map_err(|e| db_err("查询学生选题失败", e))?;

        Ok(result.map(|m| m.into_assignment()))
    }

    pub async fn get_assignment_by_id_impl(&self, id: i64) -> Result<Option<StudentCoursework>> {
        let result = StudentCourseworks::find_by_id(id)
            .filter(Column::DeletedAt.is_null())
            .one(&self.db)
            .await
            .map_err(|e| db_err("查询选题失败", e))?;

        Ok(result.map(|m| m.into_assignment()))
    }

    pub async fn get_assignment_detail_impl(&self, id: i64) -> Result<Option<AssignmentDetail>> {
        let Some(model) = StudentCourseworks::find_by_id(id)
            .filter(Column::DeletedAt.is_null())
            .one(&self.db)
            .await
            .map_err(|e| db_err("查询选题失败", e))?
        else {
            return Ok(None);
        };

        Ok(self.attach_details(vec![model]).await?.into_iter().next())
    }

    /// 在一个事务里复核全部前置条件后插入
    ///
    /// 并发下学生唯一性由 `active_student_id` 唯一索引兜底；
    /// 名额在插入前重新计数，PostgreSQL/MySQL 还会对课题行加排他锁。
    pub async fn create_assignment_impl(
        &self,
        student_id: i64,
        coursework_id: i64,
    ) -> Result<StudentCoursework> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| db_err("开启事务失败", e))?;

        let existing = StudentCourseworks::find()
            .filter(Column::StudentId.eq(student_id))
            .filter(Column::DeletedAt.is_null())
            .one(&txn)
            .await
            .map_err(|e| db_err("查询学生选题失败", e))?;
        if existing.is_some() {
            return Err(CourseforgeError::already_assigned(format!(
                "Student {student_id} already has an active assignment"
            )));
        }

        let mut select = Courseworks::find_by_id(coursework_id);
        if txn.get_database_backend() != DbBackend::Sqlite {
            select = select.lock_exclusive();
        }
        let coursework = select
            .one(&txn)
            .await
            .map_err(|e| db_err("查询课题失败", e))?
            .ok_or_else(|| {
                CourseforgeError::not_found(format!("Coursework {coursework_id} not found"))
            })?;
        if !coursework.is_available {
            return Err(CourseforgeError::coursework_unavailable(format!(
                "Coursework {coursework_id} is not open for enrollment"
            )));
        }

        let enrolled = count_live_enrollments(&txn, coursework_id).await?;
        if enrolled >= coursework.max_students.max(0) as u64 {
            return Err(CourseforgeError::capacity_exceeded(format!(
                "Coursework {coursework_id} is full ({enrolled}/{})",
                coursework.max_students
            )));
        }

        let now = chrono::Utc::now().timestamp();
        let model = ActiveModel {
            student_id: Set(student_id),
            coursework_id: Set(coursework_id),
            status: Set(AssignmentStatus::Assigned.to_string()),
            active_student_id: Set(Some(student_id)),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let inserted = match model.insert(&txn).await {
            Ok(m) => m,
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                return Err(CourseforgeError::already_assigned(format!(
                    "Student {student_id} already has an active assignment"
                )));
            }
            Err(e) => return Err(db_err("创建选题失败", e)),
        };

        txn.commit().await.map_err(|e| {
            if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                CourseforgeError::already_assigned(format!(
                    "Student {student_id} already has an active assignment"
                ))
            } else {
                db_err("提交事务失败", e)
            }
        })?;

        Ok(inserted.into_assignment())
    }

    pub async fn update_assignment_status_impl(
        &self,
        id: i64,
        status: AssignmentStatus,
    ) -> Result<bool> {
        self.update_live(
            id,
            vec![(Column::Status, Value::from(status.to_string()))],
            "更新选题状态失败",
        )
        .await
    }

    pub async fn set_assignment_grade_impl(
        &self,
        id: i64,
        grade: i32,
        feedback: Option<String>,
    ) -> Result<bool> {
        self.update_live(
            id,
            vec![
                (
                    Column::Status,
                    Value::from(AssignmentStatus::Reviewed.to_string()),
                ),
                (Column::Grade, Value::from(grade)),
                (Column::Feedback, Value::from(feedback)),
            ],
            "写入成绩失败",
        )
        .await
    }

    pub async fn set_assignment_submitted_impl(
        &self,
        id: i64,
        at: chrono::DateTime<chrono::Utc>,
    ) -> Result<bool> {
        self.update_live(
            id,
            vec![
                (
                    Column::Status,
                    Value::from(AssignmentStatus::Submitted.to_string()),
                ),
                (Column::SubmittedAt, Value::from(at.timestamp())),
            ],
            "标记提交失败",
        )
        .await
    }

    pub async fn set_assignment_completed_impl(
        &self,
        id: i64,
        at: chrono::DateTime<chrono::Utc>,
    ) -> Result<bool> {
        self.update_live(
            id,
            vec![
                (
                    Column::Status,
                    Value::from(AssignmentStatus::Completed.to_string()),
                ),
                (Column::CompletedAt, Value::from(at.timestamp())),
            ],
            "标记完成失败",
        )
        .await
    }

    pub async fn delete_assignment_impl(&self, id: i64) -> Result<bool> {
        let now = chrono::Utc::now().timestamp();
        self.update_live(
            id,
            vec![
                (Column::DeletedAt, Value::from(now)),
                (Column::ActiveStudentId, Value::from(Option::<i64>::None)),
            ],
            "撤销选题失败",
        )
        .await
    }

    pub async fn list_assignments_by_coursework_impl(
        &self,
        coursework_id: i64,
    ) -> Result<Vec<AssignmentDetail>> {
        let models = StudentCourseworks::find()
            .filter(Column::CourseworkId.eq(coursework_id))
            .filter(Column::DeletedAt.is_null())
            .order_by_asc(Column::CreatedAt)
            .order_by_asc(Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| db_err("查询课题选题失败", e))?;

        self.attach_details(models).await
    }

    pub async fn list_assignments_by_teacher_impl(
        &self,
        teacher_id: i64,
    ) -> Result<Vec<AssignmentDetail>> {
        use crate::entity::courseworks::Column as CourseworkColumn;
        use crate::entity::student_courseworks::Relation;

        let models = StudentCourseworks::find()
            .join(JoinType::InnerJoin, Relation::Coursework.def())
            .filter(CourseworkColumn::TeacherId.eq(teacher_id))
            .filter(Column::DeletedAt.is_null())
            .order_by_asc(Column::CourseworkId)
            .order_by_asc(Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(|e| db_err("查询教师选题失败", e))?;

        self.attach_details(models).await
    }

    /// 只更新存活记录，并同步刷新 updated_at
    async fn update_live(
        &self,
        id: i64,
        values: Vec<(Column, Value)>,
        action: &str,
    ) -> Result<bool> {
        let mut update = StudentCourseworks::update_many()
            .col_expr(Column::UpdatedAt, Expr::value(chrono::Utc::now().timestamp()));
        for (col, value) in values {
            update = update.col_expr(col, Expr::value(value));
        }

        let result = update
            .filter(Column::Id.eq(id))
            .filter(Column::DeletedAt.is_null())
            .exec(&self.db)
            .await
            .map_err(|e| db_err(action, e))?;

        Ok(result.rows_affected > 0)
    }

    /// 批量补齐学生和课题的简要信息
    async fn attach_details(&self, models: Vec<Model>) -> Result<Vec<AssignmentDetail>> {
        if models.is_empty() {
            return Ok(Vec::new());
        }

        let student_ids: Vec<i64> = models.iter().map(|m| m.student_id).collect();
        let coursework_ids: Vec<i64> = models.iter().map(|m| m.coursework_id).collect();

        let students: HashMap<i64, UserBrief> = Users::find()
            .filter(crate::entity::users::Column::Id.is_in(student_ids))
            .all(&self.db)
            .await
            .map_err(|e| db_err("查询学生信息失败", e))?
            .into_iter()
            .map(|m| {
                let user = m.into_user();
                (user.id, UserBrief::from(&user))
            })
            .collect();

        let courseworks: HashMap<i64, CourseworkBrief> = Courseworks::find()
            .filter(crate::entity::courseworks::Column::Id.is_in(coursework_ids))
            .all(&self.db)
            .await
            .map_err(|e| db_err("查询课题信息失败", e))?
            .into_iter()
            .map(|m| {
                let cw = m.into_coursework();
                (cw.id, CourseworkBrief::from(&cw))
            })
            .collect();

        let mut details = Vec::with_capacity(models.len());
        for model in models {
            // 外键保证引用存在；缺失说明数据已损坏，不能悄悄丢行
            let (Some(student), Some(coursework)) = (
                students.get(&model.student_id),
                courseworks.get(&model.coursework_id),
            ) else {
                return Err(CourseforgeError::database_operation(format!(
                    "Assignment {} references a missing student or coursework",
                    model.id
                )));
            };
            details.push(AssignmentDetail {
                student: student.clone(),
                coursework: coursework.clone(),
                assignment: model.into_assignment(),
            });
        }

        Ok(details)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::{entities::UserRole, requests::CreateUserRequest};
    use crate::storage::sea_orm_storage::courseworks::tests::{coursework_request, seed_catalog};

    async fn student(storage: &SeaOrmStorage, n: u32) -> i64 {
        storage
            .create_user_impl(CreateUserRequest {
                email: format!("student{n}@example.com"),
                password: "hashed".into(),
                first_name: format!("S{n}"),
                last_name: "Tudent".into(),
                role: UserRole::Student,
            })
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_create_assignment_enforces_preconditions() {
        let storage = SeaOrmStorage::in_memory().await;
        let (teacher_id, subject_id) = seed_catalog(&storage).await;
        let cw = storage
            .create_coursework_impl(teacher_id, coursework_request(subject_id, 1))
            .await
            .unwrap();
        let other = storage
            .create_coursework_impl(teacher_id, coursework_request(subject_id, 1))
            .await
            .unwrap();
        let x = student(&storage, 1).await;
        let y = student(&storage, 2).await;

        let a = storage.create_assignment_impl(x, cw.id).await.unwrap();
        assert_eq!(a.status, AssignmentStatus::Assigned);

        let err = storage.create_assignment_impl(y, cw.id).await.unwrap_err();
        assert!(matches!(err, CourseforgeError::CapacityExceeded(_)));

        let err = storage.create_assignment_impl(x, other.id).await.unwrap_err();
        assert!(matches!(err, CourseforgeError::AlreadyAssigned(_)));

        let err = storage.create_assignment_impl(y, 9999).await.unwrap_err();
        assert!(matches!(err, CourseforgeError::NotFound(_)));

        storage.set_coursework_available_impl(other.id, false).await.unwrap();
        let err = storage.create_assignment_impl(y, other.id).await.unwrap_err();
        assert!(matches!(err, CourseforgeError::CourseworkUnavailable(_)));
    }

    #[tokio::test]
    async fn test_unique_index_blocks_second_live_row() {
        let storage = SeaOrmStorage::in_memory().await;
        let (teacher_id, subject_id) = seed_catalog(&storage).await;
        let cw = storage
            .create_coursework_impl(teacher_id, coursework_request(subject_id, 5))
            .await
            .unwrap();
        let x = student(&storage, 1).await;
        storage.create_assignment_impl(x, cw.id).await.unwrap();

        // 绕过前置检查直接插入，模拟并发竞态中落后的一方
        let now = chrono::Utc::now().timestamp();
        let raw = ActiveModel {
            student_id: Set(x),
            coursework_id: Set(cw.id),
            status: Set("assigned".into()),
            active_student_id: Set(Some(x)),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        let err = raw.insert(&storage.db).await.unwrap_err();
        assert!(matches!(
            err.sql_err(),
            Some(SqlErr::UniqueConstraintViolation(_))
        ));
    }

    #[tokio::test]
    async fn test_soft_delete_releases_slot() {
        let storage = SeaOrmStorage::in_memory().await;
        let (teacher_id, subject_id) = seed_catalog(&storage).await;
        let cw = storage
            .create_coursework_impl(teacher_id, coursework_request(subject_id, 1))
            .await
            .unwrap();
        let x = student(&storage, 1).await;
        let y = student(&storage, 2).await;

        let a = storage.create_assignment_impl(x, cw.id).await.unwrap();
        assert!(storage.delete_assignment_impl(a.id).await.unwrap());
        assert!(!storage.delete_assignment_impl(a.id).await.unwrap());
        assert!(storage.get_assignment_by_student_impl(x).await.unwrap().is_none());
        assert!(storage.get_assignment_by_id_impl(a.id).await.unwrap().is_none());

        storage.create_assignment_impl(y, cw.id).await.unwrap();
        // 同一学生撤销后可再次选题
        let current = storage.get_assignment_by_student_impl(y).await.unwrap().unwrap();
        storage.delete_assignment_impl(current.id).await.unwrap();
        storage.create_assignment_impl(x, cw.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_single_row_updates() {
        let storage = SeaOrmStorage::in_memory().await;
        let (teacher_id, subject_id) = seed_catalog(&storage).await;
        let cw = storage
            .create_coursework_impl(teacher_id, coursework_request(subject_id, 2))
            .await
            .unwrap();
        let x = student(&storage, 1).await;
        let a = storage.create_assignment_impl(x, cw.id).await.unwrap();

        let at = chrono::Utc::now();
        assert!(storage.set_assignment_submitted_impl(a.id, at).await.unwrap());
        assert!(
            storage
                .set_assignment_grade_impl(a.id, 4, Some("good".into()))
                .await
                .unwrap()
        );
        let graded = storage.get_assignment_by_id_impl(a.id).await.unwrap().unwrap();
        assert_eq!(graded.status, AssignmentStatus::Reviewed);
        assert_eq!(graded.grade, Some(4));
        assert_eq!(graded.feedback.as_deref(), Some("good"));
        assert_eq!(graded.submitted_at.map(|t| t.timestamp()), Some(at.timestamp()));

        assert!(!storage.set_assignment_completed_impl(a.id + 1, at).await.unwrap());
    }

    #[tokio::test]
    async fn test_listing_attaches_details() {
        let storage = SeaOrmStorage::in_memory().await;
        let (teacher_id, subject_id) = seed_catalog(&storage).await;
        let cw = storage
            .create_coursework_impl(teacher_id, coursework_request(subject_id, 3))
            .await
            .unwrap();
        for n in 1..=2 {
            let s = student(&storage, n).await;
            storage.create_assignment_impl(s, cw.id).await.unwrap();
        }

        let by_cw = storage.list_assignments_by_coursework_impl(cw.id).await.unwrap();
        assert_eq!(by_cw.len(), 2);
        assert_eq!(by_cw[0].student.full_name, "S1 Tudent");
        assert_eq!(by_cw[0].coursework.title, cw.title);

        let by_teacher = storage.list_assignments_by_teacher_impl(teacher_id).await.unwrap();
        assert_eq!(by_teacher.len(), 2);
        assert!(
            storage
                .list_assignments_by_teacher_impl(teacher_id + 100)
                .await
                .unwrap()
                .is_empty()
        );

        let detail = storage
            .get_assignment_detail_impl(by_cw[1].assignment.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(detail.student.email, "student2@example.com");
    }

    #[tokio::test]
    async fn test_dangling_reference_is_reported() {
        let storage = SeaOrmStorage::in_memory().await;
        let (teacher_id, subject_id) = seed_catalog(&storage).await;
        let cw = storage
            .create_coursework_impl(teacher_id, coursework_request(subject_id, 2))
            .await
            .unwrap();
        let x = student(&storage, 1).await;
        storage.create_assignment_impl(x, cw.id).await.unwrap();

        // 单连接内存库：关掉外键后直接删学生，留下悬空记录
        storage
            .db
            .execute_unprepared("PRAGMA foreign_keys = OFF")
            .await
            .unwrap();
        storage
            .db
            .execute_unprepared(&format!("DELETE FROM users WHERE id = {x}"))
            .await
            .unwrap();

        let err = storage
            .list_assignments_by_coursework_impl(cw.id)
            .await
            .unwrap_err();
        assert!(matches!(err, CourseforgeError::DatabaseOperation(_)));
    }
}
