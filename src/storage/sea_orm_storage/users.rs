use super::SeaOrmStorage;
use crate::entity::courseworks::Column as CourseworkColumn;
use crate::entity::student_courseworks::{
    Column as AssignmentColumn, Entity as StudentCourseworks, Relation as AssignmentRelation,
};
use crate::entity::users::{ActiveModel, Column, Entity as Users};
use crate::errors::{CourseforgeError, Result};
use crate::models::{
    PaginationInfo,
    users::{
        entities::User,
        requests::{CreateUserRequest, UpdateUserRequest, UserListQuery},
        responses::UserListResponse,
    },
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, JoinType, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait, Set, TransactionTrait,
};

impl SeaOrmStorage {
    /// 创建用户
    pub async fn create_user_impl(&self, req: CreateUserRequest) -> Result<User> {
        let now = chrono::Utc::now().timestamp();

        let model = ActiveModel {
            email: Set(req.email),
            password_hash: Set(req.password),
            first_name: Set(req.first_name),
            last_name: Set(req.last_name),
            role: Set(req.role.to_string()),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| CourseforgeError::database_operation(format!("创建用户失败: {e}")))?;

        Ok(result.into_user())
    }

    /// 通过 ID 获取用户
    pub async fn get_user_by_id_impl(&self, id: i64) -> Result<Option<User>> {
        let result = Users::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| CourseforgeError::database_operation(format!("查询用户失败: {e}")))?;

        Ok(result.map(|m| m.into_user()))
    }

    /// 通过邮箱获取用户
    pub async fn get_user_by_email_impl(&self, email: &str) -> Result<Option<User>> {
        let result = Users::find()
            .filter(Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(|e| CourseforgeError::database_operation(format!("查询用户失败: {e}")))?;

        Ok(result.map(|m| m.into_user()))
    }

    /// 分页列出用户
    pub async fn list_users_with_pagination_impl(
        &self,
        query: UserListQuery,
    ) -> Result<UserListResponse> {
        let page = query.page.unwrap_or(1).max(1) as u64;
        let size = query.size.unwrap_or(10).clamp(1, 100) as u64;

        let mut select = Users::find();

        if let Some(ref search) = query.search
            && !search.trim().is_empty()
        {
            let needle = search.trim();
            select = select.filter(
                Condition::any()
                    .add(Column::Email.contains(needle))
                    .add(Column::FirstName.contains(needle))
                    .add(Column::LastName.contains(needle)),
            );
        }

        if let Some(role) = query.role {
            select = select.filter(Column::Role.eq(role.to_string()));
        }

        select = select.order_by_desc(Column::CreatedAt).order_by_desc(Column::Id);

        let paginator = select.paginate(&self.db, size);
        let total = paginator.num_items().await.map_err(|e| {
            CourseforgeError::database_operation(format!("查询用户总数失败: {e}"))
        })?;

        let users = paginator.fetch_page(page - 1).await.map_err(|e| {
            CourseforgeError::database_operation(format!("查询用户列表失败: {e}"))
        })?;

        Ok(UserListResponse {
            items: users.into_iter().map(|m| m.into_user()).collect(),
            pagination: PaginationInfo::new(page, size, total),
        })
    }

    /// 更新用户信息（password 字段须为已哈希的值）
    pub async fn update_user_impl(
        &self,
        id: i64,
        update: UpdateUserRequest,
    ) -> Result<Option<User>> {
        if self.get_user_by_id_impl(id).await?.is_none() {
            return Ok(None);
        }

        let mut model = ActiveModel {
            id: Set(id),
            updated_at: Set(chrono::Utc::now().timestamp()),
            ..Default::default()
        };

        if let Some(email) = update.email {
            model.email = Set(email);
        }
        if let Some(password) = update.password {
            model.password_hash = Set(password);
        }
        if let Some(first_name) = update.first_name {
            model.first_name = Set(first_name);
        }
        if let Some(last_name) = update.last_name {
            model.last_name = Set(last_name);
        }
        if let Some(role) = update.role {
            model.role = Set(role.to_string());
        }
        if let Some(is_active) = update.is_active {
            model.is_active = Set(is_active);
        }

        model
            .update(&self.db)
            .await
            .map_err(|e| CourseforgeError::database_operation(format!("更新用户失败: {e}")))?;

        self.get_user_by_id_impl(id).await
    }

    /// 删除用户
    ///
    /// 外键级联会连带删除课题和选题记录；只要用户仍关联存活选题
    /// （本人选题，或名下课题有人选），就拒绝删除。
    pub async fn delete_user_impl(&self, id: i64) -> Result<bool> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| CourseforgeError::database_operation(format!("开启事务失败: {e}")))?;

        let held = StudentCourseworks::find()
            .filter(AssignmentColumn::StudentId.eq(id))
            .filter(AssignmentColumn::DeletedAt.is_null())
            .count(&txn)
            .await
            .map_err(|e| CourseforgeError::database_operation(format!("统计用户选题失败: {e}")))?;
        if held > 0 {
            return Err(CourseforgeError::conflict(format!(
                "User {id} still holds an active assignment"
            )));
        }

        let supervised = StudentCourseworks::find()
            .join(JoinType::InnerJoin, AssignmentRelation::Coursework.def())
            .filter(CourseworkColumn::TeacherId.eq(id))
            .filter(AssignmentColumn::DeletedAt.is_null())
            .count(&txn)
            .await
            .map_err(|e| CourseforgeError::database_operation(format!("统计教师选题失败: {e}")))?;
        if supervised > 0 {
            return Err(CourseforgeError::conflict(format!(
                "User {id} supervises {supervised} active assignments"
            )));
        }

        let result = Users::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(|e| CourseforgeError::database_operation(format!("删除用户失败: {e}")))?;
        txn.commit()
            .await
            .map_err(|e| CourseforgeError::database_operation(format!("提交事务失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }

    /// 统计用户数量
    pub async fn count_users_impl(&self) -> Result<u64> {
        Users::find()
            .count(&self.db)
            .await
            .map_err(|e| CourseforgeError::database_operation(format!("统计用户数量失败: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::entities::UserRole;

    fn new_user(email: &str, role: UserRole) -> CreateUserRequest {
        CreateUserRequest {
            email: email.to_string(),
            password: "hashed".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Byron".to_string(),
            role,
        }
    }

    #[tokio::test]
    async fn test_create_and_lookup_user() {
        let storage = SeaOrmStorage::in_memory().await;
        let user = storage
            .create_user_impl(new_user("ada@example.com", UserRole::Teacher))
            .await
            .unwrap();

        assert!(user.is_active);
        assert_eq!(user.role, UserRole::Teacher);
        let by_email = storage
            .get_user_by_email_impl("ada@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_email.id, user.id);
        assert_eq!(storage.count_users_impl().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_email_fails() {
        let storage = SeaOrmStorage::in_memory().await;
        storage
            .create_user_impl(new_user("dup@example.com", UserRole::Student))
            .await
            .unwrap();
        let err = storage
            .create_user_impl(new_user("dup@example.com", UserRole::Student))
            .await
            .unwrap_err();
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_list_filters_by_role() {
        let storage = SeaOrmStorage::in_memory().await;
        for i in 0..3 {
            storage
                .create_user_impl(new_user(&format!("s{i}@example.com"), UserRole::Student))
                .await
                .unwrap();
        }
        storage
            .create_user_impl(new_user("t@example.com", UserRole::Teacher))
            .await
            .unwrap();

        let page = storage
            .list_users_with_pagination_impl(UserListQuery {
                role: Some(UserRole::Student),
                size: Some(2),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.pagination.total, 3);
        assert_eq!(page.pagination.total_pages, 2);
    }

    #[tokio::test]
    async fn test_update_and_delete_user() {
        let storage = SeaOrmStorage::in_memory().await;
        let user = storage
            .create_user_impl(new_user("u@example.com", UserRole::Student))
            .await
            .unwrap();

        let updated = storage
            .update_user_impl(
                user.id,
                UpdateUserRequest {
                    first_name: Some("Grace".into()),
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.first_name, "Grace");
        assert!(!updated.is_active);

        assert!(storage.delete_user_impl(user.id).await.unwrap());
        assert!(storage.get_user_by_id_impl(user.id).await.unwrap().is_none());
        assert!(
            storage
                .update_user_impl(user.id, UpdateUserRequest::default())
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_delete_rejected_while_assignments_live() {
        use crate::storage::sea_orm_storage::courseworks::tests::{coursework_request, seed_catalog};

        let storage = SeaOrmStorage::in_memory().await;
        let (teacher_id, subject_id) = seed_catalog(&storage).await;
        let cw = storage
            .create_coursework_impl(teacher_id, coursework_request(subject_id, 2))
            .await
            .unwrap();
        let student = storage
            .create_user_impl(new_user("s@example.com", UserRole::Student))
            .await
            .unwrap();
        let a = storage.create_assignment_impl(student.id, cw.id).await.unwrap();

        let err = storage.delete_user_impl(teacher_id).await.unwrap_err();
        assert!(matches!(err, CourseforgeError::Conflict(_)));
        let err = storage.delete_user_impl(student.id).await.unwrap_err();
        assert!(matches!(err, CourseforgeError::Conflict(_)));
        assert!(storage.get_assignment_by_student_impl(student.id).await.unwrap().is_some());
        assert!(storage.get_coursework_by_id_impl(cw.id).await.unwrap().is_some());

        // 退选后教师即可删除
        storage.delete_assignment_impl(a.id).await.unwrap();
        assert!(storage.delete_user_impl(teacher_id).await.unwrap());
        assert!(storage.delete_user_impl(student.id).await.unwrap());
    }
}
