use std::collections::HashMap;

use super::SeaOrmStorage;
use crate::entity::courseworks::{ActiveModel, Column, Entity as Courseworks};
use crate::entity::student_courseworks::{
    Column as AssignmentColumn, Entity as StudentCourseworks,
};
use crate::errors::{CourseforgeError, Result};
use crate::models::{
    PaginationInfo,
    courseworks::{
        entities::Coursework,
        requests::{CourseworkListQuery, CreateCourseworkRequest, UpdateCourseworkRequest},
        responses::CourseworkListResponse,
    },
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};

/// 统计课题当前存活的选题人数
pub(super) async fn count_live_enrollments<C: ConnectionTrait>(
    conn: &C,
    coursework_id: i64,
) -> Result<u64> {
    StudentCourseworks::find()
        .filter(AssignmentColumn::CourseworkId.eq(coursework_id))
        .filter(AssignmentColumn::DeletedAt.is_null())
        .count(conn)
        .await
        .map_err(|e| CourseforgeError::database_operation(format!("统计选题人数失败: {e}")))
}

impl SeaOrmStorage {
    pub async fn create_coursework_impl(
        &self,
        teacher_id: i64,
        req: CreateCourseworkRequest,
    ) -> Result<Coursework> {
        let now = chrono::Utc::now().timestamp();

        let model = ActiveModel {
            title: Set(req.title),
            description: Set(req.description),
            requirements: Set(req.requirements),
            subject_id: Set(req.subject_id),
            teacher_id: Set(teacher_id),
            max_students: Set(req.max_students),
            difficulty_level: Set(req.difficulty_level.to_string()),
            is_available: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| CourseforgeError::database_operation(format!("创建课题失败: {e}")))?;

        Ok(result.into_coursework())
    }

    pub async fn get_coursework_by_id_impl(&self, id: i64) -> Result<Option<Coursework>> {
        let result = Courseworks::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| CourseforgeError::database_operation(format!("查询课题失败: {e}")))?;

        Ok(result.map(|m| m.into_coursework()))
    }

    pub async fn get_coursework_with_enrollment_count_impl(
        &self,
        id: i64,
    ) -> Result<Option<(Coursework, u64)>> {
        let Some(coursework) = self.get_coursework_by_id_impl(id).await? else {
            return Ok(None);
        };
        let count = count_live_enrollments(&self.db, id).await?;
        Ok(Some((coursework, count)))
    }

    pub async fn list_courseworks_with_pagination_impl(
        &self,
        query: CourseworkListQuery,
    ) -> Result<CourseworkListResponse> {
        let page = query.page.unwrap_or(1).max(1) as u64;
        let size = query.size.unwrap_or(10).clamp(1, 100) as u64;

        let mut select = Courseworks::find();

        if let Some(subject_id) = query.subject_id {
            select = select.filter(Column::SubjectId.eq(subject_id));
        }
        if let Some(teacher_id) = query.teacher_id {
            select = select.filter(Column::TeacherId.eq(teacher_id));
        }
        if let Some(available) = query.available {
            select = select.filter(Column::IsAvailable.eq(available));
        }
        if let Some(difficulty) = query.difficulty {
            select = select.filter(Column::DifficultyLevel.eq(difficulty.to_string()));
        }

        let paginator = select
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id)
            .paginate(&self.db, size);
        let total = paginator.num_items().await.map_err(|e| {
            CourseforgeError::database_operation(format!("查询课题总数失败: {e}"))
        })?;
        let items = paginator.fetch_page(page - 1).await.map_err(|e| {
            CourseforgeError::database_operation(format!("查询课题列表失败: {e}"))
        })?;

        Ok(CourseworkListResponse {
            items: items.into_iter().map(|m| m.into_coursework()).collect(),
            pagination: PaginationInfo::new(page, size, total),
        })
    }

    pub async fn list_available_courseworks_impl(
        &self,
        subject_id: Option<i64>,
    ) -> Result<Vec<(Coursework, u64)>> {
        let mut select = Courseworks::find().filter(Column::IsAvailable.eq(true));
        if let Some(subject_id) = subject_id {
            select = select.filter(Column::SubjectId.eq(subject_id));
        }

        let courseworks = select
            .order_by_asc(Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| CourseforgeError::database_operation(format!("查询可选课题失败: {e}")))?;
        if courseworks.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i64> = courseworks.iter().map(|c| c.id).collect();
        let counts: HashMap<i64, i64> = StudentCourseworks::find()
            .select_only()
            .column(AssignmentColumn::CourseworkId)
            .column_as(AssignmentColumn::Id.count(), "enrolled")
            .filter(AssignmentColumn::CourseworkId.is_in(ids))
            .filter(AssignmentColumn::DeletedAt.is_null())
            .group_by(AssignmentColumn::CourseworkId)
            .into_tuple::<(i64, i64)>()
            .all(&self.db)
            .await
            .map_err(|e| CourseforgeError::database_operation(format!("统计选题人数失败: {e}")))?
            .into_iter()
            .collect();

        Ok(courseworks
            .into_iter()
            .map(|m| {
                let enrolled = counts.get(&m.id).copied().unwrap_or(0).max(0) as u64;
                (m.into_coursework(), enrolled)
            })
            .filter(|(cw, enrolled)| cw.has_capacity(*enrolled))
            .collect())
    }

    /// 更新课题；名额不得低于当前存活人数
    pub async fn update_coursework_impl(
        &self,
        id: i64,
        update: UpdateCourseworkRequest,
    ) -> Result<Option<Coursework>> {
        if self.get_coursework_by_id_impl(id).await?.is_none() {
            return Ok(None);
        }

        if let Some(max_students) = update.max_students {
            let enrolled = count_live_enrollments(&self.db, id).await?;
            if (max_students.max(0) as u64) < enrolled {
                return Err(CourseforgeError::conflict(format!(
                    "Coursework {id} has {enrolled} enrolled students, cannot lower capacity to {max_students}"
                )));
            }
        }

        let mut model = ActiveModel {
            id: Set(id),
            updated_at: Set(chrono::Utc::now().timestamp()),
            ..Default::default()
        };

        if let Some(title) = update.title {
            model.title = Set(title);
        }
        if let Some(description) = update.description {
            model.description = Set(description);
        }
        if let Some(requirements) = update.requirements {
            model.requirements = Set(Some(requirements));
        }
        if let Some(subject_id) = update.subject_id {
            model.subject_id = Set(subject_id);
        }
        if let Some(max_students) = update.max_students {
            model.max_students = Set(max_students);
        }
        if let Some(difficulty) = update.difficulty_level {
            model.difficulty_level = Set(difficulty.to_string());
        }

        model
            .update(&self.db)
            .await
            .map_err(|e| CourseforgeError::database_operation(format!("更新课题失败: {e}")))?;

        self.get_coursework_by_id_impl(id).await
    }

    pub async fn set_coursework_available_impl(&self, id: i64, available: bool) -> Result<bool> {
        let result = Courseworks::update_many()
            .col_expr(Column::IsAvailable, sea_orm::sea_query::Expr::value(available))
            .col_expr(
                Column::UpdatedAt,
                sea_orm::sea_query::Expr::value(chrono::Utc::now().timestamp()),
            )
            .filter(Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(|e| CourseforgeError::database_operation(format!("更新课题状态失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }

    /// 删除课题；仍有存活选题时拒绝
    pub async fn delete_coursework_impl(&self, id: i64) -> Result<bool> {
        let enrolled = count_live_enrollments(&self.db, id).await?;
        if enrolled > 0 {
            return Err(CourseforgeError::conflict(format!(
                "Coursework {id} still has {enrolled} enrolled students"
            )));
        }

        let result = Courseworks::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(|e| CourseforgeError::database_operation(format!("删除课题失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }
}
