use super::SeaOrmStorage;
use crate::entity::subjects::{ActiveModel, Column, Entity as Subjects};
use crate::errors::{CourseforgeError, Result};
use crate::models::{
    PaginationInfo,
    subjects::{
        entities::Subject,
        requests::{CreateSubjectRequest, SubjectListQuery, UpdateSubjectRequest},
        responses::SubjectListResponse,
    },
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    Set,
};

impl SeaOrmStorage {
    pub async fn create_subject_impl(&self, req: CreateSubjectRequest) -> Result<Subject> {
        let now = chrono::Utc::now().timestamp();

        let model = ActiveModel {
            name: Set(req.name),
            code: Set(req.code),
            description: Set(req.description),
            semester: Set(req.semester),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| CourseforgeError::database_operation(format!("创建学科失败: {e}")))?;

        Ok(result.into_subject())
    }

    pub async fn get_subject_by_id_impl(&self, id: i64) -> Result<Option<Subject>> {
        let result = Subjects::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| CourseforgeError::database_operation(format!("查询学科失败: {e}")))?;

        Ok(result.map(|m| m.into_subject()))
    }

    pub async fn get_subject_by_code_impl(&self, code: &str) -> Result<Option<Subject>> {
        let result = Subjects::find()
            .filter(Column::Code.eq(code))
            .one(&self.db)
            .await
            .map_err(|e| CourseforgeError::database_operation(format!("查询学科失败: {e}")))?;

        Ok(result.map(|m| m.into_subject()))
    }

    pub async fn list_subjects_with_pagination_impl(
        &self,
        query: SubjectListQuery,
    ) -> Result<SubjectListResponse> {
        let (page, size) = query.pagination.normalized();

        let mut select = Subjects::find();

        if let Some(semester) = query.semester {
            select = select.filter(Column::Semester.eq(semester));
        }
        if let Some(is_active) = query.is_active {
            select = select.filter(Column::IsActive.eq(is_active));
        }
        if let Some(ref search) = query.search
            && !search.trim().is_empty()
        {
            let needle = search.trim();
            select = select.filter(
                Condition::any()
                    .add(Column::Name.contains(needle))
                    .add(Column::Code.contains(needle)),
            );
        }

        let paginator = select
            .order_by_asc(Column::Semester)
            .order_by_asc(Column::Code)
            .paginate(&self.db, size);
        let total = paginator.num_items().await.map_err(|e| {
            CourseforgeError::database_operation(format!("查询学科总数失败: {e}"))
        })?;
        let subjects = paginator.fetch_page(page - 1).await.map_err(|e| {
            CourseforgeError::database_operation(format!("查询学科列表失败: {e}"))
        })?;

        Ok(SubjectListResponse {
            items: subjects.into_iter().map(|m| m.into_subject()).collect(),
            pagination: PaginationInfo::new(page, size, total),
        })
    }

    pub async fn update_subject_impl(
        &self,
        id: i64,
        update: UpdateSubjectRequest,
    ) -> Result<Option<Subject>> {
        if self.get_subject_by_id_impl(id).await?.is_none() {
            return Ok(None);
        }

        let mut model = ActiveModel {
            id: Set(id),
            updated_at: Set(chrono::Utc::now().timestamp()),
            ..Default::default()
        };

        if let Some(name) = update.name {
            model.name = Set(name);
        }
        if let Some(code) = update.code {
            model.code = Set(code);
        }
        if let Some(description) = update.description {
            model.description = Set(Some(description));
        }
        if let Some(semester) = update.semester {
            model.semester = Set(semester);
        }
        if let Some(is_active) = update.is_active {
            model.is_active = Set(is_active);
        }

        model
            .update(&self.db)
            .await
            .map_err(|e| CourseforgeError::database_operation(format!("更新学科失败: {e}")))?;

        self.get_subject_by_id_impl(id).await
    }

    pub async fn delete_subject_impl(&self, id: i64) -> Result<bool> {
        let result = Subjects::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(|e| CourseforgeError::database_operation(format!("删除学科失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PaginationQuery;

    fn subject(code: &str, semester: i32) -> CreateSubjectRequest {
        CreateSubjectRequest {
            name: format!("Subject {code}"),
            code: code.to_string(),
            description: None,
            semester,
        }
    }

    #[tokio::test]
    async fn test_subject_crud() {
        let storage = SeaOrmStorage::in_memory().await;
        let created = storage.create_subject_impl(subject("CS101", 1)).await.unwrap();
        assert!(created.is_active);

        let by_code = storage.get_subject_by_code_impl("CS101").await.unwrap().unwrap();
        assert_eq!(by_code.id, created.id);

        let updated = storage
            .update_subject_impl(
                created.id,
                UpdateSubjectRequest {
                    semester: Some(3),
                    description: Some("Intro".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.semester, 3);
        assert_eq!(updated.description.as_deref(), Some("Intro"));

        assert!(storage.delete_subject_impl(created.id).await.unwrap());
        assert!(!storage.delete_subject_impl(created.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_list_by_semester() {
        let storage = SeaOrmStorage::in_memory().await;
        storage.create_subject_impl(subject("A1", 1)).await.unwrap();
        storage.create_subject_impl(subject("B2", 2)).await.unwrap();
        storage.create_subject_impl(subject("C2", 2)).await.unwrap();

        let list = storage
            .list_subjects_with_pagination_impl(SubjectListQuery {
                pagination: PaginationQuery::default(),
                semester: Some(2),
                is_active: None,
                search: None,
            })
            .await
            .unwrap();
        let codes: Vec<_> = list.items.iter().map(|s| s.code.as_str()).collect();
        assert_eq!(codes, vec!["B2", "C2"]);
    }
}
