use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 创建用户表
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Users::Email)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Users::PasswordHash).string().not_null())
                    .col(ColumnDef::new(Users::FirstName).string().not_null())
                    .col(ColumnDef::new(Users::LastName).string().not_null())
                    .col(ColumnDef::new(Users::Role).string().not_null())
                    .col(
                        ColumnDef::new(Users::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Users::CreatedAt).big_integer().not_null())
                    .col(ColumnDef::new(Users::UpdatedAt).big_integer().not_null())
                    .to_owned(),
            )
            .await?;

        // 创建学科表
        manager
            .create_table(
                Table::create()
                    .table(Subjects::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Subjects::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Subjects::Name).string().not_null())
                    .col(
                        ColumnDef::new(Subjects::Code)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Subjects::Description).text().null())
                    .col(ColumnDef::new(Subjects::Semester).integer().not_null())
                    .col(
                        ColumnDef::new(Subjects::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Subjects::CreatedAt).big_integer().not_null())
                    .col(ColumnDef::new(Subjects::UpdatedAt).big_integer().not_null())
                    .to_owned(),
            )
            .await?;

        // 创建课程设计题目表
        manager
            .create_table(
                Table::create()
                    .table(Courseworks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Courseworks::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Courseworks::Title).string().not_null())
                    .col(ColumnDef::new(Courseworks::Description).text().not_null())
                    .col(ColumnDef::new(Courseworks::Requirements).text().null())
                    .col(
                        ColumnDef::new(Courseworks::SubjectId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Courseworks::TeacherId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Courseworks::MaxStudents)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(
                        ColumnDef::new(Courseworks::DifficultyLevel)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Courseworks::IsAvailable)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Courseworks::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Courseworks::UpdatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Courseworks::Table, Courseworks::SubjectId)
                            .to(Subjects::Table, Subjects::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Courseworks::Table, Courseworks::TeacherId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 创建学生选题表
        // active_student_id 仅在记录有效期间等于 student_id，撤销后置空；
        // 其唯一索引保证每个学生至多一条有效选题
        manager
            .create_table(
                Table::create()
                    .table(StudentCourseworks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(StudentCourseworks::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(StudentCourseworks::StudentId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StudentCourseworks::CourseworkId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StudentCourseworks::Status)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(StudentCourseworks::Grade).integer().null())
                    .col(ColumnDef::new(StudentCourseworks::Feedback).text().null())
                    .col(
                        ColumnDef::new(StudentCourseworks::SubmittedAt)
                            .big_integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(StudentCourseworks::CompletedAt)
                            .big_integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(StudentCourseworks::ActiveStudentId)
                            .big_integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(StudentCourseworks::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StudentCourseworks::UpdatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StudentCourseworks::DeletedAt)
                            .big_integer()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(StudentCourseworks::Table, StudentCourseworks::StudentId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(StudentCourseworks::Table, StudentCourseworks::CourseworkId)
                            .to(Courseworks::Table, Courseworks::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 创建索引
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_users_role")
                    .table(Users::Table)
                    .col(Users::Role)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_courseworks_subject_id")
                    .table(Courseworks::Table)
                    .col(Courseworks::SubjectId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_courseworks_teacher_id")
                    .table(Courseworks::Table)
                    .col(Courseworks::TeacherId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_student_courseworks_coursework_id")
                    .table(StudentCourseworks::Table)
                    .col(StudentCourseworks::CourseworkId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_student_courseworks_student_id")
                    .table(StudentCourseworks::Table)
                    .col(StudentCourseworks::StudentId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .unique()
                    .name("uq_student_courseworks_active_student")
                    .table(StudentCourseworks::Table)
                    .col(StudentCourseworks::ActiveStudentId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 按照创建的相反顺序删除
        manager
            .drop_table(Table::drop().table(StudentCourseworks::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Courseworks::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Subjects::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Users {
    #[sea_orm(iden = "users")]
    Table,
    Id,
    Email,
    PasswordHash,
    FirstName,
    LastName,
    Role,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Subjects {
    #[sea_orm(iden = "subjects")]
    Table,
    Id,
    Name,
    Code,
    Description,
    Semester,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Courseworks {
    #[sea_orm(iden = "courseworks")]
    Table,
    Id,
    Title,
    Description,
    Requirements,
    SubjectId,
    TeacherId,
    MaxStudents,
    DifficultyLevel,
    IsAvailable,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum StudentCourseworks {
    #[sea_orm(iden = "student_courseworks")]
    Table,
    Id,
    StudentId,
    CourseworkId,
    Status,
    Grade,
    Feedback,
    SubmittedAt,
    CompletedAt,
    ActiveStudentId,
    CreatedAt,
    UpdatedAt,
    DeletedAt,
}
