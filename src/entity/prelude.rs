//! 预导入模块，方便使用

pub use super::courseworks::{
    ActiveModel as CourseworkActiveModel, Entity as Courseworks, Model as CourseworkModel,
};
pub use super::student_courseworks::{
    ActiveModel as StudentCourseworkActiveModel, Entity as StudentCourseworks,
    Model as StudentCourseworkModel,
};
pub use super::subjects::{
    ActiveModel as SubjectActiveModel, Entity as Subjects, Model as SubjectModel,
};
pub use super::teacher_subjects::{
    ActiveModel as TeacherSubjectActiveModel, Entity as TeacherSubjects,
    Model as TeacherSubjectModel,
};
pub use super::users::{ActiveModel as UserActiveModel, Entity as Users, Model as UserModel};
