use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::courseworks::requests::{CreateCourseworkRequest, UpdateCourseworkRequest};
use crate::models::subjects::requests::{CreateSubjectRequest, UpdateSubjectRequest};

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Z|a-z]{2,}$").expect("Invalid email regex")
});

static SUBJECT_CODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("Invalid subject code regex"));

/// 成绩允许范围
pub const GRADE_RANGE: std::ops::RangeInclusive<i32> = 2..=5;
/// 课题名额范围
pub const MAX_STUDENTS_RANGE: std::ops::RangeInclusive<i32> = 1..=10;

fn char_len(s: &str) -> usize {
    s.trim().chars().count()
}

/// 姓名校验：2 <= x <= 50 个字符
pub fn validate_person_name(name: &str) -> Result<(), &'static str> {
    let len = char_len(name);
    if !(2..=50).contains(&len) {
        return Err("Name length must be between 2 and 50 characters");
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), &'static str> {
    // 邮箱格式校验：必须包含 @ 和 .
    if !EMAIL_RE.is_match(email) {
        return Err("Email format is invalid");
    }
    Ok(())
}

/// 密码策略验证结果
#[derive(Debug, Clone)]
pub struct PasswordValidationResult {
    pub is_valid: bool,
    pub errors: Vec<&'static str>,
}

impl PasswordValidationResult {
    pub fn error_message(&self) -> String {
        self.errors.join("; ")
    }
}

/// 验证密码是否符合安全策略
///
/// 策略要求：
/// - 最小长度：8 字符
/// - 必须包含：大写字母 + 小写字母 + 数字
/// - 可选：特殊字符（增强安全性）
pub fn validate_password(password: &str) -> PasswordValidationResult {
    let mut errors = Vec::new();

    // 1. 长度检查：至少 8 个字符
    if password.len() < 8 {
        errors.push("Password must be at least 8 characters long");
    }

    // 2. 大写字母检查
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        errors.push("Password must contain at least one uppercase letter");
    }

    // 3. 小写字母检查
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        errors.push("Password must contain at least one lowercase letter");
    }

    // 4. 数字检查
    if !password.chars().any(|c| c.is_ascii_digit()) {
        errors.push("Password must contain at least one digit");
    }

    // 5. 常见弱密码检查
    let weak_passwords = [
        "password",
        "12345678",
        "123456789",
        "qwerty123",
        "admin123",
        "password1",
        "Password1",
        "Qwerty123",
        "Abcd1234",
    ];
    if weak_passwords
        .iter()
        .any(|&weak| password.eq_ignore_ascii_case(weak))
    {
        errors.push("Password is too common, please choose a stronger password");
    }

    PasswordValidationResult {
        is_valid: errors.is_empty(),
        errors,
    }
}

/// 简化的密码验证（返回 Result）
pub fn validate_password_simple(password: &str) -> Result<(), String> {
    let result = validate_password(password);
    if result.is_valid {
        Ok(())
    } else {
        Err(result.error_message())
    }
}

/// 成绩校验
pub fn validate_grade(grade: i32) -> Result<(), String> {
    if !GRADE_RANGE.contains(&grade) {
        return Err(format!(
            "Grade {grade} is outside {}..={}",
            GRADE_RANGE.start(),
            GRADE_RANGE.end()
        ));
    }
    Ok(())
}

fn check_subject_name(name: &str) -> Result<(), &'static str> {
    if !(3..=100).contains(&char_len(name)) {
        return Err("Subject name length must be between 3 and 100 characters");
    }
    Ok(())
}

fn check_subject_code(code: &str) -> Result<(), &'static str> {
    if !(2..=20).contains(&code.len()) || !SUBJECT_CODE_RE.is_match(code) {
        return Err(
            "Subject code must be 2 to 20 letters, digits, underscores or hyphens",
        );
    }
    Ok(())
}

fn check_semester(semester: i32) -> Result<(), &'static str> {
    if !(1..=12).contains(&semester) {
        return Err("Semester must be between 1 and 12");
    }
    Ok(())
}

pub fn validate_create_subject(req: &CreateSubjectRequest) -> Result<(), &'static str> {
    check_subject_name(&req.name)?;
    check_subject_code(&req.code)?;
    check_semester(req.semester)
}

pub fn validate_update_subject(req: &UpdateSubjectRequest) -> Result<(), &'static str> {
    if let Some(ref name) = req.name {
        check_subject_name(name)?;
    }
    if let Some(ref code) = req.code {
        check_subject_code(code)?;
    }
    if let Some(semester) = req.semester {
        check_semester(semester)?;
    }
    Ok(())
}

fn check_coursework_title(title: &str) -> Result<(), &'static str> {
    if !(5..=300).contains(&char_len(title)) {
        return Err("Coursework title length must be between 5 and 300 characters");
    }
    Ok(())
}

fn check_coursework_description(description: &str) -> Result<(), &'static str> {
    if char_len(description) < 20 {
        return Err("Coursework description must be at least 20 characters");
    }
    Ok(())
}

fn check_max_students(max_students: i32) -> Result<(), &'static str> {
    if !MAX_STUDENTS_RANGE.contains(&max_students) {
        return Err("max_students must be between 1 and 10");
    }
    Ok(())
}

pub fn validate_create_coursework(req: &CreateCourseworkRequest) -> Result<(), &'static str> {
    check_coursework_title(&req.title)?;
    check_coursework_description(&req.description)?;
    check_max_students(req.max_students)
}

pub fn validate_update_coursework(req: &UpdateCourseworkRequest) -> Result<(), &'static str> {
    if let Some(ref title) = req.title {
        check_coursework_title(title)?;
    }
    if let Some(ref description) = req.description {
        check_coursework_description(description)?;
    }
    if let Some(max_students) = req.max_students {
        check_max_students(max_students)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_password() {
        assert!(validate_password("SecureP@ss1").is_valid);
        assert!(validate_password("MyP@ssw0rd").is_valid);
        assert!(validate_password("SecurePass123").is_valid);
    }

    #[test]
    fn test_short_password() {
        let result = validate_password("Ab1");
        assert!(!result.is_valid);
        assert!(
            result
                .errors
                .contains(&"Password must be at least 8 characters long")
        );
    }

    #[test]
    fn test_no_uppercase() {
        let result = validate_password("abcd1234");
        assert!(!result.is_valid);
        assert!(
            result
                .errors
                .contains(&"Password must contain at least one uppercase letter")
        );
    }

    #[test]
    fn test_no_lowercase() {
        let result = validate_password("ABCD1234");
        assert!(!result.is_valid);
        assert!(
            result
                .errors
                .contains(&"Password must contain at least one lowercase letter")
        );
    }

    #[test]
    fn test_no_digit() {
        let result = validate_password("AbcdEfgh");
        assert!(!result.is_valid);
        assert!(
            result
                .errors
                .contains(&"Password must contain at least one digit")
        );
    }

    #[test]
    fn test_common_password() {
        let result = validate_password("Password1");
        assert!(!result.is_valid);
        assert!(
            result
                .errors
                .contains(&"Password is too common, please choose a stronger password")
        );
    }

    #[test]
    fn test_email() {
        assert!(validate_email("student@uni.edu").is_ok());
        assert!(validate_email("student@uni").is_err());
        assert!(validate_email("no-at-sign.edu").is_err());
    }

    #[test]
    fn test_person_name() {
        assert!(validate_person_name("Li").is_ok());
        assert!(validate_person_name("  A ").is_err());
        assert!(validate_person_name(&"x".repeat(51)).is_err());
    }

    #[test]
    fn test_grade_bounds() {
        assert!(validate_grade(2).is_ok());
        assert!(validate_grade(5).is_ok());
        assert!(validate_grade(1).is_err());
        assert!(validate_grade(6).is_err());
        assert!(validate_grade(-4).is_err());
    }

    #[test]
    fn test_subject_rules() {
        let mut req = CreateSubjectRequest {
            name: "Databases".into(),
            code: "DB-310".into(),
            description: None,
            semester: 5,
        };
        assert!(validate_create_subject(&req).is_ok());
        req.semester = 13;
        assert!(validate_create_subject(&req).is_err());
        req.semester = 5;
        req.code = "D B".into();
        assert!(validate_create_subject(&req).is_err());
        assert!(validate_update_subject(&UpdateSubjectRequest::default()).is_ok());
    }

    #[test]
    fn test_coursework_rules() {
        use crate::models::courseworks::entities::DifficultyLevel;

        let mut req = CreateCourseworkRequest {
            title: "Query planner".into(),
            description: "Implement a cost based query planner".into(),
            requirements: None,
            subject_id: 1,
            teacher_id: None,
            max_students: 1,
            difficulty_level: DifficultyLevel::Hard,
        };
        assert!(validate_create_coursework(&req).is_ok());
        req.max_students = 0;
        assert!(validate_create_coursework(&req).is_err());
        req.max_students = 11;
        assert!(validate_create_coursework(&req).is_err());
        req.max_students = 3;
        req.description = "too short".into();
        assert!(validate_create_coursework(&req).is_err());

        let update = UpdateCourseworkRequest {
            title: Some("abc".into()),
            ..Default::default()
        };
        assert!(validate_update_coursework(&update).is_err());
    }
}
