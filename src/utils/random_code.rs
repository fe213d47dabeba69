use rand::Rng;
use rand::distr::Alphanumeric;

/// 生成随机口令，保证同时含有大小写字母与数字
pub fn generate_password(len: usize) -> String {
    let len = len.max(8);
    let mut rng = rand::rng();
    loop {
        let candidate: String = (&mut rng)
            .sample_iter(&Alphanumeric)
            .take(len)
            .map(char::from)
            .collect();
        if crate::utils::validate::validate_password(&candidate).is_valid {
            return candidate;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_password_passes_policy() {
        for _ in 0..20 {
            let pw = generate_password(16);
            assert_eq!(pw.len(), 16);
            assert!(crate::utils::validate::validate_password(&pw).is_valid);
        }
        assert_eq!(generate_password(3).len(), 8);
    }
}
