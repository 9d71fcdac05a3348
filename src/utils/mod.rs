use bcrypt::{DEFAULT_COST, hash, verify};

use crate::error::ServiceError;

pub fn hash_password(password: &str) -> Result<String, bcrypt::BcryptError> {
    hash(password.as_bytes(), DEFAULT_COST)
}

pub fn verify_password(password: &str, digest: &str) -> Result<bool, bcrypt::BcryptError> {
    verify(password.as_bytes(), digest)
}

/// 把手机号规整成 E.164 风格的紧凑形式
/// 只做轻量规范化，完整的号码解析是外部协作方的职责
pub fn normalize_phone(phone: &str) -> Result<String, ServiceError> {
    let compact: String = phone
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '(' | ')'))
        .collect();

    let digits = compact.strip_prefix('+').unwrap_or(&compact);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(ServiceError::Validation(format!(
            "无法识别的手机号: {}",
            phone
        )));
    }
    if !compact.starts_with('+') {
        return Err(ServiceError::Validation(
            "手机号必须携带国际区号前缀 +".to_string(),
        ));
    }

    Ok(compact)
}

/// 根据姓名生成默认头像地址
pub fn picture_url_from_name(first_name: &str, last_name: &str) -> String {
    let name = format!("{}+{}", first_name, last_name).replace(' ', "+");
    format!("https://ui-avatars.com/api/?name={}", name)
}
