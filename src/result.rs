use serde::{Deserialize, Serialize};

/// 统一响应信封
#[derive(Serialize, Deserialize)]
pub struct ApiResult<T: Serialize> {
    pub code: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<T>,
}

impl<T: Serialize> ApiResult<T> {
    pub fn success(data: T) -> Self {
        Self {
            code: 0,
            error_message: None,
            content: Some(data),
        }
    }

    /// 失败信封，`code` 与响应的 HTTP 状态码保持一致
    pub fn error(code: i32, message: &str) -> Self {
        Self {
            code,
            error_message: Some(message.to_string()),
            content: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_envelope_omits_error_message() {
        let body = serde_json::to_value(ApiResult::success(vec![1, 2])).unwrap();
        assert_eq!(body, serde_json::json!({ "code": 0, "content": [1, 2] }));
    }

    #[test]
    fn error_envelope_omits_content() {
        let body = serde_json::to_value(ApiResult::<()>::error(404, "记录不存在")).unwrap();
        assert_eq!(
            body,
            serde_json::json!({ "code": 404, "error_message": "记录不存在" })
        );
    }
}
