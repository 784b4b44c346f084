// ==========================================
// 公共工程管理系统 - 传输层响应封装
// ==========================================
// 三路结果: 成功+数据 / 业务规则失败+消息 / 未找到
// 其余技术错误归为 SYSTEM_ERROR
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use serde::{Deserialize, Serialize};

pub mod codes {
    pub const OK: &str = "OK";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const BUSINESS_RULE: &str = "BUSINESS_RULE";
    pub const SYSTEM_ERROR: &str = "SYSTEM_ERROR";
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseEnvelope<T> {
    pub success: bool,
    pub data: Option<T>,
    pub code: String,
    /// 细粒度错误类别（成功时为空）
    pub error_kind: Option<String>,
    pub message: String,
}

impl<T> ResponseEnvelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            code: codes::OK.to_string(),
            error_kind: None,
            message: String::new(),
        }
    }

    pub fn from_error(err: &ApiError) -> Self {
        let code = match err {
            ApiError::NotFound(_) => codes::NOT_FOUND,
            e if e.is_business_rule() => codes::BUSINESS_RULE,
            _ => codes::SYSTEM_ERROR,
        };
        if code == codes::SYSTEM_ERROR {
            tracing::error!(error = %err, "系统错误");
        }
        Self {
            success: false,
            data: None,
            code: code.to_string(),
            error_kind: Some(err.kind().to_string()),
            message: err.to_string(),
        }
    }

    pub fn from_result(result: ApiResult<T>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(err) => Self::from_error(&err),
        }
    }
}

impl<T: Serialize> ResponseEnvelope<T> {
    /// 序列化为 JSON；序列化失败时退化为 SYSTEM_ERROR 封装
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            serde_json::json!({
                "success": false,
                "data": null,
                "code": codes::SYSTEM_ERROR,
                "error_kind": "INTERNAL",
                "message": format!("响应序列化失败: {}", e),
            })
            .to_string()
        })
    }
}
