//! 持久化网关接口
//!
//! 题组和小题的创建/更新由外部服务完成，这里只定义调用形状
use serde::Deserialize;
use serde_json::Value;

use crate::error::GatewayError;
use crate::models::sub_question::RecordId;
use crate::services::request_assembler::{BulkCreatePayload, GroupUpsert, SubQuestionPayload};

/// 批量创建结果
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkCreateResult {
    #[serde(default)]
    pub created_count: usize,
    #[serde(default)]
    pub error_count: usize,
    /// 逐条错误详情，格式由网关决定
    #[serde(default)]
    pub errors: Vec<Value>,
    /// 新建小题的 id，按请求顺序；网关不返回时为空
    #[serde(default)]
    pub ids: Vec<RecordId>,
}

impl BulkCreateResult {
    /// 全部创建成功且返回了与请求数量一致的 id 时，返回这些 id
    pub fn assigned_ids(&self, requested: usize) -> Option<&[RecordId]> {
        (self.error_count == 0 && self.ids.len() == requested).then_some(self.ids.as_slice())
    }

    /// 把错误详情转换为可读文本
    pub fn error_messages(&self) -> Vec<String> {
        self.errors
            .iter()
            .map(|e| match e {
                Value::String(s) => s.clone(),
                Value::Object(map) => map
                    .get("message")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| e.to_string()),
                other => other.to_string(),
            })
            .collect()
    }
}

/// 持久化网关
///
/// 保存流程按顺序调用：题组创建/更新 → 逐个更新已有小题 → 批量创建新小题
#[allow(async_fn_in_trait)]
pub trait PersistenceGateway {
    /// 创建题组，返回新题组 id
    async fn create_group(&self, upsert: &GroupUpsert) -> Result<RecordId, GatewayError>;

    /// 更新题组
    async fn update_group(&self, group_id: RecordId, upsert: &GroupUpsert) -> Result<(), GatewayError>;

    /// 更新单个已有小题
    async fn update_sub_question(
        &self,
        id: RecordId,
        fields: &SubQuestionPayload,
    ) -> Result<(), GatewayError>;

    /// 批量创建新小题
    async fn bulk_create_sub_questions(
        &self,
        group_id: RecordId,
        payload: &BulkCreatePayload,
    ) -> Result<BulkCreateResult, GatewayError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bulk_result_defaults_and_messages() {
        let result: BulkCreateResult = serde_json::from_value(json!({
            "createdCount": 2,
            "errorCount": 2,
            "errors": ["row 3 invalid", {"index": 4, "message": "answer too long"}]
        }))
        .unwrap();
        assert_eq!(result.created_count, 2);
        assert_eq!(
            result.error_messages(),
            vec!["row 3 invalid".to_string(), "answer too long".to_string()]
        );

        let empty: BulkCreateResult = serde_json::from_value(json!({})).unwrap();
        assert_eq!(empty, BulkCreateResult::default());
    }

    #[test]
    fn test_assigned_ids_only_when_complete() {
        let result: BulkCreateResult = serde_json::from_value(json!({
            "createdCount": 2,
            "errorCount": 0,
            "ids": [41, 42]
        }))
        .unwrap();
        assert_eq!(result.assigned_ids(2), Some(&[41, 42][..]));
        assert_eq!(result.assigned_ids(3), None);

        let partial = BulkCreateResult {
            error_count: 1,
            ..result
        };
        assert_eq!(partial.assigned_ids(2), None);
    }
}
