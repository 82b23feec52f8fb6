//! 持久化网关 HTTP 客户端
//!
//! 封装所有与题组/小题存储接口相关的调用逻辑
use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use tracing::debug;

use crate::clients::gateway::{BulkCreateResult, PersistenceGateway};
use crate::config::Config;
use crate::error::GatewayError;
use crate::models::sub_question::RecordId;
use crate::services::request_assembler::{BulkCreatePayload, GroupUpsert, SubQuestionPayload};
use crate::utils::logging::truncate_text;

/// 网关 HTTP 客户端
pub struct HttpGateway {
    client: Client,
    base_url: String,
    token: String,
}

impl HttpGateway {
    /// 创建新的网关客户端
    pub fn new(config: &Config) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| GatewayError::request_failed("client", e))?;

        Ok(Self {
            client,
            base_url: config.gateway_base_url.trim_end_matches('/').to_string(),
            token: config.gateway_token.clone(),
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint)
    }

    /// 题组请求：带图片时用 multipart（字段 JSON 放在 `data` 部分），否则用 JSON
    fn group_request(
        &self,
        builder: RequestBuilder,
        endpoint: &str,
        upsert: &GroupUpsert,
    ) -> Result<RequestBuilder, GatewayError> {
        match &upsert.image {
            Some(image) => {
                let fields_json =
                    serde_json::to_string(&upsert.fields).map_err(|source| {
                        GatewayError::JsonParseFailed {
                            endpoint: endpoint.to_string(),
                            source,
                        }
                    })?;
                let part = Part::bytes(image.bytes.clone())
                    .file_name(image.file_name.clone())
                    .mime_str(&image.content_type)
                    .map_err(|e| GatewayError::request_failed(endpoint, e))?;
                let form = Form::new().text("data", fields_json).part("image", part);
                Ok(builder.multipart(form))
            }
            None => Ok(builder.json(&upsert.fields)),
        }
    }

    /// 发送请求并解析 JSON 响应
    async fn send(&self, endpoint: &str, builder: RequestBuilder) -> Result<Value, GatewayError> {
        debug!("调用网关: {}", endpoint);

        let response = builder
            .bearer_auth(&self.token)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| GatewayError::request_failed(endpoint, e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GatewayError::request_failed(endpoint, e))?;

        debug!("网关响应 ({}): {} {}", endpoint, status, truncate_text(&body, 200));

        if !status.is_success() {
            return Err(GatewayError::bad_response(
                endpoint,
                status.as_u16(),
                truncate_text(&body, 200),
            ));
        }

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }

        let value: Value =
            serde_json::from_str(&body).map_err(|source| GatewayError::JsonParseFailed {
                endpoint: endpoint.to_string(),
                source,
            })?;
        Ok(unwrap_envelope(value))
    }
}

impl PersistenceGateway for HttpGateway {
    async fn create_group(&self, upsert: &GroupUpsert) -> Result<RecordId, GatewayError> {
        let endpoint = "question-groups";
        let builder = self.client.post(self.url(endpoint));
        let builder = self.group_request(builder, endpoint, upsert)?;
        let result = self.send(endpoint, builder).await?;

        extract_id(&result).ok_or_else(|| {
            GatewayError::bad_response(endpoint, 200, format!("响应中缺少 id: {}", result))
        })
    }

    async fn update_group(&self, group_id: RecordId, upsert: &GroupUpsert) -> Result<(), GatewayError> {
        let endpoint = format!("question-groups/{}", group_id);
        let builder = self.client.put(self.url(&endpoint));
        let builder = self.group_request(builder, &endpoint, upsert)?;
        self.send(&endpoint, builder).await?;
        Ok(())
    }

    async fn update_sub_question(
        &self,
        id: RecordId,
        fields: &SubQuestionPayload,
    ) -> Result<(), GatewayError> {
        let endpoint = format!("questions/{}", id);
        let builder = self.client.put(self.url(&endpoint)).json(fields);
        self.send(&endpoint, builder).await?;
        Ok(())
    }

    async fn bulk_create_sub_questions(
        &self,
        group_id: RecordId,
        payload: &BulkCreatePayload,
    ) -> Result<BulkCreateResult, GatewayError> {
        let endpoint = format!("question-groups/{}/questions/bulk", group_id);
        let builder = self.client.post(self.url(&endpoint)).json(payload);
        let result = self.send(&endpoint, builder).await?;

        serde_json::from_value(result).map_err(|source| GatewayError::JsonParseFailed {
            endpoint,
            source,
        })
    }
}

/// 去掉 `{ "code": ..., "data": ... }` 外层包装
fn unwrap_envelope(value: Value) -> Value {
    match value {
        Value::Object(mut map) if map.contains_key("data") && map.contains_key("code") => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

/// 提取 id，兼容数字和数字字符串
fn extract_id(value: &Value) -> Option<RecordId> {
    let id = value.get("id")?;
    id.as_i64()
        .or_else(|| id.as_str().and_then(|s| s.parse().ok()))
}
