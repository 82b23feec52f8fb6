//! 批量请求组装 - 业务能力层
//!
//! 把定稿的题组投影为持久化网关需要的请求形状，不修改题组：
//! - 匹配/摘要/笔记/表单/表格：结构化包装（类型专属载荷 + 扁平小题数组）
//! - 其他题型：扁平小题数组
//!
//! 结构化载荷总是随题组字段一起提交，没有新小题时载荷的修改也能保存。
//!
//! 新小题（无 id）走批量创建，已有小题逐个更新。

use serde::Serialize;

use crate::error::ValidationError;
use crate::models::payload::{Cell, MatchingOption, StructuredPayload};
use crate::models::question_group::QuestionGroup;
use crate::models::question_type::QuestionType;
use crate::models::sub_question::{Choice, RecordId, SubQuestion};

/// 题组字段
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupFields {
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structured_payload: Option<StructuredPayload>,
}

/// 图片附件（图表/地图标注）
#[derive(Debug, Clone, PartialEq)]
pub struct ImageAttachment {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageAttachment {
    /// 按扩展名推断 MIME 类型
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let extension = file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        let content_type = match extension.as_str() {
            "png" => "image/png",
            "jpg" | "jpeg" => "image/jpeg",
            "gif" => "image/gif",
            "webp" => "image/webp",
            "svg" => "image/svg+xml",
            _ => "application/octet-stream",
        }
        .to_string();
        Self {
            file_name,
            content_type,
            bytes,
        }
    }
}

/// 题组创建/更新请求；带图片时网关以 multipart 提交
#[derive(Debug, Clone, PartialEq)]
pub struct GroupUpsert {
    pub fields: GroupFields,
    pub image: Option<ImageAttachment>,
}

/// 小题字段
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubQuestionPayload {
    pub text: String,
    pub correct_answer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary_answer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    pub points: u32,
    pub order: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<Choice>,
}

impl SubQuestionPayload {
    fn project(sub_question: &SubQuestion, with_choices: bool) -> Self {
        Self {
            text: sub_question.text.clone(),
            correct_answer: sub_question.correct_answer.clone(),
            secondary_answer: sub_question.secondary_answer.clone(),
            explanation: sub_question.explanation.clone(),
            points: sub_question.points,
            order: sub_question.order,
            choices: if with_choices {
                sub_question.choices.clone()
            } else {
                Vec::new()
            },
        }
    }
}

/// 结构化包装中的类型专属内容
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StructuredContent {
    Matching {
        options: Vec<MatchingOption>,
    },
    Table {
        items: Vec<Vec<Cell>>,
    },
    Notes {
        title: String,
        items: Vec<Cell>,
    },
    Summary {
        title: String,
        text: String,
    },
}

/// 结构化包装
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredBulkPayload {
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    #[serde(flatten)]
    pub content: StructuredContent,
    pub questions: Vec<SubQuestionPayload>,
}

/// 批量创建请求
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BulkCreatePayload {
    Flat(Vec<SubQuestionPayload>),
    Structured(StructuredBulkPayload),
}

impl BulkCreatePayload {
    /// 请求中的小题数量
    pub fn question_count(&self) -> usize {
        match self {
            BulkCreatePayload::Flat(questions) => questions.len(),
            BulkCreatePayload::Structured(wrapper) => wrapper.questions.len(),
        }
    }
}

/// 已有小题的更新
#[derive(Debug, Clone, PartialEq)]
pub struct SubQuestionUpdate {
    pub id: RecordId,
    pub fields: SubQuestionPayload,
}

/// 一次保存需要发出的全部请求
#[derive(Debug, Clone, PartialEq)]
pub struct SavePlan {
    pub upsert: GroupUpsert,
    pub updates: Vec<SubQuestionUpdate>,
    /// 没有新小题时为 None
    pub bulk_create: Option<BulkCreatePayload>,
}

/// 组装保存请求
///
/// # 参数
/// - `group`: 定稿的题组
/// - `image`: 待上传的图片（可选）
///
/// # 返回
/// 返回保存计划；题组缺少题型时返回校验错误
pub fn assemble(
    group: &QuestionGroup,
    image: Option<ImageAttachment>,
) -> Result<SavePlan, ValidationError> {
    let question_type = group.question_type.ok_or(ValidationError::MissingType)?;
    let with_choices = question_type.is_choice_based();

    let structured_content = if question_type.uses_structured_bulk() {
        group.structured_payload().and_then(structured_content)
    } else {
        None
    };

    let fields = GroupFields {
        title: group.title.trim().to_string(),
        description: group.description.clone(),
        question_type,
        structured_payload: group.structured_payload().cloned(),
    };

    let updates = group
        .sub_questions()
        .iter()
        .filter_map(|q| {
            q.id.map(|id| SubQuestionUpdate {
                id,
                fields: SubQuestionPayload::project(q, with_choices),
            })
        })
        .collect();

    let new_questions: Vec<SubQuestionPayload> = group
        .sub_questions()
        .iter()
        .filter(|q| q.is_new())
        .map(|q| SubQuestionPayload::project(q, with_choices))
        .collect();

    let bulk_create = if new_questions.is_empty() {
        None
    } else {
        Some(match structured_content {
            Some(content) => BulkCreatePayload::Structured(StructuredBulkPayload {
                question_type,
                content,
                questions: new_questions,
            }),
            None => BulkCreatePayload::Flat(new_questions),
        })
    };

    Ok(SavePlan {
        upsert: GroupUpsert { fields, image },
        updates,
        bulk_create,
    })
}

fn structured_content(payload: &StructuredPayload) -> Option<StructuredContent> {
    match payload {
        StructuredPayload::Matching(m) => Some(StructuredContent::Matching {
            options: m.options.clone(),
        }),
        StructuredPayload::Table(t) => Some(StructuredContent::Table {
            items: t.items.clone(),
        }),
        StructuredPayload::Notes(n) => Some(StructuredContent::Notes {
            title: n.title.clone(),
            items: n.items.clone(),
        }),
        StructuredPayload::Summary(s) => Some(StructuredContent::Summary {
            title: s.title.clone(),
            text: s.text.clone(),
        }),
        StructuredPayload::Diagram(_) => None,
    }
}
