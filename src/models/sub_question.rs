use serde::{Deserialize, Serialize};

/// 已持久化记录的标识
pub type RecordId = i64;

fn default_points() -> u32 {
    1
}

/// 选项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Choice {
    pub text: String,
    #[serde(default)]
    pub is_correct: bool,
}

impl Choice {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_correct: false,
        }
    }
}

/// 小题
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubQuestion {
    /// None 表示尚未创建
    #[serde(default)]
    pub id: Option<RecordId>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub correct_answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_answer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(default = "default_points")]
    pub points: u32,
    #[serde(default)]
    pub order: u32,
    #[serde(default)]
    pub choices: Vec<Choice>,
}

impl Default for SubQuestion {
    fn default() -> Self {
        Self {
            id: None,
            text: String::new(),
            correct_answer: String::new(),
            secondary_answer: None,
            explanation: None,
            points: default_points(),
            order: 0,
            choices: Vec::new(),
        }
    }
}

impl SubQuestion {
    /// 由生成的桩创建新小题（无 id，答案为空）
    pub fn from_stub(stub: &SubQuestionStub) -> Self {
        Self {
            text: stub.label.clone(),
            order: stub.order,
            ..Default::default()
        }
    }

    /// 是否尚未持久化
    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }

    /// 是否已填写答案（选项类题型有正确选项也算）
    pub fn has_answer(&self) -> bool {
        !self.correct_answer.trim().is_empty() || self.choices.iter().any(|c| c.is_correct)
    }
}

/// 生成器输出的小题桩
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubQuestionStub {
    /// 可读的定位描述，作为小题题干
    pub label: String,
    /// 从 1 开始
    pub order: u32,
}

impl SubQuestionStub {
    pub fn new(label: impl Into<String>, order: u32) -> Self {
        Self {
            label: label.into(),
            order,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_fields_missing() {
        let sq: SubQuestion = serde_json::from_str(r#"{"text": "Q1", "order": 1}"#).unwrap();
        assert_eq!(sq.points, 1);
        assert!(sq.is_new());
        assert!(sq.choices.is_empty());
        assert!(!sq.has_answer());
    }

    #[test]
    fn test_has_answer_via_choice() {
        let sq = SubQuestion {
            choices: vec![
                Choice::new("A"),
                Choice {
                    text: "B".into(),
                    is_correct: true,
                },
            ],
            ..Default::default()
        };
        assert!(sq.has_answer());
    }
}
