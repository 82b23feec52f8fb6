//! 结构化载荷
//!
//! 每种需要结构化编辑器的题型对应一个载荷变体，小题由载荷推导而来

use serde::{Deserialize, Serialize};

use crate::models::question_type::{EditorKind, QuestionType};

/// 表格/笔记单元格
///
/// 单行文本或多行文本（多行时按行顺序逐行扫描空位标记）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Scalar(String),
    MultiLine(Vec<String>),
}

impl Cell {
    /// 单元格显示文本（多行以空格连接）
    pub fn display_text(&self) -> String {
        match self {
            Cell::Scalar(text) => text.trim().to_string(),
            Cell::MultiLine(lines) => lines
                .iter()
                .map(|l| l.trim())
                .filter(|l| !l.is_empty())
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

impl Default for Cell {
    fn default() -> Self {
        Cell::Scalar(String::new())
    }
}

impl From<&str> for Cell {
    fn from(text: &str) -> Self {
        Cell::Scalar(text.to_string())
    }
}

/// 图上的标签位置（相对坐标，取值 [0, 1]）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LabelPlacement {
    pub x: f64,
    pub y: f64,
}

impl LabelPlacement {
    /// 坐标是否都在 [0, 1] 内
    pub fn is_in_bounds(&self) -> bool {
        (0.0..=1.0).contains(&self.x) && (0.0..=1.0).contains(&self.y)
    }
}

/// 表格填空：第 0 行是表头，不参与空位统计
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableData {
    pub items: Vec<Vec<Cell>>,
}

impl TableData {
    /// 表头列名，空表头回退为 "Column N"
    pub fn header(&self, column: usize) -> String {
        let text = self
            .items
            .first()
            .and_then(|row| row.get(column))
            .map(Cell::display_text)
            .unwrap_or_default();
        if text.is_empty() {
            format!("Column {}", column + 1)
        } else {
            text
        }
    }
}

/// 图表/地图标注
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagramData {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// 列表顺序即学生看到的标签编号（从 1 开始）
    #[serde(default)]
    pub labels: Vec<LabelPlacement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<String>,
}

/// 匹配题选项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchingOption {
    pub value: String,
    pub label: String,
}

/// 匹配题
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchingData {
    #[serde(default)]
    pub options: Vec<MatchingOption>,
    /// 每行一个小题题干，由用户直接输入
    #[serde(default)]
    pub prompts: Vec<String>,
}

/// 笔记/表单填空：列表结构，每项是一个单元格
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NoteFormData {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub items: Vec<Cell>,
}

/// 摘要填空：一段带空位标记的文本
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryData {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub text: String,
}

/// 按题型区分的结构化载荷
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum StructuredPayload {
    Table(TableData),
    Diagram(DiagramData),
    Matching(MatchingData),
    Notes(NoteFormData),
    Summary(SummaryData),
}

impl StructuredPayload {
    /// 为题型创建空载荷，简单题型返回 None
    pub fn empty_for(question_type: QuestionType) -> Option<Self> {
        match question_type.editor_kind() {
            EditorKind::Plain => None,
            EditorKind::Table => Some(StructuredPayload::Table(TableData {
                items: vec![vec![Cell::default()]],
            })),
            EditorKind::Diagram => Some(StructuredPayload::Diagram(DiagramData::default())),
            EditorKind::Matching => Some(StructuredPayload::Matching(MatchingData::default())),
            EditorKind::Notes => Some(StructuredPayload::Notes(NoteFormData::default())),
            EditorKind::Summary => Some(StructuredPayload::Summary(SummaryData::default())),
        }
    }

    /// 载荷对应的编辑器种类
    pub fn editor_kind(&self) -> EditorKind {
        match self {
            StructuredPayload::Table(_) => EditorKind::Table,
            StructuredPayload::Diagram(_) => EditorKind::Diagram,
            StructuredPayload::Matching(_) => EditorKind::Matching,
            StructuredPayload::Notes(_) => EditorKind::Notes,
            StructuredPayload::Summary(_) => EditorKind::Summary,
        }
    }

    /// 载荷是否适用于该题型
    pub fn fits(&self, question_type: QuestionType) -> bool {
        self.editor_kind() == question_type.editor_kind()
    }

    /// 载荷是否没有任何内容
    pub fn is_blank(&self) -> bool {
        match self {
            StructuredPayload::Table(t) => t
                .items
                .iter()
                .flatten()
                .all(|c| c.display_text().is_empty()),
            StructuredPayload::Diagram(d) => d.labels.is_empty() && d.image_ref.is_none(),
            StructuredPayload::Matching(m) => m.options.is_empty() && m.prompts.is_empty(),
            StructuredPayload::Notes(n) => {
                n.title.trim().is_empty() && n.items.iter().all(|c| c.display_text().is_empty())
            }
            StructuredPayload::Summary(s) => s.title.trim().is_empty() && s.text.trim().is_empty(),
        }
    }
}
