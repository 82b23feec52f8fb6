/// 题型枚举
///
/// 题组的题型是封闭集合，决定使用哪种结构化编辑器、如何生成小题以及保存时的请求形状
use phf::phf_map;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuestionType {
    /// 单选题
    #[serde(rename = "MCQ")]
    Mcq,
    /// 多选题
    #[serde(rename = "MCMA")]
    Mcma,
    /// 判断题 (True / False / Not Given)
    #[serde(rename = "TFNG")]
    TrueFalseNotGiven,
    /// 判断题 (Yes / No / Not Given)
    #[serde(rename = "YNNG")]
    YesNoNotGiven,
    /// 特征匹配
    #[serde(rename = "MF")]
    MatchingFeatures,
    /// 信息匹配
    #[serde(rename = "MI")]
    MatchingInformation,
    /// 标题匹配
    #[serde(rename = "MH")]
    MatchingHeadings,
    /// 句子填空
    #[serde(rename = "SC")]
    SentenceCompletion,
    /// 简答题
    #[serde(rename = "SA")]
    ShortAnswer,
    /// 摘要填空
    #[serde(rename = "SUC")]
    SummaryCompletion,
    /// 笔记填空
    #[serde(rename = "NC")]
    NoteCompletion,
    /// 表单填空
    #[serde(rename = "FC")]
    FormCompletion,
    /// 表格填空
    #[serde(rename = "TC")]
    TableCompletion,
    /// 图表标注
    #[serde(rename = "DL")]
    DiagramLabeling,
    /// 地图标注
    #[serde(rename = "ML")]
    MapLabeling,
}

/// 题型代码 → 题型（同时接受完整名称）
static TYPE_CODES: phf::Map<&'static str, QuestionType> = phf_map! {
    "MCQ" => QuestionType::Mcq,
    "MCMA" => QuestionType::Mcma,
    "TFNG" => QuestionType::TrueFalseNotGiven,
    "YNNG" => QuestionType::YesNoNotGiven,
    "MF" => QuestionType::MatchingFeatures,
    "MI" => QuestionType::MatchingInformation,
    "MH" => QuestionType::MatchingHeadings,
    "SC" => QuestionType::SentenceCompletion,
    "SA" => QuestionType::ShortAnswer,
    "SUC" => QuestionType::SummaryCompletion,
    "NC" => QuestionType::NoteCompletion,
    "FC" => QuestionType::FormCompletion,
    "TC" => QuestionType::TableCompletion,
    "DL" => QuestionType::DiagramLabeling,
    "ML" => QuestionType::MapLabeling,
    "MULTIPLE_CHOICE" => QuestionType::Mcq,
    "MULTIPLE_ANSWER" => QuestionType::Mcma,
    "TRUE_FALSE_NOT_GIVEN" => QuestionType::TrueFalseNotGiven,
    "YES_NO_NOT_GIVEN" => QuestionType::YesNoNotGiven,
    "MATCHING_FEATURES" => QuestionType::MatchingFeatures,
    "MATCHING_INFORMATION" => QuestionType::MatchingInformation,
    "MATCHING_HEADINGS" => QuestionType::MatchingHeadings,
    "SENTENCE_COMPLETION" => QuestionType::SentenceCompletion,
    "SHORT_ANSWER" => QuestionType::ShortAnswer,
    "SUMMARY_COMPLETION" => QuestionType::SummaryCompletion,
    "NOTE_COMPLETION" => QuestionType::NoteCompletion,
    "FORM_COMPLETION" => QuestionType::FormCompletion,
    "TABLE_COMPLETION" => QuestionType::TableCompletion,
    "DIAGRAM_LABELING" => QuestionType::DiagramLabeling,
    "MAP_LABELING" => QuestionType::MapLabeling,
};

/// 结构化编辑器种类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorKind {
    /// 无结构化编辑器，小题手动增删
    Plain,
    Table,
    Diagram,
    Matching,
    Notes,
    Summary,
}

impl QuestionType {
    /// 获取题型代码
    pub fn code(self) -> &'static str {
        match self {
            QuestionType::Mcq => "MCQ",
            QuestionType::Mcma => "MCMA",
            QuestionType::TrueFalseNotGiven => "TFNG",
            QuestionType::YesNoNotGiven => "YNNG",
            QuestionType::MatchingFeatures => "MF",
            QuestionType::MatchingInformation => "MI",
            QuestionType::MatchingHeadings => "MH",
            QuestionType::SentenceCompletion => "SC",
            QuestionType::ShortAnswer => "SA",
            QuestionType::SummaryCompletion => "SUC",
            QuestionType::NoteCompletion => "NC",
            QuestionType::FormCompletion => "FC",
            QuestionType::TableCompletion => "TC",
            QuestionType::DiagramLabeling => "DL",
            QuestionType::MapLabeling => "ML",
        }
    }

    /// 获取显示名称
    pub fn name(self) -> &'static str {
        match self {
            QuestionType::Mcq => "Multiple Choice",
            QuestionType::Mcma => "Multiple Choice (Multiple Answers)",
            QuestionType::TrueFalseNotGiven => "True / False / Not Given",
            QuestionType::YesNoNotGiven => "Yes / No / Not Given",
            QuestionType::MatchingFeatures => "Matching Features",
            QuestionType::MatchingInformation => "Matching Information",
            QuestionType::MatchingHeadings => "Matching Headings",
            QuestionType::SentenceCompletion => "Sentence Completion",
            QuestionType::ShortAnswer => "Short Answer",
            QuestionType::SummaryCompletion => "Summary Completion",
            QuestionType::NoteCompletion => "Note Completion",
            QuestionType::FormCompletion => "Form Completion",
            QuestionType::TableCompletion => "Table Completion",
            QuestionType::DiagramLabeling => "Diagram Labeling",
            QuestionType::MapLabeling => "Map Labeling",
        }
    }

    /// 从代码或完整名称解析题型（忽略大小写和首尾空白）
    pub fn from_code(code: &str) -> Option<Self> {
        let normalized = code.trim().to_ascii_uppercase().replace(['-', ' '], "_");
        TYPE_CODES.get(normalized.as_str()).copied()
    }

    /// 该题型使用的结构化编辑器
    pub fn editor_kind(self) -> EditorKind {
        match self {
            QuestionType::TableCompletion => EditorKind::Table,
            QuestionType::DiagramLabeling | QuestionType::MapLabeling => EditorKind::Diagram,
            QuestionType::MatchingFeatures
            | QuestionType::MatchingInformation
            | QuestionType::MatchingHeadings => EditorKind::Matching,
            QuestionType::NoteCompletion | QuestionType::FormCompletion => EditorKind::Notes,
            QuestionType::SummaryCompletion => EditorKind::Summary,
            _ => EditorKind::Plain,
        }
    }

    /// 是否通过结构化载荷自动生成小题
    pub fn is_derived(self) -> bool {
        self.editor_kind() != EditorKind::Plain
    }

    /// 是否是选项类题型（小题带 choices）
    pub fn is_choice_based(self) -> bool {
        matches!(
            self,
            QuestionType::Mcq
                | QuestionType::Mcma
                | QuestionType::TrueFalseNotGiven
                | QuestionType::YesNoNotGiven
        ) || self.editor_kind() == EditorKind::Matching
    }

    /// 保存时是否使用"结构化包装"的批量请求
    pub fn uses_structured_bulk(self) -> bool {
        matches!(
            self.editor_kind(),
            EditorKind::Matching | EditorKind::Summary | EditorKind::Notes | EditorKind::Table
        )
    }

    /// 固定选项（判断类题型）
    pub fn fixed_choices(self) -> Option<&'static [&'static str]> {
        match self {
            QuestionType::TrueFalseNotGiven => Some(&["True", "False", "Not Given"]),
            QuestionType::YesNoNotGiven => Some(&["Yes", "No", "Not Given"]),
            _ => None,
        }
    }
}

impl std::fmt::Display for QuestionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
