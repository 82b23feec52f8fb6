//! 小题生成服务 - 业务能力层
//!
//! 扫描结构化载荷，按作答单元生成有序的小题桩：
//! - 表格：跳过表头行，按行、列、单元格内行的顺序统计空位标记
//! - 笔记/表单：按条目、条目内行的顺序统计空位标记
//! - 摘要：整段文本中的空位标记
//! - 图表/地图：每个标签一个小题，列表顺序即标签编号
//! - 匹配：用户输入的每行题干一个小题

use tracing::debug;

use crate::error::GenerationError;
use crate::models::payload::{Cell, DiagramData, MatchingData, NoteFormData, StructuredPayload, SummaryData, TableData};
use crate::models::question_type::QuestionType;
use crate::models::sub_question::SubQuestionStub;
use crate::services::blank_scanner::{count_markers, split_at_markers};

/// 为题组生成小题桩
///
/// # 参数
/// - `question_type`: 题型
/// - `payload`: 结构化载荷
///
/// # 返回
/// 返回有序的小题桩；没有任何作答单元时返回 `NoCountableUnits`
pub fn generate_stubs(
    question_type: QuestionType,
    payload: Option<&StructuredPayload>,
) -> Result<Vec<SubQuestionStub>, GenerationError> {
    if !question_type.is_derived() {
        return Err(GenerationError::NotDerivable { question_type });
    }
    let payload = payload.ok_or(GenerationError::MissingPayload { question_type })?;
    if !payload.fits(question_type) {
        return Err(GenerationError::PayloadMismatch { question_type });
    }

    let labels = match payload {
        StructuredPayload::Table(table) => table_labels(table),
        StructuredPayload::Notes(notes) => note_labels(notes),
        StructuredPayload::Summary(summary) => summary_labels(summary),
        StructuredPayload::Diagram(diagram) => diagram_labels(diagram),
        StructuredPayload::Matching(matching) => matching_labels(matching),
    };

    if labels.is_empty() {
        return Err(GenerationError::NoCountableUnits { question_type });
    }

    debug!("{} 生成 {} 个小题桩", question_type.code(), labels.len());
    Ok(number(labels))
}

/// 把一条题干按空位标记拆成多个小题桩（单条编辑时使用）
///
/// 没有标记或只有一个标记时返回一个桩
pub fn split_prompt(text: &str) -> Vec<SubQuestionStub> {
    number(split_at_markers(text))
}

/// 统计载荷中的作答单元数量
pub fn count_units(payload: &StructuredPayload) -> usize {
    match payload {
        StructuredPayload::Table(table) => table_labels(table).len(),
        StructuredPayload::Notes(notes) => note_labels(notes).len(),
        StructuredPayload::Summary(summary) => count_markers(&summary.text),
        StructuredPayload::Diagram(diagram) => diagram.labels.len(),
        StructuredPayload::Matching(matching) => matching_labels(matching).len(),
    }
}

fn number(labels: Vec<String>) -> Vec<SubQuestionStub> {
    labels
        .into_iter()
        .enumerate()
        .map(|(i, label)| SubQuestionStub::new(label, (i + 1) as u32))
        .collect()
}

fn table_labels(table: &TableData) -> Vec<String> {
    let mut labels = Vec::new();
    for (r, row) in table.items.iter().enumerate().skip(1) {
        for (c, cell) in row.iter().enumerate() {
            let locator = format!("Row {}, {}", r, table.header(c));
            push_cell_labels(&mut labels, &locator, cell);
        }
    }
    labels
}

fn note_labels(notes: &NoteFormData) -> Vec<String> {
    let mut labels = Vec::new();
    for (i, item) in notes.items.iter().enumerate() {
        let locator = format!("Item {}", i + 1);
        push_cell_labels(&mut labels, &locator, item);
    }
    labels
}

fn summary_labels(summary: &SummaryData) -> Vec<String> {
    (1..=count_markers(&summary.text))
        .map(|n| format!("Blank {}", n))
        .collect()
}

fn diagram_labels(diagram: &DiagramData) -> Vec<String> {
    (1..=diagram.labels.len())
        .map(|n| format!("Label {}", n))
        .collect()
}

fn matching_labels(matching: &MatchingData) -> Vec<String> {
    matching
        .prompts
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

/// 单元格内每个标记生成一个定位描述
fn push_cell_labels(labels: &mut Vec<String>, locator: &str, cell: &Cell) {
    match cell {
        Cell::Scalar(text) => push_marker_labels(labels, locator.to_string(), count_markers(text)),
        Cell::MultiLine(lines) => {
            for (l, line) in lines.iter().enumerate() {
                let line_locator = format!("{} - Line {}", locator, l + 1);
                push_marker_labels(labels, line_locator, count_markers(line));
            }
        }
    }
}

/// 同一位置有多个标记时追加 "#k"
fn push_marker_labels(labels: &mut Vec<String>, locator: String, count: usize) {
    match count {
        0 => {}
        1 => labels.push(locator),
        _ => labels.extend((1..=count).map(|k| format!("{} #{}", locator, k))),
    }
}
