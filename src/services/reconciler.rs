//! 小题调和服务 - 业务能力层
//!
//! 把新生成的小题桩与已保存的小题合并，尽量保留 id 和已填写的答案。
//!
//! 默认按位置调和：第 i 个桩继承第 i 个旧小题的 id、答案、解析和分值，
//! 只覆盖题干和 order。中间插入/删除单元会让答案错位，这是已知行为，
//! 需要按题干匹配时使用 [`ReconcileStrategy::ByLabel`]。

use std::collections::HashMap;
use std::str::FromStr;

use tracing::debug;

use crate::error::EditError;
use crate::models::sub_question::{SubQuestion, SubQuestionStub};

/// 整组重新生成时的调和策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReconcileStrategy {
    /// 按位置
    #[default]
    Positional,
    /// 按题干文本完全匹配，未匹配的桩作为新小题
    ByLabel,
}

impl FromStr for ReconcileStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "positional" => Ok(ReconcileStrategy::Positional),
            "label" | "by_label" => Ok(ReconcileStrategy::ByLabel),
            other => Err(format!("未知的调和策略: {}", other)),
        }
    }
}

/// 调和小题
///
/// # 参数
/// - `old`: 已有小题
/// - `fresh`: 新生成的小题桩
/// - `edit_target`: 单条编辑时被编辑小题的位置；None 表示整组重新生成
///
/// # 返回
/// 返回调和后的小题列表
pub fn reconcile(
    old: &[SubQuestion],
    fresh: &[SubQuestionStub],
    edit_target: Option<usize>,
) -> Result<Vec<SubQuestion>, EditError> {
    match edit_target {
        None => Ok(reconcile_positional(old, fresh)),
        Some(target) => reconcile_single_edit(old, fresh, target),
    }
}

/// 按策略整组重新生成
pub fn reconcile_with(
    strategy: ReconcileStrategy,
    old: &[SubQuestion],
    fresh: &[SubQuestionStub],
) -> Vec<SubQuestion> {
    match strategy {
        ReconcileStrategy::Positional => reconcile_positional(old, fresh),
        ReconcileStrategy::ByLabel => reconcile_by_label(old, fresh),
    }
}

/// 整组重新生成：多出的旧小题被丢弃，多出的桩成为新小题
pub fn reconcile_positional(old: &[SubQuestion], fresh: &[SubQuestionStub]) -> Vec<SubQuestion> {
    let result: Vec<SubQuestion> = fresh
        .iter()
        .enumerate()
        .map(|(i, stub)| match old.get(i) {
            Some(existing) => carry_forward(existing, stub),
            None => SubQuestion::from_stub(stub),
        })
        .collect();

    debug!(
        "按位置调和: 旧 {} 条, 新 {} 条, 丢弃 {} 条",
        old.len(),
        fresh.len(),
        old.len().saturating_sub(fresh.len())
    );
    result
}

/// 按题干匹配；同一题干出现多次时按出现顺序依次匹配
pub fn reconcile_by_label(old: &[SubQuestion], fresh: &[SubQuestionStub]) -> Vec<SubQuestion> {
    let mut pool: HashMap<&str, Vec<&SubQuestion>> = HashMap::new();
    for existing in old.iter().rev() {
        pool.entry(existing.text.as_str()).or_default().push(existing);
    }

    fresh
        .iter()
        .map(|stub| match pool.get_mut(stub.label.as_str()).and_then(Vec::pop) {
            Some(existing) => carry_forward(existing, stub),
            None => SubQuestion::from_stub(stub),
        })
        .collect()
}

/// 单条编辑：被编辑的小题展开为 K 个桩
///
/// 第一个桩继承原小题的 id、order 和答案，其余为新小题；
/// 之后所有小题的 order 增加 K-1。K 为 0 时删除该小题，之后的 order 减 1。
pub fn reconcile_single_edit(
    old: &[SubQuestion],
    fresh: &[SubQuestionStub],
    target: usize,
) -> Result<Vec<SubQuestion>, EditError> {
    let original = old.get(target).ok_or(EditError::IndexOutOfRange {
        index: target,
        len: old.len(),
    })?;

    let k = fresh.len();
    let mut result = Vec::with_capacity(old.len() + k.saturating_sub(1));
    result.extend_from_slice(&old[..target]);

    for (i, stub) in fresh.iter().enumerate() {
        let replacement = if i == 0 {
            SubQuestion {
                text: stub.label.clone(),
                ..original.clone()
            }
        } else {
            SubQuestion {
                text: stub.label.clone(),
                order: original.order + i as u32,
                ..Default::default()
            }
        };
        result.push(replacement);
    }

    for later in &old[target + 1..] {
        let mut shifted = later.clone();
        shifted.order = if k == 0 {
            shifted.order.saturating_sub(1)
        } else {
            shifted.order + (k as u32 - 1)
        };
        result.push(shifted);
    }

    debug!("单条编辑: 位置 {} 展开为 {} 条", target, k);
    Ok(result)
}

/// 保留 id / 答案 / 解析 / 分值 / 选项，只覆盖题干和 order
fn carry_forward(existing: &SubQuestion, stub: &SubQuestionStub) -> SubQuestion {
    SubQuestion {
        text: stub.label.clone(),
        order: stub.order,
        ..existing.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answered(id: i64, answer: &str, order: u32) -> SubQuestion {
        SubQuestion {
            id: Some(id),
            text: format!("old {}", id),
            correct_answer: answer.to_string(),
            secondary_answer: Some(format!("{}s", answer)),
            explanation: Some("because".into()),
            points: 2,
            order,
            ..Default::default()
        }
    }

    fn stubs(n: u32) -> Vec<SubQuestionStub> {
        (1..=n)
            .map(|i| SubQuestionStub::new(format!("Blank {}", i), i))
            .collect()
    }

    #[test]
    fn test_positional_preserves_answers() {
        let old = vec![answered(1, "cat", 1), answered(2, "dog", 2)];
        let result = reconcile(&old, &stubs(2), None).unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(result[0].id, Some(1));
        assert_eq!(result[0].correct_answer, "cat");
        assert_eq!(result[0].secondary_answer.as_deref(), Some("cats"));
        assert_eq!(result[0].points, 2);
        assert_eq!(result[0].text, "Blank 1");
        assert_eq!(result[1].id, Some(2));
        assert_eq!(result[1].correct_answer, "dog");
    }

    #[test]
    fn test_positional_growth() {
        let old = vec![answered(1, "cat", 1), answered(2, "dog", 2)];
        let result = reconcile(&old, &stubs(3), None).unwrap();

        assert_eq!(result.len(), 3);
        assert_eq!(result[1].id, Some(2));
        assert_eq!(result[2].id, None);
        assert!(result[2].correct_answer.is_empty());
        assert_eq!(result[2].points, 1);
        assert_eq!(result[2].order, 3);
    }

    #[test]
    fn test_positional_shrink() {
        let old = vec![
            answered(1, "cat", 1),
            answered(2, "dog", 2),
            answered(3, "owl", 3),
        ];
        let result = reconcile(&old, &stubs(1), None).unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, Some(1));
        assert_eq!(result[0].correct_answer, "cat");
    }

    #[test]
    fn test_positional_mid_insert_shifts_answers() {
        // 在中间插入单元时答案按位置错位，这是预期行为
        let old = vec![answered(1, "cat", 1), answered(2, "dog", 2)];
        let fresh = vec![
            SubQuestionStub::new("old 1", 1),
            SubQuestionStub::new("inserted", 2),
            SubQuestionStub::new("old 2", 3),
        ];
        let result = reconcile(&old, &fresh, None).unwrap();
        assert_eq!(result[1].correct_answer, "dog");
        assert!(result[2].correct_answer.is_empty());

        let by_label = reconcile_with(ReconcileStrategy::ByLabel, &old, &fresh);
        assert_eq!(by_label[0].id, Some(1));
        assert_eq!(by_label[1].id, None);
        assert_eq!(by_label[2].id, Some(2));
        assert_eq!(by_label[2].correct_answer, "dog");
        assert_eq!(by_label[2].order, 3);
    }

    #[test]
    fn test_single_edit_expansion() {
        let old = vec![
            answered(5, "a", 1),
            answered(7, "b", 2),
            answered(8, "c", 3),
            answered(9, "d", 4),
        ];
        let result = reconcile(&old, &stubs(3), Some(1)).unwrap();

        assert_eq!(result.len(), 6);
        assert_eq!(result[0].id, Some(5));
        assert_eq!(result[1].id, Some(7));
        assert_eq!(result[1].order, 2);
        assert_eq!(result[1].correct_answer, "b");
        assert_eq!(result[2].id, None);
        assert_eq!(result[3].id, None);
        assert_eq!(result[2].order, 3);
        assert_eq!(result[3].order, 4);
        assert_eq!(result[4].id, Some(8));
        assert_eq!(result[4].order, 5);
        assert_eq!(result[5].order, 6);

        let orders: Vec<u32> = result.iter().map(|q| q.order).collect();
        assert_eq!(orders, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_single_edit_one_stub_replaces_in_place() {
        let old = vec![answered(5, "a", 1), answered(7, "b", 2)];
        let fresh = vec![SubQuestionStub::new("rewritten", 1)];
        let result = reconcile(&old, &fresh, Some(1)).unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(result[1].id, Some(7));
        assert_eq!(result[1].order, 2);
        assert_eq!(result[1].text, "rewritten");
    }

    #[test]
    fn test_single_edit_zero_stubs_removes_target() {
        let old = vec![answered(5, "a", 1), answered(7, "b", 2), answered(8, "c", 3)];
        let result = reconcile(&old, &[], Some(0)).unwrap();
        let orders: Vec<u32> = result.iter().map(|q| q.order).collect();
        assert_eq!(orders, vec![1, 2]);
        assert_eq!(result[0].id, Some(7));
    }

    #[test]
    fn test_single_edit_target_out_of_range() {
        let old = vec![answered(5, "a", 1)];
        assert_eq!(
            reconcile(&old, &stubs(1), Some(3)),
            Err(EditError::IndexOutOfRange { index: 3, len: 1 })
        );
    }

    #[test]
    fn test_strategy_from_str() {
        assert_eq!(
            "Positional".parse::<ReconcileStrategy>(),
            Ok(ReconcileStrategy::Positional)
        );
        assert_eq!(
            "label".parse::<ReconcileStrategy>(),
            Ok(ReconcileStrategy::ByLabel)
        );
        assert!("fuzzy".parse::<ReconcileStrategy>().is_err());
    }
}
