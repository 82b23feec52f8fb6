//! 题组模型
//!
//! 题组独占其结构化载荷和小题列表。所有按下标的操作都针对列表中的位置。
//! 每次插入/删除/移动/复制后按位置重新编号为连续的 `1..N`，
//! 之前手动修改过的 `order` 会被覆盖。
//! 手动修改 `order`（[`QuestionGroup::set_order`]）本身不做规范化；
//! [`QuestionGroup::normalize_orders`] 按 `order` 排序后重新编号。

use serde::{Deserialize, Serialize};

use crate::error::EditError;
use crate::models::payload::StructuredPayload;
use crate::models::question_type::QuestionType;
use crate::models::sub_question::{RecordId, SubQuestion};

/// 题组
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionGroup {
    /// None 表示尚未持久化
    #[serde(default)]
    pub id: Option<RecordId>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, rename = "type")]
    pub question_type: Option<QuestionType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) structured_payload: Option<StructuredPayload>,
    #[serde(default)]
    pub(crate) sub_questions: Vec<SubQuestion>,
    /// 新建小题的 id 未知，重新加载前不能再次保存
    #[serde(skip)]
    pub(crate) needs_reload: bool,
}

impl QuestionGroup {
    /// 新建空题组
    pub fn new() -> Self {
        Self::default()
    }

    /// 指定题型创建题组，同时安装该题型的空载荷
    pub fn with_type(title: impl Into<String>, question_type: QuestionType) -> Self {
        Self {
            title: title.into(),
            question_type: Some(question_type),
            structured_payload: StructuredPayload::empty_for(question_type),
            ..Default::default()
        }
    }

    /// 替换载荷（构建用）
    pub fn with_payload(mut self, payload: StructuredPayload) -> Self {
        self.structured_payload = Some(payload);
        self
    }

    /// 以给定小题构建（构建用，保留原有 order）
    pub fn with_sub_questions(mut self, sub_questions: Vec<SubQuestion>) -> Self {
        self.sub_questions = sub_questions;
        self
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    pub fn needs_reload(&self) -> bool {
        self.needs_reload
    }

    pub(crate) fn mark_needs_reload(&mut self) {
        self.needs_reload = true;
    }

    /// 按列表顺序把 id 写回尚未创建的小题
    pub(crate) fn assign_new_ids(&mut self, ids: &[RecordId]) {
        let new_questions = self.sub_questions.iter_mut().filter(|q| q.id.is_none());
        for (sub_question, id) in new_questions.zip(ids) {
            sub_question.id = Some(*id);
        }
    }

    pub fn structured_payload(&self) -> Option<&StructuredPayload> {
        self.structured_payload.as_ref()
    }

    pub(crate) fn structured_payload_mut(&mut self) -> Option<&mut StructuredPayload> {
        self.structured_payload.as_mut()
    }

    pub(crate) fn set_structured_payload(&mut self, payload: Option<StructuredPayload>) {
        self.structured_payload = payload;
    }

    pub fn sub_questions(&self) -> &[SubQuestion] {
        &self.sub_questions
    }

    /// 编辑单个小题的答案等字段
    pub fn sub_question_mut(&mut self, index: usize) -> Option<&mut SubQuestion> {
        self.sub_questions.get_mut(index)
    }

    /// 用调和结果整体替换小题列表
    pub(crate) fn replace_sub_questions(&mut self, sub_questions: Vec<SubQuestion>) {
        self.sub_questions = sub_questions;
    }

    pub(crate) fn clear_sub_questions(&mut self) {
        self.sub_questions.clear();
    }

    pub fn len(&self) -> usize {
        self.sub_questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sub_questions.is_empty()
    }

    /// 在 `index` 处插入小题
    pub fn insert_sub_question(
        &mut self,
        index: usize,
        sub_question: SubQuestion,
    ) -> Result<(), EditError> {
        if index > self.sub_questions.len() {
            return Err(EditError::IndexOutOfRange {
                index,
                len: self.sub_questions.len(),
            });
        }
        self.sub_questions.insert(index, sub_question);
        self.renumber();
        Ok(())
    }

    /// 追加小题到末尾
    pub fn push_sub_question(&mut self, sub_question: SubQuestion) {
        self.sub_questions.push(sub_question);
        self.renumber();
    }

    /// 删除 `index` 处的小题
    pub fn remove_sub_question(&mut self, index: usize) -> Result<SubQuestion, EditError> {
        self.check_index(index)?;
        let removed = self.sub_questions.remove(index);
        self.renumber();
        Ok(removed)
    }

    /// 把 `from` 处的小题移动到 `to`
    pub fn move_sub_question(&mut self, from: usize, to: usize) -> Result<(), EditError> {
        self.check_index(from)?;
        self.check_index(to)?;
        let item = self.sub_questions.remove(from);
        self.sub_questions.insert(to, item);
        self.renumber();
        Ok(())
    }

    /// 复制 `index` 处的小题并插入其后，副本没有 id。返回副本位置
    pub fn duplicate_sub_question(&mut self, index: usize) -> Result<usize, EditError> {
        self.check_index(index)?;
        let mut copy = self.sub_questions[index].clone();
        copy.id = None;
        self.sub_questions.insert(index + 1, copy);
        self.renumber();
        Ok(index + 1)
    }

    /// 手动设置 order，不检查重复或越界
    pub fn set_order(&mut self, index: usize, order: u32) -> Result<(), EditError> {
        self.check_index(index)?;
        self.sub_questions[index].order = order;
        Ok(())
    }

    /// 按 order 稳定排序后重新编号为 `1..N`
    pub fn normalize_orders(&mut self) {
        self.sub_questions.sort_by_key(|q| q.order);
        self.renumber();
    }

    /// order 是否恰好是 `1..N`
    pub fn has_contiguous_order(&self) -> bool {
        let mut orders: Vec<u32> = self.sub_questions.iter().map(|q| q.order).collect();
        orders.sort_unstable();
        orders
            .iter()
            .enumerate()
            .all(|(i, &order)| order as usize == i + 1)
    }

    fn renumber(&mut self) {
        for (i, q) in self.sub_questions.iter_mut().enumerate() {
            q.order = (i + 1) as u32;
        }
    }

    fn check_index(&self, index: usize) -> Result<(), EditError> {
        if index >= self.sub_questions.len() {
            Err(EditError::IndexOutOfRange {
                index,
                len: self.sub_questions.len(),
            })
        } else {
            Ok(())
        }
    }
}
