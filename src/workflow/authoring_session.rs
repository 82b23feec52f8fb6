//! 题组编辑会话 - 流程层
//!
//! 一个会话独占一个题组。结构化载荷的编辑不会直接改动小题，
//! 小题只通过 生成 → 调和 这条流水线更新：
//! - [`AuthoringSession::regenerate`]：整组重新生成
//! - [`AuthoringSession::edit_sub_question_text`]：单条编辑，可能展开为多条
//!
//! 切换题型、更换图片等破坏性操作通过注入的 [`Confirm`] 请求确认。

use tracing::{debug, info};

use crate::error::{AppResult, EditError, GenerationError, ValidationError};
use crate::models::payload::{Cell, DiagramData, LabelPlacement, MatchingData, NoteFormData, StructuredPayload, SummaryData, TableData};
use crate::models::question_group::QuestionGroup;
use crate::models::question_type::{EditorKind, QuestionType};
use crate::models::sub_question::{Choice, SubQuestion};
use crate::services::blank_scanner::render_blanks;
use crate::services::options_parser::parse_options;
use crate::services::reconciler::{reconcile_single_edit, reconcile_with, ReconcileStrategy};
use crate::services::request_assembler::ImageAttachment;
use crate::services::stub_generator::{generate_stubs, split_prompt};
use crate::services::validator::validate_for_finalize;
use crate::workflow::confirm::Confirm;
use crate::workflow::save_flow::{SaveFlow, SaveReport};
use crate::workflow::save_ctx::SaveCtx;
use crate::clients::gateway::PersistenceGateway;
use crate::utils::logging::truncate_text;

const CONFIRM_CHANGE_TYPE: &str = "切换题型将清空当前的结构化内容和所有小题，是否继续？";
const CONFIRM_REPLACE_IMAGE: &str = "更换图片将清空所有标签，是否继续？";

/// 题组编辑会话
pub struct AuthoringSession<C: Confirm> {
    group: QuestionGroup,
    confirm: C,
    strategy: ReconcileStrategy,
    pending_image: Option<ImageAttachment>,
}

impl<C: Confirm> AuthoringSession<C> {
    /// 新建空题组的会话
    pub fn new(confirm: C) -> Self {
        Self::from_group(QuestionGroup::new(), confirm)
    }

    /// 编辑已加载的题组
    pub fn from_group(group: QuestionGroup, confirm: C) -> Self {
        Self {
            group,
            confirm,
            strategy: ReconcileStrategy::default(),
            pending_image: None,
        }
    }

    /// 指定整组重新生成的调和策略
    pub fn with_strategy(mut self, strategy: ReconcileStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// 附带已加载的图片（导入草稿时使用，不清空标签）
    pub fn with_image(mut self, image: Option<ImageAttachment>) -> Self {
        self.pending_image = image;
        self
    }

    pub fn group(&self) -> &QuestionGroup {
        &self.group
    }

    pub fn pending_image(&self) -> Option<&ImageAttachment> {
        self.pending_image.as_ref()
    }

    /// 交出题组和待上传图片
    pub fn into_parts(self) -> (QuestionGroup, Option<ImageAttachment>) {
        (self.group, self.pending_image)
    }

    // ========== 题组字段 ==========

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.group.title = title.into();
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.group.description = description.into();
    }

    /// 切换题型
    ///
    /// 有内容时需要确认；确认后丢弃原载荷和所有小题，安装新题型的空载荷。
    /// 返回 false 表示用户取消
    pub fn change_type(&mut self, new_type: QuestionType) -> bool {
        if self.group.question_type == Some(new_type) {
            return true;
        }

        let has_content = !self.group.is_empty()
            || self
                .group
                .structured_payload()
                .map(|p| !p.is_blank())
                .unwrap_or(false);
        if has_content && !self.confirm.request_confirmation(CONFIRM_CHANGE_TYPE) {
            debug!("用户取消切换题型");
            return false;
        }

        info!(
            "切换题型: {} → {}",
            self.group
                .question_type
                .map(|t| t.code())
                .unwrap_or("无"),
            new_type.code()
        );
        self.group.question_type = Some(new_type);
        self.group
            .set_structured_payload(StructuredPayload::empty_for(new_type));
        self.group.clear_sub_questions();
        self.pending_image = None;
        true
    }

    // ========== 结构化载荷编辑 ==========

    /// 替换表格内容（第 0 行为表头）
    pub fn set_table(&mut self, items: Vec<Vec<Cell>>) -> Result<(), EditError> {
        self.table_mut()?.items = items;
        Ok(())
    }

    /// 替换笔记/表单内容
    pub fn set_notes(&mut self, title: impl Into<String>, items: Vec<Cell>) -> Result<(), EditError> {
        let notes = self.notes_mut()?;
        notes.title = title.into();
        notes.items = items;
        Ok(())
    }

    /// 替换摘要内容
    pub fn set_summary(&mut self, title: impl Into<String>, text: impl Into<String>) -> Result<(), EditError> {
        let summary = self.summary_mut()?;
        summary.title = title.into();
        summary.text = text.into();
        Ok(())
    }

    /// 解析并替换匹配题选项，同时刷新所有小题的可选项。返回选项数量
    pub fn set_matching_options_text(&mut self, text: &str) -> Result<usize, EditError> {
        let options = parse_options(text);
        let count = options.len();
        self.matching_mut()?.options = options;
        self.refresh_matching_choices();
        Ok(count)
    }

    /// 替换匹配题题干（每行一个小题）
    pub fn set_matching_prompts_text(&mut self, text: &str) -> Result<(), EditError> {
        self.matching_mut()?.prompts = text.lines().map(|l| l.trim().to_string()).collect();
        Ok(())
    }

    /// 放置标签，返回标签编号（从 1 开始）
    pub fn place_label(&mut self, x: f64, y: f64) -> Result<usize, EditError> {
        let placement = checked_placement(x, y)?;
        let diagram = self.diagram_mut()?;
        diagram.labels.push(placement);
        Ok(diagram.labels.len())
    }

    /// 移动标签
    pub fn move_label(&mut self, index: usize, x: f64, y: f64) -> Result<(), EditError> {
        let placement = checked_placement(x, y)?;
        let diagram = self.diagram_mut()?;
        let len = diagram.labels.len();
        let label = diagram
            .labels
            .get_mut(index)
            .ok_or(EditError::IndexOutOfRange { index, len })?;
        *label = placement;
        Ok(())
    }

    /// 删除标签，之后的标签编号前移
    pub fn remove_label(&mut self, index: usize) -> Result<LabelPlacement, EditError> {
        let diagram = self.diagram_mut()?;
        if index >= diagram.labels.len() {
            return Err(EditError::IndexOutOfRange {
                index,
                len: diagram.labels.len(),
            });
        }
        Ok(diagram.labels.remove(index))
    }

    /// 更换图表/地图图片
    ///
    /// 已有标签时需要确认；确认后清空标签和对应小题。返回 false 表示用户取消
    pub fn replace_image(&mut self, image: ImageAttachment) -> Result<bool, EditError> {
        let has_labels = !self.diagram_mut()?.labels.is_empty();
        if has_labels && !self.confirm.request_confirmation(CONFIRM_REPLACE_IMAGE) {
            debug!("用户取消更换图片");
            return Ok(false);
        }

        let diagram = self.diagram_mut()?;
        diagram.labels.clear();
        diagram.image_ref = Some(image.file_name.clone());
        if has_labels {
            self.group.clear_sub_questions();
        }
        info!("图片已更换: {}", image.file_name);
        self.pending_image = Some(image);
        Ok(true)
    }

    // ========== 生成 → 调和 ==========

    /// 整组重新生成小题
    ///
    /// 没有可计数的单元时返回 `NoCountableUnits`，小题保持不变
    pub fn regenerate(&mut self) -> AppResult<usize> {
        let question_type = self
            .group
            .question_type
            .ok_or(GenerationError::MissingType)?;
        let stubs = generate_stubs(question_type, self.group.structured_payload())?;

        let merged = reconcile_with(self.strategy, self.group.sub_questions(), &stubs);
        let kept = merged.iter().filter(|q| !q.is_new()).count();
        self.group.replace_sub_questions(merged);
        self.apply_choice_rules(question_type);

        info!(
            "「{}」重新生成 {} 个小题 (保留 {} 个已有小题)",
            truncate_text(&self.group.title, 30),
            stubs.len(),
            kept
        );
        Ok(stubs.len())
    }

    /// 单条编辑：改写一个小题的题干，含多个空位标记时展开为多条。
    /// 返回展开后的条数
    ///
    /// 只适用于小题不由载荷推导的题型
    pub fn edit_sub_question_text(&mut self, index: usize, text: &str) -> AppResult<usize> {
        let question_type = self.group.question_type.ok_or(EditError::MissingType)?;
        if question_type.is_derived() {
            return Err(EditError::WrongEditor { expected: "题干" }.into());
        }

        let stubs = split_prompt(text);
        let merged = reconcile_single_edit(self.group.sub_questions(), &stubs, index)?;
        self.group.replace_sub_questions(merged);
        self.apply_choice_rules(question_type);

        debug!(
            "第 {} 个小题展开为 {} 条: {}",
            index + 1,
            stubs.len(),
            truncate_text(&render_blanks(text), 40)
        );
        Ok(stubs.len())
    }

    // ========== 手动维护小题 ==========

    /// 追加一个空白小题（判断类题型自动带固定选项），返回其位置
    pub fn add_sub_question(&mut self) -> Result<usize, EditError> {
        let question_type = self.group.question_type.ok_or(EditError::MissingType)?;
        self.group.push_sub_question(SubQuestion::default());
        self.apply_choice_rules(question_type);
        Ok(self.group.len() - 1)
    }

    pub fn remove_sub_question(&mut self, index: usize) -> Result<SubQuestion, EditError> {
        self.group.remove_sub_question(index)
    }

    pub fn move_sub_question(&mut self, from: usize, to: usize) -> Result<(), EditError> {
        self.group.move_sub_question(from, to)
    }

    pub fn duplicate_sub_question(&mut self, index: usize) -> Result<usize, EditError> {
        self.group.duplicate_sub_question(index)
    }

    /// 手动修改 order，不做规范化
    pub fn set_order(&mut self, index: usize, order: u32) -> Result<(), EditError> {
        self.group.set_order(index, order)
    }

    pub fn normalize_orders(&mut self) {
        self.group.normalize_orders();
    }

    /// 填写答案
    pub fn set_answer(
        &mut self,
        index: usize,
        correct_answer: impl Into<String>,
        secondary_answer: Option<String>,
    ) -> Result<(), EditError> {
        let len = self.group.len();
        let question_type = self.group.question_type;
        let sub_question = self
            .group
            .sub_question_mut(index)
            .ok_or(EditError::IndexOutOfRange { index, len })?;
        sub_question.correct_answer = correct_answer.into();
        sub_question.secondary_answer = secondary_answer.filter(|s| !s.trim().is_empty());
        if question_type.map(syncs_choice_flags).unwrap_or(false) {
            sync_choice_flags(sub_question);
        }
        Ok(())
    }

    /// 填写解析和分值
    pub fn set_explanation(
        &mut self,
        index: usize,
        explanation: Option<String>,
        points: u32,
    ) -> Result<(), EditError> {
        let len = self.group.len();
        let sub_question = self
            .group
            .sub_question_mut(index)
            .ok_or(EditError::IndexOutOfRange { index, len })?;
        sub_question.explanation = explanation.filter(|s| !s.trim().is_empty());
        sub_question.points = points;
        Ok(())
    }

    /// 替换选项（单选/多选）
    pub fn set_choices(&mut self, index: usize, choices: Vec<Choice>) -> Result<(), EditError> {
        let len = self.group.len();
        let sub_question = self
            .group
            .sub_question_mut(index)
            .ok_or(EditError::IndexOutOfRange { index, len })?;
        sub_question.choices = choices;
        Ok(())
    }

    // ========== 定稿与保存 ==========

    /// 定稿校验，失败时不能进入保存
    pub fn finalize(&self) -> Result<QuestionType, ValidationError> {
        validate_for_finalize(&self.group)
    }

    /// 保存题组；成功后清除待上传图片
    pub async fn save<G: PersistenceGateway>(
        &mut self,
        flow: &SaveFlow<'_, G>,
        ctx: &SaveCtx,
    ) -> AppResult<SaveReport> {
        let report = flow
            .save(&mut self.group, self.pending_image.clone(), ctx)
            .await?;
        self.pending_image = None;
        Ok(report)
    }

    // ========== 内部辅助 ==========

    /// 判断类题型补齐固定选项，匹配题按选项重建可选项
    fn apply_choice_rules(&mut self, question_type: QuestionType) {
        if question_type.editor_kind() == EditorKind::Matching {
            self.refresh_matching_choices();
            return;
        }
        if let Some(fixed) = question_type.fixed_choices() {
            for index in 0..self.group.len() {
                if let Some(q) = self.group.sub_question_mut(index) {
                    if q.choices.is_empty() {
                        q.choices = fixed.iter().map(|text| Choice::new(*text)).collect();
                        sync_choice_flags(q);
                    }
                }
            }
        }
    }

    /// 每个小题的可选项 = 匹配题选项
    fn refresh_matching_choices(&mut self) {
        let values: Vec<String> = match self.group.structured_payload() {
            Some(StructuredPayload::Matching(m)) => m.options.iter().map(|o| o.value.clone()).collect(),
            _ => return,
        };
        for index in 0..self.group.len() {
            if let Some(q) = self.group.sub_question_mut(index) {
                q.choices = values.iter().map(|v| Choice::new(v.clone())).collect();
                sync_choice_flags(q);
            }
        }
    }

    fn table_mut(&mut self) -> Result<&mut TableData, EditError> {
        match self.group.structured_payload_mut() {
            Some(StructuredPayload::Table(t)) => Ok(t),
            _ => Err(EditError::WrongEditor { expected: "表格" }),
        }
    }

    fn notes_mut(&mut self) -> Result<&mut NoteFormData, EditError> {
        match self.group.structured_payload_mut() {
            Some(StructuredPayload::Notes(n)) => Ok(n),
            _ => Err(EditError::WrongEditor { expected: "笔记/表单" }),
        }
    }

    fn summary_mut(&mut self) -> Result<&mut SummaryData, EditError> {
        match self.group.structured_payload_mut() {
            Some(StructuredPayload::Summary(s)) => Ok(s),
            _ => Err(EditError::WrongEditor { expected: "摘要" }),
        }
    }

    fn matching_mut(&mut self) -> Result<&mut MatchingData, EditError> {
        match self.group.structured_payload_mut() {
            Some(StructuredPayload::Matching(m)) => Ok(m),
            _ => Err(EditError::WrongEditor { expected: "匹配选项" }),
        }
    }

    fn diagram_mut(&mut self) -> Result<&mut DiagramData, EditError> {
        match self.group.structured_payload_mut() {
            Some(StructuredPayload::Diagram(d)) => Ok(d),
            _ => Err(EditError::WrongEditor { expected: "图片标注" }),
        }
    }
}

fn checked_placement(x: f64, y: f64) -> Result<LabelPlacement, EditError> {
    let placement = LabelPlacement { x, y };
    if placement.is_in_bounds() {
        Ok(placement)
    } else {
        Err(EditError::LabelOutOfBounds { x, y })
    }
}

/// 判断类和匹配题的正确选项由答案决定
fn syncs_choice_flags(question_type: QuestionType) -> bool {
    question_type.fixed_choices().is_some() || question_type.editor_kind() == EditorKind::Matching
}

fn sync_choice_flags(sub_question: &mut SubQuestion) {
    let answer = sub_question.correct_answer.trim();
    for choice in &mut sub_question.choices {
        choice.is_correct = !answer.is_empty() && choice.text.eq_ignore_ascii_case(answer);
    }
}
