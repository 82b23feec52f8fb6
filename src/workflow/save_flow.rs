//! 保存流程 - 流程层
//!
//! 核心职责：定义"保存一个题组"的完整流程
//!
//! 流程顺序（严格串行，不重叠）：
//! 1. 本地校验（失败不访问网关）
//! 2. 创建/更新题组
//! 3. 逐个更新已有小题（单个失败不影响其余）
//! 4. 批量创建新小题（网关可能部分失败）
//!
//! 题组保存成功而小题保存中断时，题组会留在服务端；不做补偿回滚，
//! 错误中带有中断前的保存结果。
//!
//! 批量创建成功后，网关返回的 id 写回新小题；网关不返回 id 时题组被标记为
//! 需要重新加载，再次保存会被拒绝，避免重复创建。

use tracing::{error, info, warn};

use crate::clients::gateway::PersistenceGateway;
use crate::config::Config;
use crate::error::{AppResult, SaveError};
use crate::models::question_group::QuestionGroup;
use crate::models::sub_question::RecordId;
use crate::services::request_assembler::{assemble, ImageAttachment};
use crate::services::validator::validate_for_finalize;
use crate::workflow::save_ctx::SaveCtx;

/// 单个小题更新失败
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateFailure {
    pub id: RecordId,
    pub order: u32,
    pub reason: String,
}

/// 保存结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveReport {
    pub group_id: RecordId,
    /// true 表示本次新建了题组
    pub group_created: bool,
    pub updated: usize,
    pub update_failures: Vec<UpdateFailure>,
    pub created: usize,
    pub create_failed: usize,
    pub create_errors: Vec<String>,
    /// 新建小题的 id 未知，需要重新加载题组
    pub needs_reload: bool,
}

impl SaveReport {
    /// 所有小题都保存成功
    pub fn is_complete_success(&self) -> bool {
        self.update_failures.is_empty() && self.create_failed == 0
    }

    pub fn succeeded(&self) -> usize {
        self.updated + self.created
    }

    pub fn failed(&self) -> usize {
        self.update_failures.len() + self.create_failed
    }

    /// 一行摘要
    pub fn summary(&self) -> String {
        format!(
            "题组 {} {}: 成功 {} 条 (更新 {}, 新建 {}), 失败 {} 条",
            self.group_id,
            if self.group_created { "已创建" } else { "已更新" },
            self.succeeded(),
            self.updated,
            self.created,
            self.failed()
        )
    }
}

/// 保存流程
///
/// 不持有题组，题组由调用方显式传入
pub struct SaveFlow<'a, G: PersistenceGateway> {
    gateway: &'a G,
    normalize_order_on_save: bool,
}

impl<'a, G: PersistenceGateway> SaveFlow<'a, G> {
    /// 创建新的保存流程
    pub fn new(gateway: &'a G, config: &Config) -> Self {
        Self {
            gateway,
            normalize_order_on_save: config.normalize_order_on_save,
        }
    }

    /// 保存题组
    ///
    /// # 参数
    /// - `group`: 题组；新建成功后写回 id
    /// - `image`: 待上传的图片（可选）
    /// - `ctx`: 保存上下文（日志用）
    ///
    /// # 返回
    /// 返回合并的成功/失败统计；题组保存失败或批量创建调用本身失败时返回错误
    pub async fn save(
        &self,
        group: &mut QuestionGroup,
        image: Option<ImageAttachment>,
        ctx: &SaveCtx,
    ) -> AppResult<SaveReport> {
        if let (true, Some(group_id)) = (group.needs_reload(), group.id) {
            warn!("{} ⚠️ 题组 {} 上次新建的小题 id 未知，拒绝重复保存", ctx, group_id);
            return Err(SaveError::ReloadRequired { group_id }.into());
        }

        if self.normalize_order_on_save {
            group.normalize_orders();
        }

        validate_for_finalize(group)?;
        let plan = assemble(group, image)?;

        // ========== 第 1 步: 题组 ==========
        let (group_id, group_created) = match group.id {
            Some(id) => {
                info!("{} 📤 正在更新题组 {}...", ctx, id);
                self.gateway.update_group(id, &plan.upsert).await?;
                (id, false)
            }
            None => {
                info!("{} 📤 正在创建题组...", ctx);
                let id = self.gateway.create_group(&plan.upsert).await?;
                group.id = Some(id);
                (id, true)
            }
        };
        info!("{} ✓ 题组已保存 (id: {})", ctx, group_id);

        let mut report = SaveReport {
            group_id,
            group_created,
            ..Default::default()
        };

        // ========== 第 2 步: 逐个更新已有小题 ==========
        for update in &plan.updates {
            match self.gateway.update_sub_question(update.id, &update.fields).await {
                Ok(()) => report.updated += 1,
                Err(e) => {
                    warn!(
                        "{} ⚠️ 小题 {} (第 {} 题) 更新失败: {}",
                        ctx, update.id, update.fields.order, e
                    );
                    report.update_failures.push(UpdateFailure {
                        id: update.id,
                        order: update.fields.order,
                        reason: e.to_string(),
                    });
                }
            }
        }

        // ========== 第 3 步: 批量创建新小题 ==========
        if let Some(payload) = &plan.bulk_create {
            info!("{} 📤 正在批量创建 {} 个小题...", ctx, payload.question_count());
            match self
                .gateway
                .bulk_create_sub_questions(group_id, payload)
                .await
            {
                Ok(result) => {
                    report.created = result.created_count;
                    report.create_failed = result.error_count;
                    report.create_errors = result.error_messages();
                    if result.error_count > 0 {
                        warn!(
                            "{} ⚠️ 批量创建部分失败: 成功 {}, 失败 {}",
                            ctx, result.created_count, result.error_count
                        );
                    }

                    match result.assigned_ids(payload.question_count()) {
                        Some(ids) => group.assign_new_ids(ids),
                        None if result.created_count > 0 => {
                            warn!("{} ⚠️ 网关未返回新小题 id，再次保存前需重新加载题组", ctx);
                            group.mark_needs_reload();
                            report.needs_reload = true;
                        }
                        None => {}
                    }
                }
                Err(source) => {
                    error!("{} ❌ 批量创建失败，题组 {} 已保存但缺少小题", ctx, group_id);
                    return Err(SaveError::QuestionPassFailed {
                        group_id,
                        report: Box::new(report),
                        source,
                    }
                    .into());
                }
            }
        }

        info!("{} {}", ctx, report.summary());
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::gateway::BulkCreateResult;
    use crate::error::{AppError, GatewayError, ValidationError};
    use crate::models::question_type::QuestionType;
    use crate::models::sub_question::SubQuestion;
    use crate::services::request_assembler::{BulkCreatePayload, GroupUpsert, SubQuestionPayload};
    use std::cell::RefCell;

    /// 记录调用顺序的网关
    #[derive(Default)]
    struct RecordingGateway {
        calls: RefCell<Vec<String>>,
        failing_updates: Vec<RecordId>,
        bulk_errors: usize,
        bulk_unreachable: bool,
        returns_ids: bool,
    }

    impl PersistenceGateway for RecordingGateway {
        async fn create_group(&self, _upsert: &GroupUpsert) -> Result<RecordId, GatewayError> {
            self.calls.borrow_mut().push("create_group".into());
            Ok(100)
        }

        async fn update_group(&self, id: RecordId, _upsert: &GroupUpsert) -> Result<(), GatewayError> {
            self.calls.borrow_mut().push(format!("update_group {}", id));
            Ok(())
        }

        async fn update_sub_question(
            &self,
            id: RecordId,
            _fields: &SubQuestionPayload,
        ) -> Result<(), GatewayError> {
            self.calls.borrow_mut().push(format!("update {}", id));
            if self.failing_updates.contains(&id) {
                return Err(GatewayError::bad_response(format!("questions/{}", id), 500, "boom"));
            }
            Ok(())
        }

        async fn bulk_create_sub_questions(
            &self,
            group_id: RecordId,
            payload: &BulkCreatePayload,
        ) -> Result<BulkCreateResult, GatewayError> {
            self.calls.borrow_mut().push(format!("bulk {}", group_id));
            if self.bulk_unreachable {
                return Err(GatewayError::bad_response("bulk", 503, "unavailable"));
            }
            let total = payload.question_count();
            Ok(BulkCreateResult {
                created_count: total - self.bulk_errors,
                error_count: self.bulk_errors,
                errors: (0..self.bulk_errors)
                    .map(|i| serde_json::json!({ "message": format!("item {}", i) }))
                    .collect(),
                ids: if self.returns_ids {
                    (0..total as RecordId).map(|i| 500 + i).collect()
                } else {
                    Vec::new()
                },
            })
        }
    }

    fn sq(id: Option<RecordId>, answer: &str) -> SubQuestion {
        SubQuestion {
            id,
            text: "prompt".into(),
            correct_answer: answer.into(),
            ..Default::default()
        }
    }

    fn group_with(questions: Vec<SubQuestion>) -> QuestionGroup {
        let mut group = QuestionGroup::with_type("Questions 1-3", QuestionType::ShortAnswer);
        for q in questions {
            group.push_sub_question(q);
        }
        group
    }

    #[test]
    fn test_new_group_create_then_bulk() {
        let gateway = RecordingGateway::default();
        let flow = SaveFlow::new(&gateway, &Config::default());
        let mut group = group_with(vec![sq(None, "a"), sq(None, "b")]);

        let report =
            tokio_test::block_on(flow.save(&mut group, None, &SaveCtx::new(1, "t"))).unwrap();

        assert_eq!(group.id, Some(100));
        assert!(report.group_created);
        assert_eq!(report.created, 2);
        assert!(report.is_complete_success());
        assert_eq!(*gateway.calls.borrow(), vec!["create_group", "bulk 100"]);
    }

    #[test]
    fn test_update_failures_are_collected_independently() {
        let gateway = RecordingGateway {
            failing_updates: vec![2],
            bulk_errors: 1,
            ..Default::default()
        };
        let flow = SaveFlow::new(&gateway, &Config::default());
        let mut group = group_with(vec![sq(Some(1), "a"), sq(Some(2), "b"), sq(Some(3), "c"), sq(None, "d"), sq(None, "e")]);
        group.id = Some(9);

        let report =
            tokio_test::block_on(flow.save(&mut group, None, &SaveCtx::new(1, "t"))).unwrap();

        assert_eq!(
            *gateway.calls.borrow(),
            vec!["update_group 9", "update 1", "update 2", "update 3", "bulk 9"]
        );
        assert_eq!(report.updated, 2);
        assert_eq!(report.update_failures.len(), 1);
        assert_eq!(report.update_failures[0].id, 2);
        assert_eq!(report.update_failures[0].order, 2);
        assert_eq!(report.created, 1);
        assert_eq!(report.create_failed, 1);
        assert_eq!(report.create_errors, vec!["item 0".to_string()]);
        assert_eq!(report.succeeded(), 3);
        assert_eq!(report.failed(), 2);
        assert!(!report.is_complete_success());
    }

    #[test]
    fn test_validation_blocks_gateway() {
        let gateway = RecordingGateway::default();
        let flow = SaveFlow::new(&gateway, &Config::default());
        let mut group = group_with(vec![sq(None, "")]);

        let err = tokio_test::block_on(flow.save(&mut group, None, &SaveCtx::new(1, "t")))
            .unwrap_err();

        assert!(matches!(
            err,
            AppError::Validation(ValidationError::EmptyAnswers { .. })
        ));
        assert!(gateway.calls.borrow().is_empty());
    }

    #[test]
    fn test_bulk_failure_after_group_saved() {
        let gateway = RecordingGateway {
            bulk_unreachable: true,
            ..Default::default()
        };
        let flow = SaveFlow::new(&gateway, &Config::default());
        let mut group = group_with(vec![sq(None, "a")]);

        let err = tokio_test::block_on(flow.save(&mut group, None, &SaveCtx::new(1, "t")))
            .unwrap_err();

        assert!(matches!(
            err,
            AppError::Save(SaveError::QuestionPassFailed { group_id: 100, .. })
        ));
        // 题组已持久化，id 保留以便再次保存时走更新
        assert_eq!(group.id, Some(100));
    }

    #[test]
    fn test_bulk_failure_keeps_update_results() {
        let gateway = RecordingGateway {
            failing_updates: vec![1],
            bulk_unreachable: true,
            ..Default::default()
        };
        let flow = SaveFlow::new(&gateway, &Config::default());
        let mut group = group_with(vec![sq(Some(1), "a"), sq(Some(2), "b"), sq(None, "c")]);
        group.id = Some(3);

        let err = tokio_test::block_on(flow.save(&mut group, None, &SaveCtx::new(1, "t")))
            .unwrap_err();

        match err {
            AppError::Save(SaveError::QuestionPassFailed {
                group_id, report, ..
            }) => {
                assert_eq!(group_id, 3);
                assert_eq!(report.updated, 1);
                assert_eq!(report.update_failures.len(), 1);
                assert_eq!(report.update_failures[0].id, 1);
                assert_eq!(report.created, 0);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_returned_ids_turn_resave_into_updates() {
        let gateway = RecordingGateway {
            returns_ids: true,
            ..Default::default()
        };
        let flow = SaveFlow::new(&gateway, &Config::default());
        let mut group = group_with(vec![sq(None, "a"), sq(None, "b")]);

        tokio_test::block_on(flow.save(&mut group, None, &SaveCtx::new(1, "t"))).unwrap();
        let ids: Vec<Option<RecordId>> = group.sub_questions().iter().map(|q| q.id).collect();
        assert_eq!(ids, vec![Some(500), Some(501)]);

        let report =
            tokio_test::block_on(flow.save(&mut group, None, &SaveCtx::new(1, "t"))).unwrap();
        assert_eq!(report.updated, 2);
        assert_eq!(report.created, 0);
        assert_eq!(
            *gateway.calls.borrow(),
            vec!["create_group", "bulk 100", "update_group 100", "update 500", "update 501"]
        );
    }

    #[test]
    fn test_resave_refused_when_created_ids_unknown() {
        let gateway = RecordingGateway::default();
        let flow = SaveFlow::new(&gateway, &Config::default());
        let mut group = group_with(vec![sq(None, "a")]);

        let report =
            tokio_test::block_on(flow.save(&mut group, None, &SaveCtx::new(1, "t"))).unwrap();
        assert!(report.needs_reload);
        assert!(group.needs_reload());

        let err = tokio_test::block_on(flow.save(&mut group, None, &SaveCtx::new(1, "t")))
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Save(SaveError::ReloadRequired { group_id: 100 })
        ));
        assert_eq!(*gateway.calls.borrow(), vec!["create_group", "bulk 100"]);
    }

    #[test]
    fn test_manual_orders_pass_through_unless_configured() {
        let gateway = RecordingGateway {
            returns_ids: true,
            ..Default::default()
        };
        let mut group = group_with(vec![sq(None, "a"), sq(None, "b")]);
        group.set_order(1, 7).unwrap();

        let flow = SaveFlow::new(&gateway, &Config::default());
        tokio_test::block_on(flow.save(&mut group, None, &SaveCtx::new(1, "t"))).unwrap();
        assert_eq!(group.sub_questions()[1].order, 7);

        let config = Config {
            normalize_order_on_save: true,
            ..Config::default()
        };
        let flow = SaveFlow::new(&gateway, &config);
        tokio_test::block_on(flow.save(&mut group, None, &SaveCtx::new(2, "t"))).unwrap();
        assert_eq!(group.sub_questions()[1].order, 2);
    }
}
