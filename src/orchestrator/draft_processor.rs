//! 单个草稿处理器 - 编排层
//!
//! 1. 跳过已经保存过的草稿（带 `saved_group_id`）
//! 2. 读取草稿引用的图片
//! 3. 在编辑会话中重新生成结构化题型的小题（保留已有答案）
//! 4. 两阶段保存
//! 5. 完全成功时删除草稿文件；题组已保存但草稿保留时，把题组 id 写回草稿

use std::path::Path;
use tokio::fs;
use tracing::{error, info, warn};

use crate::clients::gateway::PersistenceGateway;
use crate::config::Config;
use crate::error::{AppError, AppResult, FileError, GenerationError, SaveError};
use crate::models::loaders::{load_image, mark_draft_saved, GroupDraft};
use crate::models::sub_question::RecordId;
use crate::services::stub_generator::count_units;
use crate::workflow::{AuthoringSession, AutoConfirm, SaveCtx, SaveFlow};

/// 草稿处理结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftOutcome {
    /// 题组和所有小题都已保存
    Saved,
    /// 题组已保存，部分小题失败
    Partial,
    /// 未能保存
    Failed,
    /// 之前已保存过，需要人工核对
    Skipped,
}

/// 处理单个草稿
///
/// # 参数
/// - `gateway`: 持久化网关
/// - `draft`: 草稿
/// - `draft_index`: 草稿序号（用于日志）
/// - `config`: 配置
pub async fn process_draft<G: PersistenceGateway>(
    gateway: &G,
    draft: GroupDraft,
    draft_index: usize,
    config: &Config,
) -> AppResult<DraftOutcome> {
    let ctx = SaveCtx::new(draft_index, draft.source_name());

    if let Some(group_id) = draft.saved_group_id {
        warn!(
            "{} ⏭️ {} 已保存为题组 {}，跳过（核对后删除该文件或去掉 saved_group_id）",
            ctx, ctx.source, group_id
        );
        return Ok(DraftOutcome::Skipped);
    }

    log_draft_start(&ctx, &draft);

    let image = load_image(&draft).await?;
    let file_path = draft.file_path.clone();

    // 导入不做交互，破坏性操作一律拒绝
    let mut session = AuthoringSession::from_group(draft.group, AutoConfirm(false))
        .with_strategy(config.reconcile_strategy)
        .with_image(image);

    let derived = session
        .group()
        .question_type
        .map(|t| t.is_derived())
        .unwrap_or(false);
    if derived {
        match session.regenerate() {
            Ok(count) => info!("{} 已生成 {} 个小题", ctx, count),
            Err(AppError::Generation(e @ GenerationError::NoCountableUnits { .. })) => {
                warn!("{} ⚠️ {}，沿用草稿中的小题", ctx, e);
            }
            Err(e) => return Err(e),
        }
    }

    if let Err(e) = session.finalize() {
        error!("{} ❌ 草稿未通过校验: {}", ctx, e);
        return Ok(DraftOutcome::Failed);
    }

    let flow = SaveFlow::new(gateway, config);
    let (outcome, persisted_group) = match session.save(&flow, &ctx).await {
        Ok(report) if report.is_complete_success() => (DraftOutcome::Saved, Some(report.group_id)),
        Ok(report) => {
            for failure in &report.update_failures {
                warn!("{} 第 {} 题更新失败: {}", ctx, failure.order, failure.reason);
            }
            for message in &report.create_errors {
                warn!("{} 新建失败: {}", ctx, message);
            }
            (DraftOutcome::Partial, Some(report.group_id))
        }
        Err(AppError::Save(SaveError::QuestionPassFailed {
            group_id,
            report,
            source,
        })) => {
            error!("{} ❌ 题组 {} 已保存，批量创建失败: {}", ctx, group_id, source);
            warn!("{} {}", ctx, report.summary());
            (DraftOutcome::Partial, Some(group_id))
        }
        Err(e) => {
            error!("{} ❌ 保存失败: {}", ctx, e);
            (DraftOutcome::Failed, None)
        }
    };

    if let (Some(path), Some(group_id)) = (file_path.as_deref(), persisted_group) {
        if outcome == DraftOutcome::Saved && config.remove_saved_drafts {
            cleanup_file(path, &ctx).await?;
        } else {
            record_saved_group(path, group_id, &ctx).await?;
        }
    }

    match outcome {
        DraftOutcome::Saved => info!("{} ✅ 草稿处理完成\n", ctx),
        _ => warn!("{} ⚠️ 草稿未完全保存，已保留文件\n", ctx),
    }
    Ok(outcome)
}

/// 删除已保存的草稿文件
async fn cleanup_file(path: &Path, ctx: &SaveCtx) -> Result<(), FileError> {
    if !path.exists() {
        warn!("{} ⚠️ 文件不存在: {}", ctx, path.display());
        return Ok(());
    }
    fs::remove_file(path)
        .await
        .map_err(|source| FileError::DeleteFailed {
            path: path.display().to_string(),
            source,
        })?;
    info!("{} 🗑️ 草稿已删除: {}", ctx, ctx.source);
    Ok(())
}

/// 题组已在服务端，保留的草稿记下题组 id，重复运行时不会再建一个题组
async fn record_saved_group(path: &Path, group_id: RecordId, ctx: &SaveCtx) -> Result<(), FileError> {
    mark_draft_saved(path, group_id).await?;
    info!("{} 📝 已在草稿中记录题组 id {}", ctx, group_id);
    Ok(())
}

fn log_draft_start(ctx: &SaveCtx, draft: &GroupDraft) {
    info!("{} 开始处理: {}", ctx, ctx.source);
    info!("{} 标题: {}", ctx, draft.group.title);
    info!(
        "{} 题型: {}",
        ctx,
        draft
            .group
            .question_type
            .map(|t| t.to_string())
            .unwrap_or_else(|| "未设置".to_string())
    );
    if let Some(payload) = draft.group.structured_payload() {
        info!("{} 空位/标签数: {}", ctx, count_units(payload));
    }
    info!("{} 小题数: {}", ctx, draft.group.len());
}
