//! 批量草稿处理器 - 编排层
//!
//! 应用入口：初始化日志文件和网关，扫描草稿目录，逐个保存并汇总统计。
//! 草稿严格串行处理，一个保存完成后再开始下一个。

use anyhow::Context;
use tracing::{error, info, warn};

use crate::clients::http_gateway::HttpGateway;
use crate::config::Config;
use crate::error::AppResult;
use crate::models::loaders::{load_all_drafts, GroupDraft};
use crate::orchestrator::draft_processor::{process_draft, DraftOutcome};
use crate::utils::logging;

/// 应用主结构
pub struct App {
    config: Config,
    gateway: HttpGateway,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> anyhow::Result<Self> {
        logging::init_log_file(&config.output_log_file)
            .with_context(|| format!("无法写入日志文件: {}", config.output_log_file))?;
        logging::log_startup(&config.gateway_base_url, &config.draft_folder);

        let gateway = HttpGateway::new(&config).context("无法创建网关客户端")?;

        Ok(Self { config, gateway })
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> AppResult<()> {
        info!("\n📁 正在扫描待导入的草稿...");
        let drafts = load_all_drafts(&self.config.draft_folder).await?;

        if drafts.is_empty() {
            warn!("⚠️ 没有找到待导入的TOML草稿，程序结束");
            return Ok(());
        }

        logging::log_drafts_loaded(drafts.len());
        let stats = self.process_all_drafts(drafts).await;

        logging::print_final_stats(
            stats.saved,
            stats.partial,
            stats.failed,
            stats.skipped,
            stats.total,
            &self.config.output_log_file,
        );
        Ok(())
    }

    async fn process_all_drafts(&self, drafts: Vec<GroupDraft>) -> ProcessingStats {
        let mut stats = ProcessingStats {
            total: drafts.len(),
            ..Default::default()
        };

        for (idx, draft) in drafts.into_iter().enumerate() {
            let draft_index = idx + 1;
            info!("\n{}", "=".repeat(60));
            info!("📄 草稿 {}/{}", draft_index, stats.total);

            match process_draft(&self.gateway, draft, draft_index, &self.config).await {
                Ok(DraftOutcome::Saved) => stats.saved += 1,
                Ok(DraftOutcome::Partial) => stats.partial += 1,
                Ok(DraftOutcome::Failed) => stats.failed += 1,
                Ok(DraftOutcome::Skipped) => stats.skipped += 1,
                Err(e) => {
                    error!("[草稿 {}] ❌ 处理过程中发生错误: {}", draft_index, e);
                    stats.failed += 1;
                }
            }
        }

        stats
    }
}

/// 处理统计
#[derive(Debug, Default)]
struct ProcessingStats {
    saved: usize,
    partial: usize,
    failed: usize,
    skipped: usize,
    total: usize,
}
