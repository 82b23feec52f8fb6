//! 编排层（Orchestration Layer）
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 批量草稿处理器
//! - 管理应用生命周期（初始化、运行）
//! - 扫描并加载草稿目录（Vec<GroupDraft>）
//! - 串行处理并输出全局统计
//!
//! ### `draft_processor` - 单个草稿处理器
//! - 在编辑会话中重新生成小题
//! - 调用两阶段保存
//! - 清理已保存的草稿文件
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<GroupDraft>)
//!     ↓
//! draft_processor (处理单个 GroupDraft)
//!     ↓
//! workflow::AuthoringSession / SaveFlow
//!     ↓
//! services (生成 / 调和 / 校验 / 组装)
//!     ↓
//! clients (PersistenceGateway)
//! ```

pub mod batch_processor;
pub mod draft_processor;

pub use batch_processor::App;
pub use draft_processor::{process_draft, DraftOutcome};
