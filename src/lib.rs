//! # Group Authoring
//!
//! 题组编辑与保存：结构化载荷 → 小题生成 → 调和 → 两阶段保存
//!
//! ## 架构设计
//!
//! ### ① 模型层（Models）
//! - `models/` - 题组、小题、结构化载荷、题型
//! - `models/loaders` - TOML 草稿加载
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 纯函数能力，不做 I/O
//! - `blank_scanner` / `stub_generator` - 空位扫描与小题桩生成
//! - `reconciler` - 新旧小题调和，保留已填答案
//! - `validator` / `request_assembler` - 定稿校验与请求组装
//!
//! ### ③ 客户端层（Clients）
//! - `PersistenceGateway` - 持久化网关抽象
//! - `HttpGateway` - 基于 reqwest 的实现
//!
//! ### ④ 流程层（Workflow）
//! - `AuthoringSession` - 单个题组的编辑会话
//! - `SaveFlow` - 两阶段保存（题组 → 小题）
//!
//! ### ⑤ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 批量导入草稿目录
//! - `orchestrator/draft_processor` - 单个草稿的生成与保存

pub mod clients;
pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use clients::{HttpGateway, PersistenceGateway};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::{QuestionGroup, QuestionType, StructuredPayload, SubQuestion};
pub use orchestrator::App;
pub use workflow::{AuthoringSession, AutoConfirm, Confirm, SaveCtx, SaveFlow, SaveReport};
