pub mod authoring_session;
pub mod confirm;
pub mod save_ctx;
pub mod save_flow;

pub use authoring_session::AuthoringSession;
pub use confirm::{AutoConfirm, Confirm};
pub use save_ctx::SaveCtx;
pub use save_flow::{SaveFlow, SaveReport, UpdateFailure};
