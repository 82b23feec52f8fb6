pub mod toml_loader;

pub use toml_loader::{load_all_drafts, load_draft, load_image, mark_draft_saved, GroupDraft};
