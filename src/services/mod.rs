pub mod blank_scanner;
pub mod options_parser;
pub mod reconciler;
pub mod request_assembler;
pub mod stub_generator;
pub mod validator;

pub use options_parser::{format_options, parse_options};
pub use reconciler::{reconcile, reconcile_with, ReconcileStrategy};
pub use request_assembler::{
    assemble, BulkCreatePayload, GroupFields, GroupUpsert, ImageAttachment, SavePlan,
    SubQuestionPayload, SubQuestionUpdate,
};
pub use stub_generator::{generate_stubs, split_prompt};
