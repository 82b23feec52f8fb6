pub mod loaders;
pub mod payload;
pub mod question_group;
pub mod question_type;
pub mod sub_question;

pub use loaders::{load_all_drafts, load_draft, GroupDraft};
pub use payload::{
    Cell, DiagramData, LabelPlacement, MatchingData, MatchingOption, NoteFormData,
    StructuredPayload, SummaryData, TableData,
};
pub use question_group::QuestionGroup;
pub use question_type::{EditorKind, QuestionType};
pub use sub_question::{Choice, RecordId, SubQuestion, SubQuestionStub};
