pub mod record;
pub mod run;

pub use record::{QuestionRef, StudentAnswerRecord, CSV_HEADER};
pub use run::{ExtractionRun, RunState, RunStatus, RunSummary};
