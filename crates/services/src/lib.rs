#![forbid(unsafe_code)]

pub mod error;
pub mod exam;

pub use exam_core::Clock;

pub use error::ExamError;
pub use exam::{
    ExamController, ExamPhase, ExamProgress, ExamSession, PaletteCell, SubmitOutcome, palette,
};
