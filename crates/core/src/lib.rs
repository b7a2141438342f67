#![forbid(unsafe_code)]

pub mod cursor;
pub mod error;
pub mod ledger;
pub mod model;
pub mod time;
pub mod timer;

pub use cursor::Cursor;
pub use error::Error;
pub use ledger::{AnswerLedger, AnswerRecord, QuestionStatus};
pub use time::Clock;
pub use timer::CountdownTimer;
