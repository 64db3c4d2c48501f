//! Interview orchestration
//!
//! [`InterviewSession`] owns the chat handle and transcript for one interview
//! and drives it through its phases:
//!
//! ```text
//! Intro --start--> Interviewing --finish--> Generating --ok--> Results
//!                       ^                        |               |
//!                       +------ batch failed ----+               |
//! Intro <----------------------- reset --------------------------+
//! ```

mod error;
mod session;

pub use error::InterviewError;
pub use session::{Exchange, InterviewSession, Phase, SessionSettings};
