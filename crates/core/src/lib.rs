//! claimbeaver-core: Shared types and pure logic for the claims inquiry service
//!
//! This crate holds everything that does not touch the network or the
//! database: the SQL fence extractor, the two prompt templates, chat message
//! types, and the HTTP request/response schemas.

pub mod error;
pub mod prompt;
pub mod schemas;
pub mod sql;

pub use error::InquiryError;
pub use prompt::{ANSWER_PROMPT, ChatMessage, PromptTemplate, Role, SQL_PROMPT, SQL_STOP_SEQUENCE};
pub use schemas::{AnswerResponse, ErrorResponse, Question};
pub use sql::extract_sql;
