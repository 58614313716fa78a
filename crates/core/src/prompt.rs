//! Prompt templates for the two-stage SQL chain

use serde::{Deserialize, Serialize};

use crate::error::InquiryError;

/// Stop sequence for SQL generation, keeps the model from inventing a result section
pub const SQL_STOP_SEQUENCE: &str = "\nSQLResult:";

/// Stage 1: question + schema -> SQL
pub const SQL_PROMPT: PromptTemplate = PromptTemplate::new(
    "Based on the table schema provided below, write only the SQL query that would answer the \n\
user's question:\n\
{schema}\n\
\n\
Question: {question}\n\
SQL Query:",
);

/// Stage 3: question + schema + query + result -> natural language answer
pub const ANSWER_PROMPT: PromptTemplate = PromptTemplate::new(
    "You are a HealthCare Claims Inquiry Agent. Provide a clear, concise natural language answer \n\
to the query below. Do not include extra explanatory text.\n\
Table Schema:\n\
{schema}\n\
\n\
Question: {question}\n\
SQL Query: {query}\n\
SQL Response: {response}\n\
Answer:",
);

/// Speaker of a chat message
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single chat message sent to a model
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }
}

/// A text template with `{name}` placeholders.
///
/// Placeholders are substituted in a single pass, so braces that appear in
/// substituted values (query results, schema comments) are left alone.
/// Brace pairs whose contents are not an identifier are copied verbatim.
#[derive(Debug, Clone, Copy)]
pub struct PromptTemplate {
    template: &'static str,
}

impl PromptTemplate {
    pub const fn new(template: &'static str) -> Self {
        Self { template }
    }

    /// Raw template text
    pub fn as_str(&self) -> &'static str {
        self.template
    }

    /// Names of the placeholders, in order of first appearance
    pub fn variables(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        let mut rest = self.template;
        while let Some(start) = rest.find('{') {
            let after = &rest[start + 1..];
            match after.find('}') {
                Some(end) if is_identifier(&after[..end]) => {
                    let name = &after[..end];
                    if !names.contains(&name) {
                        names.push(name);
                    }
                    rest = &after[end + 1..];
                }
                _ => rest = after,
            }
        }
        names
    }

    /// Substitute every placeholder. Unknown placeholders are an error.
    pub fn format(&self, values: &[(&str, &str)]) -> Result<String, InquiryError> {
        let mut out = String::with_capacity(self.template.len());
        let mut rest = self.template;

        while let Some(start) = rest.find('{') {
            out.push_str(&rest[..start]);
            let after = &rest[start + 1..];
            match after.find('}') {
                Some(end) if is_identifier(&after[..end]) => {
                    let name = &after[..end];
                    let value = values
                        .iter()
                        .find(|(key, _)| *key == name)
                        .map(|(_, value)| *value)
                        .ok_or_else(|| {
                            InquiryError::Prompt(format!("missing value for {{{name}}}"))
                        })?;
                    out.push_str(value);
                    rest = &after[end + 1..];
                }
                _ => {
                    out.push('{');
                    rest = after;
                }
            }
        }
        out.push_str(rest);

        Ok(out)
    }

    /// Render as a single user message
    pub fn format_messages(&self, values: &[(&str, &str)]) -> Result<Vec<ChatMessage>, InquiryError> {
        Ok(vec![ChatMessage::user(self.format(values)?)])
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}
