pub mod confluence;
pub mod jira;
pub mod openai;
