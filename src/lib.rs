//! Prenatal health assistant: symptom classification, risk mapping, remedy
//! ranking, vitals and CTG status, and a chat-model collaborator.

pub mod api;
pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod llm;
pub mod logging;
pub mod nlp;
