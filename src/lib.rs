//! heyllm - preset prompts for a chat-completion API, from the shell.
//!
//! `hey` merges your text into one of a handful of prompt templates, sends it
//! to an OpenAI-compatible chat-completion endpoint and prints the reply,
//! copying it to the clipboard as well. The conversation is kept on disk so
//! the next call can carry on from it.
//!
//! # Architecture
//!
//! - [`commands`] - The command table: models, parameters, templates
//! - [`dispatch`] - Resolves flags and words against the table
//! - [`session`] - Conversation state persisted between invocations
//! - [`app`] - Plans the conversation and runs one completion
//! - [`completion`] - Chat-completion client and offline mock
//! - [`http_client`] - HTTP client abstraction
//! - [`credentials`] - API key prompt and persistence
//! - [`response`] - Strips code fences from replies
//! - [`clipboard`] - Best-effort clipboard copy
//! - [`display`] - Terminal output
//! - [`config`] - Configuration management (API key, endpoint)
//!
//! # Example
//!
//! ```bash
//! # Start a conversation with a preset
//! hey sh find files over 100MB
//!
//! # Continue it: no command, so the text is appended
//! hey only in my home directory
//!
//! # Not what you wanted? Replace the last follow-up instead of appending
//! hey -o only in /var
//! ```

pub mod app;
pub mod clipboard;
pub mod commands;
pub mod completion;
pub mod config;
pub mod credentials;
pub mod dispatch;
pub mod display;
pub mod http_client;
pub mod response;
pub mod session;
