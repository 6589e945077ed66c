//! Chat and mind-map backend: session memory, prompt assembly, web context and
//! resilient JSON recovery behind a small HTTP API.

// Interdiction stricte de pratiques dangereuses ou non idiomatiques
#![deny(unsafe_code)] // Le code unsafe est interdit
#![deny(missing_docs)] // Toute fonction, struct, enum ou module public doit être documenté
#![deny(non_camel_case_types)]
#![deny(unused_must_use)] // Oblige à gérer explicitement les Result et Option
#![deny(nonstandard_style)]
#![forbid(unsafe_op_in_unsafe_fn)]
// Clippy pour stricte discipline
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![deny(clippy::unwrap_used)] // Interdit unwrap()
#![deny(clippy::expect_used)] // Interdit expect()
#![deny(clippy::panic)] // Interdit panic!()
#![deny(clippy::print_stdout)] // Interdit println!() en production
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
#![deny(clippy::redundant_clone)]
#![deny(clippy::shadow_unrelated)]
#![deny(clippy::too_many_arguments)]
#![deny(clippy::cognitive_complexity)]
#![cfg_attr(
    test,
    allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)
)]

/// Application configuration loaded from the environment.
pub mod config;
/// Session bookkeeping: turns, titles and the store abstraction.
pub mod conversation;
/// Conversational model clients.
#[allow(clippy::missing_errors_doc)]
pub mod llm;
/// Background maintenance of the session store.
pub mod maintenance;
/// Prompt assembly from history, query and web context.
pub mod prompt;
/// Multi-stage recovery of JSON objects from model output.
pub mod recovery;
/// Web search and page extraction used as prompt context.
#[allow(
    clippy::doc_markdown,
    clippy::missing_errors_doc,
    clippy::cast_precision_loss
)]
pub mod scraping;
/// HTTP server and API routes.
#[allow(clippy::missing_errors_doc, clippy::unused_async)]
pub mod server;
/// Entry helpers to start the chatmap server.
pub mod start_chatmap;
