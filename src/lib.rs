//! vkbot: a VK community bot adapter.
//!
//! Receives Callback API deliveries over HTTP, hands them to application
//! code through a bounded queue, and sends replies with `messages.send`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod api;
pub mod bot;
pub mod config;
pub mod logging;
pub mod tokens;
pub mod types;
pub mod webhook;
