//! Core types & traits: protocol envelopes, content shapes, errors and the tool contract.

pub mod content;
pub mod error;
pub mod mcp;
pub mod tool;
