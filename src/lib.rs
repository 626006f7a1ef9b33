//! MCP fetch gateway: fetch web content through a remote MCP `fetch` tool and
//! normalize the result into a flat [`domain::DocumentRecord`].

pub mod api;
pub mod cli;
pub mod clients;
pub mod core;
pub mod domain;
pub mod infra;
pub mod tools;
