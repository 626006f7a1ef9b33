pub mod fetch;
pub mod mcp_http;
pub mod normalize;
