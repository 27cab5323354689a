//! CalorieBeta Library
//!
//! Calorie, macro, and body weight tracking behind an MCP server.

pub mod build_info;
pub mod catalog;
pub mod config;
pub mod db;
pub mod events;
pub mod mcp;
pub mod models;
pub mod nutrition;
pub mod tools;
