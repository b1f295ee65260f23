//! Shared helpers for integration tests. Not every test binary uses every helper.
#![allow(dead_code)]

pub mod fake_tool;
pub mod http_server;
