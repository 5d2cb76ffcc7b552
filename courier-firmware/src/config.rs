//! Node configuration
//!
//! Values come from node.toml, validated and compiled in by build.rs.

include!(concat!(env!("OUT_DIR"), "/node_config.rs"));

/// UART RX/TX ring buffer size
pub const UART_BUF_SIZE: usize = 256;
