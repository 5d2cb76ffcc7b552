//! Build script for courier-firmware
//!
//! - Sets up linker search paths and scripts for memory.x
//! - Validates node.toml and generates the node configuration constants

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

fn main() {
    setup_linker();
    let node = validate_config();
    generate_config(&node);
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    // Copy memory.x to the output directory
    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    // Tell rustc where to find memory.x
    println!("cargo:rustc-link-search={}", out_dir.display());

    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    println!("cargo:rustc-link-arg-bins=-Tlink-rp.x");
    println!("cargo:rustc-link-arg-bins=-Tdefmt.x");

    // Re-run if memory.x changes
    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Validated node settings
struct NodeConfig {
    timer_period_ms: u16,
    normal_wait_ms: u32,
    stats_interval_ms: u32,
    uart_baud: u32,
}

/// Validate node.toml at compile time
fn validate_config() -> NodeConfig {
    println!("cargo:rerun-if-changed=node.toml");

    let config_path = Path::new("node.toml");

    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: node.toml not found!                                     ║\n\
            ║                                                                  ║\n\
            ║  The firmware requires a node.toml configuration file in the     ║\n\
            ║  courier-firmware directory.                                     ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read node.toml                                 ║\n\
                ║                                                                  ║\n\
                ║  Error: {:<56} ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    let config: toml::Value = match toml::from_str(&config_content) {
        Ok(value) => value,
        Err(e) => {
            let error_msg = e.to_string();
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Invalid TOML syntax in node.toml                         ║\n\
                ╠══════════════════════════════════════════════════════════════════╣\n\
                ║                                                                  ║\n\
                {}\n\
                ║                                                                  ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                format_error_lines(&error_msg)
            );
        }
    };

    let mut errors = Vec::new();

    let timer_period_ms = read_int(&config, "timer", "period_ms", 1, u16::MAX as i64, &mut errors);
    let normal_wait_ms = read_int(&config, "dispatch", "normal_wait_ms", 1, 1000, &mut errors);
    let stats_interval_ms = read_int(&config, "monitor", "interval_ms", 100, 3_600_000, &mut errors);
    let uart_baud = read_int(&config, "uart", "baud", 1200, 921_600, &mut errors);

    if !errors.is_empty() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: Invalid node configuration                               ║\n\
            ╠══════════════════════════════════════════════════════════════════╣\n\
            {}\n\
            ╚══════════════════════════════════════════════════════════════════╝\n",
            errors
                .iter()
                .map(|e| format!("║  • {:<62} ║", e))
                .collect::<Vec<_>>()
                .join("\n")
        );
    }

    println!("cargo:warning=node.toml validated successfully");

    NodeConfig {
        timer_period_ms: timer_period_ms as u16,
        normal_wait_ms: normal_wait_ms as u32,
        stats_interval_ms: stats_interval_ms as u32,
        uart_baud: uart_baud as u32,
    }
}

/// Read `[section] key` as an integer in `min..=max`, recording problems
fn read_int(
    config: &toml::Value,
    section: &str,
    key: &str,
    min: i64,
    max: i64,
    errors: &mut Vec<String>,
) -> i64 {
    let table = match config.get(section) {
        Some(toml::Value::Table(t)) => t,
        Some(_) => {
            errors.push(format!("[{}] must be a table", section));
            return min;
        }
        None => {
            errors.push(format!("Missing [{}] section", section));
            return min;
        }
    };

    match table.get(key) {
        Some(toml::Value::Integer(value)) if (min..=max).contains(value) => *value,
        Some(toml::Value::Integer(_)) => {
            errors.push(format!("[{}] {} must be {}-{}", section, key, min, max));
            min
        }
        Some(_) => {
            errors.push(format!("[{}] {} must be an integer", section, key));
            min
        }
        None => {
            errors.push(format!("[{}] missing '{}'", section, key));
            min
        }
    }
}

/// Format error message lines with box drawing
fn format_error_lines(msg: &str) -> String {
    msg.lines()
        .map(|line| {
            let truncated = if line.len() > 64 {
                format!("{}...", &line[..61])
            } else {
                line.to_string()
            };
            format!("║  {:<64} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Write the validated settings as Rust constants into OUT_DIR
fn generate_config(node: &NodeConfig) {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let mut f = File::create(out_dir.join("node_config.rs")).unwrap();

    writeln!(f, "/// Timer service tick period").unwrap();
    writeln!(f, "pub const TIMER_PERIOD_MS: u16 = {};", node.timer_period_ms).unwrap();
    writeln!(f, "/// Bounded wait of the dispatch worker on the normal queue").unwrap();
    writeln!(f, "pub const NORMAL_WAIT_MS: u32 = {};", node.normal_wait_ms).unwrap();
    writeln!(f, "/// Interval between statistics reports").unwrap();
    writeln!(f, "pub const STATS_INTERVAL_MS: u32 = {};", node.stats_interval_ms).unwrap();
    writeln!(f, "/// Command link baud rate").unwrap();
    writeln!(f, "pub const UART_BAUD: u32 = {};", node.uart_baud).unwrap();
}
