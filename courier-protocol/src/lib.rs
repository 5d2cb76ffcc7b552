//! Courier Command Protocol
//!
//! This crate defines the binary wire protocol used by a host to issue
//! commands to a Courier node and to receive the responses. It has no
//! knowledge of the link carrying the bytes (UART, USB CDC, BLE...).
//!
//! # Protocol Overview
//!
//! Every message travels inside a length-prefixed, checksummed frame
//! (all multi-byte integers little-endian):
//! ```text
//! ┌─────────┬─────┬───────┬──────┬────────┬─────────────┬────────┐
//! │ MAGIC   │ VER │ FLAGS │ SID  │ LENGTH │ PAYLOAD     │ CRC16  │
//! │ AC DA   │ 1B  │ 1B    │ 1B   │ 2B     │ 0–65535B    │ 2B     │
//! └─────────┴─────┴───────┴──────┴────────┴─────────────┴────────┘
//! ```
//!
//! The CRC covers header and payload. Command requests and responses are
//! small fixed-layout payloads carried inside a single frame:
//! ```text
//! request:  [cluster][command_id][params_len][params 0-8]
//! response: [cluster][command_id][status][data_len][data 0-16]
//! ```

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod command;
pub mod crc;
pub mod frame;
pub mod parser;

pub use command::{
    Cluster, CodecError, CommandKey, CommandRequest, CommandResponse, CommandStatus,
    MAX_DATA, MAX_PARAMS, MAX_REQUEST_FRAME, MAX_RESPONSE_FRAME, SENSOR_GET_COUNTER, SYSTEM_PING,
};
pub use crc::crc16;
pub use frame::{
    decode_frame, encode_frame, FrameError, FrameOptions, FrameView, FLAG_FIN, FRAME_OVERHEAD,
    HEADER_SIZE, MAGIC, MAX_PAYLOAD_SIZE, STREAM_NONE, VERSION,
};
pub use parser::FrameParser;
