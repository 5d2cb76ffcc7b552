//! Command request/response types and their payload codec
//!
//! Request payload:  `[cluster][command_id][params_len][params 0-8]`
//! Response payload: `[cluster][command_id][status][data_len][data 0-16]`
//!
//! Both travel inside a single frame (see [`crate::frame`]).

use crate::frame::{decode_frame, encode_frame, FrameError, FrameOptions, FRAME_OVERHEAD};

/// Maximum request parameter bytes
pub const MAX_PARAMS: usize = 8;

/// Maximum response data bytes
pub const MAX_DATA: usize = 16;

/// Request payload header (cluster + command id + params length)
pub const REQUEST_HEADER_SIZE: usize = 3;

/// Response payload header (cluster + command id + status + data length)
pub const RESPONSE_HEADER_SIZE: usize = 4;

/// Largest encoded request frame
pub const MAX_REQUEST_FRAME: usize = FRAME_OVERHEAD + REQUEST_HEADER_SIZE + MAX_PARAMS;

/// Largest encoded response frame
pub const MAX_RESPONSE_FRAME: usize = FRAME_OVERHEAD + RESPONSE_HEADER_SIZE + MAX_DATA;

// Well-known command ids
/// System cluster: connectivity check, returns uptime ticks
pub const SYSTEM_PING: u8 = 0x01;
/// Sensor cluster: current tick counter value
pub const SENSOR_GET_COUNTER: u8 = 0x01;

/// Errors from encoding or decoding command payloads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CodecError {
    /// The enclosing frame was invalid
    Frame(FrameError),
    /// Payload shorter than its fixed header
    PayloadTooShort,
    /// Declared parameter length exceeds [`MAX_PARAMS`]
    ParamsTooLong,
    /// Declared data length exceeds [`MAX_DATA`]
    DataTooLong,
    /// Payload length disagrees with the declared field length
    LengthMismatch,
    /// Response status byte is not a known status
    UnknownStatus(u8),
}

impl From<FrameError> for CodecError {
    fn from(e: FrameError) -> Self {
        CodecError::Frame(e)
    }
}

/// First-level routing of commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Cluster {
    /// Node-level commands (ping, info)
    System,
    /// Sensor and counter readouts
    Sensor,
    /// Cluster byte this firmware does not know; still routable
    Unknown(u8),
}

// Wire format values
const CLUSTER_SYSTEM: u8 = 0x00;
const CLUSTER_SENSOR: u8 = 0x01;

impl Cluster {
    /// Parse a cluster from its wire format byte
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            CLUSTER_SYSTEM => Cluster::System,
            CLUSTER_SENSOR => Cluster::Sensor,
            other => Cluster::Unknown(other),
        }
    }

    /// Convert to wire format byte
    pub fn to_byte(self) -> u8 {
        match self {
            Cluster::System => CLUSTER_SYSTEM,
            Cluster::Sensor => CLUSTER_SENSOR,
            Cluster::Unknown(byte) => byte,
        }
    }
}

/// Outcome of a command, carried inline in the response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum CommandStatus {
    /// Command executed
    #[default]
    Success = 0,
    /// No handler registered for the key
    NotFound = 1,
    /// Handler rejected the parameters
    InvalidParam = 2,
    /// Handler cannot serve the command right now
    Busy = 3,
    /// Handler failed
    Error = 4,
}

impl CommandStatus {
    /// Parse a status from its wire format byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(CommandStatus::Success),
            1 => Some(CommandStatus::NotFound),
            2 => Some(CommandStatus::InvalidParam),
            3 => Some(CommandStatus::Busy),
            4 => Some(CommandStatus::Error),
            _ => None,
        }
    }

    /// Convert to wire format byte
    pub fn to_byte(self) -> u8 {
        self as u8
    }
}

/// Identity of a command handler
///
/// Two keys are equal when both the cluster and the command id match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CommandKey {
    pub cluster: Cluster,
    pub command_id: u8,
}

impl CommandKey {
    pub const fn new(cluster: Cluster, command_id: u8) -> Self {
        Self {
            cluster,
            command_id,
        }
    }
}

impl Default for CommandKey {
    fn default() -> Self {
        Self::new(Cluster::System, 0)
    }
}

/// A decoded command request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CommandRequest {
    pub key: CommandKey,
    params: [u8; MAX_PARAMS],
    params_len: u8,
}

impl CommandRequest {
    /// Create a request, rejecting more than [`MAX_PARAMS`] parameter bytes
    pub fn new(key: CommandKey, params: &[u8]) -> Result<Self, CodecError> {
        if params.len() > MAX_PARAMS {
            return Err(CodecError::ParamsTooLong);
        }

        let mut request = Self {
            key,
            params: [0; MAX_PARAMS],
            params_len: params.len() as u8,
        };
        request.params[..params.len()].copy_from_slice(params);
        Ok(request)
    }

    /// Parameter bytes (`params_len` of them)
    pub fn params(&self) -> &[u8] {
        &self.params[..self.params_len as usize]
    }

    /// Decode a request from a complete frame
    pub fn from_frame(frame: &[u8]) -> Result<Self, CodecError> {
        let view = decode_frame(frame)?;
        Self::from_payload(view.payload)
    }

    /// Decode a request from an already deframed payload
    pub fn from_payload(payload: &[u8]) -> Result<Self, CodecError> {
        if payload.len() < REQUEST_HEADER_SIZE {
            return Err(CodecError::PayloadTooShort);
        }

        let params_len = payload[2] as usize;
        if params_len > MAX_PARAMS {
            return Err(CodecError::ParamsTooLong);
        }
        if payload.len() != REQUEST_HEADER_SIZE + params_len {
            return Err(CodecError::LengthMismatch);
        }

        let key = CommandKey::new(Cluster::from_byte(payload[0]), payload[1]);
        Self::new(key, &payload[REQUEST_HEADER_SIZE..])
    }

    /// Encode this request as a complete frame
    ///
    /// Returns the number of bytes written.
    pub fn encode(&self, options: FrameOptions, buffer: &mut [u8]) -> Result<usize, CodecError> {
        let mut payload = [0u8; REQUEST_HEADER_SIZE + MAX_PARAMS];
        let params = self.params();
        payload[0] = self.key.cluster.to_byte();
        payload[1] = self.key.command_id;
        payload[2] = params.len() as u8;
        payload[REQUEST_HEADER_SIZE..REQUEST_HEADER_SIZE + params.len()].copy_from_slice(params);

        let len = REQUEST_HEADER_SIZE + params.len();
        Ok(encode_frame(&payload[..len], options, buffer)?)
    }
}

/// Result of executing a command
///
/// Handlers fill `status` and, when returning data, the data buffer
/// through [`set_data`](Self::set_data) or [`set_u32`](Self::set_u32).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CommandResponse {
    pub key: CommandKey,
    pub status: CommandStatus,
    data: [u8; MAX_DATA],
    data_len: u8,
}

impl CommandResponse {
    /// Create an empty, successful response for `key`
    pub const fn new(key: CommandKey) -> Self {
        Self {
            key,
            status: CommandStatus::Success,
            data: [0; MAX_DATA],
            data_len: 0,
        }
    }

    /// Data bytes (`data_len` of them)
    pub fn data(&self) -> &[u8] {
        &self.data[..self.data_len as usize]
    }

    /// Replace the data, rejecting more than [`MAX_DATA`] bytes
    pub fn set_data(&mut self, data: &[u8]) -> Result<(), CodecError> {
        if data.len() > MAX_DATA {
            return Err(CodecError::DataTooLong);
        }
        self.data[..data.len()].copy_from_slice(data);
        self.data_len = data.len() as u8;
        Ok(())
    }

    /// Store a `u32` as 4 little-endian data bytes
    pub fn set_u32(&mut self, value: u32) {
        self.data[..4].copy_from_slice(&value.to_le_bytes());
        self.data_len = 4;
    }

    /// Drop any data
    pub fn clear_data(&mut self) {
        self.data_len = 0;
    }

    /// Encode this response as a complete frame
    ///
    /// Returns the number of bytes written.
    pub fn encode(&self, options: FrameOptions, buffer: &mut [u8]) -> Result<usize, CodecError> {
        let data = self.data();
        let mut payload = [0u8; RESPONSE_HEADER_SIZE + MAX_DATA];
        payload[0] = self.key.cluster.to_byte();
        payload[1] = self.key.command_id;
        payload[2] = self.status.to_byte();
        payload[3] = data.len() as u8;
        payload[RESPONSE_HEADER_SIZE..RESPONSE_HEADER_SIZE + data.len()].copy_from_slice(data);

        let len = RESPONSE_HEADER_SIZE + data.len();
        Ok(encode_frame(&payload[..len], options, buffer)?)
    }

    /// Decode a response from a complete frame (host side)
    pub fn from_frame(frame: &[u8]) -> Result<Self, CodecError> {
        let view = decode_frame(frame)?;
        Self::from_payload(view.payload)
    }

    /// Decode a response from an already deframed payload
    pub fn from_payload(payload: &[u8]) -> Result<Self, CodecError> {
        if payload.len() < RESPONSE_HEADER_SIZE {
            return Err(CodecError::PayloadTooShort);
        }

        let data_len = payload[3] as usize;
        if data_len > MAX_DATA {
            return Err(CodecError::DataTooLong);
        }
        if payload.len() != RESPONSE_HEADER_SIZE + data_len {
            return Err(CodecError::LengthMismatch);
        }

        let status =
            CommandStatus::from_byte(payload[2]).ok_or(CodecError::UnknownStatus(payload[2]))?;
        let key = CommandKey::new(Cluster::from_byte(payload[0]), payload[1]);
        let mut response = Self::new(key);
        response.status = status;
        response.set_data(&payload[RESPONSE_HEADER_SIZE..])?;
        Ok(response)
    }
}
