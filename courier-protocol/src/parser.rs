//! Incremental frame reassembly for byte streams.
//!
//! Serial links deliver frames in arbitrary chunks, possibly preceded by
//! line noise. [`FrameParser`] buffers bytes until a complete frame has
//! arrived, re-synchronizing on the magic bytes, and hands back the raw
//! frame once it passes [`decode_frame`] validation.
//!
//! A rejected candidate only costs its first byte: the parser rescans the
//! bytes it already buffered for the next magic, so a real frame that
//! started inside a false header is still found.

use heapless::Vec;

use crate::frame::{
    decode_frame, FrameError, FRAME_OVERHEAD, HEADER_SIZE, MAGIC, OFF_LEN, OFF_VERSION, VERSION,
};

/// State machine for collecting frames from a byte stream
///
/// `N` is the largest complete frame (header, payload and CRC) the parser
/// can hold. Frames declaring a longer payload are rejected as soon as
/// their header is complete.
#[derive(Debug, Clone)]
pub struct FrameParser<const N: usize> {
    buffer: Vec<u8, N>,
    /// Length of the frame handed out by the last `feed`, dropped on the next
    returned: usize,
}

/// Outcome of inspecting the front of the buffer
enum Candidate {
    /// The buffer holds a valid prefix; more bytes are needed
    Incomplete,
    /// A complete, validated frame of this length starts at offset 0
    Frame(usize),
    /// The candidate starting at offset 0 can never become a valid frame
    Rejected(FrameError),
}

impl<const N: usize> Default for FrameParser<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> FrameParser<N> {
    /// Create a new frame parser
    pub const fn new() -> Self {
        Self {
            buffer: Vec::new(),
            returned: 0,
        }
    }

    /// Reset the parser state, discarding buffered bytes
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.returned = 0;
    }

    /// Feed a single byte to the parser
    ///
    /// Returns `Ok(Some(frame))` with the complete, validated frame bytes,
    /// `Ok(None)` when more bytes are needed, or `Err` when a candidate
    /// frame was rejected. After a rejection the parser keeps scanning the
    /// bytes after the rejected magic, so no later frame is lost.
    pub fn feed(&mut self, byte: u8) -> Result<Option<&[u8]>, FrameError> {
        if self.returned > 0 {
            let returned = self.returned;
            self.returned = 0;
            self.discard(returned);
        }

        if self.buffer.push(byte).is_err() {
            self.reset();
            return Err(FrameError::BufferTooSmall);
        }

        let mut rejected = None;
        loop {
            match self.inspect() {
                Candidate::Incomplete => break,
                Candidate::Frame(len) => {
                    // A frame found right after a rejection wins over the error
                    self.returned = len;
                    return Ok(Some(&self.buffer[..len]));
                }
                Candidate::Rejected(e) => {
                    rejected.get_or_insert(e);
                    self.discard(1);
                }
            }
        }

        match rejected {
            Some(e) => Err(e),
            None => Ok(None),
        }
    }

    /// Skip noise up to the next magic and judge the candidate there
    fn inspect(&mut self) -> Candidate {
        loop {
            match self.buffer.iter().position(|&b| b == MAGIC[0]) {
                Some(start) => self.discard(start),
                None => {
                    self.buffer.clear();
                    return Candidate::Incomplete;
                }
            }

            // A lone first magic byte followed by anything else is noise
            match self.buffer.get(1).copied() {
                None => return Candidate::Incomplete,
                Some(b) if b != MAGIC[1] => self.discard(1),
                Some(_) => break,
            }
        }

        match self.buffer.get(OFF_VERSION).copied() {
            None => return Candidate::Incomplete,
            Some(v) if v != VERSION => {
                return Candidate::Rejected(FrameError::UnsupportedVersion)
            }
            Some(_) => {}
        }

        if self.buffer.len() < HEADER_SIZE {
            return Candidate::Incomplete;
        }

        let payload_len =
            u16::from_le_bytes([self.buffer[OFF_LEN], self.buffer[OFF_LEN + 1]]) as usize;
        let total = payload_len + FRAME_OVERHEAD;
        if total > N {
            return Candidate::Rejected(FrameError::PayloadTooLarge);
        }
        if self.buffer.len() < total {
            return Candidate::Incomplete;
        }

        match decode_frame(&self.buffer[..total]) {
            Ok(_) => Candidate::Frame(total),
            Err(e) => Candidate::Rejected(e),
        }
    }

    /// Drop the first `count` buffered bytes
    fn discard(&mut self, count: usize) {
        let len = self.buffer.len();
        if count >= len {
            self.buffer.clear();
            return;
        }
        self.buffer.copy_within(count.., 0);
        self.buffer.truncate(len - count);
    }
}
