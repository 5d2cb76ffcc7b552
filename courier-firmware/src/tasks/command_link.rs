//! UART command link task
//!
//! Reassembles request frames from the serial stream, runs each command
//! synchronously, and writes the framed response back on the same link.

use defmt::*;
use embassy_rp::uart::{BufferedUartRx, BufferedUartTx};
use embedded_io_async::{Read, Write};

use courier_core::{CommandDispatcher, CommandRegistry};
use courier_protocol::{
    decode_frame, CommandRequest, FrameOptions, FrameParser, MAX_REQUEST_FRAME,
    MAX_RESPONSE_FRAME,
};

use crate::node::{RESPONSE_SLOT, RESPONSE_TOPIC, UPTIME};

/// Buffer size for UART receive
const RX_BUF_SIZE: usize = 64;

#[embassy_executor::task]
pub async fn command_link_task(
    mut rx: BufferedUartRx,
    mut tx: BufferedUartTx,
    registry: &'static CommandRegistry<'static>,
) {
    info!("Command link started ({} commands)", registry.len());

    // Only this task dispatches commands
    let mut dispatcher = CommandDispatcher::new(registry, &RESPONSE_TOPIC, &RESPONSE_SLOT, &UPTIME);
    let mut parser = FrameParser::<MAX_REQUEST_FRAME>::new();
    let mut buf = [0u8; RX_BUF_SIZE];

    loop {
        let n = match rx.read(&mut buf).await {
            Ok(n) => n,
            Err(e) => {
                warn!("UART read error: {:?}", e);
                continue;
            }
        };

        trace!("RX: {} bytes", n);

        for &byte in &buf[..n] {
            let mut out = [0u8; MAX_RESPONSE_FRAME];
            let len = match parser.feed(byte) {
                Ok(Some(frame)) => match handle_frame(&mut dispatcher, frame, &mut out) {
                    Some(len) => len,
                    None => continue,
                },
                Ok(None) => continue,
                Err(e) => {
                    warn!("Frame rejected: {:?}", e);
                    continue;
                }
            };

            if let Err(e) = tx.write_all(&out[..len]).await {
                warn!("Failed to send response: {:?}", e);
            }
        }
    }
}

/// Decode, execute, and encode one request
///
/// Returns the length of the response frame in `out`, or `None` when the
/// request could not be decoded (no response is sent).
fn handle_frame(
    dispatcher: &mut CommandDispatcher<'_>,
    frame: &[u8],
    out: &mut [u8; MAX_RESPONSE_FRAME],
) -> Option<usize> {
    // The parser only yields frames that already passed validation
    let view = decode_frame(frame).ok()?;

    let request = match CommandRequest::from_payload(view.payload) {
        Ok(request) => request,
        Err(e) => {
            warn!("Malformed request: {:?}", e);
            return None;
        }
    };

    let ok = dispatcher.dispatch_sync(&request);
    let response = dispatcher.last_response();
    debug!(
        "Command {:?} -> {:?} (ok={})",
        request.key, response.status, ok
    );

    // Answer on the stream the request came from
    let options = FrameOptions {
        stream_id: view.stream_id,
        ..FrameOptions::single()
    };
    match response.encode(options, out) {
        Ok(len) => Some(len),
        Err(e) => {
            error!("Response encoding failed: {:?}", e);
            None
        }
    }
}
