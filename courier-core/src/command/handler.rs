//! Command handler capability

use courier_protocol::{CommandKey, CommandRequest, CommandResponse};

/// A command the node can execute
///
/// Handlers are registered by reference in a
/// [`CommandRegistry`](super::CommandRegistry) and looked up by key.
pub trait CommandHandler {
    /// Key this handler answers to; must not change after registration
    fn key(&self) -> CommandKey;

    /// Execute `request`, filling `response`
    ///
    /// `response` arrives reset for the request's key with a `Success`
    /// status and no data. Handlers set the status and, if they return
    /// data, at most [`MAX_DATA`](courier_protocol::MAX_DATA) bytes.
    fn execute(&self, request: &CommandRequest, response: &mut CommandResponse);
}
