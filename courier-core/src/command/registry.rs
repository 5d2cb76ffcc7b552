//! Fixed-capacity key to handler table

use courier_protocol::CommandKey;
use heapless::Vec;

use super::handler::CommandHandler;

/// Maximum number of registered handlers
pub const MAX_COMMANDS: usize = 8;

/// Why a registration was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegistryError {
    /// [`MAX_COMMANDS`] handlers are already registered
    Full,
    /// A handler with the same key is already registered
    Duplicate,
}

/// Lookup table for command handlers
///
/// Filled once at startup; lookups are a linear scan over at most
/// [`MAX_COMMANDS`] entries.
pub struct CommandRegistry<'a> {
    handlers: Vec<&'a dyn CommandHandler, MAX_COMMANDS>,
}

impl Default for CommandRegistry<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> CommandRegistry<'a> {
    pub const fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    /// Add a handler under its own key
    pub fn register(&mut self, handler: &'a dyn CommandHandler) -> Result<(), RegistryError> {
        if self.handlers.is_full() {
            return Err(RegistryError::Full);
        }

        let key = handler.key();
        if self.find(key).is_some() {
            return Err(RegistryError::Duplicate);
        }

        self.handlers
            .push(handler)
            .map_err(|_| RegistryError::Full)
    }

    /// Handler registered for `key`, if any
    pub fn find(&self, key: CommandKey) -> Option<&'a dyn CommandHandler> {
        self.handlers.iter().copied().find(|h| h.key() == key)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
