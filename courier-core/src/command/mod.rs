//! Command routing: handlers, registry, dispatcher

mod dispatcher;
mod handler;
mod handlers;
mod registry;
mod response;

pub use dispatcher::CommandDispatcher;
pub use handler::CommandHandler;
pub use handlers::{GetCounterCommand, PingCommand};
pub use registry::{CommandRegistry, RegistryError, MAX_COMMANDS};
pub use response::ResponseEvent;
