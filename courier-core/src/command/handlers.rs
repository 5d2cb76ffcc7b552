//! Built-in command handlers

use courier_protocol::{
    Cluster, CommandKey, CommandRequest, CommandResponse, CommandStatus, SENSOR_GET_COUNTER,
    SYSTEM_PING,
};

use super::handler::CommandHandler;
use crate::event::Clock;
use crate::services::CounterService;

/// System/Ping: replies with the current clock in milliseconds
pub struct PingCommand<'a> {
    clock: &'a dyn Clock,
}

impl<'a> PingCommand<'a> {
    pub const KEY: CommandKey = CommandKey::new(Cluster::System, SYSTEM_PING);

    pub fn new(clock: &'a dyn Clock) -> Self {
        Self { clock }
    }
}

impl CommandHandler for PingCommand<'_> {
    fn key(&self) -> CommandKey {
        Self::KEY
    }

    fn execute(&self, _request: &CommandRequest, response: &mut CommandResponse) {
        response.set_u32(self.clock.now_ms());
        response.status = CommandStatus::Success;
    }
}

/// Sensor/GetCounter: replies with the tick counter
pub struct GetCounterCommand<'a> {
    counter: &'a CounterService,
}

impl<'a> GetCounterCommand<'a> {
    pub const KEY: CommandKey = CommandKey::new(Cluster::Sensor, SENSOR_GET_COUNTER);

    pub fn new(counter: &'a CounterService) -> Self {
        Self { counter }
    }
}

impl CommandHandler for GetCounterCommand<'_> {
    fn key(&self) -> CommandKey {
        Self::KEY
    }

    fn execute(&self, _request: &CommandRequest, response: &mut CommandResponse) {
        response.set_u32(self.counter.count());
        response.status = CommandStatus::Success;
    }
}
