//! Routes decoded requests to handlers and publishes the result

use courier_protocol::{CommandRequest, CommandResponse, CommandStatus};

use super::registry::CommandRegistry;
use super::response::ResponseEvent;
use crate::event::{Clock, EventSlot};
use crate::topic::Topic;

/// Executes requests against a registry
///
/// Every call writes the single shared response slot, so dispatching
/// takes `&mut self`: only the owner of the dispatcher can process
/// commands, one at a time.
pub struct CommandDispatcher<'a> {
    registry: &'a CommandRegistry<'a>,
    topic: &'static Topic<ResponseEvent>,
    slot: &'static EventSlot<ResponseEvent>,
    clock: &'a dyn Clock,
}

impl<'a> CommandDispatcher<'a> {
    pub fn new(
        registry: &'a CommandRegistry<'a>,
        topic: &'static Topic<ResponseEvent>,
        slot: &'static EventSlot<ResponseEvent>,
        clock: &'a dyn Clock,
    ) -> Self {
        Self {
            registry,
            topic,
            slot,
            clock,
        }
    }

    /// Execute `request` and queue the response on the response topic
    ///
    /// Returns the topic's publish result: under backpressure the
    /// response is computed (see [`last_response`](Self::last_response))
    /// but not delivered.
    pub fn dispatch(&mut self, request: &CommandRequest) -> bool {
        self.execute(request);
        self.topic.publish(self.slot)
    }

    /// Execute `request` and notify response subscribers immediately
    ///
    /// Returns whether the handler reported `Success`.
    pub fn dispatch_sync(&mut self, request: &CommandRequest) -> bool {
        self.execute(request);
        let event = self.slot.get();
        self.topic.notify(&event);
        event.response.status == CommandStatus::Success
    }

    /// Response produced by the most recent dispatch
    pub fn last_response(&self) -> CommandResponse {
        self.slot.get().response
    }

    fn execute(&mut self, request: &CommandRequest) {
        let mut event = self.slot.get();
        event.reset(request.key, self.clock.now_ms());

        match self.registry.find(request.key) {
            Some(handler) => handler.execute(request, &mut event.response),
            None => event.response.status = CommandStatus::NotFound,
        }

        self.slot.set(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommandHandler;
    use crate::dispatch::{Context, DispatchEngine, NORMAL_QUEUE_SIZE};
    use crate::testing::{FixedClock, Log};
    use courier_protocol::{Cluster, CommandKey};

    struct Echo;

    impl CommandHandler for Echo {
        fn key(&self) -> CommandKey {
            CommandKey::new(Cluster::System, 0x10)
        }

        fn execute(&self, request: &CommandRequest, response: &mut CommandResponse) {
            if request.params().is_empty() {
                response.status = CommandStatus::InvalidParam;
                return;
            }
            // Params never exceed the data capacity
            let _ = response.set_data(request.params());
        }
    }

    fn log_status(event: &ResponseEvent, context: Context) {
        if let Some(log) = context.and_then(|c| c.downcast_ref::<Log>()) {
            log.push(event.response.status.to_byte() as u32);
        }
    }

    fn echo_request(params: &[u8]) -> CommandRequest {
        CommandRequest::new(CommandKey::new(Cluster::System, 0x10), params).unwrap()
    }

    #[test]
    fn test_dispatch_sync_runs_handler() {
        static ENGINE: DispatchEngine = DispatchEngine::new();
        static TOPIC: Topic<ResponseEvent> = Topic::new("command", &ENGINE);
        static SLOT: EventSlot<ResponseEvent> = EventSlot::new(ResponseEvent::new());
        static LOG: Log = Log::new();

        let echo = Echo;
        let mut registry = CommandRegistry::new();
        registry.register(&echo).unwrap();
        let clock = FixedClock(1_000);
        let mut dispatcher = CommandDispatcher::new(&registry, &TOPIC, &SLOT, &clock);
        TOPIC.subscribe(log_status, Some(&LOG));

        assert!(dispatcher.dispatch_sync(&echo_request(&[1, 2, 3])));
        let response = dispatcher.last_response();
        assert_eq!(response.key, CommandKey::new(Cluster::System, 0x10));
        assert_eq!(response.data(), &[1, 2, 3]);
        assert_eq!(SLOT.get().envelope.timestamp, 1_000);
        assert_eq!(LOG.entries().as_slice(), &[0]);
    }

    #[test]
    fn test_handler_status_overrides_success() {
        static ENGINE: DispatchEngine = DispatchEngine::new();
        static TOPIC: Topic<ResponseEvent> = Topic::new("command", &ENGINE);
        static SLOT: EventSlot<ResponseEvent> = EventSlot::new(ResponseEvent::new());

        let echo = Echo;
        let mut registry = CommandRegistry::new();
        registry.register(&echo).unwrap();
        let clock = FixedClock(0);
        let mut dispatcher = CommandDispatcher::new(&registry, &TOPIC, &SLOT, &clock);

        assert!(dispatcher.dispatch_sync(&echo_request(&[9; 8])));
        assert!(!dispatcher.dispatch_sync(&echo_request(&[])));

        // Data from the previous call does not leak into this one
        let response = dispatcher.last_response();
        assert_eq!(response.status, CommandStatus::InvalidParam);
        assert!(response.data().is_empty());
    }

    #[test]
    fn test_unknown_key_is_not_found() {
        static ENGINE: DispatchEngine = DispatchEngine::new();
        static TOPIC: Topic<ResponseEvent> = Topic::new("command", &ENGINE);
        static SLOT: EventSlot<ResponseEvent> = EventSlot::new(ResponseEvent::new());
        static LOG: Log = Log::new();

        let registry = CommandRegistry::new();
        let clock = FixedClock(0);
        let mut dispatcher = CommandDispatcher::new(&registry, &TOPIC, &SLOT, &clock);
        TOPIC.subscribe(log_status, Some(&LOG));

        let request = CommandRequest::new(CommandKey::new(Cluster::Unknown(0x7F), 2), &[]).unwrap();
        assert!(!dispatcher.dispatch_sync(&request));

        let response = dispatcher.last_response();
        assert_eq!(response.key, request.key);
        assert_eq!(response.status, CommandStatus::NotFound);
        assert!(response.data().is_empty());
        assert_eq!(LOG.entries().as_slice(), &[CommandStatus::NotFound.to_byte() as u32]);
    }

    #[test]
    fn test_dispatch_publishes_through_engine() {
        static ENGINE: DispatchEngine = DispatchEngine::new();
        static TOPIC: Topic<ResponseEvent> = Topic::new("command", &ENGINE);
        static SLOT: EventSlot<ResponseEvent> = EventSlot::new(ResponseEvent::new());
        static LOG: Log = Log::new();

        let echo = Echo;
        let mut registry = CommandRegistry::new();
        registry.register(&echo).unwrap();
        let clock = FixedClock(0);
        let mut dispatcher = CommandDispatcher::new(&registry, &TOPIC, &SLOT, &clock);
        TOPIC.subscribe(log_status, Some(&LOG));

        // Not started: response computed, delivery rejected
        assert!(!dispatcher.dispatch(&echo_request(&[4])));
        assert_eq!(dispatcher.last_response().data(), &[4]);
        assert!(LOG.entries().is_empty());

        ENGINE.start();
        assert!(dispatcher.dispatch(&echo_request(&[5])));
        assert!(LOG.entries().is_empty());
        assert_eq!(ENGINE.drain(), 1);
        assert_eq!(LOG.entries().as_slice(), &[0]);
    }

    #[test]
    fn test_dispatch_reports_backpressure() {
        static ENGINE: DispatchEngine = DispatchEngine::new();
        static TOPIC: Topic<ResponseEvent> = Topic::new("command", &ENGINE);
        static SLOT: EventSlot<ResponseEvent> = EventSlot::new(ResponseEvent::new());

        fn ignore(_event: &ResponseEvent, _context: Context) {}

        let echo = Echo;
        let mut registry = CommandRegistry::new();
        registry.register(&echo).unwrap();
        let clock = FixedClock(0);
        let mut dispatcher = CommandDispatcher::new(&registry, &TOPIC, &SLOT, &clock);
        TOPIC.subscribe(ignore, None);
        ENGINE.start();

        for _ in 0..NORMAL_QUEUE_SIZE {
            assert!(dispatcher.dispatch(&echo_request(&[1])));
        }
        assert!(!dispatcher.dispatch(&echo_request(&[2])));
        assert_eq!(dispatcher.last_response().data(), &[2]);
        assert_eq!(ENGINE.stats().normal.overflowed, 1);
    }
}
