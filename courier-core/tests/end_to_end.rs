//! Frame in, frame out: the command path wired like the firmware does it

use core::cell::RefCell;

use courier_core::{
    Clock, CommandDispatcher, CommandRegistry, Context, CounterService, DispatchEngine,
    EventSlot, GetCounterCommand, PingCommand, ResponseEvent, TimerEvent, TimerService, Topic,
};
use courier_protocol::{
    decode_frame, encode_frame, Cluster, CodecError, CommandKey, CommandRequest,
    CommandResponse, CommandStatus, FrameError, FrameOptions, FrameParser, MAX_REQUEST_FRAME,
    MAX_RESPONSE_FRAME,
};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;

struct TestClock(u32);

impl Clock for TestClock {
    fn now_ms(&self) -> u32 {
        self.0
    }
}

/// Responses seen by the response topic subscriber
struct Received(Mutex<CriticalSectionRawMutex, RefCell<Option<CommandResponse>>>);

impl Received {
    const fn new() -> Self {
        Self(Mutex::new(RefCell::new(None)))
    }

    fn take(&self) -> Option<CommandResponse> {
        self.0.lock(|r| r.borrow_mut().take())
    }
}

fn on_response(event: &ResponseEvent, context: Context) {
    if let Some(received) = context.and_then(|c| c.downcast_ref::<Received>()) {
        received.0.lock(|r| *r.borrow_mut() = Some(event.response));
    }
}

fn request_frame(cluster: Cluster, command_id: u8, params: &[u8]) -> ([u8; MAX_REQUEST_FRAME], usize) {
    let request = CommandRequest::new(CommandKey::new(cluster, command_id), params).unwrap();
    let mut frame = [0u8; MAX_REQUEST_FRAME];
    let len = request.encode(FrameOptions::single(), &mut frame).unwrap();
    (frame, len)
}

/// Decode a request frame, dispatch it synchronously, and re-frame the reply
fn roundtrip(dispatcher: &mut CommandDispatcher<'_>, frame: &[u8]) -> Result<CommandResponse, CodecError> {
    let request = CommandRequest::from_frame(frame)?;
    dispatcher.dispatch_sync(&request);

    let mut out = [0u8; MAX_RESPONSE_FRAME];
    let len = dispatcher
        .last_response()
        .encode(FrameOptions::single(), &mut out)?;
    CommandResponse::from_frame(&out[..len])
}

#[test]
fn test_ping_scenario() {
    static ENGINE: DispatchEngine = DispatchEngine::new();
    static RESPONSES: Topic<ResponseEvent> = Topic::new("command", &ENGINE);
    static SLOT: EventSlot<ResponseEvent> = EventSlot::new(ResponseEvent::new());
    static RECEIVED: Received = Received::new();

    let clock = TestClock(0x0000_1234);
    let ping = PingCommand::new(&clock);
    let mut registry = CommandRegistry::new();
    registry.register(&ping).unwrap();
    let mut dispatcher = CommandDispatcher::new(&registry, &RESPONSES, &SLOT, &clock);
    RESPONSES.subscribe(on_response, Some(&RECEIVED));

    let (frame, len) = request_frame(Cluster::System, 0x01, &[]);
    assert_eq!(
        &frame[..len],
        &[0xAC, 0xDA, 0x01, 0x01, 0x00, 0x03, 0x00, 0x00, 0x01, 0x00, 0x98, 0xF4]
    );

    let response = roundtrip(&mut dispatcher, &frame[..len]).unwrap();
    assert_eq!(response.key, CommandKey::new(Cluster::System, 0x01));
    assert_eq!(response.status, CommandStatus::Success);
    assert_eq!(response.data(), &0x1234u32.to_le_bytes());

    // Subscribers saw the same response
    assert_eq!(RECEIVED.take(), Some(response));
}

#[test]
fn test_get_counter_scenario() {
    static ENGINE: DispatchEngine = DispatchEngine::new();
    static TIMER: Topic<TimerEvent> = Topic::new("timer", &ENGINE);
    static TIMER_SLOT: EventSlot<TimerEvent> = EventSlot::new(TimerEvent::new());
    static RESPONSES: Topic<ResponseEvent> = Topic::new("command", &ENGINE);
    static SLOT: EventSlot<ResponseEvent> = EventSlot::new(ResponseEvent::new());
    static COUNTER: CounterService = CounterService::new();

    let clock = TestClock(0);
    let timer = TimerService::new(&TIMER, &TIMER_SLOT, 100);
    assert!(ENGINE.start());
    assert!(COUNTER.attach(&TIMER));

    for _ in 0..3 {
        assert!(timer.tick(&clock));
    }
    assert_eq!(ENGINE.drain(), 3);

    let get_counter = GetCounterCommand::new(&COUNTER);
    let mut registry = CommandRegistry::new();
    registry.register(&get_counter).unwrap();
    let mut dispatcher = CommandDispatcher::new(&registry, &RESPONSES, &SLOT, &clock);

    let (frame, len) = request_frame(Cluster::Sensor, 0x01, &[]);
    let response = roundtrip(&mut dispatcher, &frame[..len]).unwrap();
    assert_eq!(response.status, CommandStatus::Success);
    assert_eq!(response.data(), &3u32.to_le_bytes());
}

#[test]
fn test_unregistered_key_scenario() {
    static ENGINE: DispatchEngine = DispatchEngine::new();
    static RESPONSES: Topic<ResponseEvent> = Topic::new("command", &ENGINE);
    static SLOT: EventSlot<ResponseEvent> = EventSlot::new(ResponseEvent::new());

    let clock = TestClock(0);
    let ping = PingCommand::new(&clock);
    let mut registry = CommandRegistry::new();
    registry.register(&ping).unwrap();
    let mut dispatcher = CommandDispatcher::new(&registry, &RESPONSES, &SLOT, &clock);

    let (frame, len) = request_frame(Cluster::System, 0x42, &[1, 2]);
    let response = roundtrip(&mut dispatcher, &frame[..len]).unwrap();
    assert_eq!(response.key, CommandKey::new(Cluster::System, 0x42));
    assert_eq!(response.status, CommandStatus::NotFound);
    assert!(response.data().is_empty());
}

#[test]
fn test_bad_magic_scenario() {
    let (mut frame, len) = request_frame(Cluster::System, 0x01, &[]);
    frame[0] = 0x00;
    frame[1] = 0x00;

    assert_eq!(decode_frame(&frame[..len]), Err(FrameError::BadMagic));
    assert_eq!(
        CommandRequest::from_frame(&frame[..len]),
        Err(CodecError::Frame(FrameError::BadMagic))
    );
}

#[test]
fn test_nine_params_rejected_despite_valid_frame() {
    let payload = [0x00, 0x01, 9, 0, 0, 0, 0, 0, 0, 0, 0, 0];
    let mut frame = [0u8; 32];
    let len = encode_frame(&payload, FrameOptions::single(), &mut frame).unwrap();

    assert!(decode_frame(&frame[..len]).is_ok());
    assert_eq!(
        CommandRequest::from_frame(&frame[..len]),
        Err(CodecError::ParamsTooLong)
    );
}

#[test]
fn test_serial_stream_to_response() {
    static ENGINE: DispatchEngine = DispatchEngine::new();
    static RESPONSES: Topic<ResponseEvent> = Topic::new("command", &ENGINE);
    static SLOT: EventSlot<ResponseEvent> = EventSlot::new(ResponseEvent::new());

    let clock = TestClock(77);
    let ping = PingCommand::new(&clock);
    let mut registry = CommandRegistry::new();
    registry.register(&ping).unwrap();
    let mut dispatcher = CommandDispatcher::new(&registry, &RESPONSES, &SLOT, &clock);

    // Line noise, then two requests back to back
    let (ping_frame, ping_len) = request_frame(Cluster::System, 0x01, &[]);
    let (other_frame, other_len) = request_frame(Cluster::Sensor, 0x09, &[]);
    let mut stream = vec![0x55, 0xAC, 0x00];
    stream.extend_from_slice(&ping_frame[..ping_len]);
    stream.extend_from_slice(&other_frame[..other_len]);

    let mut parser = FrameParser::<MAX_REQUEST_FRAME>::new();
    let mut statuses = Vec::new();
    for byte in stream {
        if let Some(frame) = parser.feed(byte).unwrap() {
            let frame = frame.to_vec();
            statuses.push(roundtrip(&mut dispatcher, &frame).unwrap().status);
        }
    }
    assert_eq!(statuses, [CommandStatus::Success, CommandStatus::NotFound]);
}
