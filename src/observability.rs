use biometrics::{Collector, Counter, Moments};

pub(crate) static CLIENT_REQUESTS: Counter = Counter::new("termline.client.requests");
pub(crate) static CLIENT_REQUEST_ERRORS: Counter = Counter::new("termline.client.request_errors");
pub(crate) static CLIENT_REQUEST_DURATION: Moments =
    Moments::new("termline.client.request_duration_seconds");

pub(crate) static STREAM_CHUNKS: Counter = Counter::new("termline.stream.chunks");
pub(crate) static STREAM_TEXT_FRAGMENTS: Counter = Counter::new("termline.stream.text_fragments");
pub(crate) static STREAM_ERRORS: Counter = Counter::new("termline.stream.errors");
pub(crate) static STREAM_BYTES: Counter = Counter::new("termline.stream.bytes");
pub(crate) static STREAM_DURATION: Moments = Moments::new("termline.stream.duration_seconds");

pub(crate) static CHAT_TURNS: Counter = Counter::new("termline.chat.turns");
pub(crate) static CHAT_TURN_ERRORS: Counter = Counter::new("termline.chat.turn_errors");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&CLIENT_REQUESTS);
    collector.register_counter(&CLIENT_REQUEST_ERRORS);
    collector.register_moments(&CLIENT_REQUEST_DURATION);

    collector.register_counter(&STREAM_CHUNKS);
    collector.register_counter(&STREAM_TEXT_FRAGMENTS);
    collector.register_counter(&STREAM_ERRORS);
    collector.register_counter(&STREAM_BYTES);
    collector.register_moments(&STREAM_DURATION);

    collector.register_counter(&CHAT_TURNS);
    collector.register_counter(&CHAT_TURN_ERRORS);
}
