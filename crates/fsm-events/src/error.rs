use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventError {
    #[error("channel `{channel}` delivered a payload that is not a `{expected}`")]
    PayloadType {
        channel: String,
        expected: &'static str,
    },
}
