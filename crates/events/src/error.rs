use thiserror::Error;

#[derive(Error, Debug)]
pub enum EventsError {
    #[error("Failed to serialize event message: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("No subscriber is listening for notifications")]
    NoSubscribers,

    #[error("Notification delivery failed: {0}")]
    Delivery(String),
}
