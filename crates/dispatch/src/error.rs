use pesan_channels::TransportError;

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// The single delivery attempt failed.
    #[error("delivery failed: {0}")]
    Transport(#[from] TransportError),
    /// The transport panicked while sending this item (unwinding builds only).
    #[error("delivery aborted: transport task panicked")]
    Panicked,
    /// The queue went away before this item was processed.
    #[error("dispatch queue dropped the message before delivery")]
    Dropped,
}
