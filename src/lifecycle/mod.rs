//! Process lifecycle: shutdown signalling

mod shutdown;

pub use shutdown::ShutdownSignal;
