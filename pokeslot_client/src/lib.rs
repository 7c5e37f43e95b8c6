pub mod client;
pub mod driver;
pub mod terminal;

pub use client::{ClientError, DecodeError, OutcomeClient, OutcomeSource};
pub use driver::{DriverClosed, DriverHandle, DriverStatus, SpinDriver, UserCommand};
pub use terminal::TerminalRenderer;
