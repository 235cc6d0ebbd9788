pub mod composer;
pub mod config;
pub mod error;
pub mod message;
pub mod session;
pub mod theme;
pub mod transport;

// Re-export main types for convenience
pub use config::Config;
pub use error::{Rejected, TransportError, UnknownMode};
pub use message::{Message, MessageId, Role};
pub use session::{Completion, Outbound, Session, SessionId, SessionSnapshot, FAILURE_NOTICE};
pub use theme::{ColorTable, Mode, Rgb, ThemeContext};
pub use transport::{HttpTransport, Transport, TransportConfig, NO_REPLY};
