use crate::error::Rejected;
use crate::message::Message;

/// Validate raw input and turn it into a user message.
///
/// A pending request wins over empty input, so a busy session reports
/// `Busy` regardless of what was typed.
pub fn prepare(raw: &str, pending: bool) -> Result<Message, Rejected> {
    if pending {
        return Err(Rejected::Busy);
    }

    let text = raw.trim();
    if text.is_empty() {
        return Err(Rejected::Empty);
    }

    Ok(Message::user(text))
}
