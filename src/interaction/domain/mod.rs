//! Domain model for task interactions.

mod error;
mod frames;
mod ids;
mod interaction;

pub use error::{InteractionDomainError, ParseMessageTypeError};
pub use frames::{ClientCommand, HistoryBatch, MessageFrame, ServerFrame};
pub use ids::InteractionId;
pub use interaction::{
    Interaction, MAX_PRODUCER_MESSAGE_CHARS, MAX_USER_MESSAGE_CHARS, MessageType, NewInteraction,
    PersistedInteractionData,
};
