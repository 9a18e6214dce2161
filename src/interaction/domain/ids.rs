//! Identifier for persisted interactions.

crate::ids::uuid_identifier! {
    /// Names one message exchanged on a task's channel.
    pub struct InteractionId => "interaction";
}
