//! Identifier for board tasks.

crate::ids::uuid_identifier! {
    /// Names one task card on a project's board.
    ///
    /// Sessions and interactions refer back to their task through this key.
    pub struct TaskId => "task";
}
