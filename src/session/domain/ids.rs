//! Identifier for execution sessions.

crate::ids::uuid_identifier! {
    /// Names one attempt at running the agent on a task.
    ///
    /// The same value is handed to the workspace's agent runtime, which
    /// quotes it back in status callbacks and output streams.
    ///
    /// # Examples
    ///
    /// ```
    /// use vibe_control::session::domain::SessionId;
    ///
    /// let id = SessionId::new();
    /// let parsed: SessionId = id.to_string().parse().expect("valid uuid");
    /// assert_eq!(parsed, id);
    /// ```
    pub struct SessionId => "session";
}
