//! Identifiers for projects and the users who own them.

crate::ids::uuid_identifier! {
    /// Names a project and, through [`ProjectId::short`], its workspace.
    ///
    /// # Examples
    ///
    /// ```
    /// use vibe_control::workspace::domain::ProjectId;
    ///
    /// let id = ProjectId::new();
    /// assert!(!id.as_ref().is_nil());
    /// assert_eq!(id.short().len(), 8);
    /// ```
    pub struct ProjectId => "project";
}

impl ProjectId {
    /// First eight hex digits of the UUID, used in workspace resource names.
    #[must_use]
    pub fn short(self) -> String {
        self.into_inner().simple().to_string().chars().take(8).collect()
    }
}

crate::ids::uuid_identifier! {
    /// Identity asserted by the authentication layer in front of the API.
    ///
    /// The control plane never issues these; it only compares them against
    /// project owners.
    pub struct UserId => "user";
}
