//! Identifier for stored configuration versions.

crate::ids::uuid_identifier! {
    /// Names one row of a project's configuration history.
    ///
    /// Callers address versions by their ordinal; this key is what the
    /// storage layer uses internally.
    pub struct ConfigId => "configuration version";
}
