//! Diesel schema for project persistence.

diesel::table! {
    /// Project records and the identities of their compute workspaces.
    projects (id) {
        /// Internal project identifier.
        id -> Uuid,
        /// Owning user.
        owner_id -> Uuid,
        /// Display name.
        #[max_length = 255]
        name -> Varchar,
        /// Optional free-text description.
        description -> Nullable<Text>,
        /// Compute resource name derived from the identifier.
        #[max_length = 63]
        pod_name -> Varchar,
        /// Orchestrator namespace.
        #[max_length = 63]
        pod_namespace -> Varchar,
        /// Persistent volume name derived from the identifier.
        #[max_length = 63]
        volume_name -> Varchar,
        /// Aggregate project status.
        #[max_length = 20]
        status -> Varchar,
        /// Last observed pod phase.
        #[max_length = 20]
        pod_status -> Nullable<Varchar>,
        /// Last provisioning error.
        pod_error -> Nullable<Text>,
        /// Successful provisioning timestamp.
        pod_created_at -> Nullable<Timestamptz>,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}
