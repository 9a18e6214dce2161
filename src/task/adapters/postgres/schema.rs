//! Diesel schema for task persistence.

diesel::table! {
    /// Task board records.
    tasks (id) {
        /// Internal task identifier.
        id -> Uuid,
        /// Owning project.
        project_id -> Uuid,
        /// Title.
        #[max_length = 500]
        title -> Varchar,
        /// Optional description.
        description -> Nullable<Text>,
        /// Board column.
        #[max_length = 20]
        status -> Varchar,
        /// Ordering hint within the column.
        position -> Int4,
        /// Priority.
        #[max_length = 10]
        priority -> Varchar,
        /// Most recent session.
        current_session_id -> Nullable<Uuid>,
        /// Creator.
        created_by -> Uuid,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}
