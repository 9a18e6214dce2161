//! Diesel schema for session persistence.

diesel::table! {
    /// Execution attempts of tasks.
    sessions (id) {
        /// Session identifier.
        id -> Uuid,
        /// Executed task.
        task_id -> Uuid,
        /// Project owning the task.
        project_id -> Uuid,
        /// Session status.
        #[max_length = 20]
        status -> Varchar,
        /// Prompt sent to the agent.
        prompt -> Text,
        /// Accumulated agent output.
        output -> Text,
        /// Failure description.
        error -> Nullable<Text>,
        /// Identifier assigned by the in-pod agent.
        #[max_length = 255]
        remote_session_id -> Nullable<Varchar>,
        /// Resumable stream checkpoint.
        #[max_length = 255]
        last_event_id -> Nullable<Varchar>,
        /// Acknowledgement timestamp.
        started_at -> Nullable<Timestamptz>,
        /// Terminal status timestamp.
        completed_at -> Nullable<Timestamptz>,
        /// Run duration in milliseconds.
        duration_ms -> Nullable<Int8>,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}
