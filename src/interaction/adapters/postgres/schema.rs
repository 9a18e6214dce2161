//! Diesel schema for interaction persistence.

diesel::table! {
    /// Messages about tasks.
    interactions (id) {
        /// Interaction identifier.
        id -> Uuid,
        /// Insertion order among rows with equal timestamps.
        seq -> Int8,
        /// Task the message is about.
        task_id -> Uuid,
        /// Execution session, if any.
        session_id -> Nullable<Uuid>,
        /// Author.
        user_id -> Uuid,
        /// Message type.
        #[max_length = 30]
        message_type -> Varchar,
        /// Message text.
        content -> Text,
        /// Metadata object.
        metadata -> Jsonb,
        /// Creation timestamp.
        created_at -> Timestamptz,
    }
}
