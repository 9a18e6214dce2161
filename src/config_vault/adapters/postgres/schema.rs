//! Diesel schema for configuration persistence.

diesel::table! {
    /// Versioned agent configuration rows.
    opencode_configs (id) {
        /// Internal version identifier.
        id -> Uuid,
        /// Owning project.
        project_id -> Uuid,
        /// Version number, unique per project.
        version -> Int4,
        /// Active flag; at most one row per project is active.
        is_active -> Bool,
        /// Model provider.
        #[max_length = 20]
        model_provider -> Varchar,
        /// Model name.
        #[max_length = 100]
        model_name -> Varchar,
        /// Optional pinned model version.
        #[max_length = 50]
        model_version -> Nullable<Varchar>,
        /// Optional endpoint override.
        api_endpoint -> Nullable<Text>,
        /// Encrypted credential blob.
        api_key_encrypted -> Nullable<Bytea>,
        /// Sampling temperature.
        temperature -> Float8,
        /// Completion token limit.
        max_tokens -> Int4,
        /// Enabled tool names as a JSON array.
        enabled_tools -> Jsonb,
        /// Per-tool configuration.
        tools_config -> Nullable<Jsonb>,
        /// System prompt.
        system_prompt -> Nullable<Text>,
        /// Iteration limit.
        max_iterations -> Int4,
        /// Run timeout in seconds.
        timeout_seconds -> Int4,
        /// Author.
        created_by -> Uuid,
        /// Creation timestamp.
        created_at -> Timestamptz,
    }
}
