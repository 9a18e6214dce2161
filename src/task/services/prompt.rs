//! Execution prompt rendering.

use crate::task::domain::Task;
use minijinja::{Environment, context};

const PROMPT_TEMPLATE: &str = "Task: {{ title }}\n\nDescription:\n{{ description }}";

/// Renders the prompt sent to the agent for `task`.
///
/// A missing description renders as an empty section.
///
/// # Errors
///
/// Returns the template engine error when rendering fails.
pub fn render_prompt(task: &Task) -> Result<String, minijinja::Error> {
    Environment::new().render_str(
        PROMPT_TEMPLATE,
        context! {
            title => task.title(),
            description => task.description().unwrap_or_default(),
        },
    )
}
