//! Assistant instruction templates.
//!
//! Instructions are plain text with `{client_name}` placeholders, loaded from
//! a file or taken from the built-in default.

use std::path::Path;

/// Placeholder substituted with the configured client name.
pub const CLIENT_NAME_PLACEHOLDER: &str = "{client_name}";

/// Name used when no client name is configured.
pub const DEFAULT_CLIENT_NAME: &str = "there";

/// Built-in instructions.
pub const DEFAULT_INSTRUCTIONS: &str = "\
You are a friendly, easygoing voice assistant on a phone call with {client_name}.
Keep your answers short and conversational; this is a phone call, not an essay.
Greet {client_name} warmly, find out what they need, and help them with it.
If {client_name} interrupts you, stop and listen. Never talk over them.
If you do not know something, say so plainly instead of guessing.
Wrap up politely and thank {client_name} for their time before the call ends.";

/// Load the instruction template from `path`, or the default when `None`.
pub fn load_template(path: Option<&Path>) -> Result<String, Box<dyn std::error::Error>> {
    let Some(path) = path else {
        return Ok(DEFAULT_INSTRUCTIONS.to_string());
    };

    let template = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read instructions file {}: {e}", path.display()))?;

    if template.trim().is_empty() {
        return Err(format!("Instructions file {} is empty", path.display()).into());
    }

    Ok(template)
}

/// Substitute every `{client_name}` placeholder.
pub fn render(template: &str, client_name: &str) -> String {
    template.replace(CLIENT_NAME_PLACEHOLDER, client_name)
}
