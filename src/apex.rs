//! Naming conventions and generated Apex source for relay artifacts.
//!
//! The deployed artifacts are the only storage this tool has: a webhook's
//! name lives in its trigger's `Name` and the target entity in the trigger
//! body, so the conventions here have to stay byte-compatible with what
//! earlier deployments wrote into the org.

/// Name of the shared Apex class every relay trigger calls into. At most
/// one instance of it exists per org.
pub const WEBHOOK_CLASS_NAME: &str = "ActionRelayWebhook";

/// Prefix identifying relay-managed triggers in the org.
pub const TRIGGER_PREFIX: &str = "ActionRelayTrigger";

const CLASS_TEMPLATE: &str = include_str!("templates/webhook_class.apex");
const TRIGGER_TEMPLATE: &str = include_str!("templates/trigger.apex");

/// Source of the shared webhook class. No substitutions.
pub fn class_body() -> &'static str {
    CLASS_TEMPLATE
}

/// Artifact name for a user-supplied webhook name.
pub fn trigger_name(name: &str) -> String {
    format!("{TRIGGER_PREFIX}{name}")
}

/// Inverse of [`trigger_name`]: recover the user-facing name from an
/// artifact name. `None` for triggers this tool does not manage.
pub fn strip_trigger_prefix(artifact_name: &str) -> Option<&str> {
    artifact_name.strip_prefix(TRIGGER_PREFIX)
}

/// Render the per-webhook trigger source. The first line keeps strict
/// single-space formatting: [`target_sobject`] reads the entity back out of
/// deployed bodies by token position.
pub fn render_trigger(name: &str, sobject: &str, url: &str) -> String {
    TRIGGER_TEMPLATE
        .replace("{{name}}", name)
        .replace("{{sobject}}", sobject)
        .replace("{{url}}", url)
}

/// Target entity of a deployed trigger: the fourth space-delimited token of
/// the body (`trigger <Name> on <SObject> ...`). Splits on the space
/// character with empty tokens preserved, so the result is stable for every
/// body [`render_trigger`] ever produced.
pub fn target_sobject(body: &str) -> Option<&str> {
    body.split(' ').nth(3)
}
