use activity_core::errors::Result;
use activity_protocol::timeline::TimelineEntry;
use serde_json::Value;

use crate::providers::UserDirectory;

/// Expands the `user` reference of a stored payload with the user's current profile.
///
/// Payloads without a `user.id`, or whose user no longer exists, are returned as is.
pub async fn render_payload(payload: &Value, directory: &dyn UserDirectory) -> Result<Value> {
    let mut rendered = payload.clone();
    let Some(user_id) = payload
        .get("user")
        .and_then(|user| user.get("id"))
        .and_then(Value::as_i64)
    else {
        return Ok(rendered);
    };

    if let Some(profile) = directory.find(user_id).await? {
        if let Some(object) = rendered.as_object_mut() {
            object.insert("user".to_string(), profile.to_payload_json());
        }
    }
    Ok(rendered)
}

/// Renders the payload of every entry in place.
pub async fn render_entries(
    entries: &mut [TimelineEntry],
    directory: &dyn UserDirectory,
) -> Result<()> {
    for entry in entries.iter_mut() {
        entry.payload = render_payload(&entry.payload, directory).await?;
    }
    Ok(())
}
