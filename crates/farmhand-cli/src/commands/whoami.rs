//! Whoami command implementation.

use anyhow::{Context, Result};
use serde_json::Value;

use farmhand_http::FarmClient;

use crate::output;
use crate::session;

const PROFILE_FIELDS: [(&str, &str); 5] = [
    ("ID", "id"),
    ("Username", "username"),
    ("Email", "email"),
    ("Name", "first_name"),
    ("Role", "role"),
];

pub async fn run(client: &FarmClient) -> Result<()> {
    session::require_login(client).await?;

    let user = client
        .auth()
        .current_user()
        .await
        .context("Failed to fetch current user")?;

    for (label, key) in PROFILE_FIELDS {
        if let Some(value) = user.get(key).filter(|v| !v.is_null()) {
            output::field(label, &output::scalar(value));
        }
    }

    if let Value::Object(map) = &user
        && !PROFILE_FIELDS.iter().any(|(_, key)| map.contains_key(*key))
    {
        output::json(&user, true)?;
    }

    Ok(())
}
