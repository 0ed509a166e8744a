//! Generic record commands.

use anyhow::{Context, Result, anyhow};
use clap::{Args, Subcommand};
use colored::Colorize;

use farmhand_http::{FarmClient, Resource};

use crate::output;
use crate::session;

#[derive(Args, Debug)]
pub struct ResourceCommand {
    #[command(subcommand)]
    pub command: ResourceSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum ResourceSubcommand {
    /// List a collection
    List {
        /// Collection name (e.g. farms, breed-types, readings)
        resource: Resource,

        /// Query parameter as key=value (repeatable)
        #[arg(long = "param", short = 'p', value_parser = parse_key_val)]
        params: Vec<(String, String)>,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Fetch one record
    Get {
        resource: Resource,
        id: String,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Create a record
    Create {
        resource: Resource,

        /// JSON file with the record (use - for stdin)
        #[arg(long)]
        json: String,
    },

    /// Partially update a record
    Update {
        resource: Resource,
        id: String,

        /// JSON file with the changed fields (use - for stdin)
        #[arg(long)]
        json: String,
    },

    /// Delete a record
    Delete { resource: Resource, id: String },

    /// List the available collections
    Names,
}

/// Parse a `key=value` query parameter.
fn parse_key_val(s: &str) -> Result<(String, String)> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| anyhow!("expected key=value, got '{s}'"))?;
    if key.is_empty() {
        return Err(anyhow!("empty parameter name in '{s}'"));
    }
    Ok((key.to_string(), value.to_string()))
}

pub async fn handle(cmd: ResourceCommand, client: &FarmClient) -> Result<()> {
    if matches!(cmd.command, ResourceSubcommand::Names) {
        for resource in Resource::ALL {
            println!("{:<22} {}", resource.name(), resource.path().dimmed());
        }
        return Ok(());
    }

    session::require_login(client).await?;

    match cmd.command {
        ResourceSubcommand::List {
            resource,
            params,
            pretty,
        } => {
            let page = client
                .resource(resource)
                .list(&params)
                .await
                .with_context(|| format!("Failed to list {resource}"))?;
            output::json(&page, pretty)
        }
        ResourceSubcommand::Get {
            resource,
            id,
            pretty,
        } => {
            let record = client
                .resource(resource)
                .retrieve(&id)
                .await
                .with_context(|| format!("Failed to fetch {resource} {id}"))?;
            output::json(&record, pretty)
        }
        ResourceSubcommand::Create { resource, json } => {
            let body = super::read_json(&json)?;
            let created = client
                .resource(resource)
                .create(&body)
                .await
                .with_context(|| format!("Failed to create {resource}"))?;
            output::json(&created, false)?;
            output::success(&format!("Created {resource}"));
            Ok(())
        }
        ResourceSubcommand::Update { resource, id, json } => {
            let body = super::read_json(&json)?;
            let updated = client
                .resource(resource)
                .update(&id, &body)
                .await
                .with_context(|| format!("Failed to update {resource} {id}"))?;
            output::json(&updated, false)?;
            output::success(&format!("Updated {resource} {id}"));
            Ok(())
        }
        ResourceSubcommand::Delete { resource, id } => {
            client
                .resource(resource)
                .delete(&id)
                .await
                .with_context(|| format!("Failed to delete {resource} {id}"))?;
            output::success(&format!("Deleted {resource} {id}"));
            Ok(())
        }
        ResourceSubcommand::Names => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_val_splits_on_first_equals() {
        assert_eq!(
            parse_key_val("search=a=b").unwrap(),
            ("search".to_string(), "a=b".to_string())
        );
        assert!(parse_key_val("novalue").is_err());
        assert!(parse_key_val("=x").is_err());
    }
}
