//! Operator command line over the catalog.

use std::{future::Future, path::PathBuf, time::Duration};

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tokio::io::AsyncReadExt;

use crate::foods::dto::CreateFoodRequest;
use crate::foods::error::FoodResult;
use crate::state::AppState;

#[derive(Parser, Debug)]
#[clap(name = "foodcatalog", version, about = "Look up foods across custom and bulk sources")]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Search custom foods, then the bulk dataset
    Search {
        query: String,

        /// Page size (defaults and ceiling come from the environment)
        #[clap(long, allow_hyphen_values = true)]
        limit: Option<i64>,

        /// Continuation token from a previous page
        #[clap(long)]
        cursor: Option<String>,
    },

    /// Resolve a barcode
    Barcode { code: String },

    /// Fetch a custom food by id
    Custom { id: String },

    /// Create a custom food from a JSON request (stdin when no file is given)
    CreateCustom {
        #[clap(long)]
        actor: String,

        #[clap(long)]
        file: Option<PathBuf>,
    },

    /// Create bulk dataset indexes if missing
    EnsureIndexes,
}

impl Cli {
    pub async fn run(self, state: &AppState) -> anyhow::Result<()> {
        let timeout = state.config.request_timeout;
        let catalog = &state.catalog;
        match self.command {
            Command::Search {
                query,
                limit,
                cursor,
            } => {
                let page = deadline(timeout, catalog.search(&query, limit, cursor.as_deref())).await?;
                print_json(&page)
            }
            Command::Barcode { code } => {
                let rec = deadline(timeout, catalog.by_barcode(&code)).await?;
                print_json(&rec)
            }
            Command::Custom { id } => {
                let rec = deadline(timeout, catalog.by_custom_id(&id)).await?;
                print_json(&rec)
            }
            Command::CreateCustom { actor, file } => {
                let req = read_request(file.as_deref()).await?;
                let rec = deadline(timeout, catalog.create_custom(&actor, req)).await?;
                print_json(&rec)
            }
            Command::EnsureIndexes => {
                catalog.ensure_indexes().await;
                Ok(())
            }
        }
    }
}

/// Dropping the future on timeout cancels whatever store call is in flight.
async fn deadline<T>(
    timeout: Duration,
    fut: impl Future<Output = FoodResult<T>>,
) -> anyhow::Result<T> {
    let out = tokio::time::timeout(timeout, fut)
        .await
        .map_err(|_| anyhow!("timed out after {}s", timeout.as_secs_f32()))?;
    Ok(out?)
}

async fn read_request(file: Option<&std::path::Path>) -> anyhow::Result<CreateFoodRequest> {
    let body = match file {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            tokio::io::stdin()
                .read_to_string(&mut buf)
                .await
                .context("read request from stdin")?;
            buf
        }
    };
    serde_json::from_str(&body).context("parse custom food request")
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
