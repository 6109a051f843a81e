use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand};
use confgate_common::{ApplyRequest, ApplyResponse, ChangeId, ChangeSummary, DEFAULT_ADMIN_URL};

/// Apply can run `nginx -t` and a reload on the remote host.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(180);

/// confgate change approval CLI.
///
/// Lists staged configuration changes and applies them through the
/// toolbox's loopback-only admin API.
#[derive(Parser, Debug)]
#[command(name = "confgate-approve", version, about)]
struct Cli {
    /// Admin API base URL
    #[arg(long, env = "CONFGATE_ADMIN_URL", default_value = DEFAULT_ADMIN_URL, global = true)]
    admin_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List staged changes awaiting apply
    List,
    /// Commit, validate, and activate a staged change
    Apply {
        /// The change ID to apply (format: chg-[a-f0-9]{16})
        change_id: String,
        /// Container running nginx (defaults to the toolbox setting)
        #[arg(long)]
        container: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let base = cli.admin_url.trim_end_matches('/').to_string();

    let client = reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .context("failed to build HTTP client")?;

    match cli.command {
        Commands::List => list(&client, &base).await,
        Commands::Apply {
            change_id,
            container,
        } => {
            // Reject malformed ids before any network round-trip (CWE-20).
            let change_id = ChangeId::parse(&change_id)
                .map_err(|e| anyhow!("invalid change id '{change_id}': {e}"))?;
            apply(&client, &base, &change_id, container).await
        }
    }
}

async fn list(client: &reqwest::Client, base: &str) -> Result<()> {
    let pending: Vec<ChangeSummary> = client
        .get(format!("{base}/changes"))
        .send()
        .await
        .with_context(|| format!("failed to reach admin API at {base}"))?
        .error_for_status()
        .context("admin API rejected the request")?
        .json()
        .await
        .context("invalid response from admin API")?;

    if pending.is_empty() {
        println!("no pending changes");
        return Ok(());
    }
    for change in pending {
        println!(
            "{}  {}  {}  {} bytes  proposed {}",
            change.id,
            change.kind,
            change.target_path,
            change.content_bytes,
            change.proposed_at.to_rfc3339(),
        );
    }
    Ok(())
}

async fn apply(
    client: &reqwest::Client,
    base: &str,
    change_id: &ChangeId,
    container: Option<String>,
) -> Result<()> {
    let response = client
        .post(format!("{base}/changes/{change_id}/apply"))
        .json(&ApplyRequest { container })
        .send()
        .await
        .with_context(|| format!("failed to reach admin API at {base}"))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .context("failed to read admin API response")?;

    let outcome: ApplyResponse = serde_json::from_str(&body).map_err(|_| {
        anyhow!("admin API returned {status}: {}", body.trim())
    })?;

    match outcome {
        ApplyResponse::Applied { message, .. } => {
            println!("applied {change_id}");
            println!("{message}");
            Ok(())
        }
        ApplyResponse::Failed {
            reason, message, ..
        } => bail!("apply failed ({reason}): {message}"),
    }
}
