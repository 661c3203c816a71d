// ============================================================================
// solgate — CLI harness for the token-gated community tool
// ============================================================================
// Usage:
//   solgate actions                     List dispatchable action names
//   solgate demo                        Run a scripted end-to-end scenario
//   solgate run script.json             Execute a JSON action script
//
// A script is a JSON array of {"action": "...", "params": {...}} steps that
// run against one tool instance, so ids created early in the script are
// valid in later steps.
// ============================================================================

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use serde_json::json;
use tracing_subscriber::EnvFilter;

use solgate_core::{
    CommunityGateTool, GateAction, GateConfig, HoldingsProvider, IndexerHoldings, RpcHoldings,
    SimulatedHoldings, ToolResult, WalletContext,
};

/// Token-gated community tool harness
#[derive(Parser)]
#[command(name = "solgate", version, about = "Manage and verify token-gated communities")]
struct Cli {
    /// Solana RPC endpoint (default: mainnet-beta, or SOLGATE_RPC_URL)
    #[arg(long, global = true)]
    rpc_url: Option<String>,

    /// Path to the caller keypair file (JSON byte array)
    #[arg(long, global = true)]
    keypair: Option<String>,

    /// Query live holdings over RPC instead of the simulated provider
    #[arg(long, global = true)]
    live: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the action names the dispatcher accepts
    Actions,

    /// Run a scripted create/verify/token scenario against simulated holdings
    Demo,

    /// Execute a JSON script of actions against one tool instance
    Run {
        /// Path to a JSON array of {action, params} steps
        script: String,
    },
}

#[derive(Debug, Deserialize)]
struct ScriptStep {
    action: String,
    #[serde(default)]
    params: serde_json::Value,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();

    let mut config = GateConfig::from_env();
    if let Some(rpc_url) = cli.rpc_url.clone() {
        config.rpc_url = rpc_url;
    }
    if let Some(keypair) = cli.keypair.clone() {
        config.keypair_path = Some(keypair);
    }

    match cli.command {
        Commands::Actions => cmd_actions(),
        Commands::Demo => cmd_demo(config).await,
        Commands::Run { script } => cmd_run(config, cli.live, &script).await,
    }
}

fn cmd_actions() -> Result<()> {
    for action in GateAction::ALL {
        println!("{}", action);
    }
    Ok(())
}

fn load_wallet(config: &GateConfig) -> Result<WalletContext> {
    match &config.keypair_path {
        Some(path) => {
            WalletContext::load(path).map_err(|e| anyhow::anyhow!("{}", e))
        }
        None => Ok(WalletContext::anonymous()),
    }
}

fn live_provider(config: &GateConfig) -> Result<Arc<dyn HoldingsProvider>> {
    let mut provider = RpcHoldings::new(&config.rpc_url);
    if let Some(indexer_url) = &config.indexer_url {
        let indexer = IndexerHoldings::new(
            indexer_url,
            config.indexer_api_key.clone(),
            config.http_timeout_secs,
        )
        .map_err(|e| anyhow::anyhow!("{}", e))?;
        provider = provider.with_indexer(indexer);
    }
    Ok(Arc::new(provider))
}

async fn cmd_run(config: GateConfig, live: bool, script_path: &str) -> Result<()> {
    let script = std::fs::read_to_string(script_path)
        .with_context(|| format!("Failed to read script {}", script_path))?;
    let steps: Vec<ScriptStep> =
        serde_json::from_str(&script).context("Script must be a JSON array of {action, params}")?;

    let wallet = load_wallet(&config)?;
    let provider: Arc<dyn HoldingsProvider> = if live {
        live_provider(&config)?
    } else {
        Arc::new(SimulatedHoldings::new())
    };
    let tool = CommunityGateTool::new(config, provider, wallet);

    let mut failures = 0;
    for (index, step) in steps.iter().enumerate() {
        let result = tool.execute(&step.action, &step.params).await;
        if !result.is_success() {
            failures += 1;
        }
        println!("--- step {} ({})", index + 1, step.action);
        print_result(&result)?;
    }

    if failures > 0 {
        anyhow::bail!("{} of {} steps failed", failures, steps.len());
    }
    Ok(())
}

async fn cmd_demo(config: GateConfig) -> Result<()> {
    let wallet = WalletContext::from_address("DemoAdminWallet");
    let provider = Arc::new(SimulatedHoldings::new());
    provider.set_token_balance("HolderWallet", "DemoMint1111111111111111111111111111111111", 10.0);
    provider.set_token_balance("EmptyWallet", "DemoMint1111111111111111111111111111111111", 2.0);

    let tool = CommunityGateTool::new(config, provider, wallet);

    let created = tool
        .execute(
            "create_community",
            &json!({
                "community_name": "Demo Collective",
                "description": "Holders-only demo space",
                "token_address": "DemoMint1111111111111111111111111111111111",
                "min_token_amount": 5.0,
            }),
        )
        .await;
    println!("--- create_community");
    print_result(&created)?;
    let community_id = created
        .result
        .as_ref()
        .and_then(|r| r.get("community_id"))
        .and_then(|v| v.as_str())
        .context("demo: community creation failed")?
        .to_string();

    let id = community_id.as_str();
    let steps: Vec<(&str, serde_json::Value)> = vec![
        (
            "add_member",
            json!({"community_id": id, "wallet_address": "ModWallet", "access_level": "moderator"}),
        ),
        (
            "verify_access",
            json!({"community_id": id, "wallet_address": "HolderWallet"}),
        ),
        (
            "verify_access",
            json!({"community_id": id, "wallet_address": "EmptyWallet"}),
        ),
        (
            "generate_access_token",
            json!({"community_id": id, "wallet_address": "HolderWallet", "token_expiration": 3600}),
        ),
        ("get_community_stats", json!({"community_id": id})),
        ("list_communities", json!({})),
    ];

    let mut issued_token: Option<String> = None;
    for (action, params) in steps {
        let result = tool.execute(action, &params).await;
        println!("--- {}", action);
        print_result(&result)?;
        if action == "generate_access_token" {
            issued_token = result
                .result
                .as_ref()
                .and_then(|r| r.get("access_token"))
                .and_then(|v| v.as_str())
                .map(String::from);
        }
    }

    if let Some(token) = issued_token {
        let result = tool
            .execute("verify_token", &json!({"access_token": token}))
            .await;
        println!("--- verify_token");
        print_result(&result)?;
    }

    Ok(())
}

fn print_result(result: &ToolResult) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(result)?);
    Ok(())
}
