//! Command line entry point for the data-market contract benchmark.

#![cfg_attr(not(test), warn(unused_crate_dependencies))]

use clap::{Parser, ValueEnum};
use datamarket_bench::{
    AlloyChainClient, AlloyGateway, BenchConfig, BenchSuite, Cli, Command, ConnectionArgs,
    ConnectionConfig, OperationKind, RunCommand, build_provider, preflight, print_summary,
    save_results,
};
use eyre::{Result, WrapErr};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (ignores errors if file doesn't exist)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    cli.logging.init_tracing().wrap_err("Failed to initialize tracing")?;

    match cli.command {
        Command::Check(args) => check(&args).await,
        Command::Run(cmd) => run(*cmd).await,
        Command::List => {
            list();
            Ok(())
        }
    }
}

fn connect(config: &ConnectionConfig) -> Result<(AlloyChainClient, AlloyGateway)> {
    let provider = build_provider(config.rpc_url.clone(), config.rpc_timeout)
        .wrap_err("Failed to create RPC provider")?;
    let chain = AlloyChainClient::new(provider.clone());
    let gateway = AlloyGateway::new(provider, config.contracts);
    Ok((chain, gateway))
}

async fn check(args: &ConnectionArgs) -> Result<()> {
    let config = ConnectionConfig::from_args(args)?;
    let (chain, gateway) = connect(&config)?;

    let preflight = preflight(&chain, &gateway, config.accounts)
        .await
        .wrap_err_with(|| format!("Preflight against {} failed", config.rpc_url))?;

    let report = &preflight.report;
    println!("Connected to {} (chain {})", config.rpc_url, report.chain_id);
    println!("Latest block: {}", report.latest_block.number);
    println!("Accounts: {}", report.accounts.len());
    for canary in &report.canaries {
        let note = if canary.reverted { " (reverted)" } else { "" };
        println!("  {:<11} {} ok{note}", canary.module, canary.method);
    }
    Ok(())
}

async fn run(cmd: RunCommand) -> Result<()> {
    let config = BenchConfig::from_args(&cmd.connection, &cmd.run)?;
    let (chain, gateway) = connect(&config.connection)?;

    tracing::info!(
        rpc_url = %config.connection.rpc_url,
        operations = config.operations.len(),
        counts = ?config.counts,
        "Starting benchmark"
    );

    let suite = BenchSuite::new(chain, gateway, config);
    let report = suite.run().await.wrap_err("Benchmark aborted")?;

    print_summary(&report, suite.config().format)?;
    if let Some(path) = &suite.config().output {
        save_results(path, &report)?;
    }
    Ok(())
}

fn list() {
    for kind in OperationKind::ALL {
        let name = kind.to_possible_value().map(|v| v.get_name().to_string()).unwrap_or_default();
        let style = if kind.is_read_only() { "call" } else { "transaction" };
        let needs = kind.requirement().map_or_else(|| "-".to_string(), |e| e.to_string());
        println!("{name:<28} {:<28} {style:<12} needs: {needs}", kind.to_string());
    }
}
