use std::path::PathBuf;

use clap::Parser;
use clap::ValueEnum;
use tracing::error;
use tracing::info;

use crate::config::load_config_or_default;
use crate::engine::LoadRequest;
use crate::engine::Orchestrator;
use crate::engine::RankingWeights;
use crate::handler::ShutdownSignal;
use crate::model::graph::RankedNode;
use crate::pipeline::DecoderConfig;
use crate::tracing::setup_tracing;
use crate::Context;
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
}

#[derive(Debug, Parser)]
#[command(name = "kashif", about = "Rank addresses of a transfer network by activity and PageRank")]
pub struct Cli {
    /// Path to config TOML file
    #[arg(long, default_value = "Config.toml")]
    pub config: PathBuf,

    /// Delimited transactions file with a header row
    #[arg(long)]
    pub transactions: PathBuf,

    /// Optional per-address statistics file
    #[arg(long)]
    pub addresses: Option<PathBuf>,

    #[arg(long)]
    pub top_k: Option<i64>,

    #[arg(long)]
    pub regularity_weight: Option<f64>,

    #[arg(long)]
    pub tx_count_weight: Option<f64>,

    #[arg(long)]
    pub tx_amount_weight: Option<f64>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub output: OutputFormat,
}

impl Cli {
    /// Command-line weights layered over the configured defaults.
    fn weights(
        &self,
        defaults: RankingWeights,
    ) -> RankingWeights {
        RankingWeights::new(
            self.regularity_weight.unwrap_or(defaults.regularity_weight),
            self.tx_count_weight.unwrap_or(defaults.tx_count_weight),
            self.tx_amount_weight.unwrap_or(defaults.tx_amount_weight),
        )
    }
}

pub async fn run(cli: Cli) -> Result<()> {
    let config = load_config_or_default(&cli.config).await?;
    let _guards = setup_tracing("kashif", &config.logging)?;
    info!("kashif::starting::transactions::{}", cli.transactions.display());

    let weights = cli.weights(RankingWeights::from(&config.ranking));
    let top_k = cli.top_k.unwrap_or(config.ranking.top_k);

    let mut request = LoadRequest::new(&cli.transactions).with_decoder(DecoderConfig::from(&config.ingest));
    if let Some(addresses) = &cli.addresses {
        request = request.with_addresses(addresses);
    }

    let orchestrator = Orchestrator::new(config);
    let shutdown_signal = ShutdownSignal::new();
    let ctrl_c = shutdown_signal.listen_for_ctrl_c();

    let outcome = tokio::select! {
        result = async {
            let report = orchestrator.load(request).await?;
            info!(
                "kashif::loaded::transactions::{}::nodes::{}::edges::{}::skipped::{}",
                report.transactions, report.nodes, report.edges, report.skipped_rows
            );
            orchestrator.rank(weights, top_k).await
        } => Some(result),
        _ = shutdown_signal.wait_for_shutdown() => None,
    };

    orchestrator.shutdown().await;
    ctrl_c.abort();

    match outcome {
        Some(Ok(ranked)) => {
            match cli.output {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&ranked).context("failed to serialize ranking")?)
                },
                OutputFormat::Table => print!("{}", render_table(&ranked)),
            }
            Ok(())
        },
        Some(Err(e)) => {
            error!("kashif::failed::error::{}", e);
            Err(e)
        },
        None => {
            info!("kashif::interrupted");
            Ok(())
        },
    }
}

fn render_table(ranked: &[RankedNode]) -> String {
    let mut out = format!(
        "{:>4}  {:<16}  {:<10}  {:<8}  {:>8}  {:>10}\n",
        "rank", "address", "chain", "tier", "score", "pagerank"
    );
    for entry in ranked {
        out.push_str(&format!(
            "{:>4}  {:<16}  {:<10}  {:<8}  {:>8.4}  {:>10.6}\n",
            entry.rank, entry.node.name, entry.node.chain, entry.node.tier, entry.score, entry.node.pagerank
        ));
    }
    out
}
