// ─────────────────────────────────────────────────────────────────────────────
//  Kashif: Transfer Network Ranker
//
//  Kashif (كاشف): "The Revealer". Ingests transaction and address activity,
//  builds the transfer graph, scores it with PageRank and surfaces the most
//  regular and most active addresses under caller-chosen weights.
// ─────────────────────────────────────────────────────────────────────────────

use clap::Parser;
use kashif::cli::run;
use kashif::cli::Cli;
use kashif::error::Result;

#[tokio::main]
async fn main() -> Result<()> {
  run(Cli::parse()).await?;
  Ok(())
}
