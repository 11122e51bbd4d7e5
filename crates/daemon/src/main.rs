// CLI modules
mod cli;

use anyhow::Context;
use clap::{Parser, Subcommand};
use cli::{args::Args, op::Op, Check, Serve, Usage};

command_enum! {
    (Serve, Serve),
    (Usage, Usage),
    (Check, Check),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let ctx = cli::op::OpContext::new(args.config, args.log_level);

    let output = args
        .command
        .execute(&ctx)
        .await
        .context("command failed")?;
    println!("{}", output);
    Ok(())
}
