use anyhow::Result;
use clap::Parser;
use uncert_ppo::{run, Args};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Args::parse().run_config()?;
    let context = run(&config)?;
    log::info!(
        "Finished after episode {:?}, best evaluation score {}",
        context.last_episode,
        context.best_score
    );

    Ok(())
}
