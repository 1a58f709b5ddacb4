use anyhow::Result;
use clap::Parser;
use rink::{
    dqn::{dqn_config, DqnAgent},
    train, Args, HockeyLogger,
};
use rink_core::Configurable;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut logger = HockeyLogger::new(&args.logdir, args.mode, args.cleanup, args.quiet)?;
    let config = dqn_config(&args)?;
    config.save(logger.agents_dir().join("dqn_config.yaml"))?;

    let mut agent = DqnAgent::build(config)?;
    train::run(&args, &mut agent, args.env_config(Some(args.action_table)), &mut logger)
}
