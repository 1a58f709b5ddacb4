//! DQN agent choosing from a table of discrete actions.
use crate::{args::Args, sac::HIDDEN_UNITS, train::ReplayBuffer};
use anyhow::Result;
use rink_candle_agent::{
    dqn::{Dqn, DqnConfig, DqnModelConfig, EpsilonGreedy},
    mlp::{Mlp, MlpConfig},
    opt::OptimizerConfig,
};
use rink_py_hockey_env::{DiscreteAct, HockeyEnv, OBS_DIM};

pub type DqnAgent = Dqn<HockeyEnv<DiscreteAct>, Mlp, ReplayBuffer>;

/// The output dimension is the size of the action table given by `--action_table`.
pub fn dqn_config(args: &Args) -> Result<DqnConfig<Mlp>> {
    let n_actions = args.action_table.len();
    let model_config = DqnModelConfig::default()
        .q_config(MlpConfig::new(OBS_DIM, HIDDEN_UNITS.to_vec(), n_actions, false))
        .opt_config(OptimizerConfig::default().learning_rate(args.learning_rate));

    Ok(DqnConfig::default()
        .model_config(model_config)
        .soft_update_interval(args.update_target_every)
        .batch_size(args.batch_size)
        .discount_factor(args.gamma)
        .tau(args.soft_tau)
        .explorer(EpsilonGreedy::with_final_step(args.eps_final_step))
        .seed(args.seed)
        .device(&args.device()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_dqn_config() -> Result<()> {
        let args = Args::try_parse_from([
            "train_dqn",
            "--eps_final_step",
            "500",
            "--soft_tau",
            "0.01",
            "--seed",
            "7",
        ])?;
        let config = dqn_config(&args)?;
        assert_eq!(config.explorer.final_step, 500);
        assert_eq!(config.explorer.n_steps, 0);
        assert_eq!(config.tau, 0.01);
        assert_eq!(config.seed, 7);
        assert_eq!(config.soft_update_interval, 1);
        assert_eq!(config.discount_factor, 0.99);
        Ok(())
    }
}
