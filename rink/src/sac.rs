//! SAC agent for continuous actions.
use crate::{args::Args, train::ReplayBuffer};
use anyhow::Result;
use rink_candle_agent::{
    mlp::{Mlp, Mlp2, MlpConfig},
    opt::OptimizerConfig,
    sac::{EntCoefMode, Sac, SacConfig},
    util::{actor::GaussianActorConfig, critic::MultiCriticConfig},
};
use rink_py_hockey_env::{ContinuousAct, HockeyEnv, ACT_DIM, OBS_DIM};

pub type SacAgent = Sac<HockeyEnv<ContinuousAct>, Mlp, Mlp2, ReplayBuffer>;

/// Hidden layers of the actor and the critics.
pub const HIDDEN_UNITS: [usize; 2] = [256, 256];

pub fn sac_config(args: &Args) -> Result<SacConfig<Mlp, Mlp2>> {
    let opt_config = OptimizerConfig::default().learning_rate(args.learning_rate);
    let actor_config = GaussianActorConfig::default()
        .policy_config(MlpConfig::new(OBS_DIM, HIDDEN_UNITS.to_vec(), ACT_DIM, false))
        .opt_config(opt_config.clone());
    let critic_config = MultiCriticConfig::default()
        .q_config(MlpConfig::new(OBS_DIM + ACT_DIM, HIDDEN_UNITS.to_vec(), 1, false))
        .opt_config(opt_config)
        .tau(args.soft_tau);
    let ent_coef_mode = match args.automatic_entropy_tuning {
        true => EntCoefMode::Auto(-(ACT_DIM as f64), args.learning_rate),
        false => EntCoefMode::Fix(args.alpha),
    };

    Ok(SacConfig::default()
        .actor_config(actor_config)
        .critic_config(critic_config)
        .ent_coef_mode(ent_coef_mode)
        .discount_factor(args.gamma)
        .update_target_every(args.update_target_every)
        .batch_size(args.batch_size)
        .device(&args.device()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_sac_config() -> Result<()> {
        let args = Args::try_parse_from([
            "train_sac",
            "--automatic_entropy_tuning",
            "--gamma",
            "0.95",
            "--update_target_every",
            "2",
        ])?;
        let config = sac_config(&args)?;
        assert_eq!(config.gamma, 0.95);
        assert_eq!(config.update_target_every, 2);
        assert_eq!(config.batch_size, 64);
        assert_eq!(config.critic_config.tau, 0.005);
        assert_eq!(config.ent_coef_mode, EntCoefMode::Auto(-4.0, 3e-4));

        let args = Args::try_parse_from(["train_sac", "--alpha", "0.1"])?;
        assert_eq!(sac_config(&args)?.ent_coef_mode, EntCoefMode::Fix(0.1));
        Ok(())
    }
}
