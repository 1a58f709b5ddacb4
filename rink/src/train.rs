//! The training run shared by the SAC and DQN programs.
use crate::{args::Args, logger::HockeyLogger};
use anyhow::Result;
use log::info;
use rink_candle_agent::TensorBatch;
use rink_core::{
    generic_replay_buffer::{SimpleReplayBuffer, SimpleStepProcessor, SimpleStepProcessorConfig},
    record::{RecordValue::Scalar, Recorder},
    Agent, DefaultEvaluator, Env, Evaluator, ReplayBufferBase, Trainer,
};
use rink_py_hockey_env::{HockeyAct, HockeyEnv, HockeyEnvConfig};

pub type ReplayBuffer = SimpleReplayBuffer<TensorBatch, TensorBatch>;
pub type StepProc<A> = SimpleStepProcessor<HockeyEnv<A>, TensorBatch, TensorBatch>;

pub const TRAINER_CONFIG_FILE: &str = "trainer_config.yaml";
pub const REPLAY_BUFFER_CONFIG_FILE: &str = "replay_buffer_config.yaml";
pub const ENV_CONFIG_FILE: &str = "env_config.yaml";
pub const FINAL_MODEL_NAME: &str = "agent";

/// Trains `agent` against the basic opponent.
///
/// 1. Loads the parameters in `--filename`, if given.
/// 2. Saves the configurations of the run in the checkpoint directory.
/// 3. Runs the [`Trainer`], which writes episode and evaluation records to `logger`.
/// 4. With `--evaluate`, evaluates the trained agent once more.
/// 5. Saves the agent in `<logdir>/agents/agent` and writes the plots.
///
/// The evaluation environment is seeded with `--seed` + 1.
pub fn run<A, G>(
    args: &Args,
    agent: &mut G,
    env_config: HockeyEnvConfig,
    logger: &mut HockeyLogger,
) -> Result<()>
where
    A: HockeyAct,
    TensorBatch: TryFrom<A, Error = anyhow::Error>,
    G: Agent<HockeyEnv<A>, ReplayBuffer>,
{
    if let Some(path) = &args.filename {
        logger.load_model(agent, Some(path))?;
    }

    let agents_dir = logger.agents_dir();
    let trainer_config = args.trainer_config(&agents_dir)?;
    let replay_buffer_config = args.replay_buffer_config();
    trainer_config.save(agents_dir.join(TRAINER_CONFIG_FILE))?;
    replay_buffer_config.save(agents_dir.join(REPLAY_BUFFER_CONFIG_FILE))?;
    env_config.save(agents_dir.join(ENV_CONFIG_FILE))?;

    let (max_steps, eval_episodes) = (trainer_config.max_steps, trainer_config.eval_episodes);
    let n_episodes = trainer_config.episode_limit();
    let eval_seed = args.seed as i64 + 1;
    let mut evaluator =
        DefaultEvaluator::<HockeyEnv<A>>::new(&env_config, eval_seed, eval_episodes, max_steps)?;
    let mut trainer = Trainer::<HockeyEnv<A>, StepProc<A>, ReplayBuffer>::build(
        trainer_config,
        env_config,
        SimpleStepProcessorConfig::default(),
        replay_buffer_config,
    );
    trainer.train(agent, logger, &mut evaluator)?;

    if args.evaluate {
        info!("Evaluating the trained agent in {} episodes", eval_episodes);
        agent.eval();
        let mut record = evaluator.evaluate(agent)?;
        record.insert("episode", Scalar(n_episodes as f32));
        logger.write(record);
    }

    finish::<HockeyEnv<A>, ReplayBuffer, _>(agent, logger)
}

/// Saves the final agent with the default name and writes the plots.
fn finish<E, R, G>(agent: &G, logger: &HockeyLogger) -> Result<()>
where
    E: Env,
    R: ReplayBufferBase,
    G: Agent<E, R>,
{
    logger.save_model(agent, FINAL_MODEL_NAME)?;
    logger.plot_all();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rink_core::{
        checkpoint::MANIFEST_FILE,
        dummy::{DummyAgent, DummyEnv, DummyReplayBuffer},
    };
    use rink_py_hockey_env::Mode;
    use tempdir::TempDir;

    #[test]
    fn test_final_agent_is_saved_by_logger() -> Result<()> {
        let dir = TempDir::new("train")?;
        let logger = HockeyLogger::new(dir.path(), Mode::Defense, false, true)?;
        let mut agent = DummyAgent::new(1);

        finish::<DummyEnv, DummyReplayBuffer, _>(&agent, &logger)?;
        let path = logger.agents_dir().join(FINAL_MODEL_NAME);
        assert!(path.join(MANIFEST_FILE).is_file());

        // The default checkpoint of the logger is the final agent
        logger.load_model::<DummyEnv, DummyReplayBuffer, _>(&mut agent, None)?;
        Ok(())
    }
}
