//! Train [`Agent`].
mod config;
mod episode;
use crate::{
    record::{AggregateRecorder, RecordValue::Scalar},
    Agent, Env, Evaluator, ExperienceBufferBase, ReplayBufferBase, StepProcessor,
};
use anyhow::Result;
pub use config::{TrainerConfig, DRY_RUN_EPISODES};
pub use episode::{EpisodeStats, EvalStats, Outcome};
use log::{info, trace, warn};
use std::path::Path;

#[cfg_attr(doc, aquamarine::aquamarine)]
/// Manages the episodic training loop and related objects.
///
/// # Training loop
///
/// 0. Given an agent implementing [`Agent`], a recorder implementing
///    [`AggregateRecorder`] and an evaluator implementing [`Evaluator`].
/// 1. Build [`Env`], [`StepProcessor`] and the replay buffer.
/// 2. For each episode `1..=max_episodes` (at most [`DRY_RUN_EPISODES`] in a dry run):
///     1. Reset [`Env`] and [`StepProcessor`].
///     2. Run at most `max_steps` environment steps, pushing a transition into the
///        replay buffer at every step. If the episode does not end by the last step,
///        the last transition is marked as truncated.
///     3. If the buffer holds at least `warmup_period` transitions, call
///        [`Agent::opt`] `iter_fit` times and store the returned records.
///     4. Write a record of [`EpisodeStats`].
///     5. Every `eval_interval` episodes, evaluate the agent in evaluation mode and
///        write the [`EvalStats`] record. If the evaluation reward is the best so far,
///        the agent is saved in `(model_dir)/best`.
///     6. Every `save_interval` episodes, the agent is saved in
///        `(model_dir)/episode_(n)`.
///     7. Every `flush_record_interval` episodes, flush the recorder.
///
/// The final agent is left to the caller, which saves it where its checkpoints live.
///
/// # Interaction of objects
///
/// ```mermaid
/// graph LR
///     A[Agent]-->|Env::Act|B[Env]
///     B -->|Env::Obs|A
///     B -->|"Step&lt;E: Env&gt;"|C[StepProcessor]
///     C -->|ExperienceBufferBase::Item|D[ReplayBufferBase]
///     D -->|TransitionBatch|A
/// ```
pub struct Trainer<E, P, R>
where
    E: Env,
    P: StepProcessor<E>,
    R: ExperienceBufferBase<Item = P::Output> + ReplayBufferBase,
{
    /// Configuration of the environment for training.
    env_config_train: E::Config,

    /// Configuration of the transition producer.
    step_proc_config: P::Config,

    /// Configuration of the replay buffer.
    replay_buffer_config: R::Config,

    config: TrainerConfig,
}

impl<E, P, R> Trainer<E, P, R>
where
    E: Env,
    P: StepProcessor<E>,
    R: ExperienceBufferBase<Item = P::Output> + ReplayBufferBase,
{
    /// Constructs a trainer.
    pub fn build(
        config: TrainerConfig,
        env_config_train: E::Config,
        step_proc_config: P::Config,
        replay_buffer_config: R::Config,
    ) -> Self {
        Self {
            env_config_train,
            step_proc_config,
            replay_buffer_config,
            config,
        }
    }

    fn save_model<A: Agent<E, R>>(agent: &A, model_dir: &Path) {
        match agent.save_params(model_dir) {
            Ok(_) => info!("Saved the model in {:?}.", model_dir),
            Err(e) => warn!("Failed to save model in {:?}: {}", model_dir, e),
        }
    }

    fn save_model_as<A: Agent<E, R>>(&self, agent: &A, name: &str) {
        if let Some(model_dir) = self.config.model_dir.as_ref() {
            Self::save_model(agent, &Path::new(model_dir).join(name));
        }
    }

    /// Runs an episode and pushes its transitions into `buffer`.
    fn run_episode<A: Agent<E, R>>(
        &self,
        episode: usize,
        env: &mut E,
        step_proc: &mut P,
        agent: &mut A,
        buffer: &mut R,
    ) -> Result<EpisodeStats> {
        let mut stats = EpisodeStats::new(episode);
        let mut prev_obs = env.reset()?;
        step_proc.reset(prev_obs.clone())?;

        for t in 0..self.config.max_steps {
            let act = agent.sample(&prev_obs)?;
            let (mut step, _) = env.step(&act)?;
            if t + 1 == self.config.max_steps && !step.is_done() {
                step.is_truncated = 1;
            }
            stats.update(&step);

            let is_done = step.is_done();
            prev_obs = step.obs.clone();
            buffer.push(step_proc.process(step)?)?;

            if is_done {
                break;
            }
        }
        trace!("Episode {} finished: {:?}", episode, stats);

        Ok(stats)
    }

    /// Train the agent.
    pub fn train<A, D>(
        &mut self,
        agent: &mut A,
        recorder: &mut dyn AggregateRecorder,
        evaluator: &mut D,
    ) -> Result<()>
    where
        A: Agent<E, R>,
        D: Evaluator<E>,
    {
        let mut env = E::build(&self.env_config_train, self.config.seed)?;
        let mut step_proc = P::build(&self.step_proc_config);
        let mut buffer = R::build(&self.replay_buffer_config);
        let mut max_eval_reward = f32::MIN;
        let n_episodes = self.config.episode_limit();
        agent.train();

        for episode in 1..=n_episodes {
            let stats = self.run_episode(episode, &mut env, &mut step_proc, agent, &mut buffer)?;

            // Fit phase
            let mut epsilon = None;
            if buffer.len() >= self.config.warmup_period {
                for _ in 0..self.config.iter_fit {
                    match agent.opt(&mut buffer)? {
                        Some(record) => {
                            if let Ok(eps) = record.get_scalar("epsilon") {
                                epsilon = Some(eps);
                            }
                            recorder.store(record);
                        }
                        None => break,
                    }
                }
            }

            let mut record = stats.to_record();
            if let Some(eps) = epsilon {
                record.insert("epsilon", Scalar(eps));
            }
            recorder.write(record);

            // Evaluation
            if self.config.eval_interval > 0 && episode % self.config.eval_interval == 0 {
                info!("Starts evaluation of the trained model");
                agent.eval();
                let mut record = evaluator.evaluate(agent)?;
                agent.train();
                let eval_reward = record.get_scalar("eval_reward")?;
                record.insert("episode", Scalar(episode as f32));
                recorder.write(record);

                // Save the best model up to the current episode
                if eval_reward > max_eval_reward {
                    max_eval_reward = eval_reward;
                    self.save_model_as(agent, "best");
                }
            }

            // Save the current model
            if self.config.save_interval > 0 && episode % self.config.save_interval == 0 {
                self.save_model_as(agent, &format!("episode_{}", episode));
            }

            // Flush records
            if self.config.flush_record_interval > 0
                && episode % self.config.flush_record_interval == 0
            {
                recorder.flush(episode as _);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dummy::{DummyAgent, DummyEnv, DummyEnvConfig, DummyReplayBuffer, VecBatch},
        generic_replay_buffer::{
            SimpleReplayBufferConfig, SimpleStepProcessor, SimpleStepProcessorConfig,
        },
    };

    type StepProc = SimpleStepProcessor<DummyEnv, VecBatch, VecBatch>;

    fn run_one(episode_len: Option<usize>, max_steps: usize) -> Result<DummyReplayBuffer> {
        let env_config = DummyEnvConfig { episode_len };
        let trainer = Trainer::<DummyEnv, StepProc, DummyReplayBuffer>::build(
            TrainerConfig::default().max_steps(max_steps),
            env_config.clone(),
            SimpleStepProcessorConfig::default(),
            SimpleReplayBufferConfig::default().capacity(100),
        );
        let mut env = DummyEnv::build(&env_config, 0)?;
        let mut step_proc = StepProc::build(&SimpleStepProcessorConfig::default());
        let mut buffer = DummyReplayBuffer::build(&SimpleReplayBufferConfig::default().capacity(100));
        let mut agent = DummyAgent::new(1);
        let stats = trainer.run_episode(1, &mut env, &mut step_proc, &mut agent, &mut buffer)?;
        assert_eq!(stats.steps, buffer.len());
        Ok(buffer)
    }

    #[test]
    fn test_last_step_is_truncated() -> Result<()> {
        let buffer = run_one(None, 4)?;
        let batch = buffer.get(&[0, 1, 2, 3])?;
        assert_eq!(batch.is_truncated, vec![0, 0, 0, 1]);
        assert_eq!(batch.is_terminated, vec![0, 0, 0, 0]);
        assert_eq!(batch.obs.data(), &[0.0, 1.0, 2.0, 3.0]);
        assert_eq!(batch.next_obs.data(), &[1.0, 2.0, 3.0, 4.0]);
        Ok(())
    }

    #[test]
    fn test_terminated_episode_is_not_truncated() -> Result<()> {
        let buffer = run_one(Some(2), 4)?;
        assert_eq!(buffer.len(), 2);
        let batch = buffer.get(&[0, 1])?;
        assert_eq!(batch.is_terminated, vec![0, 1]);
        assert_eq!(batch.is_truncated, vec![0, 0]);
        Ok(())
    }
}
