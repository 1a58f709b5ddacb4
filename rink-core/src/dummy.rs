//! Minimal environment, agent and batch types used in tests and doc examples.
use crate::{
    checkpoint::CheckpointManifest,
    generic_replay_buffer::{BatchBase, GenericTransitionBatch, SimpleReplayBuffer},
    record::{Record, RecordValue},
    Agent, Env, Info, Outcome, Policy, ReplayBufferBase, Step,
};
use anyhow::{bail, Result};
use std::path::{Path, PathBuf};

/// Dummy observation, the step counter of [`DummyEnv`].
#[derive(Clone, Debug, PartialEq)]
pub struct DummyObs(pub f32);

impl crate::Obs for DummyObs {}

/// Dummy action.
#[derive(Clone, Debug, PartialEq)]
pub struct DummyAct(pub f32);

impl crate::Act for DummyAct {}

/// A batch of scalars, one per transition.
#[derive(Clone, Debug, PartialEq)]
pub struct VecBatch {
    data: Vec<f32>,
}

impl VecBatch {
    /// Values in the batch.
    pub fn data(&self) -> &[f32] {
        &self.data
    }
}

impl From<Vec<f32>> for VecBatch {
    fn from(data: Vec<f32>) -> Self {
        Self { data }
    }
}

impl From<DummyObs> for VecBatch {
    fn from(obs: DummyObs) -> Self {
        Self { data: vec![obs.0] }
    }
}

impl From<DummyAct> for VecBatch {
    fn from(act: DummyAct) -> Self {
        Self { data: vec![act.0] }
    }
}

impl BatchBase for VecBatch {
    fn new(capacity: usize) -> Self {
        Self {
            data: vec![0.0; capacity],
        }
    }

    fn push(&mut self, ix: usize, data: Self) -> Result<()> {
        let capacity = self.data.len();
        if capacity == 0 {
            bail!("Push into a batch with zero capacity");
        }
        for (j, v) in data.data.into_iter().enumerate() {
            self.data[(ix + j) % capacity] = v;
        }
        Ok(())
    }

    fn sample(&self, ixs: &[usize]) -> Result<Self> {
        let data = ixs
            .iter()
            .map(|&ix| match self.data.get(ix) {
                Some(v) => Ok(*v),
                None => bail!("Index {} out of range ({})", ix, self.data.len()),
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { data })
    }
}

/// Information of [`DummyEnv`].
#[derive(Clone, Debug, Default)]
pub struct DummyInfo {
    won: bool,
    touched: bool,
}

impl Info for DummyInfo {
    fn outcome(&self) -> Option<Outcome> {
        match self.won {
            true => Some(Outcome::Won),
            false => None,
        }
    }

    fn touched_puck(&self) -> bool {
        self.touched
    }
}

/// Configuration of [`DummyEnv`].
#[derive(Clone, Debug, Default)]
pub struct DummyEnvConfig {
    /// If `Some(n)`, episodes terminate after `n` steps with a win.
    pub episode_len: Option<usize>,
}

/// An environment whose observation counts steps in the episode.
///
/// Every step gives reward 1 and the first step of an episode touches the puck.
pub struct DummyEnv {
    config: DummyEnvConfig,
    t: usize,
}

impl Env for DummyEnv {
    type Config = DummyEnvConfig;
    type Obs = DummyObs;
    type Act = DummyAct;
    type Info = DummyInfo;

    fn build(config: &Self::Config, _seed: i64) -> Result<Self> {
        Ok(Self {
            config: config.clone(),
            t: 0,
        })
    }

    fn step(&mut self, a: &Self::Act) -> Result<(Step<Self>, Record)> {
        self.t += 1;
        let terminated = self.config.episode_len == Some(self.t);
        let info = DummyInfo {
            won: terminated,
            touched: self.t == 1,
        };
        let step = Step::new(
            DummyObs(self.t as f32),
            a.clone(),
            1.0,
            terminated as i8,
            0,
            info,
        );
        Ok((step, Record::empty()))
    }

    fn reset(&mut self) -> Result<Self::Obs> {
        self.t = 0;
        Ok(DummyObs(0.0))
    }

    fn reset_with_index(&mut self, _ix: usize) -> Result<Self::Obs> {
        self.reset()
    }
}

/// Replay buffer used with [`DummyAgent`].
pub type DummyReplayBuffer = SimpleReplayBuffer<VecBatch, VecBatch>;

/// An agent taking action 0 and counting optimization steps.
pub struct DummyAgent {
    batch_size: usize,
    train: bool,

    /// The number of calls of [`Agent::opt`].
    pub n_opt_calls: usize,

    /// The number of optimization steps actually performed.
    pub n_opts: usize,
}

impl DummyAgent {
    /// Creates an agent sampling batches of the given size.
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size,
            train: true,
            n_opt_calls: 0,
            n_opts: 0,
        }
    }
}

impl Policy<DummyEnv> for DummyAgent {
    fn sample(&mut self, _obs: &DummyObs) -> Result<DummyAct> {
        Ok(DummyAct(0.0))
    }
}

impl Agent<DummyEnv, DummyReplayBuffer> for DummyAgent {
    fn train(&mut self) {
        self.train = true;
    }

    fn eval(&mut self) {
        self.train = false;
    }

    fn is_train(&self) -> bool {
        self.train
    }

    fn opt(&mut self, buffer: &mut DummyReplayBuffer) -> Result<Option<Record>> {
        self.n_opt_calls += 1;
        if !buffer.is_ready(self.batch_size) {
            return Ok(None);
        }

        let batch: GenericTransitionBatch<VecBatch, VecBatch> = buffer.batch(self.batch_size)?;
        self.n_opts += 1;
        let mean_reward = batch.reward.iter().sum::<f32>() / batch.reward.len() as f32;
        Ok(Some(Record::from_slice(&[(
            "loss",
            RecordValue::Scalar(mean_reward),
        )])))
    }

    fn save_params(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let manifest = CheckpointManifest::new("dummy");
        Ok(vec![manifest.save(path)?])
    }

    fn load_params(&mut self, path: &Path) -> Result<()> {
        CheckpointManifest::load_for(path, "dummy")?;
        Ok(())
    }
}
