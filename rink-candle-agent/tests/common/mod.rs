//! A point mass moving toward the origin, used to exercise the agents.
#![allow(dead_code)]
use anyhow::{Context, Result};
use candle_core::{Device, Tensor};
use rand::{rngs::SmallRng, Rng, SeedableRng};
use rink_candle_agent::TensorBatch;
use rink_core::{
    generic_replay_buffer::{
        SimpleReplayBuffer, SimpleStepProcessor, SimpleStepProcessorConfig,
    },
    record::Record,
    Act, Env, ExperienceBufferBase, Info, Obs, Outcome, Step, StepProcessor,
};
use std::marker::PhantomData;

pub type ReplayBuffer = SimpleReplayBuffer<TensorBatch, TensorBatch>;

#[derive(Clone, Debug)]
pub struct PointObs(pub Vec<f32>);

impl Obs for PointObs {}

impl TryFrom<PointObs> for Tensor {
    type Error = anyhow::Error;

    fn try_from(obs: PointObs) -> Result<Self> {
        Ok(Tensor::from_vec(obs.0, (1, 2), &Device::Cpu)?)
    }
}

impl TryFrom<PointObs> for TensorBatch {
    type Error = anyhow::Error;

    fn try_from(obs: PointObs) -> Result<Self> {
        Ok(TensorBatch::from_tensor(obs.try_into()?))
    }
}

/// Actions of the point mass.
pub trait Move: Act {
    fn velocity(&self) -> [f32; 2];
}

/// Continuous velocity in `[-1, 1]^2`.
#[derive(Clone, Debug)]
pub struct PointAct(pub Vec<f32>);

impl Act for PointAct {}

impl Move for PointAct {
    fn velocity(&self) -> [f32; 2] {
        [self.0[0].clamp(-1., 1.), self.0[1].clamp(-1., 1.)]
    }
}

impl TryFrom<Tensor> for PointAct {
    type Error = anyhow::Error;

    fn try_from(t: Tensor) -> Result<Self> {
        Ok(PointAct(t.flatten_all()?.to_vec1()?))
    }
}

impl TryFrom<PointAct> for TensorBatch {
    type Error = anyhow::Error;

    fn try_from(act: PointAct) -> Result<Self> {
        let t = Tensor::from_vec(act.0, (1, 2), &Device::Cpu)?;
        Ok(TensorBatch::from_tensor(t))
    }
}

/// One of four directions.
#[derive(Clone, Debug, PartialEq)]
pub struct ChoiceAct(pub i64);

impl Act for ChoiceAct {}

impl Move for ChoiceAct {
    fn velocity(&self) -> [f32; 2] {
        match self.0 {
            0 => [1., 0.],
            1 => [-1., 0.],
            2 => [0., 1.],
            _ => [0., -1.],
        }
    }
}

impl TryFrom<Tensor> for ChoiceAct {
    type Error = anyhow::Error;

    fn try_from(t: Tensor) -> Result<Self> {
        let v: Vec<i64> = t.flatten_all()?.to_vec1()?;
        Ok(ChoiceAct(*v.first().context("Empty action tensor")?))
    }
}

impl TryFrom<ChoiceAct> for TensorBatch {
    type Error = anyhow::Error;

    fn try_from(act: ChoiceAct) -> Result<Self> {
        let t = Tensor::from_vec(vec![act.0], (1, 1), &Device::Cpu)?;
        Ok(TensorBatch::from_tensor(t))
    }
}

#[derive(Clone, Debug)]
pub struct PointInfo {
    reached: bool,
}

impl Info for PointInfo {
    fn outcome(&self) -> Option<Outcome> {
        self.reached.then_some(Outcome::Won)
    }
}

#[derive(Clone, Debug, Default)]
pub struct PointEnvConfig {}

/// The episode terminates when the point comes within 0.1 of the origin.
pub struct PointEnv<A> {
    pos: [f32; 2],
    rng: SmallRng,
    phantom: PhantomData<A>,
}

impl<A> PointEnv<A> {
    fn obs(&self) -> PointObs {
        PointObs(self.pos.to_vec())
    }

    fn dist(&self) -> f32 {
        (self.pos[0].powi(2) + self.pos[1].powi(2)).sqrt()
    }
}

impl<A: Move> Env for PointEnv<A> {
    type Config = PointEnvConfig;
    type Obs = PointObs;
    type Act = A;
    type Info = PointInfo;

    fn build(_config: &Self::Config, seed: i64) -> Result<Self> {
        Ok(Self {
            pos: [0., 0.],
            rng: SmallRng::seed_from_u64(seed as u64),
            phantom: PhantomData,
        })
    }

    fn step(&mut self, a: &A) -> Result<(Step<Self>, Record)> {
        let [vx, vy] = a.velocity();
        self.pos = [self.pos[0] + 0.1 * vx, self.pos[1] + 0.1 * vy];
        let dist = self.dist();
        let reached = dist < 0.1;
        let info = PointInfo { reached };
        let step = Step::new(self.obs(), a.clone(), -dist, reached as i8, 0, info);
        Ok((step, Record::empty()))
    }

    fn reset(&mut self) -> Result<PointObs> {
        self.pos = [self.rng.gen_range(-1.0..1.0), self.rng.gen_range(-1.0..1.0)];
        Ok(self.obs())
    }

    fn reset_with_index(&mut self, ix: usize) -> Result<PointObs> {
        self.rng = SmallRng::seed_from_u64(ix as u64);
        self.reset()
    }
}

/// Pushes `n` transitions of the environment driven by `policy` into `buffer`.
pub fn fill<A>(buffer: &mut ReplayBuffer, n: usize, policy: impl Fn(usize) -> A) -> Result<()>
where
    A: Move,
    TensorBatch: TryFrom<A, Error = anyhow::Error>,
{
    let mut env = PointEnv::<A>::build(&PointEnvConfig::default(), 0)?;
    let mut step_proc = SimpleStepProcessor::<PointEnv<A>, TensorBatch, TensorBatch>::build(
        &SimpleStepProcessorConfig::default(),
    );
    step_proc.reset(env.reset()?)?;

    for i in 0..n {
        let (step, _) = env.step(&policy(i))?;
        let is_done = step.is_done();
        buffer.push(step_proc.process(step)?)?;
        if is_done {
            step_proc.reset(env.reset()?)?;
        }
    }

    Ok(())
}

pub fn obs(x: f32, y: f32) -> PointObs {
    PointObs(vec![x, y])
}
