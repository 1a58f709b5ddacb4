//! A step processor producing 1-step transitions.
use super::{BatchBase, GenericTransitionBatch};
use crate::{Env, Step, StepProcessor};
use anyhow::{Context, Result};
use std::marker::PhantomData;

/// Configuration of [`SimpleStepProcessor`].
#[derive(Clone, Debug, Default)]
pub struct SimpleStepProcessorConfig {}

/// Converts [`Step`]s into transitions `(o_t, a_t, o_t+1, r_t)` for 1-step TD backup.
///
/// The processor keeps the previous observation. It must be reset with the first
/// observation of every episode.
pub struct SimpleStepProcessor<E, O, A> {
    prev_obs: Option<O>,
    phantom: PhantomData<(E, A)>,
}

impl<E, O, A> StepProcessor<E> for SimpleStepProcessor<E, O, A>
where
    E: Env,
    O: BatchBase + TryFrom<E::Obs>,
    A: BatchBase + TryFrom<E::Act>,
    anyhow::Error: From<<O as TryFrom<E::Obs>>::Error> + From<<A as TryFrom<E::Act>>::Error>,
{
    type Config = SimpleStepProcessorConfig;
    type Output = GenericTransitionBatch<O, A>;

    fn build(_config: &Self::Config) -> Self {
        Self {
            prev_obs: None,
            phantom: PhantomData,
        }
    }

    fn reset(&mut self, init_obs: E::Obs) -> Result<()> {
        self.prev_obs = Some(O::try_from(init_obs)?);
        Ok(())
    }

    fn process(&mut self, step: Step<E>) -> Result<Self::Output> {
        let next_obs = O::try_from(step.obs.clone())?;
        let obs = self
            .prev_obs
            .replace(O::try_from(step.obs)?)
            .context("prev_obs is not set. Forgot to call reset()?")?;

        // The next episode starts with reset(), which replaces prev_obs.
        if step.is_terminated == 1 || step.is_truncated == 1 {
            self.prev_obs = None;
        }

        Ok(GenericTransitionBatch {
            obs,
            act: A::try_from(step.act)?,
            next_obs,
            reward: vec![step.reward],
            is_terminated: vec![step.is_terminated],
            is_truncated: vec![step.is_truncated],
            ix_sample: None,
            weight: None,
        })
    }
}
