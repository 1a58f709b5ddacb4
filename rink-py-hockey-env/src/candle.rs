//! Conversion of observations and actions into [`Tensor`] and [`TensorBatch`].
//!
//! A single observation or action becomes a tensor with a batch axis of size 1.
use crate::{act::ACT_DIM, ContinuousAct, DiscreteAct, HockeyObs, OBS_DIM};
use anyhow::{Context, Result};
use candle_core::{Device, Tensor};
use rink_candle_agent::TensorBatch;

impl TryFrom<HockeyObs> for Tensor {
    type Error = anyhow::Error;

    fn try_from(obs: HockeyObs) -> Result<Self> {
        Ok(Tensor::from_vec(obs.0, (1, OBS_DIM), &Device::Cpu)?)
    }
}

impl TryFrom<HockeyObs> for TensorBatch {
    type Error = anyhow::Error;

    fn try_from(obs: HockeyObs) -> Result<Self> {
        Ok(TensorBatch::from_tensor(obs.try_into()?))
    }
}

impl TryFrom<Tensor> for ContinuousAct {
    type Error = anyhow::Error;

    fn try_from(t: Tensor) -> Result<Self> {
        Ok(ContinuousAct(t.flatten_all()?.to_vec1()?))
    }
}

impl TryFrom<ContinuousAct> for TensorBatch {
    type Error = anyhow::Error;

    fn try_from(act: ContinuousAct) -> Result<Self> {
        let t = Tensor::from_vec(act.0, (1, ACT_DIM), &Device::Cpu)?;
        Ok(TensorBatch::from_tensor(t))
    }
}

impl TryFrom<Tensor> for DiscreteAct {
    type Error = anyhow::Error;

    fn try_from(t: Tensor) -> Result<Self> {
        let v: Vec<i64> = t.flatten_all()?.to_vec1()?;
        Ok(DiscreteAct(*v.first().context("Empty action tensor")?))
    }
}

impl TryFrom<DiscreteAct> for TensorBatch {
    type Error = anyhow::Error;

    fn try_from(act: DiscreteAct) -> Result<Self> {
        let t = Tensor::from_vec(vec![act.0], (1, 1), &Device::Cpu)?;
        Ok(TensorBatch::from_tensor(t))
    }
}
