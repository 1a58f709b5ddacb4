//! DQN agent implemented with candle.
use super::{config::DqnConfig, explorer::EpsilonGreedy, model::DqnModel};
use crate::{
    model::SubModel1,
    util::{gamma_not_terminated, track_with_replace_substring, vec_to_tensor, CriticLoss, OutDim},
    Device as RinkDevice,
};
use anyhow::Result;
use candle_core::{shape::D, DType, Device, Tensor};
use log::trace;
use rand::{rngs::SmallRng, SeedableRng};
use rink_core::{
    checkpoint::CheckpointManifest,
    error::RinkError,
    record::{Record, RecordValue},
    Agent, Configurable, Env, Policy, ReplayBufferBase, TransitionBatch,
};
use serde::{de::DeserializeOwned, Serialize};
use std::{
    fmt::Debug,
    marker::PhantomData,
    path::{Path, PathBuf},
};

/// Kind of the agent written in checkpoint manifests.
pub const DQN_KIND: &str = "dqn";

#[allow(clippy::upper_case_acronyms)]
/// DQN agent implemented with candle.
///
/// Actions are indices of a discrete action table. In training mode, actions are
/// chosen with [`EpsilonGreedy`]; in evaluation mode, they are greedy.
pub struct Dqn<E, Q, R>
where
    Q: SubModel1<Input = Tensor, Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + OutDim + Debug + PartialEq + Clone,
{
    soft_update_interval: usize,
    batch_size: usize,
    qnet: DqnModel<Q>,
    qnet_tgt: DqnModel<Q>,
    train: bool,
    phantom: PhantomData<(E, R)>,
    discount_factor: f64,
    tau: f64,
    explorer: EpsilonGreedy,
    device: Device,
    n_opts: usize,
    double_dqn: bool,
    critic_loss: CriticLoss,
    rng: SmallRng,
}

impl<E, Q, R> Dqn<E, Q, R>
where
    E: Env,
    Q: SubModel1<Input = Tensor, Output = Tensor>,
    R: ReplayBufferBase,
    Q::Config: DeserializeOwned + Serialize + OutDim + Debug + PartialEq + Clone,
    <R::Batch as TransitionBatch>::ObsBatch: TryInto<Tensor, Error = anyhow::Error>,
    <R::Batch as TransitionBatch>::ActBatch: TryInto<Tensor, Error = anyhow::Error>,
{
    /// Returns the current epsilon of the explorer.
    pub fn epsilon(&self) -> f64 {
        self.explorer.eps()
    }

    /// Returns the number of optimization steps done so far.
    pub fn n_opts(&self) -> usize {
        self.n_opts
    }

    /// Returns action values of the target network.
    fn next_qvals(&self, next_obs: &Tensor) -> Result<Tensor> {
        let q = if self.double_dqn {
            let a = self.qnet.forward(next_obs)?.argmax_keepdim(D::Minus1)?;
            self.qnet_tgt.forward(next_obs)?.gather(&a, D::Minus1)?
        } else {
            self.qnet_tgt.forward(next_obs)?.max_keepdim(D::Minus1)?
        };
        Ok(q.squeeze(D::Minus1)?)
    }

    /// Updates the action-value function and returns the loss and absolute TD errors.
    fn update_critic(&mut self, buffer: &mut R) -> Result<(f32, Vec<f32>)> {
        let batch = buffer.batch(self.batch_size)?;
        let (obs, act, next_obs, reward, is_terminated, _, ixs, weight) = batch.unpack();
        let (obs, act, next_obs): (Tensor, Tensor, Tensor) =
            (obs.try_into()?, act.try_into()?, next_obs.try_into()?);
        let batch_size = reward.len();
        let obs = obs.to_device(&self.device)?;
        let act = act
            .to_device(&self.device)?
            .to_dtype(DType::U32)?
            .reshape((batch_size, 1))?;
        let next_obs = next_obs.to_device(&self.device)?;
        let reward = vec_to_tensor(&reward, &self.device)?;
        let gamma_not_terminated =
            gamma_not_terminated(self.discount_factor, &is_terminated, &self.device)?;

        let pred = self
            .qnet
            .forward(&obs)?
            .gather(&act, D::Minus1)?
            .squeeze(D::Minus1)?;

        let tgt = {
            let q = self.next_qvals(&next_obs)?;
            (reward + (gamma_not_terminated * q)?)?
        }
        .detach();

        let td_err: Vec<f32> = (pred.detach() - &tgt)?.abs()?.to_vec1()?;

        let weight = weight
            .map(|w| vec_to_tensor(&w, &self.device))
            .transpose()?;
        let loss = self.critic_loss.loss(&pred, &tgt, weight.as_ref())?;
        self.qnet.backward_step(&loss)?;

        if weight.is_some() {
            buffer.update_priority(&ixs, &Some(td_err.clone()))?;
        }

        Ok((loss.to_scalar::<f32>()?, td_err))
    }

    fn soft_update(&mut self) -> Result<()> {
        let ss = (self.qnet.prefix(), self.qnet_tgt.prefix());
        track_with_replace_substring(self.qnet_tgt.varmap(), self.qnet.varmap(), self.tau, ss)
    }

    fn opt_(&mut self, buffer: &mut R) -> Result<Record> {
        let (loss_critic, _) = self.update_critic(buffer)?;

        self.n_opts += 1;
        if self.n_opts % self.soft_update_interval == 0 {
            trace!("Soft update of the target network at {}", self.n_opts);
            self.soft_update()?;
        }

        Ok(Record::from_slice(&[
            ("loss_critic", RecordValue::Scalar(loss_critic)),
            ("epsilon", RecordValue::Scalar(self.explorer.eps() as f32)),
        ]))
    }
}

impl<E, Q, R> Configurable for Dqn<E, Q, R>
where
    E: Env,
    Q: SubModel1<Input = Tensor, Output = Tensor>,
    R: ReplayBufferBase,
    Q::Config: DeserializeOwned + Serialize + OutDim + Debug + PartialEq + Clone,
{
    type Config = DqnConfig<Q>;

    /// Constructs DQN agent.
    ///
    /// The target network is a copy of the action-value function.
    fn build(config: Self::Config) -> Result<Self> {
        if config.soft_update_interval == 0 {
            let msg = "soft_update_interval must be positive".to_string();
            return Err(RinkError::InvalidConfig(msg).into());
        }
        let device = config.device.unwrap_or(RinkDevice::Cpu).build()?;
        let qnet = DqnModel::build(config.model_config.clone(), &device, "qnet")?;
        let qnet_tgt = DqnModel::build(config.model_config, &device, "qnet_tgt")?;
        track_with_replace_substring(qnet_tgt.varmap(), qnet.varmap(), 1.0, ("qnet", "qnet_tgt"))?;

        Ok(Dqn {
            qnet,
            qnet_tgt,
            soft_update_interval: config.soft_update_interval,
            batch_size: config.batch_size,
            discount_factor: config.discount_factor,
            tau: config.tau,
            train: false,
            explorer: config.explorer,
            device,
            n_opts: 0,
            double_dqn: config.double_dqn,
            critic_loss: config.critic_loss,
            phantom: PhantomData,
            rng: SmallRng::seed_from_u64(config.seed),
        })
    }
}

impl<E, Q, R> Policy<E> for Dqn<E, Q, R>
where
    E: Env,
    Q: SubModel1<Input = Tensor, Output = Tensor>,
    R: ReplayBufferBase,
    E::Obs: TryInto<Tensor, Error = anyhow::Error>,
    E::Act: TryFrom<Tensor, Error = anyhow::Error>,
    Q::Config: DeserializeOwned + Serialize + OutDim + Debug + PartialEq + Clone,
{
    fn sample(&mut self, obs: &E::Obs) -> Result<E::Act> {
        let obs: Tensor = obs.clone().try_into()?;
        let qvals = self.qnet.forward(&obs.to_device(&self.device)?)?;
        let act = if self.train {
            self.explorer.action(&qvals, &mut self.rng)?
        } else {
            qvals.argmax(D::Minus1)?.to_dtype(DType::I64)?
        };
        E::Act::try_from(act.to_device(&Device::Cpu)?)
    }
}

impl<E, Q, R> Agent<E, R> for Dqn<E, Q, R>
where
    E: Env,
    Q: SubModel1<Input = Tensor, Output = Tensor>,
    R: ReplayBufferBase,
    E::Obs: TryInto<Tensor, Error = anyhow::Error>,
    E::Act: TryFrom<Tensor, Error = anyhow::Error>,
    Q::Config: DeserializeOwned + Serialize + OutDim + Debug + PartialEq + Clone,
    <R::Batch as TransitionBatch>::ObsBatch: TryInto<Tensor, Error = anyhow::Error>,
    <R::Batch as TransitionBatch>::ActBatch: TryInto<Tensor, Error = anyhow::Error>,
{
    fn train(&mut self) {
        self.train = true;
    }

    fn eval(&mut self) {
        self.train = false;
    }

    fn is_train(&self) -> bool {
        self.train
    }

    fn opt(&mut self, buffer: &mut R) -> Result<Option<Record>> {
        if !buffer.is_ready(self.batch_size) {
            return Ok(None);
        }
        Ok(Some(self.opt_(buffer)?))
    }

    fn save_params(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let mut manifest = CheckpointManifest::new(DQN_KIND);
        let qnet_path = self.qnet.save(path, &mut manifest)?;
        let qnet_tgt_path = self.qnet_tgt.save(path, &mut manifest)?;
        let manifest_path = manifest.save(path)?;
        Ok(vec![qnet_path, qnet_tgt_path, manifest_path])
    }

    fn load_params(&mut self, path: &Path) -> Result<()> {
        let manifest = CheckpointManifest::load_for(path, DQN_KIND)?;
        self.qnet.load(path, &manifest)?;
        self.qnet_tgt.load(path, &manifest)?;
        Ok(())
    }
}
