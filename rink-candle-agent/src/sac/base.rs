use super::{EntCoef, SacConfig};
use crate::{
    model::{SubModel1, SubModel2},
    util::{
        actor::GaussianActor, critic::MultiCritic, gamma_not_terminated, vec_to_tensor,
        CriticLoss, OutDim,
    },
    Device as RinkDevice,
};
use anyhow::Result;
use candle_core::{Device, Tensor};
use log::trace;
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
pub const SAC_KIND: &str = "sac";

type ActionValue = Tensor;
type ActMean = Tensor;
type ActLogStd = Tensor;

/// Soft actor critic (SAC) agent.
///
/// In training mode, actions are sampled from the tanh-squashed Gaussian policy. In
/// evaluation mode, the action is `tanh(mean)`.
pub struct Sac<E, Q, P, R>
where
    Q: SubModel2<Input1 = Tensor, Input2 = Tensor, Output = ActionValue>,
    P: SubModel1<Input = Tensor, Output = (ActMean, ActLogStd)>,
    Q::Config: DeserializeOwned + Serialize + Debug + PartialEq + Clone,
    P::Config: DeserializeOwned + Serialize + OutDim + Debug + PartialEq + Clone,
{
    critic: MultiCritic<Q>,
    actor: GaussianActor<P>,
    gamma: f64,
    ent_coef: EntCoef,
    update_target_every: usize,
    batch_size: usize,
    reward_scale: f32,
    train: bool,
    n_opts: usize,
    critic_loss: CriticLoss,
    phantom: PhantomData<(E, R)>,
    device: Device,
}

impl<E, Q, P, R> Sac<E, Q, P, R>
where
    E: Env,
    Q: SubModel2<Input1 = Tensor, Input2 = Tensor, Output = ActionValue>,
    P: SubModel1<Input = Tensor, Output = (ActMean, ActLogStd)>,
    R: ReplayBufferBase,
    Q::Config: DeserializeOwned + Serialize + Debug + PartialEq + Clone,
    P::Config: DeserializeOwned + Serialize + OutDim + Debug + PartialEq + Clone,
    <R::Batch as TransitionBatch>::ObsBatch: TryInto<Tensor, Error = anyhow::Error>,
    <R::Batch as TransitionBatch>::ActBatch: TryInto<Tensor, Error = anyhow::Error>,
{
    /// Returns an action for a batch of observations.
    ///
    /// In training mode, the action is sampled from the policy and returned with its
    /// log probability. In evaluation mode, the deterministic action is returned
    /// without log probability.
    pub fn act(&self, obs: &Tensor) -> Result<(Tensor, Option<Tensor>)> {
        if self.train {
            let (act, logp) = self.actor.sample_with_logp(obs)?;
            Ok((act, Some(logp)))
        } else {
            Ok((self.actor.greedy(obs)?, None))
        }
    }

    /// Returns the number of optimization steps done so far.
    pub fn n_opts(&self) -> usize {
        self.n_opts
    }

    /// Updates the critics and returns the loss and the absolute TD errors, the latter
    /// averaged over the critics.
    fn update_critic(
        &mut self,
        obs: &Tensor,
        act: &Tensor,
        next_obs: &Tensor,
        reward: &Tensor,
        gamma_not_terminated: &Tensor,
        weight: Option<&Tensor>,
    ) -> Result<(f32, Vec<f32>)> {
        // Prediction
        let qs = self.critic.qvals(obs, act)?;

        // Target
        let tgt = {
            let (next_act, next_logp) = self.actor.sample_with_logp(next_obs)?;
            let next_q = self.critic.qvals_min_tgt(next_obs, &next_act)?;
            let alpha = self.ent_coef.alpha()?;
            let next_v = (next_q - alpha.broadcast_mul(&next_logp)?)?;
            let reward = reward.affine(self.reward_scale as f64, 0.0)?;
            (reward + (gamma_not_terminated * next_v)?)?
        }
        .detach();
        debug_assert_eq!(tgt.dims(), [self.batch_size]);

        let td_err: Vec<f32> = Tensor::stack(&qs, 0)?
            .detach()
            .broadcast_sub(&tgt)?
            .abs()?
            .mean(0)?
            .to_vec1()?;

        // Loss
        let losses = qs
            .iter()
            .map(|pred| self.critic_loss.loss(pred, &tgt, weight))
            .collect::<Result<Vec<_>>>()?;
        let loss = Tensor::stack(&losses, 0)?.mean_all()?;
        self.critic.backward_step(&loss)?;

        Ok((loss.to_scalar::<f32>()?, td_err))
    }

    fn update_actor(&mut self, obs: &Tensor) -> Result<f32> {
        let (act, logp) = self.actor.sample_with_logp(obs)?;

        // Update the entropy coefficient
        self.ent_coef.update(&logp)?;

        let loss = {
            let q = self.critic.qvals_min(obs, &act)?;
            let alpha = self.ent_coef.alpha()?;
            (alpha.broadcast_mul(&logp)? - q)?.mean_all()?
        };
        self.actor.backward_step(&loss)?;

        Ok(loss.to_scalar::<f32>()?)
    }

    fn opt_(&mut self, buffer: &mut R) -> Result<Record> {
        let batch = buffer.batch(self.batch_size)?;
        let (obs, act, next_obs, reward, is_terminated, _, ixs, weight) = batch.unpack();
        let (obs, act, next_obs): (Tensor, Tensor, Tensor) =
            (obs.try_into()?, act.try_into()?, next_obs.try_into()?);
        let obs = obs.to_device(&self.device)?;
        let act = act.to_device(&self.device)?;
        let next_obs = next_obs.to_device(&self.device)?;
        let reward = vec_to_tensor(&reward, &self.device)?;
        let gamma_not_terminated = gamma_not_terminated(self.gamma, &is_terminated, &self.device)?;
        let weight = weight
            .map(|w| vec_to_tensor(&w, &self.device))
            .transpose()?;

        let (loss_critic, td_err) = self.update_critic(
            &obs,
            &act,
            &next_obs,
            &reward,
            &gamma_not_terminated,
            weight.as_ref(),
        )?;
        let loss_actor = self.update_actor(&obs)?;

        if weight.is_some() {
            buffer.update_priority(&ixs, &Some(td_err))?;
        }

        self.n_opts += 1;
        if self.n_opts % self.update_target_every == 0 {
            trace!("Soft update of the target critics at {}", self.n_opts);
            self.critic.soft_update()?;
        }

        Ok(Record::from_slice(&[
            ("loss_critic", RecordValue::Scalar(loss_critic)),
            ("loss_actor", RecordValue::Scalar(loss_actor)),
            ("ent_coef", RecordValue::Scalar(self.ent_coef.alpha_scalar()?)),
        ]))
    }
}

impl<E, Q, P, R> Policy<E> for Sac<E, Q, P, R>
where
    E: Env,
    Q: SubModel2<Input1 = Tensor, Input2 = Tensor, Output = ActionValue>,
    P: SubModel1<Input = Tensor, Output = (ActMean, ActLogStd)>,
    R: ReplayBufferBase,
    E::Obs: TryInto<Tensor, Error = anyhow::Error>,
    E::Act: TryFrom<Tensor, Error = anyhow::Error>,
    Q::Config: DeserializeOwned + Serialize + Debug + PartialEq + Clone,
    P::Config: DeserializeOwned + Serialize + OutDim + Debug + PartialEq + Clone,
    <R::Batch as TransitionBatch>::ObsBatch: TryInto<Tensor, Error = anyhow::Error>,
    <R::Batch as TransitionBatch>::ActBatch: TryInto<Tensor, Error = anyhow::Error>,
{
    fn sample(&mut self, obs: &E::Obs) -> Result<E::Act> {
        let obs: Tensor = obs.clone().try_into()?;
        let (act, _) = self.act(&obs.to_device(&self.device)?)?;
        E::Act::try_from(act.to_device(&Device::Cpu)?)
    }
}

impl<E, Q, P, R> Configurable for Sac<E, Q, P, R>
where
    E: Env,
    Q: SubModel2<Input1 = Tensor, Input2 = Tensor, Output = ActionValue>,
    P: SubModel1<Input = Tensor, Output = (ActMean, ActLogStd)>,
    R: ReplayBufferBase,
    Q::Config: DeserializeOwned + Serialize + Debug + PartialEq + Clone,
    P::Config: DeserializeOwned + Serialize + OutDim + Debug + PartialEq + Clone,
{
    type Config = SacConfig<Q, P>;

    /// Constructs [`Sac`] agent.
    fn build(config: Self::Config) -> Result<Self> {
        if config.update_target_every == 0 {
            let msg = "update_target_every must be positive".to_string();
            return Err(RinkError::InvalidConfig(msg).into());
        }
        let device = config.device.unwrap_or(RinkDevice::Cpu).build()?;
        let actor = GaussianActor::build(config.actor_config, device.clone())?;
        let critic = MultiCritic::build(config.critic_config, device.clone())?;
        let ent_coef = EntCoef::new(config.ent_coef_mode, device.clone())?;

        Ok(Sac {
            actor,
            critic,
            gamma: config.gamma,
            ent_coef,
            update_target_every: config.update_target_every,
            batch_size: config.batch_size,
            reward_scale: config.reward_scale,
            train: false,
            critic_loss: config.critic_loss,
            n_opts: 0,
            device,
            phantom: PhantomData,
        })
    }
}

impl<E, Q, P, R> Agent<E, R> for Sac<E, Q, P, R>
where
    E: Env,
    Q: SubModel2<Input1 = Tensor, Input2 = Tensor, Output = ActionValue>,
    P: SubModel1<Input = Tensor, Output = (ActMean, ActLogStd)>,
    R: ReplayBufferBase,
    E::Obs: TryInto<Tensor, Error = anyhow::Error>,
    E::Act: TryFrom<Tensor, Error = anyhow::Error>,
    Q::Config: DeserializeOwned + Serialize + Debug + PartialEq + Clone,
    P::Config: DeserializeOwned + Serialize + OutDim + Debug + PartialEq + Clone,
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
        let mut manifest = CheckpointManifest::new(SAC_KIND);
        let actor_path = self.actor.save(path, &mut manifest)?;
        let (critic_path, critic_tgt_path) = self.critic.save(path, &mut manifest)?;
        let ent_coef_path = self.ent_coef.save(path, &mut manifest)?;
        let manifest_path = manifest.save(path)?;

        Ok(vec![
            actor_path,
            critic_path,
            critic_tgt_path,
            ent_coef_path,
            manifest_path,
        ])
    }

    fn load_params(&mut self, path: &Path) -> Result<()> {
        let manifest = CheckpointManifest::load_for(path, SAC_KIND)?;
        self.actor.load(path, &manifest)?;
        self.critic.load(path, &manifest)?;
        self.ent_coef.load(path, &manifest)?;

        Ok(())
    }
}
