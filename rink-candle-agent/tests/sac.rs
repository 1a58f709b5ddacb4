mod common;
use anyhow::Result;
use common::{fill, obs, PointAct, PointEnv, PointEnvConfig, ReplayBuffer};
use rink_candle_agent::{
    mlp::{Mlp, Mlp2, MlpConfig},
    sac::{EntCoefMode, Sac, SacConfig},
    util::{actor::GaussianActorConfig, critic::MultiCriticConfig, CriticLoss},
    TensorBatch,
};
use rink_core::{
    checkpoint::MANIFEST_FILE,
    error::RinkError,
    generic_replay_buffer::{
        PerConfig, SimpleReplayBufferConfig, SimpleStepProcessor, SimpleStepProcessorConfig,
    },
    record::BufferedRecorder,
    Agent, Configurable, DefaultEvaluator, Policy, ReplayBufferBase, Trainer, TrainerConfig,
};
use tempdir::TempDir;

type Env = PointEnv<PointAct>;
type SacAgent = Sac<Env, Mlp, Mlp2, ReplayBuffer>;
type StepProc = SimpleStepProcessor<Env, TensorBatch, TensorBatch>;

fn sac_config() -> SacConfig<Mlp, Mlp2> {
    SacConfig::default()
        .batch_size(8)
        .actor_config(
            GaussianActorConfig::default().policy_config(MlpConfig::new(2, vec![16, 16], 2, false)),
        )
        .critic_config(
            MultiCriticConfig::default().q_config(MlpConfig::new(4, vec![16, 16], 1, false)),
        )
}

fn random_policy(i: usize) -> PointAct {
    let x = (i as f32 * 0.7).sin();
    PointAct(vec![x, -x])
}

#[test]
fn test_opt_is_skipped_when_underfilled() -> Result<()> {
    let mut agent = SacAgent::build(sac_config())?;
    let mut buffer = ReplayBuffer::build(&SimpleReplayBufferConfig::default().capacity(100));
    fill(&mut buffer, 7, random_policy)?;
    assert!(agent.opt(&mut buffer)?.is_none());
    assert_eq!(agent.n_opts(), 0);
    Ok(())
}

#[test]
fn test_opt_returns_finite_losses() -> Result<()> {
    for (ent_coef_mode, critic_loss) in [
        (EntCoefMode::Fix(0.2), CriticLoss::Mse),
        (EntCoefMode::Auto(-2.0, 0.001), CriticLoss::SmoothL1),
    ] {
        let config = sac_config()
            .ent_coef_mode(ent_coef_mode)
            .critic_loss(critic_loss)
            .update_target_every(2);
        let mut agent = SacAgent::build(config)?;
        let mut buffer = ReplayBuffer::build(&SimpleReplayBufferConfig::default().capacity(100));
        fill(&mut buffer, 32, random_policy)?;

        for _ in 0..3 {
            let record = agent.opt(&mut buffer)?.expect("buffer is ready");
            for key in ["loss_critic", "loss_actor", "ent_coef"] {
                assert!(record.get_scalar(key)?.is_finite(), "{} is not finite", key);
            }
        }
        assert_eq!(agent.n_opts(), 3);
    }
    Ok(())
}

#[test]
fn test_opt_with_per() -> Result<()> {
    let mut agent = SacAgent::build(sac_config())?;
    let config = SimpleReplayBufferConfig::default()
        .capacity(100)
        .per_config(Some(PerConfig::default()));
    let mut buffer = ReplayBuffer::build(&config);
    fill(&mut buffer, 32, random_policy)?;

    for _ in 0..3 {
        let record = agent.opt(&mut buffer)?.expect("buffer is ready");
        assert!(record.get_scalar("loss_critic")?.is_finite());
    }
    Ok(())
}

#[test]
fn test_train_and_eval_actions() -> Result<()> {
    let mut agent = SacAgent::build(sac_config())?;
    let o = obs(0.3, -0.2);

    agent.eval();
    let a1 = Policy::<Env>::sample(&mut agent, &o)?;
    let a2 = Policy::<Env>::sample(&mut agent, &o)?;
    assert_eq!(a1.0, a2.0);

    agent.train();
    let a = Policy::<Env>::sample(&mut agent, &o)?;
    assert_eq!(a.0.len(), 2);
    assert!(a.0.iter().all(|v| v.abs() <= 1.0));
    Ok(())
}

#[test]
fn test_save_and_load() -> Result<()> {
    let dir = TempDir::new("sac")?;
    let o = obs(0.5, 0.5);

    let mut agent1 = SacAgent::build(sac_config())?;
    let mut agent2 = SacAgent::build(sac_config())?;
    agent1.eval();
    agent2.eval();

    let files = agent1.save_params(dir.path())?;
    assert!(files.iter().all(|f| f.is_file()));
    assert!(dir.path().join(MANIFEST_FILE).is_file());

    let a1 = Policy::<Env>::sample(&mut agent1, &o)?;
    assert_ne!(a1.0, Policy::<Env>::sample(&mut agent2, &o)?.0);
    agent2.load_params(dir.path())?;
    assert_eq!(a1.0, Policy::<Env>::sample(&mut agent2, &o)?.0);
    Ok(())
}

#[test]
fn test_load_missing_checkpoint() -> Result<()> {
    let dir = TempDir::new("sac")?;
    let mut agent = SacAgent::build(sac_config())?;
    let err = agent.load_params(&dir.path().join("agent")).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<RinkError>(),
        Some(RinkError::CheckpointNotFound(_))
    ));
    Ok(())
}

#[test]
fn test_train_with_trainer() -> Result<()> {
    let dir = TempDir::new("sac")?;
    let config = TrainerConfig::default()
        .max_episodes(4)
        .max_steps(10)
        .warmup_period(8)
        .iter_fit(2)
        .eval_interval(2)
        .eval_episodes(2)
        .model_dir(dir.path().to_string_lossy());
    let mut trainer = Trainer::<Env, StepProc, ReplayBuffer>::build(
        config.clone(),
        PointEnvConfig::default(),
        SimpleStepProcessorConfig::default(),
        SimpleReplayBufferConfig::default().capacity(1000),
    );
    let mut agent = SacAgent::build(sac_config())?;
    let mut evaluator = DefaultEvaluator::<Env>::new(
        &PointEnvConfig::default(),
        0,
        config.eval_episodes,
        config.max_steps,
    )?;
    let mut recorder = BufferedRecorder::new();
    trainer.train(&mut agent, &mut recorder, &mut evaluator)?;

    assert!(agent.n_opts() > 0);
    assert!(dir.path().join("best").join(MANIFEST_FILE).is_file());
    assert!(!dir.path().join("agent").exists());
    Ok(())
}
