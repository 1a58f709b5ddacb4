use anyhow::Result;
use rink_core::{
    checkpoint::MANIFEST_FILE,
    dummy::{DummyAgent, DummyEnv, DummyEnvConfig, DummyReplayBuffer, VecBatch},
    generic_replay_buffer::{
        SimpleReplayBufferConfig, SimpleStepProcessor, SimpleStepProcessorConfig,
    },
    record::BufferedRecorder,
    Agent, DefaultEvaluator, EpisodeStats, Trainer, TrainerConfig, DRY_RUN_EPISODES,
};
use tempdir::TempDir;

type StepProc = SimpleStepProcessor<DummyEnv, VecBatch, VecBatch>;

fn train(
    config: TrainerConfig,
    env_config: DummyEnvConfig,
    agent: &mut DummyAgent,
) -> Result<BufferedRecorder> {
    let mut trainer = Trainer::<DummyEnv, StepProc, DummyReplayBuffer>::build(
        config.clone(),
        env_config.clone(),
        SimpleStepProcessorConfig::default(),
        SimpleReplayBufferConfig::default().capacity(1000),
    );
    let mut evaluator =
        DefaultEvaluator::<DummyEnv>::new(&env_config, 0, config.eval_episodes, config.max_steps)?;
    let mut recorder = BufferedRecorder::new();
    trainer.train(agent, &mut recorder, &mut evaluator)?;
    Ok(recorder)
}

fn episode_records(recorder: &BufferedRecorder) -> Vec<EpisodeStats> {
    recorder
        .iter()
        .filter(|r| r.get("steps").is_some())
        .map(|r| EpisodeStats::from_record(r).unwrap())
        .collect()
}

#[test]
fn test_no_opt_during_warmup() -> Result<()> {
    let config = TrainerConfig::default()
        .max_episodes(1)
        .max_steps(5)
        .warmup_period(64);
    let mut agent = DummyAgent::new(64);
    let recorder = train(config, DummyEnvConfig::default(), &mut agent)?;

    let episodes = episode_records(&recorder);
    assert_eq!(episodes.len(), 1);
    assert_eq!(episodes[0].steps, 5);
    assert_eq!(episodes[0].reward, 5.0);
    assert!(episodes[0].touched);
    assert_eq!(agent.n_opt_calls, 0);
    assert_eq!(recorder.n_stored(), 0);
    Ok(())
}

#[test]
fn test_fit_phase_after_warmup() -> Result<()> {
    let config = TrainerConfig::default()
        .max_episodes(3)
        .max_steps(10)
        .warmup_period(10)
        .iter_fit(4);
    let mut agent = DummyAgent::new(8);
    let recorder = train(config, DummyEnvConfig::default(), &mut agent)?;

    assert_eq!(episode_records(&recorder).len(), 3);
    assert_eq!(agent.n_opt_calls, 12);
    assert_eq!(agent.n_opts, 12);
    assert_eq!(recorder.n_stored(), 12);
    Ok(())
}

#[test]
fn test_dry_run_with_evaluation() -> Result<()> {
    let dir = TempDir::new("trainer")?;
    let config = TrainerConfig::default()
        .max_episodes(5000)
        .max_steps(2)
        .eval_interval(5)
        .eval_episodes(2)
        .dry_run(true)
        .model_dir(dir.path().to_string_lossy());
    let mut agent = DummyAgent::new(1);
    let recorder = train(config, DummyEnvConfig { episode_len: Some(1) }, &mut agent)?;

    let episodes = episode_records(&recorder);
    assert_eq!(episodes.len(), DRY_RUN_EPISODES);
    assert!(episodes.iter().all(|e| e.steps == 1));

    let n_evals = recorder
        .iter()
        .filter(|r| r.get("eval_reward").is_some())
        .count();
    assert_eq!(n_evals, 2);

    assert!(dir.path().join("best").join(MANIFEST_FILE).is_file());
    assert!(!dir.path().join("agent").exists());
    assert!(agent.is_train());
    Ok(())
}
