//! Wrapper of the hockey environment in Python.
use crate::{
    act::ACT_DIM, HockeyAct, HockeyEnvConfig, HockeyEnvError, HockeyObs, Opponent, OBS_DIM,
};
use anyhow::Result;
use log::{info, trace};
use numpy::{PyArray1, PyArrayDyn};
use pyo3::{
    types::{IntoPyDict, PyDict, PyTuple},
    IntoPy, PyAny, PyObject, Python, ToPyObject,
};
use rand::{rngs::SmallRng, Rng, SeedableRng};
use rink_core::{record::Record, Env, Info, Outcome, Step};
use std::marker::PhantomData;

/// Information given at every step of the game.
///
/// The fields are those of the `info` dictionary returned by the Python environment.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HockeyInfo {
    /// 1 if the player scored, -1 if the opponent scored, 0 otherwise.
    pub winner: i32,

    /// Positive if the player touched the puck in this step.
    pub reward_touch_puck: f32,

    /// Reward shaping term for being close to the puck.
    pub reward_closeness_to_puck: f32,

    /// Reward shaping term for the puck moving toward the goal of the opponent.
    pub reward_puck_direction: f32,
}

impl HockeyInfo {
    fn from_py(info: &PyAny) -> Result<Self> {
        let info: &PyDict = info.extract()?;
        let get = |key: &str| -> Result<f64> {
            match info.get_item(key) {
                Some(v) => Ok(v.extract()?),
                None => Ok(0.0),
            }
        };

        Ok(Self {
            winner: get("winner")? as i32,
            reward_touch_puck: get("reward_touch_puck")? as f32,
            reward_closeness_to_puck: get("reward_closeness_to_puck")? as f32,
            reward_puck_direction: get("reward_puck_direction")? as f32,
        })
    }
}

impl Info for HockeyInfo {
    fn outcome(&self) -> Option<Outcome> {
        match self.winner {
            0 => None,
            w => Some(Outcome::from_winner(w)),
        }
    }

    fn touched_puck(&self) -> bool {
        self.reward_touch_puck > 0.0
    }
}

/// Splits the single `done` flag of the 4-tuple step API.
///
/// A game without a winner ends only when the time is over, which is a truncation.
fn split_done(done: bool, winner: i32) -> (i8, i8) {
    match (done, winner) {
        (false, _) => (0, 0),
        (true, 0) => (0, 1),
        (true, _) => (1, 0),
    }
}

fn unexpected(method: &str, detail: impl Into<String>) -> HockeyEnvError {
    HockeyEnvError::UnexpectedReturn {
        method: method.to_string(),
        detail: detail.into(),
    }
}

/// Converts an array-like Python object into a vector of `f32`.
fn to_f32_vec(py: Python, obj: &PyAny) -> Result<Vec<f32>> {
    let arr = py
        .import("numpy")?
        .getattr("asarray")?
        .call1((obj, "float32"))?;
    let arr: &PyArrayDyn<f32> = arr.extract()?;
    Ok(arr.to_owned_array().iter().copied().collect())
}

/// The laser-hockey game, `laserhockey.hockey_env.HockeyEnv` in Python.
///
/// The agent plays the first player. The second player is controlled by one of the
/// opponents in [`HockeyEnvConfig::opponents`], chosen at random at every reset.
///
/// The type parameter `A` is the action type of the agent, [`ContinuousAct`] or
/// [`DiscreteAct`]. Discrete actions are looked up in
/// [`HockeyEnvConfig::action_table`].
///
/// [`ContinuousAct`]: crate::ContinuousAct
/// [`DiscreteAct`]: crate::DiscreteAct
pub struct HockeyEnv<A: HockeyAct> {
    env: PyObject,
    opponents: Vec<PyObject>,
    opponent: Option<usize>,
    config: HockeyEnvConfig,
    rng: SmallRng,
    phantom: PhantomData<A>,
}

impl<A: HockeyAct> HockeyEnv<A> {
    fn convert_obs(&self, py: Python, obs: &PyAny) -> Result<HockeyObs> {
        let obs = HockeyObs::new(to_f32_vec(py, obs)?)?;
        match self.config.normalize_obs {
            true => Ok(obs.normalize()),
            false => Ok(obs),
        }
    }

    /// Action of the second player.
    fn opponent_act(&self, py: Python) -> Result<Vec<f32>> {
        match self.opponent {
            Some(ix) => {
                let obs = self.env.call_method0(py, "obs_agent_two")?;
                let act = self.opponents[ix].call_method1(py, "act", (obs,))?;
                to_f32_vec(py, act.as_ref(py))
            }
            None => Ok(vec![0.0; ACT_DIM]),
        }
    }

    fn seed(&mut self, seed: u64) -> Result<()> {
        self.rng = SmallRng::seed_from_u64(seed);
        Python::with_gil(|py| -> Result<()> {
            if self.env.getattr(py, "seed").is_ok() {
                self.env.call_method1(py, "seed", (seed,))?;
            }
            Ok(())
        })
    }
}

impl<A: HockeyAct> Env for HockeyEnv<A> {
    type Config = HockeyEnvConfig;
    type Obs = HockeyObs;
    type Act = A;
    type Info = HockeyInfo;

    /// Constructs the environment and the opponents in Python.
    fn build(config: &Self::Config, seed: i64) -> Result<Self> {
        let (env, opponents) = Python::with_gil(|py| -> Result<(PyObject, Vec<PyObject>)> {
            // pyglet, used for rendering, reads sys.argv, which can be empty in an
            // embedded interpreter.
            let locals = [("sys", py.import("sys")?)].into_py_dict(py);
            py.eval("sys.argv.insert(0, 'HockeyEnv')", None, Some(locals))?;
            let ver = py.eval("sys.version", None, Some(locals))?;
            info!("Initialize HockeyEnv in mode {}", config.mode);
            info!("Python version = {}", ver);

            let hockey = py.import("laserhockey.hockey_env")?;
            let mode: PyObject = hockey
                .getattr("HockeyEnv_BasicOpponent")?
                .getattr(config.mode.py_attr())?
                .into();
            let kwargs = vec![("mode", mode), ("quiet", config.quiet.to_object(py))];
            let env = hockey
                .getattr("HockeyEnv")?
                .call((), Some(kwargs.into_py_dict(py)))?;

            let shape: Vec<usize> = env
                .getattr("observation_space")?
                .getattr("shape")?
                .extract()?;
            let found = shape.iter().product::<usize>();
            if found != OBS_DIM {
                return Err(HockeyEnvError::ObsDim {
                    found,
                    expected: OBS_DIM,
                }
                .into());
            }

            let opponents = config
                .opponents
                .iter()
                .map(|o| -> Result<PyObject> {
                    match o {
                        Opponent::Basic { weak } => {
                            let kwargs = vec![("weak", *weak)].into_py_dict(py);
                            let cls = hockey.getattr("BasicOpponent")?;
                            Ok(cls.call((), Some(kwargs))?.into())
                        }
                    }
                })
                .collect::<Result<Vec<_>>>()?;

            Ok((env.into(), opponents))
        })?;

        let mut env = Self {
            env,
            opponents,
            opponent: None,
            config: config.clone(),
            rng: SmallRng::seed_from_u64(seed as u64),
            phantom: PhantomData,
        };
        env.seed(seed as u64)?;
        Ok(env)
    }

    /// Resets the game and chooses the opponent of the episode.
    ///
    /// Both `obs` and `(obs, info)` are accepted as the return value of `reset()`.
    fn reset(&mut self) -> Result<HockeyObs> {
        trace!("HockeyEnv::reset()");
        self.opponent = match self.opponents.len() {
            0 => None,
            n => Some(self.rng.gen_range(0..n)),
        };

        Python::with_gil(|py| -> Result<HockeyObs> {
            let ret = self.env.call_method0(py, "reset")?;
            let ret = ret.as_ref(py);
            let obs = match ret.extract::<&PyTuple>() {
                Ok(t) if t.len() == 2 => t.get_item(0),
                Ok(t) => {
                    let detail = format!("tuple of length {}", t.len());
                    return Err(unexpected("reset", detail).into());
                }
                Err(_) => ret,
            };
            self.convert_obs(py, obs)
        })
    }

    /// Resets the game with the random seed `ix`.
    fn reset_with_index(&mut self, ix: usize) -> Result<HockeyObs> {
        self.seed(ix as u64)?;
        self.reset()
    }

    /// Steps the game with the action of the agent and that of the opponent.
    ///
    /// Both the 4-tuple `(obs, reward, done, info)` and the 5-tuple
    /// `(obs, reward, terminated, truncated, info)` are accepted as the return value of
    /// `step()`.
    fn step(&mut self, a: &A) -> Result<(Step<Self>, Record)> {
        trace!("HockeyEnv::step()");
        let act = a.to_vec(self.config.action_table.as_ref())?;

        Python::with_gil(|py| -> Result<(Step<Self>, Record)> {
            if self.config.render {
                self.env.call_method0(py, "render")?;
            }

            let act: Vec<f32> = act.iter().copied().chain(self.opponent_act(py)?).collect();
            let act: PyObject = PyArray1::<f32>::from_vec(py, act).into_py(py);
            let ret = self.env.call_method1(py, "step", (act,))?;
            let items: Vec<&PyAny> = ret.extract::<&PyTuple>(py)?.iter().collect();

            let (info, is_terminated, is_truncated) = match items.len() {
                4 => {
                    let info = HockeyInfo::from_py(items[3])?;
                    let (t, u) = split_done(items[2].is_true()?, info.winner);
                    (info, t, u)
                }
                5 => {
                    let info = HockeyInfo::from_py(items[4])?;
                    (info, items[2].is_true()? as i8, items[3].is_true()? as i8)
                }
                n => return Err(unexpected("step", format!("tuple of length {}", n)).into()),
            };
            let obs = self.convert_obs(py, items[0])?;
            let reward: f32 = items[1].extract()?;

            let step = Step::new(obs, a.clone(), reward, is_terminated, is_truncated, info);
            Ok((step, Record::empty()))
        })
    }

    fn render(&mut self) -> Result<()> {
        Python::with_gil(|py| -> Result<()> {
            self.env.call_method0(py, "render")?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_done() {
        assert_eq!(split_done(false, 0), (0, 0));
        assert_eq!(split_done(false, 1), (0, 0));
        assert_eq!(split_done(true, 1), (1, 0));
        assert_eq!(split_done(true, -1), (1, 0));
        assert_eq!(split_done(true, 0), (0, 1));
    }

    #[test]
    fn test_hockey_info() {
        let info = HockeyInfo::default();
        assert_eq!(info.outcome(), None);
        assert!(!info.touched_puck());

        let info = HockeyInfo {
            winner: -1,
            reward_touch_puck: 1.0,
            ..Default::default()
        };
        assert_eq!(info.outcome(), Some(Outcome::Lost));
        assert!(info.touched_puck());

        let info = HockeyInfo {
            winner: 1,
            ..Default::default()
        };
        assert_eq!(info.outcome(), Some(Outcome::Won));
    }
}
