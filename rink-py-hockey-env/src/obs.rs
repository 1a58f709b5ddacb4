use crate::HockeyEnvError;
use anyhow::Result;
use rink_core::Obs;

/// Number of elements of an observation.
pub const OBS_DIM: usize = 18;

/// Mean of observations, estimated from games against the basic opponent.
pub const OBS_MEAN: [f32; OBS_DIM] = [
    -1.659_143_4,
    0.331_981_44,
    0.047_030_057,
    0.388_417_45,
    0.125_526_88,
    0.040_391_913,
    2.926_414_3,
    0.186_940_29,
    -0.001_174_530_6,
    -0.044_102_77,
    0.143_406_86,
    -0.007_987_459,
    0.223_126_74,
    0.149_935_16,
    0.621_875_7,
    -0.053_269_325,
    1.821_784_4,
    1.118_101_9,
];

/// Standard deviation of observations.
pub const OBS_STD: [f32; OBS_DIM] = [
    0.819_381_43,
    1.355_415_1,
    0.610_296_3,
    4.182_742_4,
    3.999_646_8,
    3.690_211_7,
    0.824_367_43,
    0.849_237_57,
    0.646_652_36,
    3.976_124,
    4.522_714_6,
    3.446_563_6,
    1.957_008_3,
    1.650_492_3,
    14.879_555,
    13.133_097,
    3.955_893_3,
    3.371_709_8,
];

/// Observation of the hockey environment from the viewpoint of a player.
///
/// Positions, angles and velocities of both players, followed by the position and
/// velocity of the puck and the remaining time the players can hold the puck.
#[derive(Clone, Debug, PartialEq)]
pub struct HockeyObs(pub Vec<f32>);

impl HockeyObs {
    /// Constructs an observation, checking the number of elements.
    pub fn new(v: Vec<f32>) -> Result<Self> {
        if v.len() != OBS_DIM {
            return Err(HockeyEnvError::ObsDim {
                found: v.len(),
                expected: OBS_DIM,
            }
            .into());
        }
        Ok(Self(v))
    }

    /// Standardizes the observation with [`OBS_MEAN`] and [`OBS_STD`].
    pub fn normalize(mut self) -> Self {
        for ((x, m), s) in self.0.iter_mut().zip(OBS_MEAN.iter()).zip(OBS_STD.iter()) {
            *x = (*x - m) / s;
        }
        self
    }
}

impl Obs for HockeyObs {}
