use rand::seq::SliceRandom;
use rand::Rng;
use serde::{ Deserialize, Serialize };
use std::fmt;

/// Body region a generated case is centred on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyRegion {
    LumbarSpine,
    CervicalSpine,
    ThoracicSpine,
    Hip,
    Knee,
    Ankle,
    Foot,
    Shoulder,
    Elbow,
    Hand,
}

impl BodyRegion {
    pub const ALL: [BodyRegion; 10] = [
        BodyRegion::LumbarSpine,
        BodyRegion::CervicalSpine,
        BodyRegion::ThoracicSpine,
        BodyRegion::Hip,
        BodyRegion::Knee,
        BodyRegion::Ankle,
        BodyRegion::Foot,
        BodyRegion::Shoulder,
        BodyRegion::Elbow,
        BodyRegion::Hand,
    ];

    /// Label substituted into the case-generation prompt.
    pub fn label(&self) -> &'static str {
        match self {
            BodyRegion::LumbarSpine => "columna lumbar",
            BodyRegion::CervicalSpine => "columna cervical",
            BodyRegion::ThoracicSpine => "columna dorsal",
            BodyRegion::Hip => "cadera",
            BodyRegion::Knee => "rodilla",
            BodyRegion::Ankle => "tobillo",
            BodyRegion::Foot => "pie",
            BodyRegion::Shoulder => "hombro",
            BodyRegion::Elbow => "codo",
            BodyRegion::Hand => "mano",
        }
    }

    /// Uniform draw over [`BodyRegion::ALL`].
    pub fn random_with<R: Rng + ?Sized>(rng: &mut R) -> Self {
        // ALL is a non-empty const array, so choose never returns None.
        *Self::ALL.choose(rng).unwrap_or(&BodyRegion::LumbarSpine)
    }

    pub fn random() -> Self {
        Self::random_with(&mut rand::thread_rng())
    }
}

impl fmt::Display for BodyRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}
