//! Settings: defaults, an optional JSON file, command-line overrides and
//! validation.

use crate::population::Rearm;
use crate::school::Topology;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read settings file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid settings in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("frame delay must be at least 1 ms")]
    ZeroDelay,
    #[error("at least one school topology must be allowed")]
    NoTopologies,
    #[error("bubble frequency must be at least 1")]
    ZeroBubbleFrequency,
    #[error("{name} margin must not be negative (got {value})")]
    NegativeMargin { name: &'static str, value: i32 },
    #[error("ideal sea monkey to minnow ratio must be at least 1")]
    ZeroIdealRatio,
    #[error("re-arm ratio must be above 1.0 (got {0})")]
    RearmRatio(f32),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub delay_ms: u64,
    /// Fixed seed for the scene and every random choice; random when unset.
    pub seed: Option<u64>,
    pub sand: bool,
    pub water: bool,
    pub bubbles: bool,
    pub hill: bool,
    pub ocean_drift: bool,
    pub clock_fish: bool,
    pub explorer_school: bool,
    pub word_bubbles: bool,
    pub word_file: PathBuf,
    pub verbose: bool,
    /// How far off screen swimmers may wander before turning back.
    pub water_margin: i32,
    pub sand_margin: i32,
    /// Higher is rarer.
    pub bubble_frequency: u32,
    /// Schools at or below this size are never culled.
    pub min_school_size: usize,
    pub topologies: Vec<Topology>,
    pub ideal_ratio: u32,
    pub settle_frames: i32,
    /// Re-arm load shedding after it settles when a frame runs this many
    /// times over budget.
    pub rearm_above: Option<f32>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            delay_ms: 80,
            seed: None,
            sand: true,
            water: false,
            bubbles: true,
            hill: true,
            ocean_drift: false,
            clock_fish: false,
            explorer_school: false,
            word_bubbles: false,
            word_file: PathBuf::from("/usr/share/dict/words"),
            verbose: false,
            water_margin: 50,
            sand_margin: 5,
            bubble_frequency: 30,
            min_school_size: 5,
            topologies: Topology::ALL.to_vec(),
            ideal_ratio: 5,
            settle_frames: 20,
            rearm_above: None,
        }
    }
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.delay_ms == 0 {
            return Err(ConfigError::ZeroDelay);
        }
        if self.topologies.is_empty() {
            return Err(ConfigError::NoTopologies);
        }
        if self.bubble_frequency == 0 {
            return Err(ConfigError::ZeroBubbleFrequency);
        }
        for (name, value) in [("water", self.water_margin), ("sand", self.sand_margin)] {
            if value < 0 {
                return Err(ConfigError::NegativeMargin { name, value });
            }
        }
        if self.ideal_ratio == 0 {
            return Err(ConfigError::ZeroIdealRatio);
        }
        match self.rearm_above {
            Some(ratio) if ratio.is_nan() || ratio <= 1.0 => Err(ConfigError::RearmRatio(ratio)),
            _ => Ok(()),
        }
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    pub fn rearm(&self) -> Rearm {
        match self.rearm_above {
            Some(ratio) => Rearm::Above(ratio),
            None => Rearm::Never,
        }
    }
}

/// Word list for word bubbles: one word per line, possessives stripped.
/// An unreadable file yields no words.
pub fn load_words(path: &Path) -> Vec<String> {
    match fs::read_to_string(path) {
        Ok(text) => text
            .lines()
            .map(|line| line.trim().replace("'s", ""))
            .filter(|word| !word.is_empty())
            .collect(),
        Err(err) => {
            tracing::warn!(path = %path.display(), %err, "word bubbles disabled: cannot read word file");
            Vec::new()
        }
    }
}

#[derive(Parser, Debug, Default)]
#[command(name = "aquarium", about = "An ASCII aquarium for your terminal")]
pub struct Args {
    /// JSON settings file; flags override it
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// ms per frame
    #[arg(long)]
    pub delay_ms: Option<u64>,

    /// seed for a reproducible tank
    #[arg(long)]
    pub seed: Option<u64>,

    /// draw the water line
    #[arg(long)]
    pub water: bool,

    /// leave out the sand fill
    #[arg(long)]
    pub no_sand: bool,

    /// no bubbles
    #[arg(long)]
    pub no_bubbles: bool,

    /// no underwater hill
    #[arg(long)]
    pub no_hill: bool,

    /// occasional currents push swimmers sideways
    #[arg(long)]
    pub ocean_drift: bool,

    /// add a fish that shows the time
    #[arg(long)]
    pub clock_fish: bool,

    /// the first sea monkey school wanders off on its own
    #[arg(long)]
    pub explorer: bool,

    /// bubbles sometimes carry a random word
    #[arg(long)]
    pub word_bubbles: bool,

    /// dictionary for word bubbles
    #[arg(long)]
    pub word_file: Option<PathBuf>,

    /// allowed school shapes (repeatable)
    #[arg(long = "topology", value_enum)]
    pub topologies: Vec<Topology>,

    /// keep shedding fish after settling when a frame runs this many times over budget
    #[arg(long)]
    pub rearm_above: Option<f32>,

    /// start with the info overlay
    #[arg(short, long)]
    pub verbose: bool,

    /// write tracing output here
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Args {
    /// File settings (or defaults), then flags, then validation.
    pub fn settings(&self) -> Result<Settings, ConfigError> {
        let mut s = match &self.config {
            Some(path) => Settings::load(path)?,
            None => Settings::default(),
        };
        if let Some(ms) = self.delay_ms {
            s.delay_ms = ms;
        }
        if self.seed.is_some() {
            s.seed = self.seed;
        }
        s.water |= self.water;
        s.sand &= !self.no_sand;
        s.bubbles &= !self.no_bubbles;
        s.hill &= !self.no_hill;
        s.ocean_drift |= self.ocean_drift;
        s.clock_fish |= self.clock_fish;
        s.explorer_school |= self.explorer;
        s.word_bubbles |= self.word_bubbles;
        s.verbose |= self.verbose;
        if let Some(path) = &self.word_file {
            s.word_file = path.clone();
        }
        if !self.topologies.is_empty() {
            s.topologies = self.topologies.clone();
        }
        if self.rearm_above.is_some() {
            s.rearm_above = self.rearm_above;
        }
        s.validate()?;
        Ok(s)
    }
}
