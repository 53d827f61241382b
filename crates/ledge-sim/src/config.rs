use serde::{Deserialize, Serialize};

/// Settings for the `ledge-sim` runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Seed for the generated level when no level file is given.
    pub seed: u64,
    /// Number of fixed steps to run.
    pub ticks: u64,
    pub tick_rate_hz: f64,
    /// Path to a level TOML file.
    pub level: Option<String>,
    /// Log the character's position every this many ticks. 0 disables it.
    pub log_every: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            ticks: 1200,
            tick_rate_hz: 60.0,
            level: None,
            log_every: 60,
        }
    }
}

impl SimConfig {
    /// Load from the TOML file named by `LEDGE_SIM_CONFIG` (else
    /// `config/sim.toml`), then apply env var overrides.
    pub fn load() -> Self {
        let path =
            std::env::var("LEDGE_SIM_CONFIG").unwrap_or_else(|_| "config/sim.toml".to_string());
        let mut config = match std::fs::read_to_string(&path) {
            Ok(content) => match Self::from_toml_str(&content) {
                Ok(cfg) => {
                    tracing::info!(path = %path, "Loaded sim configuration");
                    cfg
                },
                Err(e) => {
                    tracing::warn!("Failed to parse {path}: {e}, using defaults");
                    Self::default()
                },
            },
            Err(_) => {
                tracing::debug!(path = %path, "No sim config found, using defaults");
                Self::default()
            },
        };

        if let Ok(val) = std::env::var("LEDGE_SIM_SEED")
            && let Ok(seed) = val.parse::<u64>()
        {
            config.seed = seed;
        }
        if let Ok(val) = std::env::var("LEDGE_SIM_TICKS")
            && let Ok(ticks) = val.parse::<u64>()
        {
            config.ticks = ticks;
        }
        if let Ok(level) = std::env::var("LEDGE_SIM_LEVEL")
            && !level.is_empty()
        {
            config.level = Some(level);
        }

        config
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, SimConfigError> {
        let config: Self =
            toml::from_str(contents).map_err(|e| SimConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), SimConfigError> {
        if !self.tick_rate_hz.is_finite() || self.tick_rate_hz <= 0.0 {
            return Err(SimConfigError::InvalidTickRate(self.tick_rate_hz));
        }
        Ok(())
    }

    /// Fixed step length in seconds.
    pub fn dt(&self) -> f64 {
        1.0 / self.tick_rate_hz
    }
}

#[derive(Debug)]
pub enum SimConfigError {
    Parse(String),
    InvalidTickRate(f64),
}

impl std::fmt::Display for SimConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(e) => write!(f, "invalid sim config: {e}"),
            Self::InvalidTickRate(hz) => write!(f, "tick_rate_hz must be positive, got {hz}"),
        }
    }
}

impl std::error::Error for SimConfigError {}
