use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use sw_engine::{DEFAULT_OUTPUT_PATH, DEFAULT_SCORE_MARKER};
use sw_types::{config_error, validation_error, ParameterDef, ParameterSpace, SweepResult};
use tracing::debug;

use crate::cli::Cli;

pub const DEFAULT_SOLVER: &str = "./main_refactored";
pub const DEFAULT_INSTANCE: &str = "nsp_instancias/instances1_24/Instance2.txt";

/// Sweep definition as written in a TOML file. Every field is optional;
/// missing ones fall back to the built-in reference sweep.
#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileConfig {
    pub solver: Option<PathBuf>,
    pub instance: Option<String>,
    pub output: Option<PathBuf>,
    pub workers: Option<usize>,
    pub timeout_secs: Option<u64>,
    pub scratch_dir: Option<PathBuf>,
    pub score_marker: Option<String>,
    pub summary_json: Option<PathBuf>,
    pub parameters: Option<Vec<ParameterDef>>,
}

impl FileConfig {
    pub fn load(path: &Path) -> SweepResult<Self> {
        debug!("Loading sweep configuration from {}", path.display());
        let content = std::fs::read_to_string(path)
            .map_err(|e| config_error!("failed to read {}: {e}", path.display()))?;
        Self::from_toml_str(&content)
            .map_err(|e| config_error!("failed to parse {}: {e}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

/// Fully resolved sweep settings: defaults, then the file, then CLI flags.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepConfig {
    pub solver: PathBuf,
    pub instance: String,
    pub output: PathBuf,
    pub workers: usize,
    pub timeout: Option<Duration>,
    pub scratch_dir: Option<PathBuf>,
    pub score_marker: String,
    pub summary_json: Option<PathBuf>,
    pub space: ParameterSpace,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            solver: PathBuf::from(DEFAULT_SOLVER),
            instance: DEFAULT_INSTANCE.to_string(),
            output: PathBuf::from(DEFAULT_OUTPUT_PATH),
            workers: 1,
            timeout: None,
            scratch_dir: None,
            score_marker: DEFAULT_SCORE_MARKER.to_string(),
            summary_json: None,
            space: ParameterSpace::new()
                .add("initial_temp", [1000_i64, 5000, 10000])
                .add("cooling_rate", [0.95, 0.99, 0.995])
                .add("max_iterations", [10000_i64, 50000, 100000])
                .add("stagnation_limit", [500_i64, 1000, 2000]),
        }
    }
}

impl SweepConfig {
    pub fn resolve(cli: &Cli) -> SweepResult<Self> {
        let file = cli.config.as_deref().map(FileConfig::load).transpose()?;
        Self::build(file, cli)
    }

    fn build(file: Option<FileConfig>, cli: &Cli) -> SweepResult<Self> {
        let mut config = Self::default();
        if let Some(file) = file {
            config.apply_file(file);
        }
        config.apply_cli(cli);
        // Concurrent solvers write their side files next to the results
        // instead of sharing the current directory.
        if config.workers > 1 && config.scratch_dir.is_none() {
            config.scratch_dir = Some(config.output.with_file_name("sweep-scratch"));
        }
        config.validate()?;
        debug!("Resolved sweep configuration: {:?}", config);
        Ok(config)
    }

    fn apply_file(&mut self, file: FileConfig) {
        if let Some(solver) = file.solver {
            self.solver = solver;
        }
        if let Some(instance) = file.instance {
            self.instance = instance;
        }
        if let Some(output) = file.output {
            self.output = output;
        }
        if let Some(workers) = file.workers {
            self.workers = workers;
        }
        if let Some(secs) = file.timeout_secs {
            self.timeout = Some(Duration::from_secs(secs));
        }
        if file.scratch_dir.is_some() {
            self.scratch_dir = file.scratch_dir;
        }
        if let Some(marker) = file.score_marker {
            self.score_marker = marker;
        }
        if file.summary_json.is_some() {
            self.summary_json = file.summary_json;
        }
        if let Some(parameters) = file.parameters {
            self.space = ParameterSpace { parameters };
        }
    }

    fn apply_cli(&mut self, cli: &Cli) {
        if let Some(solver) = &cli.solver {
            self.solver = solver.clone();
        }
        if let Some(instance) = &cli.instance {
            self.instance = instance.clone();
        }
        if let Some(output) = &cli.output {
            self.output = output.clone();
        }
        if let Some(workers) = cli.workers {
            self.workers = workers;
        }
        if let Some(secs) = cli.timeout {
            self.timeout = Some(Duration::from_secs(secs));
        }
        if cli.scratch_dir.is_some() {
            self.scratch_dir = cli.scratch_dir.clone();
        }
        if cli.summary_json.is_some() {
            self.summary_json = cli.summary_json.clone();
        }
    }

    fn validate(&self) -> SweepResult<()> {
        if self.workers == 0 {
            return Err(config_error!("workers must be at least 1"));
        }
        if self.timeout == Some(Duration::ZERO) {
            return Err(config_error!("timeout must be greater than zero seconds"));
        }
        if self.score_marker.is_empty() {
            return Err(config_error!("score-marker must not be empty"));
        }
        if self.instance.is_empty() {
            return Err(validation_error!("instance argument must not be empty"));
        }
        self.space.validate()
    }
}
