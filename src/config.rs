use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_fmin")]
    pub fmin: f32,
    #[serde(default = "default_fmax")]
    pub fmax: f32,
}

#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_top")]
    pub top: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            fmin: default_fmin(),
            fmax: default_fmax(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { top: default_top() }
    }
}

fn default_fmin() -> f32 { 65.41 }
fn default_fmax() -> f32 { 1046.5 }
fn default_top() -> usize { 10 }

pub fn load_config(path: &PathBuf) -> Option<Config> {
    let content = std::fs::read_to_string(path).ok()?;
    toml::from_str(&content).ok()
}
