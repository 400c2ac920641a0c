//! Pipeline configuration.
//!
//! Sources are merged in this order, later ones overriding earlier ones:
//! 1. Bundled defaults (include_str! from mangaweave.toml)
//! 2. `~/.config/mangaweave/mangaweave.toml`
//! 3. `./mangaweave.toml`
//! 4. An explicit file, usually from `--config`
//!
//! Every section also has a `Default` matching the bundled file, so a config
//! can be built in code without touching the filesystem.

use config::{Config, File, FileFormat};
use mangaweave_error::{ConfigError, MangaweaveError, MangaweaveResult};
use mangaweave_schema::ScaleBounds;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, instrument};

const DEFAULT_CONFIG: &str = include_str!("../../../mangaweave.toml");

/// Where pages are read from and artifacts are written to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory holding the ordered page images
    pub pages_dir: PathBuf,
    /// Root of the artifact store
    pub artifacts_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            pages_dir: PathBuf::from("data/pages"),
            artifacts_dir: PathBuf::from("data/artifacts"),
        }
    }
}

/// Model selection and provider access.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    /// Model used for text-only calls
    pub text_model: String,
    /// Model used for calls carrying page images
    pub vision_model: String,
    /// Base URL of the OpenAI-compatible API
    pub api_base: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    /// Per-call timeout in seconds
    pub request_timeout_secs: u64,
    /// Optional client-side request rate limit
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requests_per_minute: Option<u32>,
    /// System message sent with every request; empty disables it
    pub system_prompt: String,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            text_model: "grok-4-fast-reasoning".to_string(),
            vision_model: "grok-4-fast-reasoning".to_string(),
            api_base: "https://api.x.ai/v1".to_string(),
            api_key_env: "XAI_API_KEY".to_string(),
            request_timeout_secs: 3600,
            requests_per_minute: None,
            system_prompt: "You are a meticulous, structured assistant for a manga-to-novel \
                            pipeline. Always follow the requested format exactly."
                .to_string(),
        }
    }
}

impl ModelsConfig {
    /// Per-call timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

/// Sampling temperature per kind of call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Temperatures {
    /// Page batch descriptions
    pub describe: f32,
    /// Summary refinement
    pub refine: f32,
    /// Chapter prose
    pub prose: f32,
    /// Chapter synopses
    pub synopsis: f32,
    /// Story index
    pub story_index: f32,
    /// Anchor extraction
    pub anchors: f32,
    /// Branch suggestions
    pub branches: f32,
    /// Character bible
    pub characters: f32,
    /// Content scales
    pub scales: f32,
    /// Chapter plans of simulated chapters
    pub plan: f32,
    /// Page batches of simulated chapters
    pub page_batch: f32,
    /// Visual summary of simulated chapters
    pub visual: f32,
}

impl Default for Temperatures {
    fn default() -> Self {
        Self {
            describe: 0.2,
            refine: 0.4,
            prose: 0.7,
            synopsis: 0.3,
            story_index: 0.4,
            anchors: 0.3,
            branches: 0.7,
            characters: 0.4,
            scales: 0.2,
            plan: 0.5,
            page_batch: 0.7,
            visual: 0.4,
        }
    }
}

/// Generation budget.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Attempts per structured or free-text call
    pub max_attempts: u32,
    /// Temperature per kind of call
    pub temperatures: Temperatures,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            temperatures: Temperatures::default(),
        }
    }
}

/// Chapter boundary detection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentationConfig {
    /// Pages since the last boundary before the title oracle is consulted
    pub min_chapter_pages: usize,
    /// Pages between two oracle consultations
    pub oracle_cooldown: usize,
    /// Pixel saturation above which a pixel counts as colored
    pub saturation_threshold: f32,
    /// Fraction of colored pixels above which a page counts as colored
    pub colored_ratio_threshold: f32,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            min_chapter_pages: 15,
            oracle_cooldown: 4,
            saturation_threshold: 0.25,
            colored_ratio_threshold: 0.1,
        }
    }
}

/// Page batching for vision and simulation calls.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Pages per call
    pub page_batch_size: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self { page_batch_size: 10 }
    }
}

/// Character budgets for context assembled into prompts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// Rolling story-so-far during novelization
    pub rolling_chars: usize,
    /// Story context for branches and simulated chapters
    pub story_context_chars: usize,
    /// Whole-story context for refinement
    pub global_context_chars: usize,
    /// Compact summaries for the story index
    pub story_index_chars: usize,
    /// Novel tail for the character bible
    pub character_context_chars: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            rolling_chars: 15_000,
            story_context_chars: 15_000,
            global_context_chars: 1_500_000,
            story_index_chars: 1_800_000,
            character_context_chars: 200_000,
        }
    }
}

/// Novelization options.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NovelConfig {
    /// Prefer refined summaries when they exist
    pub use_refined_summaries: bool,
}

impl Default for NovelConfig {
    fn default() -> Self {
        Self {
            use_refined_summaries: true,
        }
    }
}

/// Branch suggestion options.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BranchesConfig {
    /// Anchors below this branching potential get no suggestions
    pub min_branching_potential: i64,
}

impl Default for BranchesConfig {
    fn default() -> Self {
        Self {
            min_branching_potential: 3,
        }
    }
}

/// Simulated chapter options.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContinuationConfig {
    /// Pages per simulated chapter
    pub target_pages: usize,
}

impl Default for ContinuationConfig {
    fn default() -> Self {
        Self { target_pages: 18 }
    }
}

/// Complete pipeline configuration.
///
/// # Example
///
/// ```no_run
/// use mangaweave_pipeline::PipelineConfig;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = PipelineConfig::load(None)?;
/// println!("pages from {}", config.paths.pages_dir.display());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Input and output locations
    pub paths: PathsConfig,
    /// Model access
    pub models: ModelsConfig,
    /// Attempts and temperatures
    pub generation: GenerationConfig,
    /// Chapter boundary detection
    pub segmentation: SegmentationConfig,
    /// Page batching
    pub batch: BatchConfig,
    /// Prompt context budgets
    pub context: ContextConfig,
    /// Novelization
    pub novel: NovelConfig,
    /// Branch suggestions
    pub branches: BranchesConfig,
    /// Simulated chapters
    pub continuation: ContinuationConfig,
    /// Content rating bounds
    pub scales: ScaleBounds,
}

impl PipelineConfig {
    /// Load the layered configuration, optionally topped by `explicit`.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` when the explicit file is missing or any source
    /// fails to parse.
    #[instrument]
    pub fn load(explicit: Option<&Path>) -> MangaweaveResult<Self> {
        debug!("Loading configuration: explicit > current dir > home dir > bundled defaults");

        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config/mangaweave/mangaweave.toml");
            builder = builder.add_source(File::from(home_config).required(false));
        }

        builder = builder.add_source(File::with_name("mangaweave").required(false));

        if let Some(path) = explicit {
            builder = builder.add_source(File::from(path).required(true));
        }

        Self::finish(builder)
    }

    /// Load only the bundled defaults and one file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` when the file is missing or malformed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> MangaweaveResult<Self> {
        let builder = Config::builder()
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
            .add_source(File::from(path.as_ref()).required(true));
        Self::finish(builder)
    }

    /// Parse a TOML string layered over the bundled defaults.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` when the text is not valid TOML for this config.
    pub fn from_toml_str(text: &str) -> MangaweaveResult<Self> {
        let builder = Config::builder()
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
            .add_source(File::from_str(text, FileFormat::Toml));
        Self::finish(builder)
    }

    fn finish(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> MangaweaveResult<Self> {
        builder
            .build()
            .map_err(|e| {
                MangaweaveError::from(ConfigError::new(format!(
                    "Failed to build configuration: {}",
                    e
                )))
            })?
            .try_deserialize()
            .map_err(|e| {
                MangaweaveError::from(ConfigError::new(format!(
                    "Failed to parse configuration: {}",
                    e
                )))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_defaults_match_code_defaults() {
        let bundled = PipelineConfig::from_toml_str("").unwrap();
        assert_eq!(bundled, PipelineConfig::default());
    }

    #[test]
    fn test_override_single_value() {
        let config = PipelineConfig::from_toml_str(
            r#"
            [continuation]
            target_pages = 24

            [generation.temperatures]
            scales = 0.0
            "#,
        )
        .unwrap();

        assert_eq!(config.continuation.target_pages, 24);
        assert_eq!(config.generation.temperatures.scales, 0.0);
        assert_eq!(config.generation.temperatures.prose, 0.7);
        assert_eq!(config.batch.page_batch_size, 10);
    }

    #[test]
    fn test_invalid_type_is_config_error() {
        let result = PipelineConfig::from_toml_str("[batch]\npage_batch_size = \"ten\"");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Configuration"));
    }
}
