//! bizplan configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Main bizplan configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level", skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,

    /// LLM provider configuration
    pub llm: LlmConfig,

    /// Interview behavior
    pub interview: InterviewConfig,

    /// Document generation settings
    pub generation: GenerationConfig,

    /// Prompt template overrides
    pub prompts: PromptsConfig,

    /// Export settings
    pub export: ExportConfig,

    /// User-facing localized messages
    pub messages: Messages,
}

impl Config {
    /// Validate configuration before use
    ///
    /// Checks that an API key can be resolved so an interview does not fail
    /// on its first exchange.
    pub fn validate(&self) -> Result<()> {
        debug!(provider = %self.llm.provider, "Config::validate: called");
        self.llm.get_api_key()?;
        if self.interview.min_turns == 0 {
            return Err(eyre::eyre!("interview.min-turns must be at least 1"));
        }
        Ok(())
    }

    /// Load configuration with fallback chain
    ///
    /// 1. Explicit path (errors are fatal)
    /// 2. `.bizplan.yml` in the working directory
    /// 3. `~/.config/bizplan/bizplan.yml`
    /// 4. Built-in defaults
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        let local_config = PathBuf::from(".bizplan.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        if let Some(user_config) = Self::user_config_path()
            && user_config.exists()
        {
            match Self::load_from_file(&user_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read only the log level, before logging is initialized
    ///
    /// Any error is swallowed; the full load reports it later.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        Self::load(config_path).ok().and_then(|c| c.log_level)
    }

    fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("bizplan").join("bizplan.yml"))
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider name ("gemini" or "openai")
    pub provider: String,

    /// Model identifier
    pub model: String,

    /// Environment variable containing the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// File holding the API key, read when the environment variable is unset
    #[serde(rename = "api-key-file", skip_serializing_if = "Option::is_none")]
    pub api_key_file: Option<PathBuf>,

    /// API base URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Maximum tokens per response
    #[serde(rename = "max-tokens")]
    pub max_tokens: u32,

    /// HTTP request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "gemini".to_string(),
            model: "gemini-2.5-flash".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            api_key_file: None,
            base_url: GEMINI_BASE_URL.to_string(),
            max_tokens: 8192,
            timeout_ms: 120_000,
        }
    }
}

impl LlmConfig {
    /// Resolve the API key from the environment, then the key file
    pub fn get_api_key(&self) -> Result<String> {
        debug!(api_key_env = %self.api_key_env, "LlmConfig::get_api_key: called");
        if let Ok(key) = std::env::var(&self.api_key_env)
            && !key.trim().is_empty()
        {
            debug!("LlmConfig::get_api_key: found in environment");
            return Ok(key.trim().to_string());
        }

        if let Some(path) = &self.api_key_file {
            debug!(?path, "LlmConfig::get_api_key: reading key file");
            let expanded = expand_tilde(path);
            let key = fs::read_to_string(&expanded)
                .context(format!("Failed to read API key file {}", expanded.display()))?;
            let key = key.trim();
            if !key.is_empty() {
                return Ok(key.to_string());
            }
            return Err(eyre::eyre!("API key file {} is empty", expanded.display()));
        }

        Err(eyre::eyre!(
            "LLM API key not found. Set the {} environment variable.",
            self.api_key_env
        ))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Base URL for the configured provider
    ///
    /// An `openai` provider left on the Gemini default base URL talks to
    /// api.openai.com instead.
    pub fn resolved_base_url(&self) -> &str {
        if self.provider == "openai" && self.base_url == GEMINI_BASE_URL {
            return OPENAI_BASE_URL;
        }
        &self.base_url
    }
}

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const OPENAI_BASE_URL: &str = "https://api.openai.com";

/// Interview behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InterviewConfig {
    /// Minimum transcript turns before documents may be generated
    #[serde(rename = "min-turns")]
    pub min_turns: usize,

    /// Language the consultant speaks and documents are written in
    pub language: String,

    /// Utterance sent on the user's behalf to open the interview
    #[serde(rename = "opening-utterance")]
    pub opening_utterance: String,

    /// Maximum tokens per interview reply
    #[serde(rename = "chat-max-tokens")]
    pub chat_max_tokens: u32,
}

impl Default for InterviewConfig {
    fn default() -> Self {
        Self {
            min_turns: 3,
            language: "Burmese".to_string(),
            opening_utterance: "မင်္ဂလာပါ (Start interview)".to_string(),
            chat_max_tokens: 2048,
        }
    }
}

/// Document generation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Per-document timeout in seconds
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    /// Maximum tokens per generated document
    #[serde(rename = "max-tokens")]
    pub max_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 180,
            max_tokens: 8192,
        }
    }
}

impl GenerationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Prompt template overrides
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptsConfig {
    /// Directory checked first for `{name}.pmt` overrides
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

/// Export settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Base directory for exported bundles
    pub dir: PathBuf,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("business-plans"),
        }
    }
}

/// Localized user-facing messages
///
/// Defaults pair the Burmese text with an English gloss.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Messages {
    /// Seeded as the first turn when the interview cannot start
    #[serde(rename = "start-failed")]
    pub start_failed: String,

    /// Appended in place of a reply when a turn fails
    #[serde(rename = "send-failed")]
    pub send_failed: String,

    /// Used when the model returns an empty reply
    #[serde(rename = "empty-reply")]
    pub empty_reply: String,

    /// Shown when finish is requested too early
    #[serde(rename = "too-few-turns")]
    pub too_few_turns: String,

    /// Shown when the document batch fails
    #[serde(rename = "generation-failed")]
    pub generation_failed: String,

    /// Summary note fallback for an empty response
    #[serde(rename = "summary-unavailable")]
    pub summary_unavailable: String,

    /// Fallback for any other empty document
    #[serde(rename = "document-unavailable")]
    pub document_unavailable: String,

    /// Placeholder for a missing canvas
    #[serde(rename = "canvas-unavailable")]
    pub canvas_unavailable: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            start_failed: "စနစ်ချို့ယွင်းမှုရှိနေပါသည်။ ကျေးဇူးပြု၍ ပြန်လည်ကြိုးစားပါ။ (System Error)".to_string(),
            send_failed: "အမှားအယွင်းရှိပါသည်။ (Error occurred)".to_string(),
            empty_reply: "...".to_string(),
            too_few_turns:
                "ကျေးဇူးပြု၍ အချက်အလက်ပြည့်စုံအောင် မေးခွန်းများကို အရင်ဖြေကြားပေးပါ။ (Please answer more questions first)"
                    .to_string(),
            generation_failed: "စာရွက်စာတမ်းများ ပြင်ဆင်နေစဉ် အမှားရှိပါသည်။ (Generation Failed)".to_string(),
            summary_unavailable: "အချက်အလက်များကို အကျဉ်းချုပ်၍ မရနိုင်ပါ။ (Could not generate summary)".to_string(),
            document_unavailable: "(Could not generate this document)".to_string(),
            canvas_unavailable: "No data available".to_string(),
        }
    }
}

fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    path.to_path_buf()
}
