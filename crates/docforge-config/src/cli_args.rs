use std::path::PathBuf;

/// CLI-level overrides fed into [`Config::discover`](crate::Config::discover).
///
/// Every field is optional; `None` (or `false`) leaves lower-precedence
/// sources in charge.
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    pub config_path: Option<PathBuf>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub base_url: Option<String>,
    pub prompts_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub trace: bool,
}
