use crate::config::Config;

pub struct PipelineConfig {
    /// Characters of normalized text sent to the language model.
    pub excerpt_chars: usize,
    /// Characters of an error message persisted on failure.
    pub error_max_chars: usize,
    pub tag_count: usize,
}

impl PipelineConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            excerpt_chars: config.enrichment.excerpt_chars,
            error_max_chars: config.enrichment.error_max_chars,
            tag_count: config.enrichment.tag_count,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}
