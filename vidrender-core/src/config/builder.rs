// ============================================================================
// vidrender-core/src/config/builder.rs
// ============================================================================
//
// CONFIGURATION BUILDER: Builder Pattern for CoreConfig
//
// Fluent construction of CoreConfig. `build()` validates the result so a
// misconfigured pipeline is rejected before any job is accepted.

// ---- Standard library imports ----
use std::path::PathBuf;
use std::time::Duration;

// ---- Internal crate imports ----
use super::{CoreConfig, EncoderSettings, MergeOptions};
use crate::error::CoreResult;
use crate::job::RetentionPolicy;

/// Builder for creating CoreConfig instances.
///
/// # Examples
///
/// ```rust
/// use vidrender_core::config::CoreConfigBuilder;
/// use std::time::Duration;
///
/// let config = CoreConfigBuilder::new("/var/lib/vidrender")
///     .segment_duration_secs(5.0)
///     .worker_count(4)
///     .keep_intermediates(true)
///     .retention_max_age(Duration::from_secs(3600))
///     .build()
///     .unwrap();
/// assert_eq!(config.effective_workers(), 4);
/// ```
#[derive(Debug, Clone)]
pub struct CoreConfigBuilder {
    config: CoreConfig,
}

impl CoreConfigBuilder {
    pub fn new(workspace_dir: impl Into<PathBuf>) -> Self {
        Self {
            config: CoreConfig::new(workspace_dir),
        }
    }

    pub fn segment_duration_secs(mut self, secs: f64) -> Self {
        self.config.segment_duration_secs = secs;
        self
    }

    /// Fixes the parallel pool size instead of using every core.
    pub fn worker_count(mut self, workers: usize) -> Self {
        self.config.worker_count = Some(workers);
        self
    }

    pub fn encoder(mut self, encoder: EncoderSettings) -> Self {
        self.config.encoder = encoder;
        self
    }

    pub fn encoder_preset(mut self, preset: impl Into<String>) -> Self {
        self.config.encoder.preset = preset.into();
        self
    }

    pub fn encoder_crf(mut self, crf: u8) -> Self {
        self.config.encoder.crf = crf;
        self
    }

    pub fn merge_options(mut self, merge: MergeOptions) -> Self {
        self.config.merge = merge;
        self
    }

    /// Codec the source audio is re-encoded with in the merged output.
    pub fn audio_codec(mut self, codec: impl Into<String>) -> Self {
        self.config.merge.audio_codec = codec.into();
        self
    }

    pub fn faststart(mut self, enabled: bool) -> Self {
        self.config.merge.faststart = enabled;
        self
    }

    pub fn keep_intermediates(mut self, keep: bool) -> Self {
        self.config.keep_intermediates = keep;
        self
    }

    pub fn state_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.state_file = Some(path.into());
        self
    }

    pub fn retention(mut self, policy: RetentionPolicy) -> Self {
        self.config.retention = policy;
        self
    }

    pub fn retention_max_age(mut self, max_age: Duration) -> Self {
        self.config.retention.max_age = Some(max_age);
        self
    }

    pub fn retention_max_jobs(mut self, max_jobs: usize) -> Self {
        self.config.retention.max_finished_jobs = Some(max_jobs);
        self
    }

    /// Validates and returns the configuration.
    pub fn build(self) -> CoreResult<CoreConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_applies_every_setter() {
        let config = CoreConfigBuilder::new("/ws")
            .segment_duration_secs(4.0)
            .worker_count(2)
            .encoder_preset("ultrafast")
            .encoder_crf(28)
            .audio_codec("libopus")
            .faststart(false)
            .keep_intermediates(true)
            .state_file("/ws/jobs.json")
            .retention_max_jobs(10)
            .build()
            .unwrap();

        assert_eq!(config.segment_duration_secs, 4.0);
        assert_eq!(config.worker_count, Some(2));
        assert_eq!(config.encoder.preset, "ultrafast");
        assert_eq!(config.encoder.crf, 28);
        assert_eq!(config.merge.audio_codec, "libopus");
        assert!(!config.merge.faststart);
        assert!(config.keep_intermediates);
        assert_eq!(config.state_file, Some(PathBuf::from("/ws/jobs.json")));
        assert_eq!(config.retention.max_finished_jobs, Some(10));
        assert_eq!(config.retention.max_age, None);
    }

    #[test]
    fn build_validates() {
        assert!(CoreConfigBuilder::new("/ws").worker_count(0).build().is_err());
    }
}
