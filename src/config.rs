//! TOML configuration.
//!
//! Every table is optional; a missing key takes its default. The default
//! config path may be absent entirely, in which case [`Config::default`] is
//! used. Validation happens in [`load_config`].

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tr_genius_core::diff::{DiffLimits, MarkerStyle, DEFAULT_MAX_TOKENS};
use tr_genius_core::segment::SegmentConfig;

/// Path used when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = "./config/trg.toml";

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub segmentation: SegmentConfig,
    pub corpus: CorpusConfig,
    pub context: ContextConfig,
    pub diff: DiffConfig,
    pub sections: SectionsConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./data"),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CorpusConfig {
    /// JSON array of `{page, content}` objects holding the reference law.
    pub core_path: Option<PathBuf>,
    pub core_name: String,
    pub include_globs: Vec<String>,
    pub exclude_globs: Vec<String>,
    pub max_file_bytes: u64,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            core_path: None,
            core_name: "Lei 14.133/21 (Base de Conhecimento)".to_string(),
            include_globs: vec![
                "**/*.pdf".to_string(),
                "**/*.docx".to_string(),
                "**/*.txt".to_string(),
            ],
            exclude_globs: Vec::new(),
            max_file_bytes: 50 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ContextConfig {
    pub warn_chars: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            warn_chars: 400_000,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DiffConfig {
    pub max_tokens: usize,
    pub markers: MarkerStyle,
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            max_tokens: DEFAULT_MAX_TOKENS,
            markers: MarkerStyle::default(),
        }
    }
}

impl DiffConfig {
    pub fn limits(&self) -> DiffLimits {
        DiffLimits {
            max_tokens: self.max_tokens,
        }
    }
}

/// Section ids per document kind, in display order.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SectionsConfig {
    pub etp: Vec<String>,
    pub tr: Vec<String>,
}

impl Default for SectionsConfig {
    fn default() -> Self {
        let ids = |list: &[&str]| list.iter().map(|s| s.to_string()).collect();
        Self {
            etp: ids(&[
                "etp-input-introducao",
                "etp-input-demanda",
                "etp-input-analise-demanda",
                "etp-input-levantamento-solucoes",
                "etp-input-analise-solucoes",
                "etp-input-recomendacao",
                "etp-input-anexos",
            ]),
            tr: ids(&[
                "tr-input-objeto",
                "tr-input-justificativa",
                "tr-input-execucao",
                "tr-input-obrigacoes",
                "tr-input-habilitacao",
                "tr-input-pagamento",
                "tr-input-fiscalizacao",
                "tr-input-sancoes",
            ]),
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() && path == Path::new(DEFAULT_CONFIG_PATH) {
        tracing::debug!(path = %path.display(), "no config file, using defaults");
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    // Validate segmentation
    if config.segmentation.min_unit_chars == 0 {
        bail!("segmentation.min_unit_chars must be >= 1");
    }
    if config.segmentation.min_article_markers == 0 {
        bail!("segmentation.min_article_markers must be >= 1");
    }

    // Validate diff
    if config.diff.max_tokens == 0 {
        bail!("diff.max_tokens must be >= 1");
    }

    // Validate sections
    if config.sections.etp.is_empty() || config.sections.tr.is_empty() {
        bail!("sections.etp and sections.tr must not be empty");
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_config(content: &str) -> (TempDir, PathBuf) {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("trg.toml");
        fs::write(&path, content).unwrap();
        (tmp, path)
    }

    #[test]
    fn empty_file_gives_defaults() {
        let (_tmp, path) = write_config("");
        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.segmentation, SegmentConfig::default());
        assert_eq!(cfg.diff.max_tokens, DEFAULT_MAX_TOKENS);
        assert_eq!(cfg.diff.markers, MarkerStyle::Brackets);
        assert_eq!(cfg.sections.tr.len(), 8);
        assert_eq!(cfg.sections.etp[0], "etp-input-introducao");
        assert_eq!(cfg.corpus.max_file_bytes, 52_428_800);
    }

    #[test]
    fn partial_tables_keep_other_defaults() {
        let (_tmp, path) = write_config(
            r#"
[segmentation]
min_unit_chars = 20

[diff]
markers = "html"
"#,
        );
        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.segmentation.min_unit_chars, 20);
        assert_eq!(cfg.segmentation.min_article_markers, 2);
        assert_eq!(cfg.diff.markers, MarkerStyle::Html);
        assert_eq!(cfg.diff.max_tokens, DEFAULT_MAX_TOKENS);
    }

    #[test]
    fn unknown_marker_style_is_rejected() {
        let (_tmp, path) = write_config("[diff]\nmarkers = \"ansi\"\n");
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn zero_limits_are_rejected() {
        let (_tmp, path) = write_config("[diff]\nmax_tokens = 0\n");
        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("diff.max_tokens"));

        let (_tmp, path) = write_config("[segmentation]\nmin_unit_chars = 0\n");
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn empty_section_list_is_rejected() {
        let (_tmp, path) = write_config("[sections]\netp = []\n");
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn explicit_missing_path_is_an_error() {
        let tmp = TempDir::new().unwrap();
        assert!(load_config(&tmp.path().join("absent.toml")).is_err());
    }
}
