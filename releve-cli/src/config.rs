use anyhow::{Context, Result, bail};
use releve_core::Reconciler;
use releve_ingest::{NoOcr, PdfTextExtractor, TesseractOcr};
use releve_llm::{Provider, StructurerConfig};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::state::{ensure_releve_home, releve_home};

const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub llm: LlmSection,
    pub paths: PathsSection,
    pub ocr: OcrSection,
    pub reconcile: ReconcileSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    pub provider: String,
    pub model: String,
    /// Empty means the provider's public endpoint.
    pub base_url: String,
    pub temperature: f32,
    pub timeout_secs: u64,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsSection {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrSection {
    pub enabled: bool,
    pub pdftoppm: String,
    pub tesseract: String,
    pub language: String,
    pub dpi: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileSection {
    /// Decimal string; "0" means exact equality.
    pub tolerance: String,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: Provider::OpenAI.default_model().to_string(),
            base_url: String::new(),
            temperature: 0.0,
            timeout_secs: 120,
            max_tokens: 4096,
        }
    }
}

impl Default for PathsSection {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("input"),
            output_dir: PathBuf::from("output"),
        }
    }
}

impl Default for OcrSection {
    fn default() -> Self {
        let t = TesseractOcr::default();
        Self {
            enabled: true,
            pdftoppm: t.pdftoppm,
            tesseract: t.tesseract,
            language: t.language,
            dpi: t.dpi,
        }
    }
}

impl Default for ReconcileSection {
    fn default() -> Self {
        Self {
            tolerance: "0".to_string(),
        }
    }
}

impl Config {
    /// Structurer settings, with the API key taken from the provider's env var.
    pub fn structurer_config(&self) -> Result<StructurerConfig> {
        let key_var = self.provider()?.api_key_var();
        self.structurer_config_with_key(std::env::var(key_var).ok())
    }

    pub fn structurer_config_with_key(&self, api_key: Option<String>) -> Result<StructurerConfig> {
        let provider = self.provider()?;
        let mut sc = StructurerConfig::new(provider);
        if !self.llm.model.trim().is_empty() {
            sc.model = self.llm.model.trim().to_string();
        }
        if !self.llm.base_url.trim().is_empty() {
            sc.base_url = self.llm.base_url.trim().to_string();
        }
        sc.temperature = self.llm.temperature;
        sc.timeout_secs = self.llm.timeout_secs;
        sc.max_tokens = self.llm.max_tokens;
        sc.api_key = api_key.filter(|k| !k.trim().is_empty());
        Ok(sc)
    }

    pub fn provider(&self) -> Result<Provider> {
        Provider::from_str(&self.llm.provider).map_err(|e| anyhow::anyhow!(e))
    }

    pub fn tolerance(&self) -> Result<Decimal> {
        parse_tolerance(&self.reconcile.tolerance)
    }

    pub fn reconciler(&self) -> Result<Reconciler> {
        Ok(Reconciler::with_tolerance(self.tolerance()?)?)
    }

    /// Text extractor honoring `[ocr]`; `force_off` comes from `--no-ocr`.
    pub fn extractor(&self, force_off: bool) -> PdfTextExtractor {
        if force_off || !self.ocr.enabled {
            return PdfTextExtractor::new(NoOcr);
        }
        PdfTextExtractor::new(TesseractOcr {
            pdftoppm: self.ocr.pdftoppm.clone(),
            tesseract: self.ocr.tesseract.clone(),
            language: self.ocr.language.clone(),
            dpi: self.ocr.dpi,
        })
    }
}

pub fn parse_tolerance(raw: &str) -> Result<Decimal> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(Decimal::ZERO);
    }
    let t = Decimal::from_str(raw).with_context(|| format!("invalid tolerance `{raw}`"))?;
    if t.is_sign_negative() && !t.is_zero() {
        bail!("tolerance must not be negative (got {raw})");
    }
    Ok(t)
}

pub fn config_path() -> Result<PathBuf> {
    Ok(releve_home()?.join(CONFIG_FILE))
}

/// Reading never creates the home directory; without one the defaults apply.
pub fn load_config() -> Result<Config> {
    match releve_home() {
        Ok(home) => load_config_in(&home),
        Err(e) => {
            tracing::debug!(error = %e, "no releve home, using default config");
            Ok(Config::default())
        }
    }
}

pub fn load_config_in(home: &Path) -> Result<Config> {
    load_config_from(&home.join(CONFIG_FILE))
}

pub fn load_config_from(p: &Path) -> Result<Config> {
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(p).with_context(|| format!("read {}", p.display()))?;
    toml::from_str(&s).with_context(|| format!("parse {}", p.display()))
}

pub fn save_config_to(cfg: &Config, p: &Path) -> Result<()> {
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn init_config() -> Result<()> {
    let p = ensure_releve_home()?.join(CONFIG_FILE);
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config_to(&Config::default(), &p)?;
    println!("Wrote {}", p.display());
    Ok(())
}
