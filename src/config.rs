use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

use crate::archive::ArchiveFormat;
use crate::schemas::Source;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub format: ArchiveFormat,
    pub create_comic_info: bool,
    pub create_metron_info: bool,
    pub create_metadata: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: ArchiveFormat::Cbz,
            create_comic_info: true,
            create_metron_info: true,
            create_metadata: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub path: PathBuf,
    pub expiry_days: u32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        let base = dirs::cache_dir().unwrap_or_else(|| PathBuf::from("."));
        Self {
            path: base.join("longbox").join("responses.sqlite"),
            expiry_days: 14,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComicvineConfig {
    pub api_key: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetronConfig {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarvelConfig {
    pub public_key: String,
    pub private_key: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeagueConfig {
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub collection_folder: PathBuf,
    pub output: OutputConfig,
    pub cache: CacheConfig,
    /// Services are tried in this order until one fully resolves
    /// publisher, series and issue.
    pub service_order: Vec<Source>,
    pub comicvine: ComicvineConfig,
    pub metron: MetronConfig,
    pub marvel: MarvelConfig,
    pub league: LeagueConfig,
}

impl Default for Settings {
    fn default() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        Self {
            collection_folder: home.join("comics"),
            output: OutputConfig::default(),
            cache: CacheConfig::default(),
            service_order: vec![Source::Metron, Source::Comicvine],
            comicvine: ComicvineConfig::default(),
            metron: MetronConfig::default(),
            marvel: MarvelConfig::default(),
            league: LeagueConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct PartialSettings {
    collection_folder: Option<PathBuf>,
    output: Option<OutputConfig>,
    cache: Option<CacheConfig>,
    service_order: Option<Vec<Source>>,
    comicvine: Option<ComicvineConfig>,
    metron: Option<MetronConfig>,
    marvel: Option<MarvelConfig>,
    league: Option<LeagueConfig>,
}

fn env_or_string(var: &str, fallback: &str) -> String {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => fallback.to_string(),
    }
}

fn env_or_path(var: &str, fallback: PathBuf) -> PathBuf {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => PathBuf::from(v.trim()),
        _ => fallback,
    }
}

fn env_or_u32(var: &str, fallback: u32) -> u32 {
    match env::var(var) {
        Ok(v) => v.trim().parse::<u32>().ok().unwrap_or(fallback),
        Err(_) => fallback,
    }
}

fn env_or_bool(var: &str, fallback: bool) -> bool {
    match env::var(var) {
        Ok(v) => match v.trim() {
            "1" | "true" | "TRUE" | "yes" | "on" => true,
            "0" | "false" | "FALSE" | "no" | "off" => false,
            _ => fallback,
        },
        Err(_) => fallback,
    }
}

fn validate(cfg: &Settings) -> Result<()> {
    if !cfg.output.format.writable() {
        return Err(anyhow!(
            "invalid output format: {} archives are read-only",
            cfg.output.format
        ));
    }
    if !cfg.output.create_comic_info && !cfg.output.create_metron_info && !cfg.output.create_metadata
    {
        return Err(anyhow!(
            "invalid output config: at least one sidecar format must be enabled"
        ));
    }
    if cfg.cache.expiry_days == 0 {
        return Err(anyhow!("invalid cache expiry: must be >= 1 day"));
    }
    if cfg.service_order.is_empty() {
        return Err(anyhow!("invalid service order: cannot be empty"));
    }
    Ok(())
}

fn resolve_config_path() -> Option<PathBuf> {
    if let Ok(custom) = env::var("LONGBOX_CONFIG_PATH") {
        let trimmed = custom.trim();
        if !trimmed.is_empty() {
            return Some(PathBuf::from(trimmed));
        }
    }

    let base = dirs::config_dir()?;
    Some(base.join("longbox").join("config.toml"))
}

fn merge_file_config(base: &mut Settings) -> Result<()> {
    let Some(path) = resolve_config_path() else {
        return Ok(());
    };
    if !path.exists() {
        return Ok(());
    }

    let raw = fs::read_to_string(&path)?;
    let parsed: PartialSettings = toml::from_str(&raw)
        .map_err(|err| anyhow!("failed to parse config {}: {err}", path.display()))?;
    if let Some(folder) = parsed.collection_folder {
        base.collection_folder = folder;
    }
    if let Some(output) = parsed.output {
        base.output = output;
    }
    if let Some(cache) = parsed.cache {
        base.cache = cache;
    }
    if let Some(order) = parsed.service_order {
        base.service_order = order;
    }
    if let Some(comicvine) = parsed.comicvine {
        base.comicvine = comicvine;
    }
    if let Some(metron) = parsed.metron {
        base.metron = metron;
    }
    if let Some(marvel) = parsed.marvel {
        base.marvel = marvel;
    }
    if let Some(league) = parsed.league {
        base.league = league;
    }
    Ok(())
}

pub fn load() -> Result<Settings> {
    let mut cfg = Settings::default();
    merge_file_config(&mut cfg)?;

    cfg.collection_folder = env_or_path("LONGBOX_COLLECTION", cfg.collection_folder);
    if let Ok(raw) = env::var("LONGBOX_OUTPUT_FORMAT") {
        if let Some(format) = ArchiveFormat::parse(raw.trim()) {
            cfg.output.format = format;
        }
    }
    cfg.output.create_comic_info =
        env_or_bool("LONGBOX_CREATE_COMIC_INFO", cfg.output.create_comic_info);
    cfg.output.create_metron_info =
        env_or_bool("LONGBOX_CREATE_METRON_INFO", cfg.output.create_metron_info);
    cfg.output.create_metadata = env_or_bool("LONGBOX_CREATE_METADATA", cfg.output.create_metadata);
    cfg.cache.path = env_or_path("LONGBOX_CACHE_PATH", cfg.cache.path);
    cfg.cache.expiry_days = env_or_u32("LONGBOX_CACHE_EXPIRY_DAYS", cfg.cache.expiry_days);
    cfg.comicvine.api_key = env_or_string("LONGBOX_COMICVINE_API_KEY", &cfg.comicvine.api_key);
    cfg.metron.username = env_or_string("LONGBOX_METRON_USERNAME", &cfg.metron.username);
    cfg.metron.password = env_or_string("LONGBOX_METRON_PASSWORD", &cfg.metron.password);
    cfg.marvel.public_key = env_or_string("LONGBOX_MARVEL_PUBLIC_KEY", &cfg.marvel.public_key);
    cfg.marvel.private_key = env_or_string("LONGBOX_MARVEL_PRIVATE_KEY", &cfg.marvel.private_key);
    cfg.league.client_id = env_or_string("LONGBOX_LEAGUE_CLIENT_ID", &cfg.league.client_id);
    cfg.league.client_secret =
        env_or_string("LONGBOX_LEAGUE_CLIENT_SECRET", &cfg.league.client_secret);

    validate(&cfg)?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_pass_validation() {
        let cfg = Settings::default();
        assert!(validate(&cfg).is_ok());
    }

    #[test]
    fn read_only_output_format_is_rejected() {
        let mut cfg = Settings::default();
        cfg.output.format = ArchiveFormat::Cbr;
        assert!(validate(&cfg).is_err());
    }

    #[test]
    fn disabling_every_sidecar_is_rejected() {
        let mut cfg = Settings::default();
        cfg.output.create_comic_info = false;
        cfg.output.create_metron_info = false;
        cfg.output.create_metadata = false;
        assert!(validate(&cfg).is_err());
    }

    #[test]
    fn partial_toml_overrides_only_named_sections() {
        let mut cfg = Settings::default();
        let parsed: PartialSettings =
            toml::from_str("[metron]\nusername = \"alice\"\npassword = \"secret\"\n")
                .expect("parse");
        if let Some(metron) = parsed.metron {
            cfg.metron = metron;
        }
        assert_eq!(cfg.metron.username, "alice");
        assert_eq!(cfg.output.format, ArchiveFormat::Cbz);
    }
}
