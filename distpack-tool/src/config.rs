use anyhow::{Context, Result};
use distpack_lib::{ArchiveFormat, ArchiverSettings, Config};
use std::{collections::HashMap, env, fs};

use crate::options::ArchiveOptions;
use crate::plugin::HostConfig;

pub const ENV_PREFIX: &str = "DISTPACK_";
pub const DEFAULT_OUT_DIR: &str = "dist";

/// Reads environment variables prefixed with `DISTPACK_`.
pub fn read_env() -> Result<Config> {
    let vars: HashMap<String, String> = env::vars().collect();
    config_from_vars(&vars)
}

fn parse_flag(v: &str) -> bool {
    v == "true" || v == "1" || v.eq_ignore_ascii_case("yes")
}

pub fn config_from_vars(vars: &HashMap<String, String>) -> Result<Config> {
    let mut cfg = Config::default();

    macro_rules! get_env {
        ($key:expr) => {
            vars.get(&format!("{}{}", ENV_PREFIX, $key)).cloned()
        };
    }

    cfg.root = get_env!("ROOT");
    cfg.out_dir = get_env!("OUT_DIR");
    cfg.source_dir = get_env!("SOURCE_DIR");
    cfg.output = get_env!("OUTPUT");
    cfg.config = get_env!("CONFIG");
    cfg.format = get_env!("FORMAT")
        .map(|v| v.parse::<ArchiveFormat>())
        .transpose()
        .context("invalid DISTPACK_FORMAT")?;
    cfg.level = get_env!("LEVEL")
        .map(|v| v.trim().parse::<u32>())
        .transpose()
        .context("invalid DISTPACK_LEVEL")?;
    cfg.gzip = get_env!("GZIP").map(|v| parse_flag(&v));
    cfg.progress = get_env!("PROGRESS").map(|v| parse_flag(&v));
    Ok(cfg)
}

/// Reads YAML or JSON config from file
pub fn read_config_file(path: &str) -> Result<Config> {
    let content = fs::read_to_string(path).with_context(|| format!("reading config {path}"))?;
    let lower = path.to_lowercase();
    let cfg = if lower.ends_with(".json") {
        serde_json::from_str(&content).with_context(|| format!("parsing JSON config {path}"))?
    } else {
        serde_yaml::from_str(&content).with_context(|| format!("parsing YAML config {path}"))?
    };
    Ok(cfg)
}

/// Merge configs by priority: env < file < cli
pub fn merge_configs(env: Config, file: Config, cli: Config) -> Config {
    fn pick<T>(env: Option<T>, file: Option<T>, cli: Option<T>) -> Option<T> {
        cli.or(file).or(env)
    }

    Config {
        root: pick(env.root, file.root, cli.root),
        out_dir: pick(env.out_dir, file.out_dir, cli.out_dir),
        source_dir: pick(env.source_dir, file.source_dir, cli.source_dir),
        output: pick(env.output, file.output, cli.output),
        config: pick(env.config, file.config, cli.config),
        format: pick(env.format, file.format, cli.format),
        level: pick(env.level, file.level, cli.level),
        gzip: pick(env.gzip, file.gzip, cli.gzip),
        progress: pick(env.progress, file.progress, cli.progress),
    }
}

/// The host side of the merged config: project root and build output directory.
pub fn host_config(cfg: &Config) -> HostConfig {
    HostConfig::new(
        cfg.root.clone().unwrap_or_else(|| ".".to_string()),
        cfg.out_dir
            .clone()
            .unwrap_or_else(|| DEFAULT_OUT_DIR.to_string()),
    )
}

/// The plugin side of the merged config. Progress reporting is wired by the caller.
pub fn archive_options(cfg: &Config) -> ArchiveOptions {
    let mut options = ArchiveOptions::new()
        .format(cfg.format.unwrap_or_default())
        .archiver(ArchiverSettings {
            level: cfg.level,
            gzip: cfg.gzip,
        });
    if let Some(dir) = &cfg.source_dir {
        options = options.source_dir(dir);
    }
    if let Some(file) = &cfg.output {
        options = options.output_file(file);
    }
    options
}
