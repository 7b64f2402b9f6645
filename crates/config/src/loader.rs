use std::path::{Path, PathBuf};

use {
    anyhow::Context,
    tracing::{debug, warn},
};

use crate::{env_subst::substitute_env, schema::PesanConfig};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &["pesan.toml", "pesan.yaml", "pesan.yml", "pesan.json"];

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> anyhow::Result<PesanConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
}

/// Discover and load config from standard locations, then apply
/// environment overrides.
///
/// Search order:
/// 1. `./pesan.{toml,yaml,yml,json}` (project-local)
/// 2. `~/.config/pesan/pesan.{toml,yaml,yml,json}` (user-global)
///
/// Falls back to `PesanConfig::default()` if no file is found or the file
/// fails to parse.
pub fn discover_and_load() -> PesanConfig {
    let mut config = match find_config_file() {
        Some(path) => {
            debug!(path = %path.display(), "loading config");
            load_config(&path).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
                PesanConfig::default()
            })
        },
        None => {
            debug!("no config file found, using defaults");
            PesanConfig::default()
        },
    };
    apply_env_overrides(&mut config, |name| std::env::var(name).ok());
    config
}

/// Overlay the environment variables the service has always honoured
/// (`PORT`, `BIND`, `BASE_URL`, `RESTRICTED_MODE`, `ALLOWED_NUMBERS`).
pub fn apply_env_overrides(config: &mut PesanConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(port) = lookup("PORT") {
        match port.trim().parse() {
            Ok(p) => config.server.port = p,
            Err(_) => warn!(value = %port, "ignoring invalid PORT"),
        }
    }
    if let Some(bind) = lookup("BIND").filter(|b| !b.trim().is_empty()) {
        config.server.bind = bind.trim().to_string();
    }
    if let Some(url) = lookup("BASE_URL").filter(|u| !u.trim().is_empty()) {
        config.server.base_url = Some(url.trim().to_string());
    }
    if let Some(flag) = lookup("RESTRICTED_MODE") {
        config.access.restricted = matches!(
            flag.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        );
    }
    if let Some(list) = lookup("ALLOWED_NUMBERS") {
        config.access.allowed_numbers = list
            .split(',')
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(String::from)
            .collect();
    }
}

fn find_config_file() -> Option<PathBuf> {
    for name in CONFIG_FILENAMES {
        let p = PathBuf::from(name);
        if p.exists() {
            return Some(p);
        }
    }

    let dir = config_dir()?;
    CONFIG_FILENAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.exists())
}

/// Returns `~/.config/pesan/` on all platforms.
pub fn config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.home_dir().join(".config").join("pesan"))
}

fn parse_config(raw: &str, path: &Path) -> anyhow::Result<PesanConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        _ => anyhow::bail!("unsupported config format: .{ext}"),
    }
}

#[cfg(test)]
mod tests {
    use {super::*, std::collections::HashMap};

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn loads_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pesan.toml");
        std::fs::write(
            &path,
            r#"
            [server]
            port = 9000

            [access]
            restricted = true
            allowed_numbers = ["628111", "628222"]

            [dispatch]
            min_delay_ms = 0
            max_delay_ms = 50
            "#,
        )
        .unwrap();

        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.server.port, 9000);
        assert!(cfg.access.restricted);
        assert_eq!(cfg.access.allowed_numbers, vec!["628111", "628222"]);
        assert_eq!(cfg.dispatch.max_delay_ms, 50);
    }

    #[test]
    fn loads_yaml_and_json() {
        let dir = tempfile::tempdir().unwrap();

        let yaml = dir.path().join("pesan.yaml");
        std::fs::write(&yaml, "whatsapp:\n  domain_suffix: s.whatsapp.net\n").unwrap();
        assert_eq!(
            load_config(&yaml).unwrap().whatsapp.domain_suffix,
            "s.whatsapp.net"
        );

        let json = dir.path().join("pesan.json");
        std::fs::write(&json, r#"{"server":{"bind":"127.0.0.1"}}"#).unwrap();
        assert_eq!(load_config(&json).unwrap().server.bind, "127.0.0.1");
    }

    #[test]
    fn rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pesan.ini");
        std::fs::write(&path, "port=1").unwrap();
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_config(&dir.path().join("nope.toml")).is_err());
    }

    #[test]
    fn env_overrides_apply() {
        let mut cfg = PesanConfig::default();
        apply_env_overrides(
            &mut cfg,
            env(&[
                ("PORT", "8081"),
                ("BASE_URL", "https://wa.example.org"),
                ("RESTRICTED_MODE", "TRUE"),
                ("ALLOWED_NUMBERS", " 628111, ,+628222 "),
            ]),
        );
        assert_eq!(cfg.server.port, 8081);
        assert_eq!(cfg.server.base_url.as_deref(), Some("https://wa.example.org"));
        assert!(cfg.access.restricted);
        assert_eq!(cfg.access.allowed_numbers, vec!["628111", "+628222"]);
    }

    #[test]
    fn invalid_port_is_ignored() {
        let mut cfg = PesanConfig::default();
        apply_env_overrides(&mut cfg, env(&[("PORT", "not-a-port")]));
        assert_eq!(cfg.server.port, 3000);
    }

    #[test]
    fn restricted_mode_false_values() {
        let mut cfg = PesanConfig::default();
        cfg.access.restricted = true;
        apply_env_overrides(&mut cfg, env(&[("RESTRICTED_MODE", "false")]));
        assert!(!cfg.access.restricted);
    }
}
