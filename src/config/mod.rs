use std::env;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

#[derive(Debug, Default, Deserialize, Serialize, Clone, PartialEq)]
pub struct ConfigFile {
    pub url: Option<String>,
    pub pages: Option<Vec<String>>,
    pub requests: Option<usize>,
    pub concurrency: Option<usize>,
    pub security: Option<bool>,
    pub random_paths: Option<usize>,
    pub timeout: Option<usize>,
    pub rate: Option<u32>,
    pub strategy: Option<String>,
    pub workers: Option<usize>,
    pub follow_redirects: Option<bool>,
    pub max_errors_per_path: Option<usize>,
    pub output: Option<String>,
    pub output_format: Option<String>,
    pub no_color: Option<bool>,
}

fn home_dir() -> Option<PathBuf> {
    env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(|| env::var_os("USERPROFILE").map(PathBuf::from))
        .or_else(|| {
            let drive = env::var_os("HOMEDRIVE")?;
            let path = env::var_os("HOMEPATH")?;
            Some(PathBuf::from(drive).join(path))
        })
}

pub fn default_config_path() -> Option<PathBuf> {
    Some(home_dir()?.join(".stressprobe").join("config.yml"))
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/").or_else(|| path.strip_prefix("~\\")) {
        if let Some(home) = home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

pub fn expand_tilde_string(path: &str) -> String {
    expand_tilde(path).to_string_lossy().to_string()
}

pub fn load_config(path: &PathBuf, allow_missing: bool) -> Result<ConfigFile, String> {
    match std::fs::read_to_string(path) {
        Ok(contents) => parse_config(&contents)
            .map_err(|e| format!("failed to parse config '{}': {e}", path.display())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound && allow_missing => {
            Ok(ConfigFile::default())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(format!("config file not found '{}'", path.display()))
        }
        Err(e) => Err(format!("failed to read config '{}': {e}", path.display())),
    }
}

fn parse_config(contents: &str) -> Result<ConfigFile, serde_yaml::Error> {
    // a file with only comments deserializes as null
    if contents.lines().all(|l| {
        let l = l.trim();
        l.is_empty() || l.starts_with('#')
    }) {
        return Ok(ConfigFile::default());
    }
    serde_yaml::from_str::<ConfigFile>(contents)
}

fn default_config_yaml() -> String {
    r#"# Stressprobe config
#
# Location (default):
#   ~/.stressprobe/config.yml
#
# Command line flags override values set here.

# Target
url: http://localhost:8270
pages:
  - ""
  - index.html
  - 404.html
  - nope.html

# Load
requests: 1000
concurrency: 10
timeout: 10
# rate: 500
strategy: pool
workers: 4

# Security probe
security: false
random_paths: 5

# HTTP
follow_redirects: false

# Reporting
max_errors_per_path: 100
# output: ./report.json
# output_format: json
no_color: false
"#
    .to_string()
}

pub fn ensure_default_config_file(path: &PathBuf) -> Result<bool, String> {
    if path.exists() {
        return Ok(false);
    }
    let parent = path
        .parent()
        .ok_or_else(|| format!("invalid config path '{}'", path.display()))?;
    std::fs::create_dir_all(parent).map_err(|e| {
        format!(
            "failed to create config directory '{}': {e}",
            parent.display()
        )
    })?;
    let contents = default_config_yaml();
    std::fs::write(path, contents)
        .map_err(|e| format!("failed to write config file '{}': {e}", path.display()))?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = env::temp_dir().join(format!(
            "stressprobe-config-{name}-{}",
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn default_yaml_parses() {
        let cfg = parse_config(&default_config_yaml()).unwrap();
        assert_eq!(cfg.url.as_deref(), Some("http://localhost:8270"));
        assert_eq!(
            cfg.pages.unwrap(),
            vec!["", "index.html", "404.html", "nope.html"]
        );
        assert_eq!(cfg.concurrency, Some(10));
        assert_eq!(cfg.strategy.as_deref(), Some("pool"));
        assert_eq!(cfg.rate, None);
    }

    #[test]
    fn comment_only_file_is_empty_config() {
        assert_eq!(parse_config("# nothing\n\n").unwrap(), ConfigFile::default());
    }

    #[test]
    fn missing_file_handling() {
        let path = scratch_dir("missing").join("config.yml");
        assert_eq!(load_config(&path, true).unwrap(), ConfigFile::default());
        assert!(load_config(&path, false)
            .unwrap_err()
            .contains("config file not found"));
    }

    #[test]
    fn ensure_default_writes_once() {
        let dir = scratch_dir("ensure");
        let path = dir.join("nested").join("config.yml");
        assert!(ensure_default_config_file(&path).unwrap());
        assert!(!ensure_default_config_file(&path).unwrap());
        let cfg = load_config(&path, false).unwrap();
        assert_eq!(cfg.requests, Some(1000));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn tilde_expands_to_home() {
        if let Some(home) = home_dir() {
            assert_eq!(expand_tilde("~/x.yml"), home.join("x.yml"));
        }
        assert_eq!(expand_tilde("/etc/x.yml"), PathBuf::from("/etc/x.yml"));
    }
}
