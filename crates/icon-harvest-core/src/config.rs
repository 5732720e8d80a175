use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::HarvestError;
use crate::fetch_page::CurlOptions;
use crate::retry::RetryPolicy;

/// Site harvested when no `base_url` is configured.
pub const DEFAULT_BASE_URL: &str = "http://game-icons.net";

/// Which packaged archive to pick on a tag's detail page (format x colour scheme).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Flavour {
    SvgWhite,
    SvgBlack,
    PngWhite,
    #[default]
    PngBlack,
}

impl Flavour {
    pub const ALL: [Flavour; 4] = [
        Flavour::SvgWhite,
        Flavour::SvgBlack,
        Flavour::PngWhite,
        Flavour::PngBlack,
    ];

    /// Name used on the command line and in config.toml.
    pub fn as_str(self) -> &'static str {
        match self {
            Flavour::SvgWhite => "svg-white",
            Flavour::SvgBlack => "svg-black",
            Flavour::PngWhite => "png-white",
            Flavour::PngBlack => "png-black",
        }
    }

    /// Tooltip text the detail page attaches to this flavour's download link.
    pub fn hint(self) -> &'static str {
        match self {
            Flavour::SvgWhite => "white on black SVG icons",
            Flavour::SvgBlack => "black on transparent SVG icons",
            Flavour::PngWhite => "white on black PNG icons",
            Flavour::PngBlack => "black on transparent PNG icons",
        }
    }
}

impl fmt::Display for Flavour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown flavour '{0}' (expected one of: svg-white, svg-black, png-white, png-black)")]
pub struct UnknownFlavour(pub String);

impl FromStr for Flavour {
    type Err = UnknownFlavour;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Flavour::ALL
            .into_iter()
            .find(|f| f.as_str() == s.trim())
            .ok_or_else(|| UnknownFlavour(s.to_string()))
    }
}

/// Retry policy parameters (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts per page or archive fetch (including the first).
    pub max_attempts: u32,
    /// Base delay in seconds for exponential backoff (e.g. 0.25 = 250ms).
    pub base_delay_secs: f64,
    /// Maximum backoff delay in seconds.
    pub max_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_secs: 0.5,
            max_delay_secs: 30,
        }
    }
}

/// Settings loaded from `~/.config/icon-harvest/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarvestConfig {
    /// Maximum number of tags downloaded or extracted at once.
    pub parallelism: usize,
    /// Archive variant to download.
    pub flavour: Flavour,
    /// Where icons are written; defaults to `~/Downloads/game-icons`.
    #[serde(default)]
    pub output_folder: Option<PathBuf>,
    /// Site root; tag list is `<base_url>/tags.html`.
    pub base_url: String,
    pub connect_timeout_secs: u64,
    /// Upper bound on a whole request, archive downloads included.
    pub request_timeout_secs: u64,
    /// Abort a transfer that stays under 1 KiB/s for this long.
    pub low_speed_time_secs: u64,
    /// Leave downloaded archives on disk after extraction.
    #[serde(default)]
    pub keep_archives: bool,
    /// Optional retry policy; if missing, fetches are attempted once.
    #[serde(default)]
    pub retry: Option<RetryConfig>,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            parallelism: 3,
            flavour: Flavour::default(),
            output_folder: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            connect_timeout_secs: 30,
            request_timeout_secs: 600,
            low_speed_time_secs: 60,
            keep_archives: false,
            retry: None,
        }
    }
}

/// `~/Downloads/game-icons`, or `./game-icons` when no home directory is known.
pub fn default_output_folder() -> PathBuf {
    let home = if cfg!(windows) {
        std::env::var_os("USERPROFILE")
    } else {
        std::env::var_os("HOME")
    };
    match home {
        Some(h) => PathBuf::from(h).join("Downloads").join("game-icons"),
        None => PathBuf::from("game-icons"),
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("icon-harvest")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<HarvestConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = HarvestConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: HarvestConfig = toml::from_str(&data)?;
    Ok(cfg)
}

/// Validated, immutable settings for one harvest run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub parallelism: usize,
    pub flavour: Flavour,
    pub output_folder: PathBuf,
    pub base_url: url::Url,
    pub curl: CurlOptions,
    pub keep_archives: bool,
    pub retry: RetryPolicy,
}

impl RunConfig {
    /// Validates `cfg` and fills in defaults.
    ///
    /// Rejects a parallelism of 0, an unparseable base URL and zero timeouts.
    pub fn from_config(cfg: &HarvestConfig) -> Result<Self, HarvestError> {
        if cfg.parallelism == 0 {
            return Err(HarvestError::Config(
                "parallelism must be at least 1".to_string(),
            ));
        }
        if cfg.connect_timeout_secs == 0 || cfg.request_timeout_secs == 0 {
            return Err(HarvestError::Config(
                "timeouts must be at least 1 second".to_string(),
            ));
        }
        let base_url = url::Url::parse(&cfg.base_url)
            .map_err(|e| HarvestError::Config(format!("base_url '{}': {}", cfg.base_url, e)))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(HarvestError::Config(format!(
                "base_url '{}' is not an http(s) URL",
                cfg.base_url
            )));
        }

        let retry = match &cfg.retry {
            Some(r) => RetryPolicy {
                max_attempts: r.max_attempts.max(1),
                base_delay: Duration::try_from_secs_f64(r.base_delay_secs).map_err(|_| {
                    HarvestError::Config(format!(
                        "retry.base_delay_secs {} is not a usable delay",
                        r.base_delay_secs
                    ))
                })?,
                max_delay: Duration::from_secs(r.max_delay_secs),
            },
            None => RetryPolicy::single_attempt(),
        };

        Ok(Self {
            parallelism: cfg.parallelism,
            flavour: cfg.flavour,
            output_folder: cfg
                .output_folder
                .clone()
                .unwrap_or_else(default_output_folder),
            base_url,
            curl: CurlOptions {
                connect_timeout: Duration::from_secs(cfg.connect_timeout_secs),
                timeout: Duration::from_secs(cfg.request_timeout_secs),
                low_speed_time: Duration::from_secs(cfg.low_speed_time_secs),
            },
            keep_archives: cfg.keep_archives,
            retry,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let cfg = HarvestConfig::default();
        assert_eq!(cfg.parallelism, 3);
        assert_eq!(cfg.flavour, Flavour::PngBlack);
        assert_eq!(cfg.base_url, "http://game-icons.net");
        assert!(cfg.output_folder.is_none());
        assert!(!cfg.keep_archives);
    }

    #[test]
    fn config_toml_roundtrip() {
        let cfg = HarvestConfig::default();
        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed: HarvestConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.parallelism, cfg.parallelism);
        assert_eq!(parsed.flavour, cfg.flavour);
        assert_eq!(parsed.base_url, cfg.base_url);
    }

    #[test]
    fn config_toml_custom_values() {
        let toml = r#"
            parallelism = 8
            flavour = "svg-white"
            output_folder = "/srv/icons"
            base_url = "https://mirror.example.org"
            connect_timeout_secs = 5
            request_timeout_secs = 120
            low_speed_time_secs = 10

            [retry]
            max_attempts = 4
            base_delay_secs = 0.5
            max_delay_secs = 15
        "#;
        let cfg: HarvestConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.parallelism, 8);
        assert_eq!(cfg.flavour, Flavour::SvgWhite);
        assert_eq!(cfg.output_folder.as_deref(), Some(std::path::Path::new("/srv/icons")));
        let retry = cfg.retry.as_ref().unwrap();
        assert_eq!(retry.max_attempts, 4);
        assert!((retry.base_delay_secs - 0.5).abs() < 1e-9);
    }

    #[test]
    fn config_toml_rejects_unknown_flavour() {
        let toml = r#"
            parallelism = 3
            flavour = "jpg-rainbow"
            base_url = "http://game-icons.net"
            connect_timeout_secs = 5
            request_timeout_secs = 120
            low_speed_time_secs = 10
        "#;
        assert!(toml::from_str::<HarvestConfig>(toml).is_err());
    }

    #[test]
    fn flavour_parse_and_hint() {
        assert_eq!("png-white".parse::<Flavour>().unwrap(), Flavour::PngWhite);
        assert_eq!(Flavour::SvgBlack.hint(), "black on transparent SVG icons");
        let err = "gif".parse::<Flavour>().unwrap_err();
        assert!(err.to_string().contains("unknown flavour 'gif'"));
        for f in Flavour::ALL {
            assert_eq!(f.to_string().parse::<Flavour>().unwrap(), f);
        }
    }

    #[test]
    fn run_config_rejects_zero_parallelism() {
        let cfg = HarvestConfig {
            parallelism: 0,
            ..HarvestConfig::default()
        };
        assert!(matches!(
            RunConfig::from_config(&cfg),
            Err(HarvestError::Config(_))
        ));
    }

    #[test]
    fn run_config_rejects_bad_base_url() {
        let cfg = HarvestConfig {
            base_url: "not a url".to_string(),
            ..HarvestConfig::default()
        };
        assert!(RunConfig::from_config(&cfg).is_err());
        let cfg = HarvestConfig {
            base_url: "ftp://game-icons.net".to_string(),
            ..HarvestConfig::default()
        };
        assert!(RunConfig::from_config(&cfg).is_err());
    }

    #[test]
    fn run_config_rejects_unusable_retry_delay() {
        for delay in [f64::INFINITY, f64::NAN, -1.0] {
            let cfg = HarvestConfig {
                retry: Some(RetryConfig {
                    max_attempts: 3,
                    base_delay_secs: delay,
                    max_delay_secs: 10,
                }),
                ..HarvestConfig::default()
            };
            match RunConfig::from_config(&cfg) {
                Err(HarvestError::Config(msg)) => assert!(msg.contains("base_delay_secs"), "{msg}"),
                other => panic!("expected config error for {delay}, got {other:?}"),
            }
        }
    }

    #[test]
    fn run_config_parses_inf_from_toml_and_rejects_it() {
        let toml = r#"
            parallelism = 2
            flavour = "png-black"
            base_url = "http://game-icons.net"
            connect_timeout_secs = 5
            request_timeout_secs = 120
            low_speed_time_secs = 10

            [retry]
            max_attempts = 2
            base_delay_secs = inf
            max_delay_secs = 5
        "#;
        let cfg: HarvestConfig = toml::from_str(toml).unwrap();
        assert!(matches!(RunConfig::from_config(&cfg), Err(HarvestError::Config(_))));
    }

    #[test]
    fn run_config_fills_defaults() {
        let run = RunConfig::from_config(&HarvestConfig::default()).unwrap();
        assert_eq!(run.parallelism, 3);
        assert!(run.output_folder.ends_with("game-icons"));
        assert_eq!(run.retry.max_attempts, 1);
        assert_eq!(run.curl.connect_timeout, Duration::from_secs(30));
    }
}
