use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "MedRec";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default bind address for the local web surface.
pub const DEFAULT_BIND: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 8501);

/// Default PBKDF2 work factor for new password records.
pub const DEFAULT_PBKDF2_ITERATIONS: u32 = 600_000;

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "medrec=info,medrec_lib=info,tower_http=info"
}

/// Get the application data directory.
/// ~/MedRec/ on all platforms, falling back to the working directory
/// when no home directory can be determined.
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(APP_NAME))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind: SocketAddr,
    pub data_dir: PathBuf,
    pub catalog_path: PathBuf,
    pub similarity_path: PathBuf,
    pub db_path: PathBuf,
    pub images_dir: PathBuf,
    pub pbkdf2_iterations: u32,
}

impl AppConfig {
    /// Resolve configuration from `MEDREC_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve configuration from an arbitrary key lookup.
    ///
    /// Unparseable values fall back to their defaults with a warning.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let data_dir = lookup("MEDREC_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(app_data_dir);

        let path_or = |key: &str, default: &str| {
            lookup(key)
                .map(PathBuf::from)
                .unwrap_or_else(|| data_dir.join(default))
        };

        let bind = match lookup("MEDREC_BIND") {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                tracing::warn!(value = %raw, "Invalid MEDREC_BIND, using default");
                DEFAULT_BIND
            }),
            None => DEFAULT_BIND,
        };

        let pbkdf2_iterations = match lookup("MEDREC_PBKDF2_ITERATIONS") {
            Some(raw) => match raw.parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => {
                    tracing::warn!(value = %raw, "Invalid MEDREC_PBKDF2_ITERATIONS, using default");
                    DEFAULT_PBKDF2_ITERATIONS
                }
            },
            None => DEFAULT_PBKDF2_ITERATIONS,
        };

        Self {
            bind,
            catalog_path: path_or("MEDREC_CATALOG", "medicine_dict.json"),
            similarity_path: path_or("MEDREC_SIMILARITY", "similarity.json"),
            db_path: path_or("MEDREC_DB", "users.db"),
            images_dir: path_or("MEDREC_IMAGES", "images"),
            pbkdf2_iterations,
            data_dir,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn app_data_dir_ends_with_app_name() {
        let dir = app_data_dir();
        if dirs::home_dir().is_some() {
            assert!(dir.ends_with("MedRec"));
        }
    }

    #[test]
    fn defaults_live_under_data_dir() {
        let config = AppConfig::from_lookup(lookup_from(&[("MEDREC_DATA_DIR", "/srv/medrec")]));
        assert_eq!(config.data_dir, PathBuf::from("/srv/medrec"));
        assert_eq!(config.catalog_path, PathBuf::from("/srv/medrec/medicine_dict.json"));
        assert_eq!(config.similarity_path, PathBuf::from("/srv/medrec/similarity.json"));
        assert_eq!(config.db_path, PathBuf::from("/srv/medrec/users.db"));
        assert_eq!(config.images_dir, PathBuf::from("/srv/medrec/images"));
        assert_eq!(config.bind, DEFAULT_BIND);
        assert_eq!(config.pbkdf2_iterations, DEFAULT_PBKDF2_ITERATIONS);
    }

    #[test]
    fn explicit_paths_override_data_dir() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("MEDREC_DATA_DIR", "/srv/medrec"),
            ("MEDREC_DB", "/tmp/other.db"),
            ("MEDREC_BIND", "0.0.0.0:9000"),
        ]));
        assert_eq!(config.db_path, PathBuf::from("/tmp/other.db"));
        assert_eq!(config.bind.port(), 9000);
    }

    #[test]
    fn invalid_values_fall_back_to_defaults() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("MEDREC_BIND", "not-an-address"),
            ("MEDREC_PBKDF2_ITERATIONS", "0"),
        ]));
        assert_eq!(config.bind, DEFAULT_BIND);
        assert_eq!(config.pbkdf2_iterations, DEFAULT_PBKDF2_ITERATIONS);
    }

    #[test]
    fn default_bind_is_local_port_8501() {
        assert_eq!(DEFAULT_BIND.to_string(), "127.0.0.1:8501");
    }

    #[test]
    fn app_name_is_medrec() {
        assert_eq!(APP_NAME, "MedRec");
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.1.0");
    }
}
