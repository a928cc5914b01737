use std::env;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
    pub profile: String,
    /// Recompute every book aggregate at startup
    pub rebuild_ratings: bool,
    /// Insert the demo catalogue at startup
    pub seed_demo: bool,
}

impl Config {
    pub fn from_env() -> Self {
        let profile = env::var("PROFILE").unwrap_or_else(|_| "default".to_string());
        Self::with_profile(profile)
    }

    /// Same as `from_env` but with an explicit profile (from `--profile`)
    pub fn with_profile(profile: String) -> Self {
        let database_url = env::var("DATABASE_URL").unwrap_or_else(|_| {
            if profile == "default" {
                "sqlite://bibliorate.db?mode=rwc".to_string()
            } else {
                format!("sqlite://bibliorate_{}.db?mode=rwc", profile)
            }
        });

        Self {
            database_url,
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8000),
            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .ok()
                .map(|s| {
                    s.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            profile,
            rebuild_ratings: flag("REBUILD_RATINGS"),
            seed_demo: flag("SEED_DEMO"),
        }
    }
}

fn flag(name: &str) -> bool {
    env::var(name)
        .map(|v| v != "false" && v != "0")
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear() {
        for key in [
            "PROFILE",
            "DATABASE_URL",
            "PORT",
            "CORS_ALLOWED_ORIGINS",
            "REBUILD_RATINGS",
            "SEED_DEMO",
        ] {
            // SAFETY: tests touching the environment are serialized
            unsafe { env::remove_var(key) };
        }
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear();
        let config = Config::from_env();
        assert_eq!(config.database_url, "sqlite://bibliorate.db?mode=rwc");
        assert_eq!(config.port, 8000);
        assert!(config.cors_allowed_origins.is_empty());
        assert!(!config.rebuild_ratings);
        assert!(!config.seed_demo);
    }

    #[test]
    #[serial]
    fn test_profile_and_flags() {
        clear();
        unsafe {
            env::set_var("PORT", "9100");
            env::set_var("CORS_ALLOWED_ORIGINS", "http://a.test, http://b.test,");
            env::set_var("REBUILD_RATINGS", "1");
            env::set_var("SEED_DEMO", "false");
        }

        let config = Config::with_profile("staging".to_string());
        assert_eq!(config.database_url, "sqlite://bibliorate_staging.db?mode=rwc");
        assert_eq!(config.port, 9100);
        assert_eq!(
            config.cors_allowed_origins,
            vec!["http://a.test".to_string(), "http://b.test".to_string()]
        );
        assert!(config.rebuild_ratings);
        assert!(!config.seed_demo);

        clear();
    }
}
