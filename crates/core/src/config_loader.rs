use crate::config::AppConfig;
use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads configuration by layering defaults, `config/Betarb.toml`, and
    /// `BETARB_`-prefixed environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration source cannot be read or parsed.
    pub fn load() -> Result<AppConfig> {
        Self::load_from("config/Betarb.toml")
    }

    /// Loads configuration from a specific TOML file path.
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration source cannot be read or parsed.
    pub fn load_from(path: &str) -> Result<AppConfig> {
        let config: AppConfig = Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("BETARB_").split("__"))
            .extract()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::providers::Toml;
    use rust_decimal_macros::dec;

    #[test]
    fn test_missing_file_yields_defaults() {
        let config = ConfigLoader::load_from("does/not/exist.toml").unwrap();
        assert!(config.engine.practice_mode);
    }

    #[test]
    fn test_toml_overrides_defaults() {
        let config: AppConfig = Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::string(
                r#"
                [engine]
                tick_secs = 5
                practice_mode = false

                [betdaq]
                commission = 0.03
                min_stake = 1.0
                "#,
            ))
            .extract()
            .unwrap();

        assert_eq!(config.engine.tick_secs, 5);
        assert!(!config.engine.practice_mode);
        assert_eq!(config.betdaq.commission, dec!(0.03));
        // Untouched sections keep their defaults.
        assert_eq!(config.betfair.min_stake, dec!(2.0));
    }
}
