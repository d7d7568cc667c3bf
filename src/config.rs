use anyhow::Result;
use serde::{Deserialize, Serialize};
use serenity::model::id::ApplicationId;
use std::{path::PathBuf, time::Duration};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    // Discord
    pub discord_token: String,
    pub application_id: u64,
    pub guild_id: Option<u64>, // Para comandos de desarrollo

    // Voz
    pub idle_disconnect: Duration,
    pub sound_volume: f32,
    pub tts_language: String,

    // Paths
    pub sounds_dir: PathBuf,

    // Permisos
    pub dev_user_id: Option<u64>,
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            // Discord
            discord_token: std::env::var("DISCORD_TOKEN")?,
            application_id: std::env::var("APPLICATION_ID")?.parse()?,
            guild_id: std::env::var("GUILD_ID").ok().and_then(|s| s.parse().ok()),

            // Voz
            idle_disconnect: humantime::parse_duration(
                &std::env::var("IDLE_DISCONNECT").unwrap_or_else(|_| "30m".to_string()),
            )?,
            sound_volume: std::env::var("SOUND_VOLUME")
                .unwrap_or_else(|_| "0.2".to_string())
                .parse()?,
            tts_language: std::env::var("TTS_LANGUAGE").unwrap_or_else(|_| "en".to_string()),

            // Paths
            sounds_dir: std::env::var("SOUNDS_DIR")
                .unwrap_or_else(|_| "assets/sounds".to_string())
                .into(),

            dev_user_id: std::env::var("DEV_USER_ID").ok().and_then(|s| s.parse().ok()),
        };

        std::fs::create_dir_all(&config.sounds_dir)?;

        config.validate()?;

        Ok(config)
    }

    /// Validates configuration values for correctness.
    ///
    /// # Validation Rules
    ///
    /// - Idle disconnect threshold between 1 second and 24 hours
    /// - Sound volume between 0.0 and 2.0
    /// - TTS language must not be empty
    pub fn validate(&self) -> Result<()> {
        if self.idle_disconnect < Duration::from_secs(1) {
            anyhow::bail!(
                "Idle disconnect must be at least 1s, got: {}",
                humantime::format_duration(self.idle_disconnect)
            );
        }

        if self.idle_disconnect > Duration::from_secs(24 * 60 * 60) {
            anyhow::bail!(
                "Idle disconnect cannot exceed 24h, got: {}",
                humantime::format_duration(self.idle_disconnect)
            );
        }

        if !(0.0..=2.0).contains(&self.sound_volume) {
            anyhow::bail!("Sound volume must be between 0.0 and 2.0, got: {}", self.sound_volume);
        }

        if self.tts_language.trim().is_empty() {
            anyhow::bail!("TTS language must not be empty");
        }

        Ok(())
    }

    /// The id handed to the serenity client. Snowflakes are never 0.
    pub fn discord_application_id(&self) -> Result<ApplicationId> {
        if self.application_id == 0 {
            anyhow::bail!("APPLICATION_ID must be a non-zero application id");
        }
        Ok(ApplicationId::new(self.application_id))
    }

    /// Returns a summary of the current configuration for logging, without
    /// the token.
    pub fn summary(&self) -> String {
        format!(
            "Config Summary:\n  \
            Discord: App ID {} (Guild: {})\n  \
            Voice: idle disconnect {}, sound volume {}%, TTS '{}'\n  \
            Sounds: {}\n  \
            Dev user: {}",
            self.application_id,
            self.guild_id.map_or("global".to_string(), |id| id.to_string()),
            humantime::format_duration(self.idle_disconnect),
            (self.sound_volume * 100.0) as u32,
            self.tts_language,
            self.sounds_dir.display(),
            self.dev_user_id.map_or("anyone".to_string(), |id| id.to_string()),
        )
    }
}

/// Default configuration values.
///
/// Used as fallbacks when environment variables are not provided.
impl Default for Config {
    fn default() -> Self {
        Self {
            // Discord (no defaults - must be provided)
            discord_token: String::new(),
            application_id: 0,
            guild_id: None,

            idle_disconnect: Duration::from_secs(30 * 60),
            sound_volume: 0.2,
            tts_language: "en".to_string(),

            sounds_dir: "assets/sounds".into(),

            dev_user_id: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_values() {
        let config = Config {
            idle_disconnect: Duration::from_millis(10),
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            idle_disconnect: Duration::from_secs(48 * 60 * 60),
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            sound_volume: 3.0,
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            tts_language: "  ".to_string(),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn application_id_must_be_set() {
        assert!(Config::default().discord_application_id().is_err());

        let config = Config {
            application_id: 42,
            ..Config::default()
        };
        assert_eq!(config.discord_application_id().unwrap(), ApplicationId::new(42));
    }

    #[test]
    fn summary_hides_the_token() {
        let config = Config {
            discord_token: "secret-token".to_string(),
            application_id: 42,
            ..Config::default()
        };

        let summary = config.summary();
        assert!(!summary.contains("secret-token"));
        assert!(summary.contains("App ID 42"));
        assert!(summary.contains("30m"));
    }
}
