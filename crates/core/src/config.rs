use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::SecretString;
use serde::Deserialize;
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub discord: DiscordConfig,
    pub forum: ForumConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DiscordConfig {
    pub bot_token: SecretString,
    pub application_id: Option<String>,
}

#[derive(Clone, Debug)]
pub struct ForumConfig {
    pub forum_channel_id: String,
    pub announce_channel_id: String,
    pub debounce_secs: u64,
    pub cooldown_secs: u64,
    pub announce_delay_secs: u64,
    pub tags: TagsConfig,
}

/// Tag roles are optional per deployment: a role left unconfigured is
/// simply never matched against a thread's applied tags.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct TagsConfig {
    pub campaign: Option<TagRole>,
    pub server_campaign: Option<TagRole>,
    pub oneshot: Option<TagRole>,
    pub adventure: Option<TagRole>,
    pub looking_for_players: Option<TagRole>,
    pub active: Option<TagRole>,
    pub inactive: Option<TagRole>,
    pub temporarily_inactive: Option<TagRole>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct TagRole {
    pub id: String,
    #[serde(default)]
    pub emoji: Option<String>,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            discord: DiscordConfig { bot_token: String::new().into(), application_id: None },
            forum: ForumConfig {
                forum_channel_id: String::new(),
                announce_channel_id: String::new(),
                debounce_secs: 10,
                cooldown_secs: 600,
                announce_delay_secs: 3,
                tags: TagsConfig::default(),
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("herald.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_lookup(|key| env::var(key).ok())?;
        config.normalize();
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(discord) = patch.discord {
            if let Some(bot_token) = discord.bot_token {
                self.discord.bot_token = bot_token.into();
            }
            if let Some(application_id) = discord.application_id {
                self.discord.application_id = Some(application_id);
            }
        }
        if let Some(forum) = patch.forum {
            if let Some(id) = forum.forum_channel_id {
                self.forum.forum_channel_id = id;
            }
            if let Some(id) = forum.announce_channel_id {
                self.forum.announce_channel_id = id;
            }
            if let Some(secs) = forum.debounce_secs {
                self.forum.debounce_secs = secs;
            }
            if let Some(secs) = forum.cooldown_secs {
                self.forum.cooldown_secs = secs;
            }
            if let Some(secs) = forum.announce_delay_secs {
                self.forum.announce_delay_secs = secs;
            }
            if let Some(tags) = forum.tags {
                self.forum.tags = tags;
            }
        }
        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    /// Reads `HERALD_*` overrides through the supplied lookup so tests can
    /// substitute a map instead of mutating process environment.
    fn apply_env_lookup<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup("HERALD_DISCORD_BOT_TOKEN") {
            self.discord.bot_token = token.into();
        }
        if let Some(id) = lookup("HERALD_DISCORD_APPLICATION_ID") {
            self.discord.application_id = Some(id);
        }
        if let Some(id) = lookup("HERALD_FORUM_CHANNEL_ID") {
            self.forum.forum_channel_id = id;
        }
        if let Some(id) = lookup("HERALD_ANNOUNCE_CHANNEL_ID") {
            self.forum.announce_channel_id = id;
        }
        if let Some(secs) = lookup("HERALD_DEBOUNCE_SECS") {
            self.forum.debounce_secs = parse_secs("HERALD_DEBOUNCE_SECS", &secs)?;
        }
        if let Some(secs) = lookup("HERALD_COOLDOWN_SECS") {
            self.forum.cooldown_secs = parse_secs("HERALD_COOLDOWN_SECS", &secs)?;
        }
        if let Some(secs) = lookup("HERALD_ANNOUNCE_DELAY_SECS") {
            self.forum.announce_delay_secs = parse_secs("HERALD_ANNOUNCE_DELAY_SECS", &secs)?;
        }
        if let Some(level) = lookup("HERALD_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("HERALD_LOG_FORMAT") {
            self.logging.format = format.parse()?;
        }

        let tags = &mut self.forum.tags;
        override_tag_id(&mut tags.campaign, lookup("HERALD_TAG_CAMPAIGN_ID"));
        override_tag_id(&mut tags.server_campaign, lookup("HERALD_TAG_SERVER_CAMPAIGN_ID"));
        override_tag_id(&mut tags.oneshot, lookup("HERALD_TAG_ONESHOT_ID"));
        override_tag_id(&mut tags.adventure, lookup("HERALD_TAG_ADVENTURE_ID"));
        override_tag_id(&mut tags.looking_for_players, lookup("HERALD_TAG_LOOKING_FOR_PLAYERS_ID"));
        override_tag_id(&mut tags.active, lookup("HERALD_TAG_ACTIVE_ID"));
        override_tag_id(&mut tags.inactive, lookup("HERALD_TAG_INACTIVE_ID"));
        override_tag_id(
            &mut tags.temporarily_inactive,
            lookup("HERALD_TAG_TEMPORARILY_INACTIVE_ID"),
        );

        Ok(())
    }

    /// A role with an empty id behaves exactly like an absent role.
    fn normalize(&mut self) {
        let tags = &mut self.forum.tags;
        for role in [
            &mut tags.campaign,
            &mut tags.server_campaign,
            &mut tags.oneshot,
            &mut tags.adventure,
            &mut tags.looking_for_players,
            &mut tags.active,
            &mut tags.inactive,
            &mut tags.temporarily_inactive,
        ] {
            if role.as_ref().is_some_and(|r| r.id.trim().is_empty()) {
                *role = None;
            }
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        use secrecy::ExposeSecret;

        if self.discord.bot_token.expose_secret().trim().is_empty() {
            return Err(ConfigError::Validation(
                "discord.bot_token must be set before the bot can start".to_string(),
            ));
        }
        if self.forum.forum_channel_id.trim().is_empty() {
            return Err(ConfigError::Validation(
                "forum.forum_channel_id must be set".to_string(),
            ));
        }
        if self.forum.announce_channel_id.trim().is_empty() {
            return Err(ConfigError::Validation(
                "forum.announce_channel_id must be set".to_string(),
            ));
        }
        if self.forum.debounce_secs == 0 {
            return Err(ConfigError::Validation(
                "forum.debounce_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

fn override_tag_id(role: &mut Option<TagRole>, value: Option<String>) {
    let Some(id) = value else { return };
    match role {
        Some(existing) => existing.id = id,
        None => *role = Some(TagRole { id, emoji: None }),
    }
}

fn parse_secs(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    match explicit {
        Some(path) if path.exists() => Some(path.to_path_buf()),
        Some(_) => None,
        None => {
            let default = PathBuf::from("herald.toml");
            default.exists().then_some(default)
        }
    }
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;
    toml::from_str(&raw)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    discord: Option<DiscordPatch>,
    forum: Option<ForumPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DiscordPatch {
    bot_token: Option<String>,
    application_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ForumPatch {
    forum_channel_id: Option<String>,
    announce_channel_id: Option<String>,
    debounce_secs: Option<u64>,
    cooldown_secs: Option<u64>,
    announce_delay_secs: Option<u64>,
    tags: Option<TagsConfig>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    #[serde(default, deserialize_with = "deserialize_log_format")]
    format: Option<LogFormat>,
}

fn deserialize_log_format<'de, D>(deserializer: D) -> Result<Option<LogFormat>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;

    let raw: Option<String> = Option::deserialize(deserializer)?;
    raw.map(|value| value.parse().map_err(D::Error::custom)).transpose()
}
