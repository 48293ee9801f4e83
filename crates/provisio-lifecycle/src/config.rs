/// Tunables for the lifecycle services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleConfig {
    /// Page size used by List when the caller gives none.
    pub default_page_size: u32,

    /// Largest page size List accepts.
    pub max_page_size: u32,

    /// Number of random bytes in a newly issued client secret.
    pub client_secret_byte_length: usize,

    /// How many identifiers Create draws before giving up on a collision.
    pub id_generation_attempts: u32,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            default_page_size: 20,
            max_page_size: 100,
            client_secret_byte_length: 72,
            id_generation_attempts: 8,
        }
    }
}

impl LifecycleConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_reader(|key| std::env::var(key))
    }

    /// Load configuration from a custom variable reader.
    ///
    /// Unset variables take their defaults; set but unparsable ones are errors.
    pub fn from_reader<F>(reader: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Result<String, std::env::VarError>,
    {
        let defaults = Self::default();

        let default_page_size =
            read_positive(&reader, "PROVISIO_DEFAULT_PAGE_SIZE", defaults.default_page_size)?;
        let max_page_size =
            read_positive(&reader, "PROVISIO_MAX_PAGE_SIZE", defaults.max_page_size)?;
        let client_secret_byte_length = read_positive(
            &reader,
            "PROVISIO_CLIENT_SECRET_BYTE_LENGTH",
            defaults.client_secret_byte_length,
        )?;
        let id_generation_attempts = read_positive(
            &reader,
            "PROVISIO_ID_GENERATION_ATTEMPTS",
            defaults.id_generation_attempts,
        )?;

        if default_page_size > max_page_size {
            return Err(ConfigError::InvalidValue(
                "PROVISIO_DEFAULT_PAGE_SIZE".into(),
                format!("must not exceed PROVISIO_MAX_PAGE_SIZE ({max_page_size})"),
            ));
        }

        Ok(Self {
            default_page_size,
            max_page_size,
            client_secret_byte_length,
            id_generation_attempts,
        })
    }
}

fn read_positive<F, T>(reader: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
    T: std::str::FromStr + PartialOrd + Default,
    T::Err: std::fmt::Display,
{
    let Ok(raw) = reader(key) else {
        return Ok(default);
    };
    let value = raw
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidValue(key.into(), e.to_string()))?;
    if value <= T::default() {
        return Err(ConfigError::InvalidValue(
            key.into(),
            "must be greater than zero".into(),
        ));
    }
    Ok(value)
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {0}: {1}")]
    InvalidValue(String, String),
}
