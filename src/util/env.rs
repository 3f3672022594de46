//! Secrets read from the process environment.
//!
//! A `.env` file in the working directory is honoured through [`dotenvy`]; variables are then
//! deserialized straight into [`Env`], with field names mapped to `SCREAMING_SNAKE_CASE`.

use serde::Deserialize;
use serde::de::value::MapDeserializer;
use thiserror::Error;

pub const TOKEN_VAR: &str = "TELEGRAM_BOT_TOKEN";

#[derive(Clone, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct Env {
    pub telegram_bot_token: String,
}

// the token is the only thing in here and it must never reach the logs
impl std::fmt::Debug for Env {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Env")
            .field("telegram_bot_token", &"[REDACTED]")
            .finish()
    }
}

/// Loads `.env` into the process environment, if there is one.
///
/// Must run before anything else reads the environment (including `clap`'s `env` fallbacks).
pub fn load_dotenv() -> EnvResult<()> {
    match dotenvy::dotenv() {
        Ok(_) => Ok(()),
        Err(e) if e.not_found() => Ok(()),
        Err(e) => Err(EnvErr::Dotenvy(e)),
    }
}

impl Env {
    pub fn new() -> EnvResult<Self> {
        Self::from_vars(std::env::vars())
    }

    /// Builds the environment from an arbitrary list of `(name, value)` pairs.
    pub fn from_vars<Iter>(vars: Iter) -> EnvResult<Self>
    where
        Iter: IntoIterator<Item = (String, String)>,
    {
        let deserializer: MapDeserializer<_, serde::de::value::Error> =
            MapDeserializer::new(vars.into_iter());
        let env = Env::deserialize(deserializer)?;

        if env.telegram_bot_token.trim().is_empty() {
            return Err(EnvErr::EmptyToken);
        }

        Ok(env)
    }
}

pub type EnvResult<T> = core::result::Result<T, EnvErr>;

#[derive(Debug, Error)]
pub enum EnvErr {
    #[error(transparent)]
    Dotenvy(#[from] dotenvy::Error),

    #[error("env deserialization error: {0}")]
    Deserialize(#[from] serde::de::value::Error),

    #[error("{} is set but empty", TOKEN_VAR)]
    EmptyToken,
}

#[cfg(test)]
mod test {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_reads_token() {
        let env = Env::from_vars(vars(&[
            ("HOME", "/root"),
            ("TELEGRAM_BOT_TOKEN", "123:abc"),
        ]))
        .unwrap();

        assert_eq!(env.telegram_bot_token, "123:abc");
    }

    #[test]
    fn test_missing_token_is_an_error() {
        let err = Env::from_vars(vars(&[("HOME", "/root")])).unwrap_err();
        assert!(matches!(err, EnvErr::Deserialize(_)));
        assert!(err.to_string().contains(TOKEN_VAR));
    }

    #[test]
    fn test_empty_token_is_an_error() {
        let err = Env::from_vars(vars(&[("TELEGRAM_BOT_TOKEN", "  ")])).unwrap_err();
        assert!(matches!(err, EnvErr::EmptyToken));
    }

    #[test]
    fn test_debug_hides_token() {
        let env = Env::from_vars(vars(&[("TELEGRAM_BOT_TOKEN", "123:secret")])).unwrap();
        assert!(!format!("{env:?}").contains("secret"));
    }
}
