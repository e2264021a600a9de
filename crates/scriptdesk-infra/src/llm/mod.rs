//! Response generator implementations.
//!
//! Concrete implementations of the [`ResponseGenerator`] trait defined in
//! `scriptdesk-core`, plus [`build_generator`], which picks one from the
//! `[generator]` config section.
//!
//! [`ResponseGenerator`]: scriptdesk_core::chat::generator::ResponseGenerator

pub mod echo;
pub mod gemini;

use secrecy::SecretString;

use scriptdesk_core::chat::box_generator::BoxResponseGenerator;
use scriptdesk_types::config::GeneratorConfig;
use scriptdesk_types::error::{ConfigError, GenerationError};

use self::echo::EchoGenerator;
use self::gemini::GeminiGenerator;

/// Create a [`BoxResponseGenerator`] from a [`GeneratorConfig`].
///
/// The Gemini key is read from the environment variable named by
/// `api_key_env`.
///
/// # Errors
///
/// Unknown provider names, or a Gemini config whose key variable is unset
/// or empty.
pub fn build_generator(config: &GeneratorConfig) -> Result<BoxResponseGenerator, ConfigError> {
    match config.provider.to_lowercase().as_str() {
        "gemini" => {
            let key = std::env::var(&config.api_key_env)
                .ok()
                .filter(|k| !k.trim().is_empty())
                .ok_or_else(|| GenerationError::MissingApiKey(config.api_key_env.clone()))?;
            let mut generator = GeminiGenerator::new(SecretString::from(key), config.model.clone())?;
            if let Some(base_url) = &config.base_url {
                generator = generator.with_base_url(base_url.as_str());
            }
            tracing::debug!(model = %config.model, "using gemini generator");
            Ok(BoxResponseGenerator::new(generator))
        }
        "echo" => Ok(BoxResponseGenerator::new(EchoGenerator)),
        other => Err(ConfigError::UnknownProvider(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scriptdesk_core::chat::generator::ResponseGenerator;

    #[tokio::test]
    async fn test_build_echo_generator() {
        let config = GeneratorConfig {
            provider: "Echo".to_string(),
            ..GeneratorConfig::default()
        };
        let generator = build_generator(&config).unwrap();
        assert_eq!(generator.name(), "echo");
        assert_eq!(generator.generate("same").await.unwrap(), "same");
    }

    #[test]
    fn test_unknown_provider() {
        let config = GeneratorConfig {
            provider: "mystery".to_string(),
            ..GeneratorConfig::default()
        };
        assert!(matches!(
            build_generator(&config),
            Err(ConfigError::UnknownProvider(name)) if name == "mystery"
        ));
    }

    #[test]
    fn test_gemini_without_key() {
        let config = GeneratorConfig {
            api_key_env: "SCRIPTDESK_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
            ..GeneratorConfig::default()
        };
        assert!(matches!(
            build_generator(&config),
            Err(ConfigError::Generation(GenerationError::MissingApiKey(_)))
        ));
    }
}
