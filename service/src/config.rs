//! Service configuration.

use splitledger_common::MINOR_UNIT_SCALE;

/// Configuration for the ledger service.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Decimal places of the smallest currency unit used when splitting.
    pub minor_unit_scale: u32,
    /// Maximum participants allowed on a single expense.
    pub max_participants: usize,
    /// Maximum length of a settlement note.
    pub max_note_length: usize,
    /// Maximum length of an expense description.
    pub max_description_length: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            minor_unit_scale: MINOR_UNIT_SCALE,
            max_participants: 50,
            max_note_length: 500,
            max_description_length: 200,
        }
    }
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(scale) = std::env::var("SPLITLEDGER_UNIT_SCALE") {
            if let Ok(scale) = scale.parse() {
                config.minor_unit_scale = scale;
            }
        }

        if let Ok(max) = std::env::var("SPLITLEDGER_MAX_PARTICIPANTS") {
            if let Ok(max) = max.parse() {
                config.max_participants = max;
            }
        }

        if let Ok(max) = std::env::var("SPLITLEDGER_MAX_NOTE_LENGTH") {
            if let Ok(max) = max.parse() {
                config.max_note_length = max;
            }
        }

        if let Ok(max) = std::env::var("SPLITLEDGER_MAX_DESCRIPTION_LENGTH") {
            if let Ok(max) = max.parse() {
                config.max_description_length = max;
            }
        }

        config
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.minor_unit_scale > 4 {
            return Err("Unit scale cannot exceed 4 decimal places".to_string());
        }

        if self.max_participants == 0 {
            return Err("Participant limit cannot be 0".to_string());
        }

        if self.max_description_length == 0 {
            return Err("Description length limit cannot be 0".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServiceConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.minor_unit_scale, 2);
    }

    #[test]
    fn test_invalid_config() {
        let mut config = ServiceConfig::default();
        config.max_participants = 0;
        assert!(config.validate().is_err());
    }
}
