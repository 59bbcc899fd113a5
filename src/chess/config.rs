use super::error::ConfigError;

pub const DEFAULT_COLLECTION_CEILING: usize = 25;
pub const DEFAULT_DISPLAY_CEILING: usize = 3;

/// The two knobs of a batch run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunConfig {
    /// Most examples one detector may collect over the whole corpus.
    pub collection_ceiling: usize,
    /// Most examples printed per evaluator.
    pub display_ceiling: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            collection_ceiling: DEFAULT_COLLECTION_CEILING,
            display_ceiling: DEFAULT_DISPLAY_CEILING,
        }
    }
}

impl RunConfig {
    pub fn new(collection_ceiling: usize, display_ceiling: usize) -> Result<Self, ConfigError> {
        let config = Self {
            collection_ceiling,
            display_ceiling,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.collection_ceiling == 0 {
            return Err(ConfigError::ZeroCollectionCeiling);
        }
        if self.display_ceiling == 0 {
            return Err(ConfigError::ZeroDisplayCeiling);
        }
        if self.display_ceiling >= self.collection_ceiling {
            return Err(ConfigError::DisplayNotBelowCollection {
                display: self.display_ceiling,
                collection: self.collection_ceiling,
            });
        }
        Ok(())
    }
}
