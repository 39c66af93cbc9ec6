use {crate::event_loop::Priority, serde::Deserialize, thiserror::Error};


#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not parse the export configuration")]
    Parse(#[source] serde_json::Error),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExportConfig {
    /// Priority of the side-channel source relative to the other sources of
    /// the event loop.
    pub channel_priority: Priority,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            channel_priority: Priority::LOW,
        }
    }
}

impl ExportConfig {
    pub fn from_json(s: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(s).map_err(ConfigError::Parse)
    }
}
