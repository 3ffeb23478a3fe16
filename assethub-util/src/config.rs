use std::path::PathBuf;

use serde::Serialize;
use serde::de::DeserializeOwned;

/// A value that lives as a JSON document in the config [`Store`](crate::store::Store)
pub trait StoredConfig
where
    Self: Serialize,
    Self: DeserializeOwned,
{
    fn kind() -> &'static str;

    /// Document name, excluding the extension.
    ///
    /// Configs that may exist once per identity should override this to
    /// include something unique to that identity.
    fn name(&self) -> String {
        Self::kind().to_owned()
    }
}

/// Directory for persisted device configuration.
///
/// Resolves to `$XDG_CONFIG_HOME/assethub` or `~/.config/assethub` when the
/// platform has no config dir.
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
        .unwrap_or_else(|| PathBuf::from(".config"))
        .join(env!("ASSETHUB_PKG_NAME"))
}
