//! The `config` module loads [`Settings`] from `config/default.*`, a `.env`
//! file and `FABRIC_*` environment variables, in increasing priority.
//!
//! Nested keys use a double underscore, e.g. `FABRIC_BROKER__HOST` or
//! `FABRIC_FABRIC__NODENAME`, since several keys contain `_` themselves.

mod settings;

use config::{Config, ConfigError, Environment, File};

use settings::PartialSettings;

pub use settings::{
    BrokerSettings, DeviceSettings, FabricSettings, RuntimeSettings, Settings,
    generated_client_id,
};


/// Loads the configuration from the default file and environment variables
/// and merges it over [`Settings::default`].
pub fn load_config() -> Result<Settings, ConfigError> {
    dotenvy::dotenv().ok();

    let builder = Config::builder()
        .add_source(File::with_name("config/default").required(false))
        .add_source(
            Environment::with_prefix("FABRIC")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

    let config = builder.build()?;

    // Try to deserialize what is available
    let partial: PartialSettings = config.try_deserialize()?;

    Ok(partial.merge(Settings::default()))
}
