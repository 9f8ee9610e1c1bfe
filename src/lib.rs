pub mod config;
pub mod db;
pub mod entities;
pub mod services;
pub mod validation;

pub use config::Config;
pub use db::Store;
pub use services::{
    AccountError, AccountInfo, AccountService, NewAccount, ProfileUpdate, SeaOrmAccountService,
};

use tracing_subscriber::EnvFilter;

/// Install the tracing subscriber the way the embedding process expects:
/// `RUST_LOG` wins, otherwise the configured log level applies.
pub fn init_tracing(config: &Config) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
