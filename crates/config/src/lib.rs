// Configuration loading

pub mod settings;

pub use settings::{
    ConfigError, NormalizerSettings, Settings, StrategyParams, TrendSettings, ValidationSettings,
};
