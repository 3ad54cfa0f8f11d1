//! Configuration module for the placement controller.
//!
//! This module handles all configuration-related functionality:
//! - Parsing `placectl.yaml` controller settings and scenario files
//! - Environment variable overrides
//! - Validation of settings, snapshots and scenarios

mod parser;
mod spec;
mod validator;

pub use parser::{
    ConfigParser, DEFAULT_CONFIG_FILES, ENV_MAX_HISTORY, ENV_OPERATOR_TIMEOUT_SECS,
    ENV_POLL_INTERVAL_MS, find_config_file,
};
pub use spec::{ControllerConfig, OperatorAction, OperatorRequest, Scenario};
pub use validator::{ConfigValidator, ValidationError, ValidationResult};
