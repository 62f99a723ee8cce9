//! Configuration for the looper
//!
//! - Generic YAML loading/saving
//! - [`LooperConfig`]: buffer size, undo depth, starting tempo and quantization
//!
//! # Usage
//!
//! ```ignore
//! use looper_core::config::{load_config, save_config, LooperConfig};
//!
//! let config: LooperConfig = load_config(&config_path);
//! let looper = Looper::from_config(&config)?;
//!
//! save_config(&config, &config_path)?;
//! ```

mod io;
mod looper;

pub use io::{load_config, read_yaml, save_config};
pub use looper::{LooperConfig, QuantizeConfig, TimeSignatureConfig};
