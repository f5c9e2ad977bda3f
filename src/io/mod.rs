pub mod config;

pub use config::ReductionConfig;
