pub mod config_ops;
pub mod replay_ops;
pub mod segment_ops;
