// Domain layer - Core records and rules, no I/O
pub mod changelog;
pub mod ordered_map;
pub mod prediction;
pub mod scatter;
pub mod time;
pub mod timeseries;
pub mod topology;
