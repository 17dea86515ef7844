pub mod clean;
pub mod config;
pub mod extract;
pub mod frame;
pub mod load;
pub mod pipeline;
