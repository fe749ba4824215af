pub mod error;
pub mod features;
pub mod output;
pub mod sample_name;
pub mod utils;
