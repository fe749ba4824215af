pub mod compile;
pub mod core;
pub mod presence;
pub mod rename;
