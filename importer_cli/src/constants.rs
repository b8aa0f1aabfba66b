pub const PROGRAM_NAME: &str = "product-import";

// The current version of executable
pub const CURRENT_VERSION: &str = env!("CARGO_PKG_VERSION");
