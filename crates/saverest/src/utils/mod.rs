pub mod logger;
pub mod nls;
