pub mod credentials;
pub mod device;
pub mod time;
pub mod token;
