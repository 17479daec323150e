pub mod email;
pub mod nullable;
pub mod username;
