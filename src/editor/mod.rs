pub mod controller;
pub mod preview;
pub mod session;
pub mod store;
