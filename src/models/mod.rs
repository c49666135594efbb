pub mod draft;
pub mod preview;
pub mod status;
pub mod template;
