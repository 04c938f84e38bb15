pub mod completion;
pub mod profile;
