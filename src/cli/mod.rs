pub mod command;
pub mod convert;
pub mod info;
