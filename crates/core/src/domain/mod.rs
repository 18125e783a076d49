pub mod command;
pub mod member;
pub mod mention;
pub mod note;
