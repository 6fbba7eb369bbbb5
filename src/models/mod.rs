pub mod application;
pub mod contact_message;
pub mod job;
pub mod principal;
