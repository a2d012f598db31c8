pub mod catalog;
pub mod requests;
pub mod store;
