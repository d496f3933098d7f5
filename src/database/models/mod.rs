pub mod artifact;
pub mod document;
pub mod forum;
pub mod notification;
pub mod quiz;
pub mod site;
pub mod translation;
pub mod user;
