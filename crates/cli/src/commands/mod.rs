pub mod chat;
pub mod onboard;
pub mod submit;
pub mod tools;
