pub mod api;
pub mod case;
pub mod chat;
