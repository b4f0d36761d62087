//! Interactive demo menu for the ghcp chat SDK demo.

pub mod app;
pub mod console;
pub mod demos;
pub mod live;
pub mod prompt;
