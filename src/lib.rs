#![warn(clippy::all, rust_2018_idioms)]

mod app;
pub mod config;
pub mod gui;

pub use app::App;
pub use config::{Args, Config};
