pub mod cli;
pub mod config;
pub mod db;
pub mod foods;
pub mod state;
