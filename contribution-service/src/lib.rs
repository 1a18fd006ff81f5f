pub mod config;
pub mod dtos;
pub mod handlers;
pub mod models;
pub mod observers;
pub mod pipeline;
pub mod services;
pub mod startup;
