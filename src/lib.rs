pub mod audit;
pub mod config;
pub mod db;
pub mod dto;
pub mod entity;
pub mod error;
pub mod extract;
pub mod media;
pub mod middleware;
pub mod models;
pub mod phone;
pub mod response;
pub mod routes;
pub mod services;
pub mod sms;
pub mod state;
pub mod verification;
