pub mod config;
pub mod display;
pub mod schedule;
pub mod seed;
pub mod web;
