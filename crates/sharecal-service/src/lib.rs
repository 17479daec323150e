pub mod account;
pub mod auth;
pub mod calendar;
pub mod error;
pub mod event;
pub mod mail;
pub mod social;
