pub mod account;
pub mod auth;
pub mod cart;
pub mod cart_store;
pub mod catalog;
pub mod config;
pub mod content;
pub mod wishlist;
