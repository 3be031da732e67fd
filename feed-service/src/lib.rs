pub mod app;
pub mod config;
pub mod feed_parse;
pub mod fetch;
pub mod logger;
pub mod widgets;
