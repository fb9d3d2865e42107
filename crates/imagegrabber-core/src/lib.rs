pub mod config;
pub mod logging;

pub mod download;
pub mod extract;
pub mod fetch;
pub mod gate;
pub mod report;
pub mod retry;
pub mod run;
pub mod storage;
pub mod url_model;
