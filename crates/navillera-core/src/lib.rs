pub mod config;
pub mod logging;

pub mod batch;
pub mod checksum;
pub mod control;
pub mod dispatch;
pub mod options;
pub mod tool;
pub mod url_list;
