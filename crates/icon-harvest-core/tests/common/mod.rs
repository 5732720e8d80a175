#![allow(dead_code)]

pub mod site_server;
pub mod zips;
