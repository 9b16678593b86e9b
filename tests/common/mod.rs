#![allow(dead_code)]

pub mod database;
pub mod fakes;

pub use database::TestDb;
