//! Kitchen worker runtime

pub mod worker;

pub use worker::KitchenWorker;
