//! TCP listener

pub mod listener;
