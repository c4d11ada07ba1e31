//! Typed in-process event distribution

pub mod bus;
