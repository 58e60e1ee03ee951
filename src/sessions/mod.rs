//! HTTP session implementations

pub mod rest;

pub use rest::ReqwestSession;
