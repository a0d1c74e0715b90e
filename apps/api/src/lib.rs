//! Job-hunting experience sharing service for university students.
//!
//! Students sign up with an institutional address, confirm via an emailed
//! link, complete a profile, then read and append shared entry-sheet,
//! coding-test and interview records. Auth and storage live in a hosted
//! backend reached through [`backend::AuthProvider`] and
//! [`backend::RecordStore`].

pub mod backend;
pub mod config;
pub mod errors;
pub mod extract;
pub mod models;
pub mod provisioning;
pub mod records;
pub mod routes;
pub mod session;
pub mod state;
