//! labup - learning-lab environment bootstrapper library
//!
//! This library provides the core functionality for bringing a local
//! database learning-lab environment into a ready state:
//! - Python runtime selection (python3 with a python fallback)
//! - Virtual environment creation and reuse
//! - requirements.txt reconciliation (install only what is missing)
//! - Container service readiness (docker compose / docker-compose)

pub mod bootstrap;
pub mod cli;
pub mod compose;
pub mod domain;
pub mod error;
pub mod exec;
pub mod output;
pub mod progress;
pub mod runtime;
