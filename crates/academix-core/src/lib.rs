//! Academix Core - Domain logic and business rules
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain types** - `ApiError`, `StoredSession`, `UserProfile`, course DTOs
//! - **Port definitions** - Traits for adapters: `SessionStore`, `Clock`
//! - **Configuration** - Typed client configuration with YAML loading
//!
//! # Architecture
//!
//! This crate follows the hexagonal (ports & adapters) architecture pattern.
//! The domain module contains pure types with no I/O dependencies. Ports
//! define trait interfaces that the adapter crate (`academix-client`)
//! implements or consumes.

pub mod config;
pub mod domain;
pub mod ports;
