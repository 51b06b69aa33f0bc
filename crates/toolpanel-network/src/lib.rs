//! Network layer for the tool-checkout station.
//!
//! This crate posts resolved entry sessions to the remote authorization
//! service and classifies its answer:
//!
//! - [`AuthorizationRequest`]: the JSON body of a request.
//! - [`AuthTransport`]: the seam between the station and the wire.
//! - [`AuthClient`]: the HTTP implementation of that seam.
//! - [`AuthOutcome`]: what a response status means for the station.
//!
//! The [`mock`] module provides a scripted transport for tests and for the
//! simulator.

pub mod client;
pub mod mock;

pub use client::{
    AuthClient, AuthClientConfig, AuthClientError, AuthOutcome, AuthTransport,
    AuthorizationRequest,
};
