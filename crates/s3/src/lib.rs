//! bk-s3: HTTP transport and credential providers for bucketkit
//!
//! This crate provides the network side of the `bk-core` seams:
//! a reqwest transport that signs requests with AWS SigV4, credential
//! providers for the environment and the AWS default chain, and
//! `connect` to build a facade from a profile.

pub mod client;
pub mod credentials;
pub mod signer;
pub mod transport;

pub use client::connect;
pub use credentials::{EnvCredentials, SdkCredentials};
pub use signer::Signer;
pub use transport::{Addressing, HttpTransport};
