//! S3 implementation of the object-store capability.

mod client;
mod list;
mod store;

pub use client::{create_s3_client, S3Config};
pub use store::S3ObjectStore;
