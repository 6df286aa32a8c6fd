//! External collaborators for the registration API.

pub mod envelope;
mod transport;

pub use transport::{ApiResponse, HttpTransport, Transport};
