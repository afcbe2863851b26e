pub mod app;
pub mod error;
pub mod forwarder;
pub mod routes;
pub mod state;
