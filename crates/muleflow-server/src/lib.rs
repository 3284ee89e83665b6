//! # Muleflow Server
//!
//! HTTP transport and result store around the analysis engine:
//! - `POST /api/v1/analyze` uploads a CSV batch
//! - `GET /api/v1/analysis/{id}` polls status / fetches the result
//! - `GET /api/v1/analysis/{id}/download` serves the forensic report
//! - `GET /api/v1/analysis/{id}/graph` serves visualization data
//! - `GET /health`

#![warn(missing_docs)]

pub mod api;
pub mod store;
