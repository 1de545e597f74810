//! # Observability & Tracing
//!
//! The framework logs through the `tracing` macros with structured fields; only the
//! binary installs a subscriber, with [`setup_tracing`].
//!
//! ## What Gets Traced
//!
//! - **Registration**: `Kind registered` per kind, `Schema manager finalized` once (`info`)
//! - **Field trees**: one `Field tree built` per described type (`debug`)
//! - **Constraint tags**: tags that yield no validator, e.g. a lone `min` (`warn`)
//! - **Requests**: every request runs in a `request` span with `method` and `path`;
//!   path parsing and the final status are logged at `debug`, failures at `warn`
//!
//! ## Usage
//!
//! ```bash
//! # Registration and request failures
//! RUST_LOG=info cargo run
//!
//! # Path parsing, field trees and response statuses as well
//! RUST_LOG=debug cargo run
//!
//! # Only the framework
//! RUST_LOG=resource_framework=debug cargo run
//! ```
//!
//! With `RUST_LOG=info` a failing create looks like:
//!
//! ```text
//! INFO Kind registered kind=cluster version=zdns.cloud.example/example/v1 parents=[]
//! WARN request: Request failed code=MissingRequired error="field name is required" method=POST path=/apis/zdns.cloud.example/example/v1/clusters
//! ```

/// Installs a compact `fmt` subscriber filtered by `RUST_LOG`.
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();
}
