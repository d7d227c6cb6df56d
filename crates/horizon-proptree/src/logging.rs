//! Tracing targets for the presentation engines.
//!
//! Use these with `tracing` directives to filter logs by subsystem, for
//! example `RUST_LOG=horizon_proptree::table=debug`.

/// Target names for log filtering.
pub mod targets {
    /// Row flattening.
    pub const ROWS: &str = "horizon_proptree::rows";
    /// Column layout, hit testing, selection and painting.
    pub const TABLE: &str = "horizon_proptree::table";
    /// Tree click policy.
    pub const TREE: &str = "horizon_proptree::tree";
}
