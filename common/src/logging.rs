//! Logging targets.
//!
//! Every message goes through `tracing`; the front end decides how it looks.
//! `success!` is an `info` event on its own target so the formatter can give it
//! a distinct marker.

#[doc(hidden)]
pub use tracing;

pub const SUCCESS_TARGET: &str = "nfusion::success";
pub const PRINT_TARGET: &str = "nfusion::print";

#[macro_export]
macro_rules! success {
    ($($arg:tt)*) => {
        $crate::logging::tracing::info!(target: "nfusion::success", $($arg)*)
    };
}
