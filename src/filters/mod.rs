//! Stock command filters.
//!
//! - [`LoggingFilter`]: logs each command's outcome (global)
//! - [`MetricsFilter`]: Prometheus counters and latency (global)
//! - [`RequireRegistration`]: gates commands behind NICK registration

mod logging;
mod metrics;
mod registration;

pub use logging::LoggingFilter;
pub use metrics::MetricsFilter;
pub use registration::RequireRegistration;
