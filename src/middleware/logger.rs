//! Emission logging.
//!
//! Built on [`Bus::tap`]: the logged handle shares the instance and its
//! listeners with the input, only emits made through it are recorded.
//! Events go to `tracing` under the `spark_bus::emit` target at INFO.

use std::fmt::Debug;

use tracing::info;

use crate::bus::Bus;

/// A handle to `bus` that logs every emission before delivering it.
///
/// With `enabled` false the input handle is returned unchanged.
pub fn with_logger<P: Debug + 'static>(bus: Bus<P>, enabled: bool) -> Bus<P> {
    if !enabled {
        return bus;
    }
    bus.tap(|id, key, payload| {
        info!(target: "spark_bus::emit", bus = %id, event = %key, payload = ?payload, "emit");
    })
}
