//! Wireshark dissector for the SleepOn SLEEP2GO HST sleep monitor.
//!
//! The device speaks a small framed protocol over the Bluetooth LE Nordic UART service. The
//! dissector attaches to both UART characteristics through the `bluetooth.uuid` table and labels
//! each frame with what it decodes to. Build with `--features epan` to get a loadable plugin.

pub mod dissector;
pub mod frame;

pub use crate::dissector::SleepOn;

epan_glue::version!("0.1.0", 4, 0);

#[cfg(feature = "epan")]
epan_glue::plugin!(SLEEPON);

pub static SLEEPON: SleepOn = SleepOn::new();
