//! **epan-glue** is the layer between Wireshark's plugin ABI and dissectors written in Rust.
//!
//! A Wireshark plugin is a dynamic library exporting a handful of symbols. epan-glue provides
//! them, and turns the C callbacks Wireshark makes into calls on ordinary Rust traits:
//!
//! * [`ProtoPlugin`] is asked to register its protocol, and later to hand off (attach its
//!   dissector to dissector tables).
//! * [`Dissector`] is called for each packet routed to it.
//!
//! # Getting started
//!
//! ```ignore
//! // lib.rs of a crate built with crate-type = ["cdylib"]
//! epan_glue::version!("0.0.1", 4, 0);
//! epan_glue::plugin!(ECHO);
//!
//! pub static ECHO: Echo = Echo::new();
//! ```
//!
//! `Echo` implements both traits. In `proto_register` it calls [`register_protocol`] and keeps
//! the returned [`ProtocolId`]; in `proto_reg_handoff` it calls [`create_dissector_handle`] with
//! itself and binds the handle with [`dissector_add_string`].
//!
//! # Features
//!
//! * `epan` links libwireshark through `epan-sys` and enables the [`epan`] module, which
//!   `plugin!` needs. Without it, nothing here requires Wireshark to be installed.
//! * `mock` exposes [`mock::MockHost`] for tests in other crates.
//!
//! # Logging
//!
//! Logging goes through the `log` facade. The first call to [`register_all`] installs an
//! `env_logger` reading `RUST_LOG`, defaulting to `warn`.

mod adapter;
pub mod host;
mod logging;
mod registry;

#[cfg(feature = "epan")]
pub mod epan;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

#[cfg(feature = "epan")]
pub use epan_sys;
#[doc(hidden)]
pub use once_cell;

pub use epan_glue_derive::{plugin, version};

pub use crate::adapter::{add_protocol_display, add_protocol_label, dissect, register};
pub use crate::host::{
    Column, DissectFn, DissectorHandle, DissectorKey, Host, Packet, PluginDescriptor,
    ProtocolId, RegisterFn,
};
pub use crate::registry::{
    call_dissector, create_dissector_handle, dissector_add_string, dissector_name, handoff_all,
    register_all, register_protocol, Dissector, ProtoPlugin,
};
#[doc(hidden)]
pub use crate::registry::catch_panic;

#[cfg(test)]
mod compile_tests {
    #[test]
    fn run_all() {
        let t = trybuild::TestCases::new();

        t.pass("tests/compile/*.rs");
    }
}
