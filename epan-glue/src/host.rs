//! The host primitives the glue layer depends on.
//!
//! Everything the plugin asks of Wireshark goes through [`Host`]. The production implementation
//! lives in [`crate::epan`]; tests use [`crate::mock::MockHost`].

use std::ffi::{c_char, c_int, c_void, CStr};
use std::marker::{PhantomData, PhantomPinned};

macro_rules! opaque_type {
    ($($(#[$meta:meta])* $name:ident),+ $(,)?) => {
        $(
            $(#[$meta])*
            #[repr(C)]
            pub struct $name {
                _data: [u8; 0],
                _marker: PhantomData<(*mut u8, PhantomPinned)>,
            }
        )+
    };
}

opaque_type!(
    /// Host owned packet buffer (`tvbuff_t`).
    Tvb,
    /// Host owned packet metadata (`packet_info`).
    PacketInfo,
    /// Host owned protocol tree node (`proto_tree`).
    ProtoTree,
    /// Host owned protocol tree item (`proto_item`).
    ProtoItem,
);

macro_rules! wrap_pointer {
    ($name:ident, $typ:ty) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(*const $typ);
        impl $name {
            pub const fn new(p: *const $typ) -> Self {
                Self(p)
            }
            pub fn as_ptr(&self) -> *const $typ {
                self.0
            }
            pub fn is_null(&self) -> bool {
                self.0.is_null()
            }
        }

        // The pointee is never written through these handles.
        unsafe impl std::marker::Send for $name {}
        unsafe impl std::marker::Sync for $name {}
    };
}

// Unique, never freed. Its address is part of the dissector's name.
wrap_pointer!(DissectorKey, c_char);
// Whatever the host returned from dissector registration.
wrap_pointer!(DissectorHandle, c_void);

impl DissectorKey {
    /// The key as passed through the host's `void *` callback data.
    pub fn as_data(&self) -> *mut c_void {
        self.0 as *mut c_void
    }

    pub fn from_data(data: *mut c_void) -> Self {
        Self(data as *const c_char)
    }
}

/// Signature of a registration callback stored in the [`PluginDescriptor`].
pub type RegisterFn = extern "C" fn();

/// Signature of a dissector entry point that also receives its registration data.
pub type DissectFn = unsafe extern "C" fn(
    *mut Tvb,
    *mut PacketInfo,
    *mut ProtoTree,
    *mut c_void,
    *mut c_void,
) -> c_int;

/// Layout-compatible with Wireshark's `proto_plugin`.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct PluginDescriptor {
    pub register_protoinfo: Option<RegisterFn>,
    pub register_handoff: Option<RegisterFn>,
}

/// A protocol id handed out by the host. `-1` means "not registered".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProtocolId(pub c_int);

impl ProtocolId {
    pub const UNREGISTERED: ProtocolId = ProtocolId(-1);
}

/// Packet list columns the glue knows how to write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Protocol,
    Info,
}

/// Packet data handed to a [`Dissector`](crate::Dissector).
#[derive(Debug, Clone, Copy)]
pub struct Packet {
    pub tvb: *mut Tvb,
    pub pinfo: *mut PacketInfo,
    pub tree: *mut ProtoTree,
    pub data: *mut c_void,
}

pub trait Host {
    /// Hands the descriptor to the host. The host may call through it for the rest of the
    /// process.
    fn register_plugin(&self, plugin: &'static PluginDescriptor);

    fn register_protocol(
        &self,
        name: &'static CStr,
        short_name: &'static CStr,
        filter_name: &'static CStr,
    ) -> ProtocolId;

    /// Registers the host's dissection entry point under `name`, with `key` as callback data.
    fn register_dissector(
        &self,
        name: &'static CStr,
        proto: ProtocolId,
        key: DissectorKey,
    ) -> DissectorHandle;

    fn dissector_add_string(&self, table: &CStr, pattern: &CStr, handle: DissectorHandle);

    /// `proto_tree_add_protocol_format` with a single C string argument.
    #[allow(clippy::too_many_arguments)]
    fn add_protocol_format(
        &self,
        tree: *mut ProtoTree,
        hf_index: c_int,
        tvb: *mut Tvb,
        start: c_int,
        length: c_int,
        format: &CStr,
        arg: &CStr,
    ) -> *mut ProtoItem;

    /// Copies the captured bytes of `tvb`.
    fn packet_bytes(&self, tvb: *mut Tvb) -> Vec<u8>;

    fn set_column(&self, pinfo: *mut PacketInfo, column: Column, text: &CStr);

    fn clear_column(&self, pinfo: *mut PacketInfo, column: Column);
}
