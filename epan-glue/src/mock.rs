//! A [`Host`] that records what it is asked to do. *For tests only.*

use std::cell::{Cell, RefCell};
use std::ffi::{c_int, CStr};

use crate::host::{
    Column, DissectorHandle, DissectorKey, Host, PacketInfo, PluginDescriptor, ProtoItem,
    ProtoTree, ProtocolId, Tvb,
};

/// One host call. Pointers are kept as addresses so calls can be compared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    RegisterPlugin {
        plugin: usize,
        protoinfo: Option<usize>,
        handoff: Option<usize>,
    },
    RegisterProtocol {
        name: String,
        short_name: String,
        filter_name: String,
    },
    RegisterDissector {
        name: String,
        proto: ProtocolId,
        key: usize,
    },
    DissectorAddString {
        table: String,
        pattern: String,
        handle: usize,
    },
    AddProtocolFormat {
        tree: usize,
        hf_index: c_int,
        tvb: usize,
        start: c_int,
        length: c_int,
        format: String,
        arg: String,
    },
    SetColumn {
        column: Column,
        text: String,
    },
    ClearColumn {
        column: Column,
    },
}

#[derive(Debug, Default)]
pub struct MockHost {
    calls: RefCell<Vec<Call>>,
    next_proto: Cell<c_int>,
    next_handle: Cell<usize>,
    packet: Vec<u8>,
}

impl MockHost {
    /// A host whose packet buffers all contain `bytes`.
    pub fn with_packet(bytes: &[u8]) -> Self {
        Self {
            packet: bytes.to_vec(),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    /// Keys of every dissector registered so far, in order.
    pub fn registered_keys(&self) -> Vec<DissectorKey> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|call| match call {
                Call::RegisterDissector { key, .. } => {
                    Some(DissectorKey::new(*key as *const std::ffi::c_char))
                }
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }
}

fn lossy(s: &CStr) -> String {
    s.to_string_lossy().into_owned()
}

impl Host for MockHost {
    fn register_plugin(&self, plugin: &'static PluginDescriptor) {
        self.record(Call::RegisterPlugin {
            plugin: plugin as *const _ as usize,
            protoinfo: plugin.register_protoinfo.map(|f| f as usize),
            handoff: plugin.register_handoff.map(|f| f as usize),
        });
    }

    fn register_protocol(
        &self,
        name: &'static CStr,
        short_name: &'static CStr,
        filter_name: &'static CStr,
    ) -> ProtocolId {
        self.record(Call::RegisterProtocol {
            name: lossy(name),
            short_name: lossy(short_name),
            filter_name: lossy(filter_name),
        });
        let id = self.next_proto.get() + 1;
        self.next_proto.set(id);
        ProtocolId(id)
    }

    fn register_dissector(
        &self,
        name: &'static CStr,
        proto: ProtocolId,
        key: DissectorKey,
    ) -> DissectorHandle {
        self.record(Call::RegisterDissector {
            name: lossy(name),
            proto,
            key: key.as_ptr() as usize,
        });
        let handle = self.next_handle.get() + 0x100;
        self.next_handle.set(handle);
        DissectorHandle::new(handle as *const std::ffi::c_void)
    }

    fn dissector_add_string(&self, table: &CStr, pattern: &CStr, handle: DissectorHandle) {
        self.record(Call::DissectorAddString {
            table: lossy(table),
            pattern: lossy(pattern),
            handle: handle.as_ptr() as usize,
        });
    }

    fn add_protocol_format(
        &self,
        tree: *mut ProtoTree,
        hf_index: c_int,
        tvb: *mut Tvb,
        start: c_int,
        length: c_int,
        format: &CStr,
        arg: &CStr,
    ) -> *mut ProtoItem {
        self.record(Call::AddProtocolFormat {
            tree: tree as usize,
            hf_index,
            tvb: tvb as usize,
            start,
            length,
            format: lossy(format),
            arg: lossy(arg),
        });
        std::ptr::null_mut()
    }

    fn packet_bytes(&self, _tvb: *mut Tvb) -> Vec<u8> {
        self.packet.clone()
    }

    fn set_column(&self, _pinfo: *mut PacketInfo, column: Column, text: &CStr) {
        self.record(Call::SetColumn {
            column,
            text: lossy(text),
        });
    }

    fn clear_column(&self, _pinfo: *mut PacketInfo, column: Column) {
        self.record(Call::ClearColumn { column });
    }
}
