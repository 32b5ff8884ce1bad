use std::ffi::{c_int, CStr, CString};

use epan_glue::{
    add_protocol_label, create_dissector_handle, dissector_add_string, register_protocol, Column,
    Dissector, Host, Packet, ProtoPlugin, ProtocolId,
};
use log::debug;
use once_cell::sync::OnceCell;

use crate::frame::Frame;

pub const PROTO_NAME: &CStr = c"SleepOn SLEEP2GO HST Protocol";
pub const PROTO_SHORT_NAME: &CStr = c"SleepOn";
pub const PROTO_FILTER: &CStr = c"sleepon";

/// Dissector table the Bluetooth dissectors look GATT payloads up in.
pub const UUID_TABLE: &CStr = c"bluetooth.uuid";

/// Nordic UART service TX and RX characteristics (from the client's point of view).
pub const TX_CHARACTERISTIC: &CStr = c"6e400002-b5a3-f393-e0a9-e50e24dcca9e";
pub const RX_CHARACTERISTIC: &CStr = c"6e400003-b5a3-f393-e0a9-e50e24dcca9e";

#[derive(Debug, Default)]
pub struct SleepOn {
    proto: OnceCell<ProtocolId>,
}

impl SleepOn {
    pub const fn new() -> Self {
        SleepOn {
            proto: OnceCell::new(),
        }
    }

    pub fn proto(&self) -> Option<ProtocolId> {
        self.proto.get().copied()
    }
}

impl ProtoPlugin for SleepOn {
    fn proto_register(&'static self, host: &dyn Host) {
        let id = register_protocol(host, PROTO_NAME, PROTO_SHORT_NAME, PROTO_FILTER);
        if self.proto.set(id).is_err() {
            debug!("{PROTO_SHORT_NAME:?} registered more than once, keeping the first id");
        }
    }

    fn proto_reg_handoff(&'static self, host: &dyn Host) {
        let proto = self.proto().unwrap_or(ProtocolId::UNREGISTERED);
        let handle = create_dissector_handle(host, self, proto);
        for uuid in [TX_CHARACTERISTIC, RX_CHARACTERISTIC] {
            dissector_add_string(host, UUID_TABLE, uuid, handle);
        }
    }
}

impl Dissector for SleepOn {
    fn dissect(&self, host: &dyn Host, packet: &Packet) -> c_int {
        let Some(proto) = self.proto() else {
            return 0;
        };

        let bytes = host.packet_bytes(packet.tvb);

        let summary = match Frame::decode(&bytes) {
            Ok(frame) => frame.to_string(),
            Err(e) => {
                debug!("can't decode {} bytes ({bytes:02x?}): {e}", bytes.len());
                format!("Malformed: {e}")
            }
        };

        host.set_column(packet.pinfo, Column::Protocol, PROTO_SHORT_NAME);
        host.clear_column(packet.pinfo, Column::Info);
        if let Ok(info) = CString::new(summary.as_str()) {
            host.set_column(packet.pinfo, Column::Info, &info);
        }

        let label = format!("{}: {summary}", PROTO_NAME.to_string_lossy());
        add_protocol_label(host, packet.tree, proto, packet.tvb, 0, -1, &label);

        consumed(bytes.len())
    }
}

// The host's return type can't hold every buffer length.
fn consumed(len: usize) -> c_int {
    c_int::try_from(len).unwrap_or(c_int::MAX)
}
