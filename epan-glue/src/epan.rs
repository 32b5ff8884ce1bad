//! The real host, through `epan-sys`.

use std::ffi::{c_int, c_void, CStr};

use crate::adapter;
use crate::host::{
    Column, DissectorHandle, DissectorKey, Host, PacketInfo, PluginDescriptor, ProtoItem,
    ProtoTree, ProtocolId, Tvb,
};
use crate::registry;

const _: () = assert!(
    std::mem::size_of::<PluginDescriptor>() == std::mem::size_of::<epan_sys::proto_plugin>()
);

/// Wireshark's libwireshark, as linked into the running process.
#[derive(Debug, Default, Clone, Copy)]
pub struct Epan;

/// What Wireshark calls for every packet handed to one of our dissectors. `key` is the data the
/// dissector was registered with.
unsafe extern "C" fn dissect_entry(
    tvb: *mut epan_sys::tvbuff_t,
    pinfo: *mut epan_sys::packet_info,
    tree: *mut epan_sys::proto_tree,
    data: *mut c_void,
    key: *mut c_void,
) -> c_int {
    adapter::dissect(
        call_registered,
        tvb.cast(),
        pinfo.cast(),
        tree.cast(),
        data,
        key,
    )
}

unsafe extern "C" fn call_registered(
    tvb: *mut Tvb,
    pinfo: *mut PacketInfo,
    tree: *mut ProtoTree,
    data: *mut c_void,
    key: *mut c_void,
) -> c_int {
    registry::call_dissector(&Epan, tvb, pinfo, tree, data, key)
}

fn column_id(column: Column) -> c_int {
    match column {
        Column::Protocol => epan_sys::COL_PROTOCOL as c_int,
        Column::Info => epan_sys::COL_INFO as c_int,
    }
}

impl Host for Epan {
    fn register_plugin(&self, plugin: &'static PluginDescriptor) {
        // SAFETY: `PluginDescriptor` is `repr(C)` with the same fields as `proto_plugin`, and
        // lives for the rest of the process.
        unsafe {
            epan_sys::proto_register_plugin(
                plugin as *const PluginDescriptor as *const epan_sys::proto_plugin,
            );
        }
    }

    fn register_protocol(
        &self,
        name: &'static CStr,
        short_name: &'static CStr,
        filter_name: &'static CStr,
    ) -> ProtocolId {
        let id = unsafe {
            epan_sys::proto_register_protocol(
                name.as_ptr(),
                short_name.as_ptr(),
                filter_name.as_ptr(),
            )
        };
        ProtocolId(id)
    }

    fn register_dissector(
        &self,
        name: &'static CStr,
        proto: ProtocolId,
        key: DissectorKey,
    ) -> DissectorHandle {
        let handle = unsafe {
            epan_sys::register_dissector_with_data(
                name.as_ptr(),
                Some(dissect_entry),
                proto.0,
                key.as_data(),
            )
        };
        DissectorHandle::new(handle as *const c_void)
    }

    fn dissector_add_string(&self, table: &CStr, pattern: &CStr, handle: DissectorHandle) {
        unsafe {
            epan_sys::dissector_add_string(
                table.as_ptr(),
                pattern.as_ptr(),
                handle.as_ptr() as epan_sys::dissector_handle_t,
            );
        }
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
        let item = unsafe {
            epan_sys::proto_tree_add_protocol_format(
                tree.cast(),
                hf_index,
                tvb.cast(),
                start,
                length,
                format.as_ptr(),
                arg.as_ptr(),
            )
        };
        item.cast()
    }

    fn packet_bytes(&self, tvb: *mut Tvb) -> Vec<u8> {
        let tvb: *mut epan_sys::tvbuff_t = tvb.cast();
        let len = unsafe { epan_sys::tvb_captured_length(tvb) as usize };
        let mut buf = vec![0u8; len];
        unsafe {
            epan_sys::tvb_memcpy(tvb, buf.as_mut_ptr() as *mut c_void, 0, len);
        }
        buf
    }

    fn set_column(&self, pinfo: *mut PacketInfo, column: Column, text: &CStr) {
        let pinfo: *mut epan_sys::packet_info = pinfo.cast();
        // col_add_str copies, so `text` does not need to outlive the packet.
        unsafe {
            epan_sys::col_add_str((*pinfo).cinfo, column_id(column), text.as_ptr());
        }
    }

    fn clear_column(&self, pinfo: *mut PacketInfo, column: Column) {
        let pinfo: *mut epan_sys::packet_info = pinfo.cast();
        unsafe {
            epan_sys::col_clear((*pinfo).cinfo, column_id(column));
        }
    }
}
