use std::ffi::{c_int, c_void, CStr, CString};
use std::fmt::Display;

use once_cell::sync::OnceCell;

use crate::host::{
    DissectFn, Host, PacketInfo, PluginDescriptor, ProtoItem, ProtoTree, ProtocolId, RegisterFn,
    Tvb,
};

/// Fills `slot` with a descriptor holding `protoinfo` and `handoff`, and hands it to the host.
///
/// The slot is written at most once, so every call passes the same descriptor.
pub fn register(
    slot: &'static OnceCell<PluginDescriptor>,
    host: &dyn Host,
    protoinfo: RegisterFn,
    handoff: RegisterFn,
) -> &'static PluginDescriptor {
    let plugin = slot.get_or_init(|| PluginDescriptor {
        register_protoinfo: Some(protoinfo),
        register_handoff: Some(handoff),
    });
    host.register_plugin(plugin);
    plugin
}

/// Calls `routine` with the arguments as given and returns what it returns.
///
/// # Safety
///
/// The arguments must satisfy whatever `routine` requires of them.
#[inline]
pub unsafe fn dissect(
    routine: DissectFn,
    tvb: *mut Tvb,
    pinfo: *mut PacketInfo,
    tree: *mut ProtoTree,
    data: *mut c_void,
    key: *mut c_void,
) -> c_int {
    routine(tvb, pinfo, tree, data, key)
}

/// Adds a protocol item labelled with `text`. The text goes through a `"%s"` format, so it is
/// shown verbatim.
pub fn add_protocol_label(
    host: &dyn Host,
    tree: *mut ProtoTree,
    proto: ProtocolId,
    tvb: *mut Tvb,
    start: c_int,
    length: c_int,
    text: &str,
) -> *mut ProtoItem {
    let text = c_string_lossy(text);
    host.add_protocol_format(tree, proto.0, tvb, start, length, c"%s", &text)
}

/// Like [`add_protocol_label`], for anything that implements `Display`.
pub fn add_protocol_display(
    host: &dyn Host,
    tree: *mut ProtoTree,
    proto: ProtocolId,
    tvb: *mut Tvb,
    start: c_int,
    length: c_int,
    value: &impl Display,
) -> *mut ProtoItem {
    add_protocol_label(host, tree, proto, tvb, start, length, &value.to_string())
}

/// Converts `s` to a C string, cutting it at the first NUL like a C reader would.
pub(crate) fn c_string_lossy(s: &str) -> CString {
    let end = s.find('\0').unwrap_or(s.len());
    CString::new(&s[..end]).unwrap_or_default()
}

/// Same as [`c_string_lossy`], but leaked, for strings the host keeps by pointer.
pub(crate) fn leak_c_str(s: &str) -> &'static CStr {
    Box::leak(c_string_lossy(s).into_boxed_c_str())
}
