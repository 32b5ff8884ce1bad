use std::any::Any;
use std::collections::HashMap;
use std::ffi::{c_int, c_void, CStr};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Mutex;

use log::{debug, error};
use once_cell::sync::Lazy;

use crate::adapter::leak_c_str;
use crate::host::{
    DissectorHandle, DissectorKey, Host, Packet, PacketInfo, ProtoTree, ProtocolId, Tvb,
};

/// A protocol living in the plugin. Wireshark first asks every protocol to register itself, and
/// only after all protocols everywhere are known, to hand off (attach to dissector tables).
pub trait ProtoPlugin: Sync {
    fn proto_register(&'static self, host: &dyn Host);

    fn proto_reg_handoff(&'static self, host: &dyn Host);
}

pub trait Dissector: Sync {
    /// Dissects one packet. Returns the number of bytes consumed, or 0 if the packet is not ours.
    fn dissect(&self, host: &dyn Host, packet: &Packet) -> c_int;
}

static DISSECTORS: Lazy<Mutex<HashMap<DissectorKey, &'static dyn Dissector>>> =
    Lazy::new(Default::default);

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "non-string panic payload"
    }
}

/// Runs `f`, stopping a panic before it reaches the host. A panic is logged and yields `None`.
#[doc(hidden)]
pub fn catch_panic<T>(what: &str, f: impl FnOnce() -> T) -> Option<T> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(v) => Some(v),
        Err(payload) => {
            error!("{what} panicked: {}", panic_message(payload.as_ref()));
            None
        }
    }
}

/// The `register_protoinfo` half of the plugin.
pub fn register_all(host: &dyn Host, plugins: &[&'static dyn ProtoPlugin]) {
    crate::logging::init();
    for p in plugins {
        catch_panic("proto_register", || p.proto_register(host));
    }
    debug!("registered {} protocol plugins", plugins.len());
}

/// The `register_handoff` half of the plugin.
pub fn handoff_all(host: &dyn Host, plugins: &[&'static dyn ProtoPlugin]) {
    for p in plugins {
        catch_panic("proto_reg_handoff", || p.proto_reg_handoff(host));
    }
    debug!("registered handoff for {} protocol plugins", plugins.len());
}

pub fn register_protocol(
    host: &dyn Host,
    name: &'static CStr,
    short_name: &'static CStr,
    filter_name: &'static CStr,
) -> ProtocolId {
    host.register_protocol(name, short_name, filter_name)
}

/// The name a dissector is registered under. Keys are unique in the process, so names are too,
/// even across plugins.
pub fn dissector_name(key: DissectorKey) -> String {
    format!("Rust dissector {:p}", key.as_ptr())
}

/// Registers `dissector` with the host under a fresh key.
pub fn create_dissector_handle(
    host: &dyn Host,
    dissector: &'static dyn Dissector,
    proto: ProtocolId,
) -> DissectorHandle {
    let key = DissectorKey::new(leak_c_str("dissector handle").as_ptr());
    let name = leak_c_str(&dissector_name(key));

    DISSECTORS
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .insert(key, dissector);

    host.register_dissector(name, proto, key)
}

pub fn dissector_add_string(
    host: &dyn Host,
    table: &CStr,
    pattern: &CStr,
    handle: DissectorHandle,
) {
    host.dissector_add_string(table, pattern, handle)
}

/// Looks up the dissector registered under `key` and runs it.
///
/// # Safety
///
/// `key` must be null or come from [`create_dissector_handle`].
pub unsafe fn call_dissector(
    host: &dyn Host,
    tvb: *mut Tvb,
    pinfo: *mut PacketInfo,
    tree: *mut ProtoTree,
    data: *mut c_void,
    key: *mut c_void,
) -> c_int {
    let key = DissectorKey::from_data(key);
    let dissector = DISSECTORS
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .get(&key)
        .copied();

    let Some(dissector) = dissector else {
        if key.is_null() {
            error!("call_dissector called without a dissector key");
        } else {
            let name = CStr::from_ptr(key.as_ptr());
            error!(
                "call_dissector called for unknown dissector {:?} ({:?})",
                key.as_ptr(),
                name
            );
        }
        return 0;
    };

    let packet = Packet {
        tvb,
        pinfo,
        tree,
        data,
    };
    catch_panic("dissector", || dissector.dissect(host, &packet)).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{Call, MockHost};
    use once_cell::sync::OnceCell;
    use std::ptr::null_mut;

    struct Echo {
        tag: c_int,
        proto: OnceCell<ProtocolId>,
    }

    impl Echo {
        const fn new(tag: c_int) -> Self {
            Echo {
                tag,
                proto: OnceCell::new(),
            }
        }
    }

    impl ProtoPlugin for Echo {
        fn proto_register(&'static self, host: &dyn Host) {
            let id = register_protocol(host, c"Echo", c"ECHO", c"echo");
            let _ = self.proto.set(id);
        }

        fn proto_reg_handoff(&'static self, host: &dyn Host) {
            let proto = self.proto.get().copied().unwrap_or(ProtocolId::UNREGISTERED);
            let handle = create_dissector_handle(host, self, proto);
            dissector_add_string(host, c"echo.name", c"echo", handle);
        }
    }

    impl Dissector for Echo {
        fn dissect(&self, _host: &dyn Host, packet: &Packet) -> c_int {
            self.tag + packet.data as c_int
        }
    }

    #[test]
    fn register_and_handoff_visit_every_plugin_in_order() {
        static FIRST: Echo = Echo::new(1);
        static SECOND: Echo = Echo::new(2);
        let host = MockHost::default();
        let plugins: [&'static dyn ProtoPlugin; 2] = [&FIRST, &SECOND];

        register_all(&host, &plugins);
        assert_eq!(FIRST.proto.get(), Some(&ProtocolId(1)));
        assert_eq!(SECOND.proto.get(), Some(&ProtocolId(2)));

        handoff_all(&host, &plugins);
        let calls = host.calls();
        assert_eq!(calls.len(), 6);
        match &calls[2..] {
            [Call::RegisterDissector { proto: p1, .. }, Call::DissectorAddString { table, .. }, Call::RegisterDissector { proto: p2, .. }, Call::DissectorAddString { .. }] =>
            {
                assert_eq!((*p1, *p2), (ProtocolId(1), ProtocolId(2)));
                assert_eq!(table, "echo.name");
            }
            other => panic!("unexpected calls: {other:?}"),
        }
    }

    #[test]
    fn keys_route_to_their_own_dissector() {
        static A: Echo = Echo::new(100);
        static B: Echo = Echo::new(200);
        let host = MockHost::default();

        create_dissector_handle(&host, &A, ProtocolId(1));
        create_dissector_handle(&host, &B, ProtocolId(2));
        let keys = host.registered_keys();
        assert_eq!(keys.len(), 2);
        assert_ne!(keys[0], keys[1]);

        let call = |key: DissectorKey| unsafe {
            call_dissector(
                &host,
                null_mut(),
                null_mut(),
                null_mut(),
                5 as *mut c_void,
                key.as_data(),
            )
        };
        assert_eq!(call(keys[0]), 105);
        assert_eq!(call(keys[1]), 205);
    }

    #[test]
    fn dissector_names_are_unique() {
        static C: Echo = Echo::new(0);
        let host = MockHost::default();

        create_dissector_handle(&host, &C, ProtocolId(1));
        create_dissector_handle(&host, &C, ProtocolId(1));

        let names: Vec<String> = host
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::RegisterDissector { name, .. } => Some(name),
                _ => None,
            })
            .collect();
        let keys = host.registered_keys();
        assert_eq!(names.len(), 2);
        assert_ne!(names[0], names[1]);
        assert_eq!(names[0], dissector_name(keys[0]));
        assert_eq!(names[1], dissector_name(keys[1]));
        assert_ne!(names[0], "Rust dissector 0");
    }

    struct Boom;

    impl ProtoPlugin for Boom {
        fn proto_register(&'static self, _host: &dyn Host) {
            panic!("boom in proto_register");
        }

        fn proto_reg_handoff(&'static self, _host: &dyn Host) {
            panic!("boom in proto_reg_handoff");
        }
    }

    impl Dissector for Boom {
        fn dissect(&self, _host: &dyn Host, _packet: &Packet) -> c_int {
            panic!("boom in dissect");
        }
    }

    #[test]
    fn panicking_dissector_is_not_ours() {
        static BOOM: Boom = Boom;
        let host = MockHost::default();

        create_dissector_handle(&host, &BOOM, ProtocolId(1));
        let key = host.registered_keys()[0];

        let got = panic::catch_unwind(AssertUnwindSafe(|| unsafe {
            call_dissector(
                &MockHost::default(),
                null_mut(),
                null_mut(),
                null_mut(),
                null_mut(),
                key.as_data(),
            )
        }));
        assert_eq!(got.ok(), Some(0));
    }

    #[test]
    fn panicking_plugin_does_not_stop_the_others() {
        static BOOM: Boom = Boom;
        static AFTER: Echo = Echo::new(0);
        let host = MockHost::default();
        let plugins: [&'static dyn ProtoPlugin; 2] = [&BOOM, &AFTER];

        let registered = panic::catch_unwind(AssertUnwindSafe(|| register_all(&host, &plugins)));
        assert!(registered.is_ok());
        assert_eq!(AFTER.proto.get(), Some(&ProtocolId(1)));

        let handed_off = panic::catch_unwind(AssertUnwindSafe(|| handoff_all(&host, &plugins)));
        assert!(handed_off.is_ok());
        assert_eq!(host.registered_keys().len(), 1);
    }

    #[test]
    fn catch_panic_passes_values_through() {
        assert_eq!(catch_panic("add", || 2 + 2), Some(4));
        assert_eq!(catch_panic("fail", || -> i32 { panic!("{}", String::from("owned")) }), None);
    }

    #[test]
    fn unknown_key_is_not_ours() {
        let host = MockHost::default();
        let stray = c"not a dissector";

        let got = unsafe {
            call_dissector(
                &host,
                null_mut(),
                null_mut(),
                null_mut(),
                null_mut(),
                stray.as_ptr() as *mut c_void,
            )
        };
        assert_eq!(got, 0);

        let got = unsafe {
            call_dissector(&host, null_mut(), null_mut(), null_mut(), null_mut(), null_mut())
        };
        assert_eq!(got, 0);
        assert!(host.calls().is_empty());
    }
}
