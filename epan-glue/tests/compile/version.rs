use std::ffi::{c_char, CStr};

use epan_glue::version;

version!("0.0.1", 4, 0);

fn main() {
    let ver = unsafe { CStr::from_ptr(plugin_version.as_ptr()) };
    assert_eq!(ver.to_str().unwrap(), "0.0.1");
    assert_eq!(plugin_version.len(), 6);
    assert_eq!(plugin_version[5], 0 as c_char);

    let release = unsafe { CStr::from_ptr(plugin_release.as_ptr()) };
    assert_eq!(release.to_str().unwrap(), "4.0");

    assert_eq!(plugin_want_major, 4_i32);
    assert_eq!(plugin_want_minor, 0_i32);
}
