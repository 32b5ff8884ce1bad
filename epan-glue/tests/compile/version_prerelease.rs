use std::ffi::CStr;

use epan_glue::version;

version!("5.10.01-rc.2", 10, 100);

fn main() {
    let ver = unsafe { CStr::from_ptr(plugin_version.as_ptr()) };
    assert_eq!(ver.to_str().unwrap(), "5.10.01-rc.2");

    let release = unsafe { CStr::from_ptr(plugin_release.as_ptr()) };
    assert_eq!(release.to_str().unwrap(), "10.100");

    assert_eq!(plugin_want_major, 10_i32);
    assert_eq!(plugin_want_minor, 100_i32);
}
