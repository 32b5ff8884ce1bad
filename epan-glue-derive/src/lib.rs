//! This crate provides the macros for [epan-glue](../epan_glue/index.html). They emit the symbols
//! Wireshark looks up when it loads a plugin library.

use proc_macro::TokenStream;

use quote::quote;
use syn::parse::{Parse, ParseStream};
use syn::punctuated::Punctuated;

mod util;

use crate::util::*;

#[derive(Debug)]
struct VersionMacroInput {
    plugin_ver: syn::LitStr,
    ws_major_ver: syn::LitInt,
    ws_minor_ver: syn::LitInt,
}

impl Parse for VersionMacroInput {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let plugin_ver: syn::LitStr = Parse::parse(input)?;
        if !is_plugin_version(&plugin_ver.value()) {
            return make_err(&plugin_ver, "expected a plugin version like \"0.1.0\"");
        }
        <syn::Token![,]>::parse(input)?;
        let ws_major_ver = Parse::parse(input)?;
        <syn::Token![,]>::parse(input)?;
        let ws_minor_ver = Parse::parse(input)?;
        Ok(VersionMacroInput {
            plugin_ver,
            ws_major_ver,
            ws_minor_ver,
        })
    }
}

/// Declares the plugin version and the Wireshark release it is built for.
///
/// Four symbols are exported: `plugin_version` and `plugin_release` (C strings), and
/// `plugin_want_major` and `plugin_want_minor` (C ints).
///
/// # Example
///
/// The following usage declares a plugin version of 0.0.1, built for wireshark version 4.0.x.
///
/// ```
/// use epan_glue_derive::version;
/// version!("0.0.1", 4, 0);
/// ```
#[proc_macro]
pub fn version(input: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(input as VersionMacroInput);

    let ws_major: u32 = match input.ws_major_ver.base10_parse() {
        Ok(v) => v,
        Err(e) => return e.to_compile_error().into(),
    };
    let ws_minor: u32 = match input.ws_minor_ver.base10_parse() {
        Ok(v) => v,
        Err(e) => return e.to_compile_error().into(),
    };

    let plugin_ver = input.plugin_ver.value();
    let release = format!("{ws_major}.{ws_minor}");

    let ver_len = plugin_ver.len() + 1;
    let ver_chars = c_char_array(&plugin_ver);
    let release_len = release.len() + 1;
    let release_chars = c_char_array(&release);

    let ws_major_ver = input.ws_major_ver;
    let ws_minor_ver = input.ws_minor_ver;

    let version_info = quote! {
        #[no_mangle]
        #[used]
        #[allow(non_upper_case_globals)]
        static plugin_version: [std::ffi::c_char; #ver_len] = [#(#ver_chars),*];
        #[no_mangle]
        #[used]
        #[allow(non_upper_case_globals)]
        static plugin_release: [std::ffi::c_char; #release_len] = [#(#release_chars),*];
        #[no_mangle]
        #[used]
        #[allow(non_upper_case_globals)]
        static plugin_want_major: std::ffi::c_int = #ws_major_ver;
        #[no_mangle]
        #[used]
        #[allow(non_upper_case_globals)]
        static plugin_want_minor: std::ffi::c_int = #ws_minor_ver;
    };

    version_info.into()
}

struct PluginMacroInput {
    plugins: Punctuated<syn::Path, syn::Token![,]>,
}

impl Parse for PluginMacroInput {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let plugins = Punctuated::parse_terminated(input)?;
        if plugins.is_empty() {
            return Err(input.error("expected at least one protocol plugin"));
        }
        Ok(PluginMacroInput { plugins })
    }
}

/// Exports `plugin_register` for a list of statics implementing `epan_glue::ProtoPlugin`.
///
/// Needs the `epan` feature of epan-glue, since the exported callbacks talk to the real host.
///
/// ```ignore
/// pub static FOO: Foo = Foo::new();
/// epan_glue::plugin!(FOO);
/// ```
#[proc_macro]
pub fn plugin(input: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(input as PluginMacroInput);
    let plugins = input.plugins.iter();

    let ret = quote! {
        static #GLUE_PLUGINS: &[&'static dyn epan_glue::ProtoPlugin] = &[#(&#plugins),*];

        static #GLUE_DESCRIPTOR: epan_glue::once_cell::sync::OnceCell<epan_glue::PluginDescriptor> =
            epan_glue::once_cell::sync::OnceCell::new();

        extern "C" fn #GLUE_REGISTER_ALL() {
            epan_glue::catch_panic("register_protoinfo", || {
                epan_glue::register_all(&epan_glue::epan::Epan, #GLUE_PLUGINS)
            });
        }

        extern "C" fn #GLUE_HANDOFF_ALL() {
            epan_glue::catch_panic("register_handoff", || {
                epan_glue::handoff_all(&epan_glue::epan::Epan, #GLUE_PLUGINS)
            });
        }

        #[no_mangle]
        extern "C" fn plugin_register() {
            epan_glue::catch_panic("plugin_register", || {
                epan_glue::register(
                    &#GLUE_DESCRIPTOR,
                    &epan_glue::epan::Epan,
                    #GLUE_REGISTER_ALL,
                    #GLUE_HANDOFF_ALL,
                );
            });
        }
    };

    ret.into()
}
