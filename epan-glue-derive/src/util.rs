use once_cell::sync::Lazy;
use quote::quote;
use regex::Regex;
use syn::spanned::Spanned;

pub(crate) fn make_err<T>(tok: &impl Spanned, msg: &str) -> Result<T, syn::Error> {
    Err(syn::Error::new(tok.span(), msg))
}

/// Returns true if `ver` looks like a semantic version, e.g. `0.1.0` or `1.2.3-rc.1+build5`.
pub(crate) fn is_plugin_version(ver: &str) -> bool {
    static RE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"^\d+\.\d+\.\d+(-[0-9A-Za-z.-]+)?(\+[0-9A-Za-z.-]+)?$")
            .expect("regexp for plugin versions should be valid")
    });
    RE.is_match(ver)
}

/// Turns `s` into the elements of a NUL terminated `c_char` array.
pub(crate) fn c_char_array(s: &str) -> Vec<proc_macro2::TokenStream> {
    s.bytes()
        .chain(std::iter::once(0))
        .map(|b| quote! { #b as std::ffi::c_char })
        .collect()
}

// Trick from https://stackoverflow.com/a/59619245
#[derive(Debug, Clone, Copy)]
pub(crate) struct IdentHelper<'a>(pub(crate) &'a str);

impl quote::ToTokens for IdentHelper<'_> {
    fn to_tokens(&self, tokens: &mut proc_macro2::TokenStream) {
        proc_macro2::Ident::new(self.0, proc_macro2::Span::call_site()).to_tokens(tokens)
    }
}

pub(crate) const GLUE_PLUGINS: IdentHelper = IdentHelper("__EPAN_GLUE_PLUGINS");
pub(crate) const GLUE_DESCRIPTOR: IdentHelper = IdentHelper("__EPAN_GLUE_DESCRIPTOR");
pub(crate) const GLUE_REGISTER_ALL: IdentHelper = IdentHelper("__epan_glue_register_all");
pub(crate) const GLUE_HANDOFF_ALL: IdentHelper = IdentHelper("__epan_glue_handoff_all");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_semver() {
        assert!(is_plugin_version("0.0.1"));
        assert!(is_plugin_version("5.10.01"));
        assert!(is_plugin_version("1.2.3-rc.1"));
        assert!(is_plugin_version("1.2.3+git.abc"));
    }

    #[test]
    fn rejects_non_semver() {
        assert!(!is_plugin_version(""));
        assert!(!is_plugin_version("1.2"));
        assert!(!is_plugin_version("v1.2.3"));
        assert!(!is_plugin_version("1.2.3 "));
    }

    #[test]
    fn c_char_array_is_nul_terminated() {
        let elems = c_char_array("4.0");
        assert_eq!(elems.len(), 4);
        assert_eq!(elems[3].to_string(), quote! { 0u8 as std::ffi::c_char }.to_string());
    }
}
