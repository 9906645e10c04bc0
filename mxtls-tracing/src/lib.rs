//! Attribute macros that wrap functions in `tracing` enter/exit events.
//!
//! ```ignore
//! #[traced(instrument(level = tracing::Level::DEBUG, skip_all), timing(precision = "ms"))]
//! async fn probe(&self) -> ProbeResult { .. }
//! ```
//!
//! The expansion refers to `tracing::` by path, so the calling crate needs
//! `tracing` (with the `attributes` feature when `instrument` is used) in scope.

extern crate proc_macro;

use proc_macro2::TokenStream;
use quote::{quote, quote_spanned};
use syn::{ItemFn, Stmt, parse::Parse, parse_macro_input, parse_quote};

#[derive(PartialEq, Eq, Clone, Copy, Default)]
enum Precision {
    #[default]
    Nanos,
    Micros,
    Millis,
    Seconds,
    Unspecified,
}

impl Precision {
    /// A closure expression rendering the elapsed `Duration` in this unit.
    fn formatter(self) -> syn::Expr {
        match self {
            Self::Nanos => {
                parse_quote!(|d: std::time::Duration| format!("{} ns elapsed", d.as_nanos()))
            }
            Self::Micros => {
                parse_quote!(|d: std::time::Duration| format!("{} us elapsed", d.as_micros()))
            }
            Self::Millis => {
                parse_quote!(|d: std::time::Duration| format!("{} ms elapsed", d.as_millis()))
            }
            Self::Seconds => {
                parse_quote!(|d: std::time::Duration| format!("{} s elapsed", d.as_secs()))
            }
            Self::Unspecified => parse_quote!(|_: std::time::Duration| String::default()),
        }
    }
}

impl From<&str> for Precision {
    fn from(value: &str) -> Self {
        match value {
            "ns" | "nanos" => Self::Nanos,
            "us" | "micros" => Self::Micros,
            "ms" | "millis" => Self::Millis,
            "s" | "secs" => Self::Seconds,
            _ => Self::Unspecified,
        }
    }
}

impl Parse for Precision {
    fn parse(input: syn::parse::ParseStream) -> syn::Result<Self> {
        if !input.peek(syn::token::Paren) {
            return Ok(Self::default());
        }

        let content;
        let _ = syn::parenthesized!(content in input);
        let _ = content.parse::<keywords::precision>()?;
        let _ = content.parse::<syn::Token![=]>()?;
        let precision = content.parse::<syn::LitStr>()?.value();

        Ok(Self::from(precision.as_str()))
    }
}

mod keywords {
    syn::custom_keyword!(timing);
    syn::custom_keyword!(precision);
    syn::custom_keyword!(instrument);
}

#[derive(Default)]
struct Attributes {
    timing: Option<Precision>,
    instrument: Option<TokenStream>,
    unrecognised: Vec<syn::Error>,
}

impl Attributes {
    /// Unknown arguments are surfaced as deprecation warnings rather than
    /// hard errors, so a typo never breaks the build of a probe.
    fn warnings(&self) -> TokenStream {
        let warnings = self.unrecognised.iter().map(|err| {
            let msg = syn::LitStr::new(&format!("unrecognised traced argument, {err}"), err.span());

            quote_spanned! {err.span()=>
                #[warn(deprecated)]
                {
                    #[deprecated(since = "0.0.0", note = #msg)]
                    const TRACED_ARGUMENT_WARNING: () = ();
                    let () = TRACED_ARGUMENT_WARNING;
                }
            }
        });

        quote! { { #(#warnings)* } }
    }
}

impl Parse for Attributes {
    fn parse(input: syn::parse::ParseStream) -> syn::Result<Self> {
        let mut attributes = Self::default();

        while !input.is_empty() {
            let lookahead = input.lookahead1();

            if lookahead.peek(keywords::timing) {
                if attributes.timing.is_some() {
                    return Err(input.error("`timing` may only be given once"));
                }
                let _ = input.parse::<keywords::timing>()?;
                attributes.timing = Some(input.parse()?);
            } else if lookahead.peek(keywords::instrument) {
                if attributes.instrument.is_some() {
                    return Err(input.error("`instrument` may only be given once"));
                }
                let _ = input.parse::<keywords::instrument>()?;
                if input.peek(syn::token::Paren) {
                    let content;
                    let _ = syn::parenthesized!(content in input);
                    attributes.instrument = Some(content.parse()?);
                } else {
                    attributes.instrument = Some(TokenStream::new());
                }
            } else if lookahead.peek(syn::Token![,]) {
                let _ = input.parse::<syn::Token![,]>()?;
            } else {
                attributes.unrecognised.push(lookahead.error());
                let _ = input.parse::<proc_macro2::TokenTree>();
            }
        }

        Ok(attributes)
    }
}

/// Emits `tracing::trace!` events when the attributed function is entered and
/// when it returns (on every exit path, including `?` and early returns).
///
/// Arguments:
/// - `instrument(...)` forwards its contents to `#[tracing::instrument(...)]`.
/// - `timing(precision = "ms")` appends the elapsed time to the exit event.
///
/// # Panics
///
/// When applied to anything other than a function.
#[proc_macro_attribute]
pub fn traced(
    args: proc_macro::TokenStream,
    item: proc_macro::TokenStream,
) -> proc_macro::TokenStream {
    let args = parse_macro_input!(args as Attributes);
    let mut item_fn = parse_macro_input!(item as ItemFn);
    let warnings = args.warnings();

    item_fn
        .attrs
        .push(parse_quote!(#[allow(clippy::items_after_statements)]));

    if let Some(fields) = &args.instrument {
        item_fn
            .attrs
            .push(parse_quote!(#[tracing::instrument(#fields)]));
    }

    let name = item_fn.sig.ident.to_string();
    let on_exit: Stmt = match args.timing {
        None => parse_quote! { tracing::trace!("OnExit: {}", #name); },
        Some(precision) => {
            let formatter = precision.formatter();
            parse_quote! {
                tracing::trace!("OnExit: {} ({})", #name, (#formatter)(self.started.elapsed()));
            }
        }
    };

    let guard: Vec<Stmt> = parse_quote! {
        struct __TracedGuard {
            started: std::time::Instant,
        }

        impl __TracedGuard {
            fn enter() -> Self {
                #warnings

                tracing::trace!("OnEnter: {}", #name);
                Self {
                    started: std::time::Instant::now(),
                }
            }
        }

        impl std::ops::Drop for __TracedGuard {
            fn drop(&mut self) {
                #on_exit
            }
        }

        let __traced_guard = __TracedGuard::enter();
    };

    let body = std::mem::take(&mut item_fn.block.stmts);
    item_fn.block.stmts = guard.into_iter().chain(body).collect();

    proc_macro::TokenStream::from(quote! { #item_fn })
}
