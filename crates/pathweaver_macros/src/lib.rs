use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, FnArg, Ident, ItemFn, Pat};

/// Time a function when the `perf_stats` feature is enabled.
///
/// The function body is wrapped with a guard that measures wall time and
/// logs through Bevy's `warn!` when the call is slower than the threshold.
/// Without the `perf_stats` feature the guard is compiled out entirely.
///
/// # Endpoint detection
/// If the function takes parameters named `start` and `goal`, their `Debug`
/// representation is captured on entry and included in the log line, so a
/// slow search can be reproduced from the log alone.
///
/// # Example
/// ```ignore
/// #[profile]
/// pub fn find_path(grid: &CostGrid, start: Vec3, goal: Vec3) -> SearchResult {
///     // ... search ...
/// }
///
/// #[profile(5)] // only report calls slower than 5ms
/// pub fn build(config: &GridConfig) -> CostGrid { ... }
/// ```
#[proc_macro_attribute]
pub fn profile(attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemFn);

    let threshold_ms: u128 = if attr.is_empty() {
        1
    } else {
        attr.to_string().trim().parse().unwrap_or(1)
    };

    let attrs = &input.attrs;
    let vis = &input.vis;
    let sig = &input.sig;
    let block = &input.block;
    let fn_name_str = sig.ident.to_string();

    let has_param = |name: &str| {
        sig.inputs.iter().any(|arg| match arg {
            FnArg::Typed(pat_type) => match &*pat_type.pat {
                Pat::Ident(pat_ident) => pat_ident.ident == name,
                _ => false,
            },
            FnArg::Receiver(_) => false,
        })
    };

    let endpoints = if has_param("start") && has_param("goal") {
        let start = Ident::new("start", proc_macro2::Span::call_site());
        let goal = Ident::new("goal", proc_macro2::Span::call_site());
        quote! { Some(format!("{:?} -> {:?}", #start, #goal)) }
    } else {
        quote! { None }
    };

    let output = quote! {
        #(#attrs)*
        #vis #sig {
            #[cfg(feature = "perf_stats")]
            let _profile_timer = {
                struct ProfileGuard {
                    name: &'static str,
                    endpoints: Option<String>,
                    start: std::time::Instant,
                }
                impl Drop for ProfileGuard {
                    fn drop(&mut self) {
                        let elapsed = self.start.elapsed();
                        if elapsed.as_millis() >= #threshold_ms {
                            match &self.endpoints {
                                Some(endpoints) => bevy::log::warn!(
                                    "[PERF] {} ({}): {:?}", self.name, endpoints, elapsed
                                ),
                                None => bevy::log::warn!("[PERF] {}: {:?}", self.name, elapsed),
                            }
                        }
                    }
                }
                ProfileGuard {
                    name: #fn_name_str,
                    endpoints: #endpoints,
                    start: std::time::Instant::now(),
                }
            };

            #block
        }
    };

    output.into()
}
