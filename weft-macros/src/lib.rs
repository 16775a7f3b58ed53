//! Procedural macros for the weft runtime.
//!
//! - `#[weft::main]` turns an `async fn main` into a synchronous entry point
//!   that builds a runtime and blocks on the body.
//! - `#[weft::test]` does the same for a test function and adds `#[test]`.
//!
//! Both accept an optional `worker_threads = N` argument.

mod utils;

use proc_macro::{TokenStream, TokenTree};

#[proc_macro_attribute]
pub fn main(attr: TokenStream, item: TokenStream) -> TokenStream {
    let worker_threads = match utils::parse_worker_threads(attr) {
        Ok(n) => n,
        Err(message) => return utils::compile_error(&message),
    };

    match utils::wrap_body(item, worker_threads) {
        Some(tokens) => tokens.into_iter().collect(),
        None => utils::compile_error("#[weft::main] expects a function with a body"),
    }
}

#[proc_macro_attribute]
pub fn test(attr: TokenStream, item: TokenStream) -> TokenStream {
    let worker_threads = match utils::parse_worker_threads(attr) {
        Ok(n) => n,
        Err(message) => return utils::compile_error(&message),
    };

    let Some(tokens) = utils::wrap_body(item, worker_threads) else {
        return utils::compile_error("#[weft::test] expects a function with a body");
    };

    let test_attr: TokenStream = "#[test]".parse().unwrap_or_default();
    let mut result: Vec<TokenTree> = test_attr.into_iter().collect();
    result.extend(tokens);

    result.into_iter().collect()
}
