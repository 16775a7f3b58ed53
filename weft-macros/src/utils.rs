use proc_macro::{Delimiter, Group, TokenStream, TokenTree};

/// Reads the optional `worker_threads = N` argument of `#[main]` / `#[test]`.
///
/// Any other argument, or a value that is not a positive integer, is
/// rejected with a message suitable for `compile_error!`.
pub(crate) fn parse_worker_threads(attr: TokenStream) -> Result<Option<usize>, String> {
    let attr = attr.to_string();
    let mut worker_threads = None;

    for part in attr.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let Some(value) = part.strip_prefix("worker_threads") else {
            return Err(format!("unknown weft runtime option `{part}`"));
        };

        let value = value.trim_start().trim_start_matches('=').trim();

        match value.parse::<usize>() {
            Ok(n) if n > 0 => worker_threads = Some(n),
            _ => {
                return Err(format!(
                    "`worker_threads` expects a positive integer, got `{value}`"
                ));
            }
        }
    }

    Ok(worker_threads)
}

/// Rewrites an `async fn` into a synchronous one whose body runs on a fresh
/// runtime via `block_on`.
///
/// The `async` keyword is removed and the outermost brace block (the body)
/// is wrapped. Returns `None` if the item has no body.
pub(crate) fn wrap_body(
    item: TokenStream,
    worker_threads: Option<usize>,
) -> Option<Vec<TokenTree>> {
    let mut tokens: Vec<TokenTree> = item.into_iter().collect();

    if let Some(async_pos) = tokens
        .iter()
        .position(|t| matches!(t, TokenTree::Ident(id) if id.to_string() == "async"))
    {
        tokens.remove(async_pos);
    }

    let pos = tokens
        .iter()
        .rposition(|t| matches!(t, TokenTree::Group(g) if g.delimiter() == Delimiter::Brace))?;

    let TokenTree::Group(body) = &tokens[pos] else {
        return None;
    };

    let mut builder = String::from("::weft::RuntimeBuilder::new()");

    if let Some(n) = worker_threads {
        builder.push_str(&format!(".worker_threads({n})"));
    }

    let new_block = format!(
        "{{
            let runtime = {builder}
                .build()
                .expect(\"failed to build weft runtime\");
            runtime
                .block_on(async move {{
                    {}
                }})
        }}",
        body.stream()
    );

    tokens[pos] = TokenTree::Group(Group::new(Delimiter::Brace, new_block.parse().ok()?));

    Some(tokens)
}

/// Expands to a `compile_error!` carrying `message`.
pub(crate) fn compile_error(message: &str) -> TokenStream {
    format!("compile_error!({message:?});")
        .parse()
        .unwrap_or_default()
}
