extern crate proc_macro;

use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, ItemFn};

/// Wraps an async method that takes a `session: &mut Session` argument in a
/// Mongo transaction: the body runs between `start_transaction` and
/// `commit_transaction`, and any error aborts the transaction before being
/// returned.
#[proc_macro_attribute]
pub fn tx(_args: TokenStream, input: TokenStream) -> TokenStream {
    let input_fn = parse_macro_input!(input as ItemFn);
    let attrs = &input_fn.attrs;
    let vis = &input_fn.vis;
    let sig = &input_fn.sig;
    let block = &input_fn.block;

    let gen = quote! {
        #(#attrs)*
        #vis #sig {
            session.start_transaction().await?;
            let tx_result = {
                let session = &mut *session;
                let tx_body = async move #block;
                tx_body.await
            };
            match tx_result {
                Ok(value) => {
                    session.commit_transaction().await?;
                    Ok(value)
                }
                Err(err) => {
                    session.abort_transaction().await?;
                    Err(err)
                }
            }
        }
    };

    TokenStream::from(gen)
}
