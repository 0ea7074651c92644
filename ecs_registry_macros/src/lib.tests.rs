use super::component_impl;
use quote::quote;
use syn::{DeriveInput, ItemImpl};

fn expand(input: proc_macro2::TokenStream) -> ItemImpl {
    let mut ast: DeriveInput = syn::parse2(input).unwrap();
    syn::parse2(component_impl(&mut ast)).unwrap()
}

#[test]
fn test_plain_type_caches_a_sequential_id() {
    let item = expand(quote! { struct Health(i32); });
    let text = quote!(#item).to_string();

    assert!(item.generics.params.is_empty());
    assert!(text.contains("OnceLock"));
    assert!(text.contains("next_id"));
}

#[test]
fn test_generic_type_hashes_its_name() {
    let item = expand(quote! { struct Tagged<T, const N: usize> { value: [T; N] } });
    let text = quote!(#item).to_string();

    assert_eq!(item.generics.params.len(), 2);
    assert!(text.contains("type_hash"));
    assert!(text.contains("'static"));
    assert!(!text.contains("OnceLock"));
}
