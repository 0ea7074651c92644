use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, parse_quote, DeriveInput, GenericParam};

/// Derives `ecs_registry::component::Component`.
///
/// Non-generic types get a sequential id allocated once per process and cached
/// in a `OnceLock`. A `static` inside a generic function is shared by every
/// instantiation, so generic types fall back to a hash of their type name.
#[proc_macro_derive(Component)]
pub fn component_derive(input: TokenStream) -> TokenStream {
    let mut ast = parse_macro_input!(input as DeriveInput);
    component_impl(&mut ast).into()
}

fn component_impl(ast: &mut DeriveInput) -> TokenStream2 {
    let name = ast.ident.clone();

    if ast.generics.params.is_empty() {
        // Use absolute paths that work both inside and outside the crate
        return quote! {
            impl ::ecs_registry::component::Component for #name {
                fn type_index() -> ::ecs_registry::component::Id {
                    static TYPE_INDEX: ::std::sync::OnceLock<::ecs_registry::component::Id> =
                        ::std::sync::OnceLock::new();

                    *TYPE_INDEX.get_or_init(|| ::ecs_registry::component::next_id())
                }
            }
        };
    }

    for param in ast.generics.params.iter_mut() {
        if let GenericParam::Type(ty) = param {
            ty.bounds.push(parse_quote!('static));
        }
    }

    let (impl_generics, ty_generics, where_clause) = ast.generics.split_for_impl();

    quote! {
        impl #impl_generics ::ecs_registry::component::Component for #name #ty_generics #where_clause {
            fn type_index() -> ::ecs_registry::component::Id {
                ::ecs_registry::component::type_hash::<Self>()
            }
        }
    }
}

#[cfg(test)]
#[path = "lib.tests.rs"]
mod tests;
