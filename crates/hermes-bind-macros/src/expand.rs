//! `#[derive(Bind)]` expansion.
//!
//! For each field the derive emits at most one small writer function and one
//! `FieldDescriptor`, then returns the descriptors from a `const` table:
//!
//! ```rust,ignore
//! impl ::hermes_bind::Bind for GetTask {
//!     fn fields() -> &'static [::hermes_bind::FieldDescriptor<Self>] {
//!         fn __bind_text_id(record: &mut GetTask) -> &mut String { &mut record.id }
//!         const FIELDS: &[::hermes_bind::FieldDescriptor<GetTask>] = &[
//!             ::hermes_bind::FieldDescriptor { name: "id", .. },
//!         ];
//!         FIELDS
//!     }
//! }
//! ```

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{spanned::Spanned, Data, DeriveInput, Fields};

use crate::parse::{BindField, ValueKind};

/// Expands `#[derive(Bind)]`.
pub fn expand_bind(input: TokenStream) -> syn::Result<TokenStream> {
    let input: DeriveInput = syn::parse2(input)?;
    let record = &input.ident;

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new(
            input.generics.span(),
            "`Bind` cannot be derived for generic types",
        ));
    }

    let named = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => named,
            _ => {
                return Err(syn::Error::new(
                    data.fields.span(),
                    "`Bind` requires a struct with named fields",
                ))
            }
        },
        _ => {
            return Err(syn::Error::new(
                record.span(),
                "`Bind` can only be derived for structs",
            ))
        }
    };

    let fields = named
        .named
        .iter()
        .map(BindField::parse)
        .collect::<syn::Result<Vec<_>>>()?;

    let mut writers = Vec::new();
    let mut descriptors = Vec::new();
    for field in &fields {
        let (writer, setter) = generate_setter(record, field);
        writers.extend(writer);
        descriptors.push(generate_descriptor(field, &setter));
    }

    Ok(quote! {
        #[automatically_derived]
        impl ::hermes_bind::Bind for #record {
            #[allow(clippy::unnecessary_wraps, clippy::missing_const_for_fn)]
            fn fields() -> &'static [::hermes_bind::FieldDescriptor<Self>] {
                #(#writers)*

                const FIELDS: &[::hermes_bind::FieldDescriptor<#record>] = &[#(#descriptors),*];
                FIELDS
            }
        }
    })
}

/// Returns the writer function (if any) and the `setter` expression.
fn generate_setter(record: &syn::Ident, field: &BindField) -> (Option<TokenStream>, TokenStream) {
    if field.attrs.readonly {
        return (None, quote! { ::std::option::Option::None });
    }

    let ident = &field.ident;
    match &field.kind {
        ValueKind::Text => {
            let writer = format_ident!("__bind_text_{}", ident);
            (
                Some(quote! {
                    fn #writer(record: &mut #record) -> &mut ::std::string::String {
                        &mut record.#ident
                    }
                }),
                quote! { ::std::option::Option::Some(::hermes_bind::Setter::Text(#writer)) },
            )
        }
        ValueKind::Scalar { target, optional } => {
            let writer = format_ident!("__bind_parse_{}", ident);
            let parsed = quote! {
                <#target as ::std::str::FromStr>::from_str(raw)
                    .map_err(|err| ::std::string::ToString::to_string(&err))?
            };
            let value = if *optional {
                quote! { ::std::option::Option::Some(#parsed) }
            } else {
                parsed
            };
            (
                Some(quote! {
                    fn #writer(
                        record: &mut #record,
                        raw: &str,
                    ) -> ::std::result::Result<(), ::std::string::String> {
                        record.#ident = #value;
                        ::std::result::Result::Ok(())
                    }
                }),
                quote! { ::std::option::Option::Some(::hermes_bind::Setter::Parse(#writer)) },
            )
        }
        ValueKind::Map if field.is_data_bag => {
            let writer = format_ident!("__bind_bag_{}", ident);
            (
                Some(quote! {
                    fn #writer(
                        record: &mut #record,
                        map: ::hermes_bind::__private::Map<
                            ::std::string::String,
                            ::hermes_bind::__private::Value,
                        >,
                    ) {
                        record.#ident = ::std::iter::FromIterator::from_iter(map);
                    }
                }),
                quote! { ::std::option::Option::Some(::hermes_bind::Setter::Bag(#writer)) },
            )
        }
        ValueKind::Map | ValueKind::Other => (None, quote! { ::std::option::Option::None }),
    }
}

fn generate_descriptor(field: &BindField, setter: &TokenStream) -> TokenStream {
    let name = &field.name;
    let query_key = option_str(field.attrs.query.as_deref());
    let path_key = option_str(field.attrs.path.as_deref());
    let kind = match field.kind {
        ValueKind::Text => quote! { ::hermes_bind::FieldKind::Text },
        ValueKind::Scalar { .. } => quote! { ::hermes_bind::FieldKind::Scalar },
        ValueKind::Map if field.is_data_bag => quote! { ::hermes_bind::FieldKind::DataBag },
        ValueKind::Map | ValueKind::Other => quote! { ::hermes_bind::FieldKind::Other },
    };

    quote! {
        ::hermes_bind::FieldDescriptor {
            name: #name,
            query_key: #query_key,
            path_key: #path_key,
            kind: #kind,
            setter: #setter,
        }
    }
}

fn option_str(value: Option<&str>) -> TokenStream {
    match value {
        Some(value) => quote! { ::std::option::Option::Some(#value) },
        None => quote! { ::std::option::Option::None },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_record() {
        let input = quote! {
            struct GetTask {
                #[bind(query = "id", path = "task_id")]
                id: String,
                #[bind(query = "limit")]
                limit: Option<u32>,
                #[bind(readonly)]
                owner: String,
                data: Map<String, Value>,
                tags: Vec<String>,
            }
        };

        let expanded = expand_bind(input).unwrap().to_string();

        assert!(expanded.contains("__bind_text_id"));
        assert!(expanded.contains("__bind_parse_limit"));
        assert!(expanded.contains("__bind_bag_data"));
        assert!(!expanded.contains("__bind_text_owner"));
        assert!(!expanded.contains("__bind_parse_tags"));
        assert!(expanded.contains("\"task_id\""));
    }

    #[test]
    fn test_expand_empty_struct() {
        let input = quote! {
            struct Empty {}
        };
        assert!(expand_bind(input).is_ok());
    }

    #[test]
    fn test_generic_struct_rejected() {
        let input = quote! {
            struct Wrapper<T> {
                inner: T,
            }
        };
        assert!(expand_bind(input).is_err());
    }

    #[test]
    fn test_tuple_struct_rejected() {
        let input = quote! {
            struct Id(String);
        };
        assert!(expand_bind(input).is_err());
    }

    #[test]
    fn test_enum_rejected() {
        let input = quote! {
            enum Mode { A, B }
        };
        assert!(expand_bind(input).is_err());
    }

    #[test]
    fn test_field_error_surfaces() {
        let input = quote! {
            struct Bad {
                #[bind(data)]
                data: String,
            }
        };
        let err = expand_bind(input).unwrap_err();
        assert!(err.to_string().contains("`data`"));
    }
}
