//! Procedural macros for the spx backend
//!
//! This crate provides macros to remove per-entity query boilerplate:
//!
//! - `#[derive(Entity)]` - Generate the static field descriptor and positional
//!   row codec consumed by `spx_backend::db::orm`

use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, Data, DataStruct, DeriveInput, Fields};

/// Generate an `Entity` implementation for a struct with named fields.
///
/// Fields are bound to columns by position, so the declaration order must
/// match the column order of `SELECT *` on the table. The table name is the
/// lowercase struct name.
///
/// # Usage
///
/// ```ignore
/// #[derive(Entity, Clone, Debug)]
/// pub struct Asset {
///     pub id: String,
///     pub name: String,
///     pub status: i64,
/// }
/// ```
///
/// # Generated Code
///
/// ```ignore
/// impl spx_backend::db::orm::Entity for Asset {
///     const TYPE_NAME: &'static str = "Asset";
///     fn fields() -> &'static [FieldDef] { /* one FieldDef per field */ }
///     fn from_values(values: Vec<SqlValue>) -> Result<Self, QueryError> { /* ... */ }
///     fn to_values(&self) -> Vec<SqlValue> { /* ... */ }
/// }
/// ```
#[proc_macro_derive(Entity)]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand_entity(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand_entity(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let struct_name = &input.ident;

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Entity cannot be derived for generic types",
        ));
    }

    let fields = match &input.data {
        Data::Struct(DataStruct {
            fields: Fields::Named(named),
            ..
        }) => &named.named,
        _ => {
            return Err(syn::Error::new_spanned(
                struct_name,
                "Entity can only be derived for structs with named fields",
            ));
        }
    };

    let idents: Vec<_> = fields.iter().filter_map(|f| f.ident.as_ref()).collect();
    let types: Vec<_> = fields.iter().map(|f| &f.ty).collect();
    let column_names: Vec<String> = idents
        .iter()
        .map(|ident| ident.to_string().trim_start_matches("r#").to_string())
        .collect();
    let positions: Vec<usize> = (0..idents.len()).collect();
    let field_count = idents.len();
    let type_name = struct_name.to_string();

    let orm = quote!(::spx_backend::db::orm);

    Ok(quote! {
        impl #orm::Entity for #struct_name {
            const TYPE_NAME: &'static str = #type_name;

            fn fields() -> &'static [#orm::FieldDef] {
                static FIELDS: [#orm::FieldDef; #field_count] = [
                    #(
                        #orm::FieldDef {
                            name: #column_names,
                            sql_type: <#types as #orm::SqlField>::SQL_TYPE,
                            nullable: <#types as #orm::SqlField>::NULLABLE,
                        },
                    )*
                ];
                &FIELDS
            }

            fn from_values(
                values: ::std::vec::Vec<#orm::SqlValue>,
            ) -> ::std::result::Result<Self, #orm::QueryError> {
                let mut values = values.into_iter();
                ::std::result::Result::Ok(Self {
                    #(
                        #idents: #orm::decode_field(
                            values.next(),
                            #positions,
                            #column_names,
                        )?,
                    )*
                })
            }

            fn to_values(&self) -> ::std::vec::Vec<#orm::SqlValue> {
                ::std::vec![
                    #( #orm::SqlField::to_sql_value(&self.#idents), )*
                ]
            }
        }
    })
}
