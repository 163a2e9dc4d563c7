//! Procedural macros for surface-dispatch

use darling::{FromDeriveInput, FromField, FromVariant};
use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, DeriveInput};

/// Container-level attributes for #[derive(Message)]
#[derive(Debug, FromDeriveInput)]
#[darling(attributes(message), supports(enum_any))]
struct MessageOpts {
    ident: syn::Ident,
    data: darling::ast::Data<MessageVariant, ()>,

    /// Path to the crate exporting the `Message` trait
    #[darling(default)]
    krate: Option<syn::Path>,
}

/// Variant-level attributes
#[derive(Debug, FromVariant)]
#[darling(attributes(message))]
struct MessageVariant {
    ident: syn::Ident,
    fields: darling::ast::Fields<()>,

    /// Explicit name override
    #[darling(default)]
    rename: Option<String>,
}

/// Container-level attributes for #[derive(ComponentProps)]
#[derive(Debug, FromDeriveInput)]
#[darling(attributes(props), supports(struct_named))]
struct PropsOpts {
    ident: syn::Ident,
    data: darling::ast::Data<(), PropsField>,

    /// Component kind name; defaults to the struct name without a `Props` suffix
    #[darling(default)]
    kind: Option<String>,

    #[darling(default)]
    krate: Option<syn::Path>,
}

/// Field-level attributes
#[derive(Debug, FromField)]
#[darling(attributes(props))]
struct PropsField {
    ident: Option<syn::Ident>,

    /// Property must be present on every instance of the kind
    #[darling(default)]
    required: bool,

    /// Comma-separated list of allowed literal values
    #[darling(default)]
    one_of: Option<String>,

    /// Wire name override (defaults to camelCase of the field name)
    #[darling(default)]
    rename: Option<String>,

    /// Additional accepted wire name
    #[darling(multiple)]
    alias: Vec<String>,

    /// Not part of the catalog schema
    #[darling(default)]
    skip: bool,
}

/// Convert snake_case to camelCase
fn to_camel_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut upper_next = false;
    for ch in s.chars() {
        if ch == '_' {
            upper_next = !out.is_empty();
        } else if upper_next {
            out.extend(ch.to_uppercase());
            upper_next = false;
        } else {
            out.push(ch);
        }
    }
    out
}

fn default_crate_path() -> syn::Path {
    syn::parse_quote!(::surface_dispatch)
}

/// Derive macro for the Message trait
///
/// Generates a `name()` method that returns the variant name as a static string.
/// Use `#[message(rename = "...")]` on a variant to override its name, and
/// `#[message(krate = "path")]` on the enum when the trait is not reachable
/// through `::surface_dispatch`.
///
/// # Example
/// ```ignore
/// #[derive(Message, Clone, Debug)]
/// enum Inbound {
///     CreateSurface { surface_id: String },
///     #[message(rename = "Reset")]
///     DeleteSurface { surface_id: String },
/// }
///
/// assert_eq!(Inbound::DeleteSurface { surface_id: "a".into() }.name(), "Reset");
/// ```
#[proc_macro_derive(Message, attributes(message))]
pub fn derive_message(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let opts = match MessageOpts::from_derive_input(&input) {
        Ok(opts) => opts,
        Err(e) => return e.write_errors().into(),
    };

    let name = &opts.ident;
    let krate = opts.krate.clone().unwrap_or_else(default_crate_path);

    let variants = match &opts.data {
        darling::ast::Data::Enum(variants) => variants,
        _ => {
            return syn::Error::new_spanned(&input, "Message can only be derived for enums")
                .to_compile_error()
                .into();
        }
    };

    let name_arms = variants.iter().map(|v| {
        let variant_name = &v.ident;
        let variant_str = v.rename.clone().unwrap_or_else(|| variant_name.to_string());

        match &v.fields.style {
            darling::ast::Style::Unit => quote! {
                #name::#variant_name => #variant_str
            },
            darling::ast::Style::Tuple => quote! {
                #name::#variant_name(..) => #variant_str
            },
            darling::ast::Style::Struct => quote! {
                #name::#variant_name { .. } => #variant_str
            },
        }
    });

    let expanded = quote! {
        impl #krate::Message for #name {
            fn name(&self) -> &'static str {
                match self {
                    #(#name_arms),*
                }
            }
        }
    };

    TokenStream::from(expanded)
}

/// Derive macro for the ComponentProps trait
///
/// Builds the catalog schema of a component kind from its typed property
/// struct. Every named field becomes a known property; the wire name is the
/// camelCase form of the field name unless overridden.
///
/// # Example
/// ```ignore
/// #[derive(ComponentProps, Deserialize, Debug, Clone, Default, PartialEq)]
/// #[serde(rename_all = "camelCase")]
/// struct TextProps {
///     #[props(required)]
///     text: Option<BoundValue>,
///     #[props(one_of = "h1,h2,h3,body,caption", alias = "usageHint")]
///     #[serde(alias = "usageHint")]
///     variant: Option<BoundValue>,
/// }
///
/// assert_eq!(TextProps::KIND, "Text");
/// assert!(TextProps::PROPERTIES[0].required);
/// ```
#[proc_macro_derive(ComponentProps, attributes(props))]
pub fn derive_component_props(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let opts = match PropsOpts::from_derive_input(&input) {
        Ok(opts) => opts,
        Err(e) => return e.write_errors().into(),
    };

    let name = &opts.ident;
    let krate = opts.krate.clone().unwrap_or_else(default_crate_path);
    let kind = opts.kind.clone().unwrap_or_else(|| {
        let ident = name.to_string();
        let stripped = ident
            .strip_suffix("Props")
            .filter(|stripped| !stripped.is_empty())
            .map(str::to_string);
        stripped.unwrap_or(ident)
    });

    let fields = match &opts.data {
        darling::ast::Data::Struct(fields) => fields,
        _ => {
            return syn::Error::new_spanned(&input, "ComponentProps requires named fields")
                .to_compile_error()
                .into();
        }
    };

    let mut properties = Vec::new();
    for field in fields.iter().filter(|f| !f.skip) {
        let Some(ident) = &field.ident else {
            continue;
        };
        let wire_name = field
            .rename
            .clone()
            .unwrap_or_else(|| to_camel_case(&ident.to_string()));
        let aliases = &field.alias;
        let required = field.required;

        let allowed = match &field.one_of {
            Some(list) => {
                let values: Vec<String> = list
                    .split(',')
                    .map(|v| v.trim().to_string())
                    .filter(|v| !v.is_empty())
                    .collect();
                if values.is_empty() {
                    return syn::Error::new_spanned(ident, "one_of must list at least one value")
                        .to_compile_error()
                        .into();
                }
                quote! { ::core::option::Option::Some(&[#(#values),*]) }
            }
            None => quote! { ::core::option::Option::None },
        };

        properties.push(quote! {
            #krate::catalog::PropertySchema {
                name: #wire_name,
                aliases: &[#(#aliases),*],
                required: #required,
                allowed: #allowed,
            }
        });
    }

    let expanded = quote! {
        impl #krate::catalog::ComponentProps for #name {
            const KIND: &'static str = #kind;
            const PROPERTIES: &'static [#krate::catalog::PropertySchema] = &[
                #(#properties),*
            ];
        }
    };

    TokenStream::from(expanded)
}
