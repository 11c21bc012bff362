//! Derive macros for blinc_bind
//!
//! - `#[derive(Bindable)]` emits property descriptors for the fields of a
//!   struct tagged with `#[bind(...)]`
//! - `#[derive(Choice)]` makes a fieldless enum bindable as a choice
//!
//! Generated code refers to the runtime crate as `::blinc_bind`.

use proc_macro::TokenStream;
use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Expr, ExprArray, Field, Fields, Ident, LitStr};

/// Derive `blinc_bind::Bindable` for a struct with named fields
///
/// Only fields carrying a `#[bind]` attribute are bindable. Recognised keys:
///
/// - `skip`: leave the field out
/// - `readonly`: expose the field without a setter
/// - `flatten`: lift the bindable fields of a nested `Bindable` value
/// - `label = "..."`: display label
/// - `control = slider`: preferred control (`text`, `number`, `slider`,
///   `toggle`, `vector`, `choice`, `multi_choice`)
/// - `min = 0`, `max = 100`: numeric bounds
/// - `values = ["a", "b"]`: fixed set of selectable values
#[proc_macro_derive(Bindable, attributes(bind))]
pub fn derive_bindable(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand_bindable(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

/// Derive `blinc_bind::ValueType` and `blinc_bind::BindEq` for a fieldless enum
///
/// Variants are exchanged by name as `BindValue::Choice`. The enum must also
/// implement `Clone`.
#[proc_macro_derive(Choice)]
pub fn derive_choice(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand_choice(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

// =============================================================================
// BINDABLE
// =============================================================================

/// `#[bind(control = ...)]` names and the `ControlKind` variants they select
const CONTROLS: &[(&str, &str)] = &[
    ("text", "Text"),
    ("number", "Number"),
    ("slider", "Slider"),
    ("toggle", "Toggle"),
    ("vector", "Vector"),
    ("choice", "Choice"),
    ("multi_choice", "MultiChoice"),
];

#[derive(Default)]
struct FieldAttrs {
    tagged: bool,
    skip: bool,
    readonly: bool,
    flatten: bool,
    label: Option<LitStr>,
    control: Option<Ident>,
    min: Option<Expr>,
    max: Option<Expr>,
    values: Vec<Expr>,
}

impl FieldAttrs {
    fn has_metadata(&self) -> bool {
        self.readonly
            || self.label.is_some()
            || self.control.is_some()
            || self.min.is_some()
            || self.max.is_some()
            || !self.values.is_empty()
    }
}

fn parse_control(name: &str, span: Span) -> syn::Result<Ident> {
    CONTROLS
        .iter()
        .find(|(key, _)| *key == name)
        .map(|(_, variant)| Ident::new(variant, span))
        .ok_or_else(|| {
            let known: Vec<&str> = CONTROLS.iter().map(|(key, _)| *key).collect();
            syn::Error::new(
                span,
                format!("unknown control `{}`, expected one of: {}", name, known.join(", ")),
            )
        })
}

fn parse_field_attrs(field: &Field) -> syn::Result<FieldAttrs> {
    let mut attrs = FieldAttrs::default();

    for attr in &field.attrs {
        if !attr.path().is_ident("bind") {
            continue;
        }
        attrs.tagged = true;
        if matches!(attr.meta, syn::Meta::Path(_)) {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("skip") {
                attrs.skip = true;
            } else if meta.path.is_ident("readonly") {
                attrs.readonly = true;
            } else if meta.path.is_ident("flatten") {
                attrs.flatten = true;
            } else if meta.path.is_ident("label") {
                attrs.label = Some(meta.value()?.parse()?);
            } else if meta.path.is_ident("control") {
                let value = meta.value()?;
                let control = if value.peek(LitStr) {
                    let name: LitStr = value.parse()?;
                    parse_control(&name.value(), name.span())?
                } else {
                    let name: Ident = value.parse()?;
                    parse_control(&name.to_string(), name.span())?
                };
                attrs.control = Some(control);
            } else if meta.path.is_ident("min") {
                attrs.min = Some(meta.value()?.parse()?);
            } else if meta.path.is_ident("max") {
                attrs.max = Some(meta.value()?.parse()?);
            } else if meta.path.is_ident("values") {
                let values: ExprArray = meta.value()?.parse()?;
                attrs.values = values.elems.into_iter().collect();
            } else {
                return Err(meta.error("unknown bind attribute"));
            }
            Ok(())
        })?;
    }

    Ok(attrs)
}

fn attrs_expr(attrs: &FieldAttrs) -> TokenStream2 {
    let mut expr = quote! { ::blinc_bind::BindAttrs::new() };
    if let Some(label) = &attrs.label {
        expr = quote! { #expr.label(#label) };
    }
    if !attrs.values.is_empty() {
        let values = &attrs.values;
        expr = quote! { #expr.values([#(::blinc_bind::BindValue::from(#values)),*]) };
    }
    if let Some(control) = &attrs.control {
        expr = quote! { #expr.control(::blinc_bind::ControlKind::#control) };
    }
    if let Some(min) = &attrs.min {
        expr = quote! { #expr.min((#min) as f64) };
    }
    if let Some(max) = &attrs.max {
        expr = quote! { #expr.max((#max) as f64) };
    }
    if attrs.readonly {
        expr = quote! { #expr.readonly() };
    }
    expr
}

fn expand_bindable(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &input.ident,
                    "Bindable can only be derived for structs with named fields",
                ))
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input.ident,
                "Bindable can only be derived for structs",
            ))
        }
    };

    let mut pushes = Vec::new();
    for field in fields {
        let attrs = parse_field_attrs(field)?;
        if !attrs.tagged || attrs.skip {
            continue;
        }

        let Some(ident) = &field.ident else {
            continue;
        };
        let ty = &field.ty;

        if attrs.flatten {
            if attrs.has_metadata() {
                return Err(syn::Error::new_spanned(
                    ident,
                    "`flatten` cannot be combined with other bind attributes",
                ));
            }
            pushes.push(quote! {
                descriptors.extend(
                    <#ty as ::blinc_bind::Bindable>::descriptors()
                        .into_iter()
                        .map(|descriptor| {
                            descriptor.project(|s: &Self| &s.#ident, |s: &mut Self| &mut s.#ident)
                        }),
                );
            });
            continue;
        }

        let name = LitStr::new(&ident.to_string(), ident.span());
        let attrs = attrs_expr(&attrs);
        pushes.push(quote! {
            descriptors.push(::blinc_bind::PropertyDescriptor::field::<#ty, _, _>(
                #name,
                #attrs,
                |s: &Self| &s.#ident,
                |s: &mut Self| &mut s.#ident,
            ));
        });
    }

    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::blinc_bind::Bindable for #name #ty_generics #where_clause {
            fn descriptors() -> ::std::vec::Vec<::blinc_bind::PropertyDescriptor<Self>> {
                #[allow(unused_mut)]
                let mut descriptors = ::std::vec::Vec::new();
                #(#pushes)*
                descriptors
            }
        }
    })
}

// =============================================================================
// CHOICE
// =============================================================================

fn expand_choice(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let Data::Enum(data) = &input.data else {
        return Err(syn::Error::new_spanned(
            &input.ident,
            "Choice can only be derived for enums",
        ));
    };
    if data.variants.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.ident,
            "Choice requires at least one variant",
        ));
    }
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Choice cannot be derived for generic enums",
        ));
    }

    let mut variants = Vec::new();
    for variant in &data.variants {
        if !matches!(variant.fields, Fields::Unit) {
            return Err(syn::Error::new_spanned(
                variant,
                "Choice variants cannot carry fields",
            ));
        }
        variants.push(&variant.ident);
    }

    let name = &input.ident;
    let type_name = LitStr::new(&name.to_string(), name.span());
    let labels: Vec<LitStr> = variants
        .iter()
        .map(|v| LitStr::new(&v.to_string(), v.span()))
        .collect();

    Ok(quote! {
        impl ::blinc_bind::ValueType for #name {
            fn kind() -> ::blinc_bind::ValueKind {
                ::blinc_bind::ValueKind::Choice
            }

            fn to_value(&self) -> ::blinc_bind::BindValue {
                let name = match self {
                    #(Self::#variants => #labels,)*
                };
                ::blinc_bind::BindValue::Choice(::std::string::String::from(name))
            }

            fn from_value(value: ::blinc_bind::BindValue) -> ::blinc_bind::Result<Self> {
                let name = match value {
                    ::blinc_bind::BindValue::Choice(name) | ::blinc_bind::BindValue::Text(name) => name,
                    other => {
                        return ::std::result::Result::Err(::blinc_bind::BindError::TypeMismatch {
                            expected: ::blinc_bind::ValueKind::Choice,
                            found: other.type_name(),
                        })
                    }
                };
                match name.as_str() {
                    #(#labels => ::std::result::Result::Ok(Self::#variants),)*
                    _ => ::std::result::Result::Err(::blinc_bind::BindError::UnknownChoice {
                        value: name.clone(),
                        type_name: #type_name,
                    }),
                }
            }

            fn choices() -> ::std::vec::Vec<::blinc_bind::BindValue> {
                ::std::vec![
                    #(::blinc_bind::BindValue::Choice(::std::string::String::from(#labels)),)*
                ]
            }
        }

        impl ::blinc_bind::BindEq for #name {
            fn bind_eq(&self, other: &Self) -> bool {
                ::std::mem::discriminant(self) == ::std::mem::discriminant(other)
            }
        }
    })
}
