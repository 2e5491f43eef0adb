use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{
    Data, DeriveInput, Fields, GenericParam, Generics, Index, LitStr, Member, Visibility,
    parse_macro_input, parse_quote,
};

use crate::support::{attrs, diag};

pub fn derive(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match expand(input) {
        Ok(ts) => ts.into(),
        Err(e) => diag::emit(e),
    }
}

/// One reflected field.
struct Reflected {
    member: Member,
    name: String,
    tag: String,
    exported: bool,
}

fn expand(input: DeriveInput) -> syn::Result<TokenStream2> {
    let struct_name = &input.ident;

    let container = attrs::parse_flags(&input.attrs, "reflect")?;
    container.only(&["self_validate"])?;

    let fields = match &input.data {
        Data::Struct(data) => &data.fields,
        _ => {
            return Err(diag::spanned(
                struct_name,
                "Reflect derive can only be used on structs",
            ));
        }
    };

    let reflected = collect_fields(fields)?;
    let generics = bounded_generics(&input.generics)?;
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let type_name = LitStr::new(&struct_name.to_string(), struct_name.span());
    let infos = reflected.iter().map(|field| {
        let name = &field.name;
        let tag = &field.tag;
        let exported = field.exported;
        quote! { ::fieldtag::FieldInfo::new(#name, #tag, #exported) }
    });
    let indices: Vec<usize> = (0..reflected.len()).collect();
    let members: Vec<&Member> = reflected.iter().map(|field| &field.member).collect();

    let self_validate = container.has("self_validate").then(|| {
        quote! {
            fn self_validate(
                &self,
            ) -> ::core::option::Option<::core::result::Result<(), ::fieldtag::ValidationError>> {
                ::core::option::Option::Some(<Self as ::fieldtag::SelfValidate>::validate(self))
            }
        }
    });

    Ok(quote! {
        impl #impl_generics ::fieldtag::Reflect for #struct_name #ty_generics #where_clause {
            fn value(&self) -> ::fieldtag::Value<'_> {
                ::fieldtag::Value::Struct(self)
            }

            fn value_mut(&mut self) -> ::fieldtag::ValueMut<'_> {
                ::fieldtag::ValueMut::Struct(self)
            }
        }

        impl #impl_generics ::fieldtag::Struct for #struct_name #ty_generics #where_clause {
            fn type_name(&self) -> &'static str {
                #type_name
            }

            fn fields(&self) -> &'static [::fieldtag::FieldInfo] {
                const FIELDS: &[::fieldtag::FieldInfo] = &[#(#infos),*];
                FIELDS
            }

            fn field(&self, index: usize) -> ::core::option::Option<&dyn ::fieldtag::Reflect> {
                match index {
                    #(#indices => ::core::option::Option::Some(&self.#members),)*
                    _ => ::core::option::Option::None,
                }
            }

            fn field_mut(
                &mut self,
                index: usize,
            ) -> ::core::option::Option<&mut dyn ::fieldtag::Reflect> {
                match index {
                    #(#indices => ::core::option::Option::Some(&mut self.#members),)*
                    _ => ::core::option::Option::None,
                }
            }

            #self_validate
        }
    })
}

fn collect_fields(fields: &Fields) -> syn::Result<Vec<Reflected>> {
    let mut reflected = Vec::new();

    for (position, field) in fields.iter().enumerate() {
        let flags = attrs::parse_flags(&field.attrs, "reflect")?;
        flags.only(&["skip"])?;
        if flags.has("skip") {
            continue;
        }

        let (member, name) = match &field.ident {
            Some(ident) => (Member::Named(ident.clone()), ident.to_string()),
            None => (Member::Unnamed(Index::from(position)), position.to_string()),
        };

        reflected.push(Reflected {
            member,
            name: name.trim_start_matches("r#").to_string(),
            tag: attrs::parse_tags(&field.attrs, "tag")?,
            exported: matches!(field.vis, Visibility::Public(_)),
        });
    }

    Ok(reflected)
}

/// Adds a `Reflect` bound to every type parameter.
///
/// `Reflect` values are `'static`, so lifetime parameters are rejected.
fn bounded_generics(generics: &Generics) -> syn::Result<Generics> {
    let mut generics = generics.clone();

    if let Some(lifetime) = generics.lifetimes().next() {
        return Err(diag::spanned(
            lifetime,
            "Reflect derive does not support lifetime parameters",
        ));
    }

    let bounded: Vec<_> = generics
        .params
        .iter()
        .filter_map(|param| match param {
            GenericParam::Type(ty) => Some(ty.ident.clone()),
            _ => None,
        })
        .collect();

    let where_clause = generics.make_where_clause();
    for ident in bounded {
        where_clause
            .predicates
            .push(parse_quote!(#ident: ::fieldtag::Reflect));
    }

    Ok(generics)
}
