use crate::utils::{apply_derives, ensure_required_fields};
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::meta::ParseNestedMeta;
use syn::spanned::Spanned;
use syn::{Attribute, Fields, ItemStruct, LitBool, Type, parse_macro_input};

/// `#[entity(id = IdType, debug = true|false)]`
///
/// - 补齐 `id: IdType`（默认 `String`）与 `version: usize`，置于字段最前；
/// - `version` 不参与序列化：快照单独记录版本，还原时由 `set_version` 写回；
/// - 派生 Clone/Default/Serialize/Deserialize，`debug = false` 时不派生 Debug；
/// - 实现 `::es_domain::entity::Entity`。
pub(crate) fn expand(attr: TokenStream, item: TokenStream) -> TokenStream {
    let mut args = EntityArgs::default();
    let parser = syn::meta::parser(|meta| args.parse(meta));
    parse_macro_input!(attr with parser);
    let st = parse_macro_input!(item as ItemStruct);

    expand_struct(args, st)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

#[derive(Default)]
struct EntityArgs {
    id: Option<Type>,
    debug: Option<bool>,
}

impl EntityArgs {
    fn parse(&mut self, meta: ParseNestedMeta) -> syn::Result<()> {
        if meta.path.is_ident("id") {
            if self.id.is_some() {
                return Err(meta.error("duplicate `id`"));
            }
            self.id = Some(meta.value()?.parse()?);
        } else if meta.path.is_ident("debug") {
            if self.debug.is_some() {
                return Err(meta.error("duplicate `debug`"));
            }
            let flag: LitBool = meta.value()?.parse()?;
            self.debug = Some(flag.value);
        } else {
            return Err(meta.error("expected `id` or `debug`"));
        }
        Ok(())
    }
}

fn expand_struct(args: EntityArgs, mut st: ItemStruct) -> syn::Result<TokenStream2> {
    let id_type = args.id.unwrap_or_else(|| syn::parse_quote!(String));
    let version_type: Type = syn::parse_quote!(usize);

    let fields_span = st.fields.span();
    let Fields::Named(fields) = &mut st.fields else {
        return Err(syn::Error::new(
            fields_span,
            "#[entity] requires a struct with named fields",
        ));
    };
    ensure_required_fields(
        fields,
        &[("id", &id_type), ("version", &version_type)],
        true,
    );
    if let Some(version) = fields
        .named
        .iter_mut()
        .find(|f| f.ident.as_ref().is_some_and(|i| i == "version"))
    {
        version.attrs.retain(|a| !is_serde_attr(a));
        version.attrs.push(syn::parse_quote!(#[serde(skip)]));
    }

    let mut derives: Vec<syn::Path> = vec![
        syn::parse_quote!(Clone),
        syn::parse_quote!(Default),
        syn::parse_quote!(serde::Serialize),
        syn::parse_quote!(serde::Deserialize),
    ];
    if args.debug.unwrap_or(true) {
        derives.insert(0, syn::parse_quote!(Debug));
    }
    apply_derives(&mut st.attrs, derives);

    let ident = &st.ident;
    let (impl_generics, ty_generics, where_clause) = st.generics.split_for_impl();

    Ok(quote! {
        #st

        impl #impl_generics ::es_domain::entity::Entity for #ident #ty_generics #where_clause {
            type Id = #id_type;

            fn new(id: Self::Id, version: usize) -> Self {
                Self { id, version, ..::std::default::Default::default() }
            }

            fn id(&self) -> &Self::Id {
                &self.id
            }

            fn version(&self) -> usize {
                self.version
            }

            fn set_version(&mut self, version: usize) {
                self.version = version;
            }
        }
    })
}

fn is_serde_attr(attr: &Attribute) -> bool {
    attr.path().is_ident("serde")
}
