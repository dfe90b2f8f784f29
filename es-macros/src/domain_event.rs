use crate::utils::{apply_derives, ensure_required_fields};
use proc_macro::TokenStream;
use quote::quote;
use syn::punctuated::Punctuated;
use syn::spanned::Spanned;
use syn::{Expr, Ident, Item, LitStr, Result, Token, Type, parse::Parse, parse::ParseStream};

#[derive(Clone, Copy, PartialEq, Eq)]
enum Sequencing {
    Version,
    Timestamp,
}

impl Sequencing {
    fn parse_lit(lit: &LitStr) -> Result<Self> {
        match lit.value().as_str() {
            "version" => Ok(Sequencing::Version),
            "timestamp" => Ok(Sequencing::Timestamp),
            _ => Err(syn::Error::new(
                lit.span(),
                "expected \"version\" or \"timestamp\" for 'sequencing'",
            )),
        }
    }
}

struct VariantInfo {
    ident: Ident,
    topic: String,
    sequencing: Sequencing,
}

/// #[domain_event] 宏实现
/// - 支持具名字段变体 `Variant { .. }` 与单元变体 `Variant`（转换为具名字段变体）
/// - 确保每个变体具备 `originator_id: String`、`timestamp: Timestamp`，
///   按版本排序的变体额外具备 `originator_version: usize`
/// - 派生 Debug/Clone/PartialEq/Serialize/Deserialize
/// - 生成 `Sequenced`（序列 ID/位置/主题/主题表）与 `DomainEvent` 实现
/// - 主题默认 `"Enum.Variant"`，可通过 `#[event(topic = "...")]` 覆写
pub(crate) fn expand(attr: TokenStream, item: TokenStream) -> TokenStream {
    match expand_inner(attr.into(), item.into()) {
        Ok(ts) => ts.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand_inner(
    attr: proc_macro2::TokenStream,
    item: proc_macro2::TokenStream,
) -> Result<proc_macro2::TokenStream> {
    let cfg: EventAttrConfig = syn::parse2(attr)?;
    let mut input: Item = syn::parse2(item)?;

    let enum_item = match &mut input {
        Item::Enum(e) => e,
        other => {
            return Err(syn::Error::new(
                other.span(),
                "#[domain_event] can only be used on enum types",
            ));
        }
    };

    let required: Vec<syn::Path> = vec![
        syn::parse_quote!(Debug),
        syn::parse_quote!(Clone),
        syn::parse_quote!(PartialEq),
        syn::parse_quote!(serde::Serialize),
        syn::parse_quote!(serde::Deserialize),
    ];
    apply_derives(&mut enum_item.attrs, required);

    let enum_name = enum_item.ident.to_string();
    let default_sequencing = cfg.sequencing.unwrap_or(Sequencing::Version);
    let id_ty: Type = syn::parse_quote! { String };
    let version_ty: Type = syn::parse_quote! { usize };
    let timestamp_ty: Type = syn::parse_quote! { ::es_domain::domain_event::Timestamp };

    let mut variants = Vec::new();
    for v in &mut enum_item.variants {
        if matches!(v.fields, syn::Fields::Unit) {
            v.fields = syn::Fields::Named(syn::parse_quote!({}));
        }
        let fields_named = match &mut v.fields {
            syn::Fields::Named(f) => f,
            _ => {
                return Err(syn::Error::new(
                    v.span(),
                    "#[domain_event] supports only named-field or unit variants, e.g., Variant { x: T }",
                ));
            }
        };

        let mut retained_attrs = Vec::new();
        let mut topic: Option<LitStr> = None;
        let mut sequencing: Option<Sequencing> = None;
        for attr in v.attrs.iter() {
            if attr.path().is_ident("event") {
                let vc = parse_variant_event_attr(attr)?;
                if vc.topic.is_some() {
                    if topic.is_some() {
                        return Err(syn::Error::new(
                            attr.span(),
                            "duplicate 'topic' specified for this variant",
                        ));
                    }
                    topic = vc.topic;
                }
                if vc.sequencing.is_some() {
                    if sequencing.is_some() {
                        return Err(syn::Error::new(
                            attr.span(),
                            "duplicate 'sequencing' specified for this variant",
                        ));
                    }
                    sequencing = vc.sequencing;
                }
            } else {
                retained_attrs.push(attr.clone());
            }
        }
        v.attrs = retained_attrs;

        let sequencing = sequencing.unwrap_or(default_sequencing);
        let mut required_fields: Vec<(&str, &Type)> = vec![("originator_id", &id_ty)];
        if sequencing == Sequencing::Version {
            required_fields.push(("originator_version", &version_ty));
        }
        required_fields.push(("timestamp", &timestamp_ty));
        ensure_required_fields(fields_named, &required_fields, false);

        let topic = topic
            .map(|lit| lit.value())
            .unwrap_or_else(|| format!("{}.{}", enum_name, v.ident));
        variants.push(VariantInfo {
            ident: v.ident.clone(),
            topic,
            sequencing,
        });
    }

    let mut seen = std::collections::HashSet::new();
    for info in &variants {
        if !seen.insert(info.topic.as_str()) {
            return Err(syn::Error::new(
                info.ident.span(),
                format!("duplicate topic '{}'", info.topic),
            ));
        }
    }

    let enum_ident = &enum_item.ident;

    let id_arms = variants.iter().map(|info| {
        let v = &info.ident;
        quote! { Self::#v { originator_id, .. } => originator_id.as_str() }
    });
    let topic_arms = variants.iter().map(|info| {
        let v = &info.ident;
        let topic = &info.topic;
        quote! { Self::#v { .. } => #topic }
    });
    let position_arms = variants.iter().map(|info| {
        let v = &info.ident;
        match info.sequencing {
            Sequencing::Version => {
                quote! { Self::#v { originator_version, .. } => *originator_version as u64 }
            }
            Sequencing::Timestamp => quote! {
                Self::#v { timestamp, .. } => ::es_domain::domain_event::timestamp_position(timestamp)
            },
        }
    });
    let version_arms = variants.iter().map(|info| {
        let v = &info.ident;
        match info.sequencing {
            Sequencing::Version => quote! {
                Self::#v { originator_version, .. } => ::std::option::Option::Some(*originator_version)
            },
            Sequencing::Timestamp => quote! { Self::#v { .. } => ::std::option::Option::None },
        }
    });
    let timestamp_arms = variants.iter().map(|info| {
        let v = &info.ident;
        quote! { Self::#v { timestamp, .. } => *timestamp }
    });
    let topics = variants.iter().map(|info| &info.topic);

    Ok(quote! {
        #enum_item

        impl ::es_domain::persist::Sequenced for #enum_ident {
            fn sequence_id(&self) -> &str { match self { #( #id_arms, )* } }
            fn position(&self) -> u64 { match self { #( #position_arms, )* } }
            fn topic(&self) -> &str { match self { #( #topic_arms, )* } }
            fn known_topics() -> ::std::option::Option<&'static [&'static str]> {
                ::std::option::Option::Some(&[ #( #topics ),* ])
            }
        }

        impl ::es_domain::domain_event::DomainEvent for #enum_ident {
            fn originator_version(&self) -> ::std::option::Option<usize> {
                match self { #( #version_arms, )* }
            }
            fn timestamp(&self) -> ::es_domain::domain_event::Timestamp {
                match self { #( #timestamp_arms, )* }
            }
        }
    })
}

// -------- parsing --------

struct VariantEventAttrConfig {
    topic: Option<LitStr>,
    sequencing: Option<Sequencing>,
}

fn parse_variant_event_attr(attr: &syn::Attribute) -> Result<VariantEventAttrConfig> {
    let mut topic: Option<LitStr> = None;
    let mut sequencing: Option<Sequencing> = None;
    let pairs: Punctuated<AttrKv, Token![,]> =
        attr.parse_args_with(Punctuated::<AttrKv, Token![,]>::parse_terminated)?;

    for kv in pairs {
        match kv.key.to_string().as_str() {
            "topic" => {
                if topic.is_some() {
                    return Err(syn::Error::new(
                        kv.key.span(),
                        "duplicate key 'topic' in attribute",
                    ));
                }
                topic = Some(kv.str_value("topic")?);
            }
            "sequencing" => {
                if sequencing.is_some() {
                    return Err(syn::Error::new(
                        kv.key.span(),
                        "duplicate key 'sequencing' in attribute",
                    ));
                }
                sequencing = Some(Sequencing::parse_lit(&kv.str_value("sequencing")?)?);
            }
            _ => {
                return Err(syn::Error::new(
                    kv.key.span(),
                    "unknown key; expected 'topic' | 'sequencing'",
                ));
            }
        }
    }

    Ok(VariantEventAttrConfig { topic, sequencing })
}

struct AttrKv {
    key: Ident,
    value: Expr,
}

impl AttrKv {
    fn str_value(&self, name: &str) -> Result<LitStr> {
        match &self.value {
            Expr::Lit(syn::ExprLit {
                lit: syn::Lit::Str(lit),
                ..
            }) => Ok(lit.clone()),
            other => Err(syn::Error::new(
                other.span(),
                format!("expected string literal for '{name}'"),
            )),
        }
    }
}

impl Parse for AttrKv {
    fn parse(input: ParseStream) -> Result<Self> {
        let key: Ident = input.parse()?;
        let _eq: Token![=] = input.parse()?;
        let value: Expr = input.parse()?;
        Ok(Self { key, value })
    }
}

// 枚举级配置：默认排序方式
struct EventAttrConfig {
    sequencing: Option<Sequencing>,
}

impl Parse for EventAttrConfig {
    fn parse(input: ParseStream) -> Result<Self> {
        let mut sequencing: Option<Sequencing> = None;
        let pairs: Punctuated<AttrKv, Token![,]> =
            Punctuated::<AttrKv, Token![,]>::parse_terminated(input)?;

        for kv in pairs {
            match kv.key.to_string().as_str() {
                "sequencing" => {
                    if sequencing.is_some() {
                        return Err(syn::Error::new(
                            kv.key.span(),
                            "duplicate key 'sequencing' in attribute",
                        ));
                    }
                    sequencing = Some(Sequencing::parse_lit(&kv.str_value("sequencing")?)?);
                }
                _ => {
                    return Err(syn::Error::new(
                        kv.key.span(),
                        "unknown key; expected 'sequencing'",
                    ));
                }
            }
        }

        Ok(Self { sequencing })
    }
}
