//! Parsing for `#[derive(Bind)]`.
//!
//! Reads the `#[bind(...)]` field attributes and classifies each field type
//! into the value kind the binder works with.

use syn::{
    ext::IdentExt, punctuated::Punctuated, spanned::Spanned, Attribute, Expr, ExprLit, Field,
    GenericArgument, Ident, Lit, Meta, PathArguments, Token, Type,
};

/// Types parsed with `FromStr` without needing a query key.
const SCALARS: &[&str] = &[
    "bool", "char", "i8", "i16", "i32", "i64", "i128", "isize", "u8", "u16", "u32", "u64", "u128",
    "usize", "f32", "f64",
];

/// Options from the `#[bind(...)]` attributes on one field.
#[derive(Debug, Default)]
pub struct FieldAttrs {
    /// Query-string key.
    pub query: Option<String>,
    /// Extra path parameter name.
    pub path: Option<String>,
    /// Name used in place of the Rust identifier.
    pub rename: Option<String>,
    /// The binder must never write this field.
    pub readonly: bool,
    /// The field is the Data Bag.
    pub data: bool,
}

impl FieldAttrs {
    /// Collects every `#[bind(...)]` attribute on a field.
    pub fn from_attrs(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut parsed = Self::default();

        for attr in attrs.iter().filter(|a| a.path().is_ident("bind")) {
            let metas = attr.parse_args_with(Punctuated::<Meta, Token![,]>::parse_terminated)?;
            for meta in metas {
                parsed.apply(&meta)?;
            }
        }

        Ok(parsed)
    }

    fn apply(&mut self, meta: &Meta) -> syn::Result<()> {
        match meta {
            Meta::Path(path) => {
                let ident = path
                    .get_ident()
                    .ok_or_else(|| syn::Error::new(path.span(), "expected identifier"))?;
                match ident.to_string().as_str() {
                    "readonly" => self.readonly = true,
                    "data" => self.data = true,
                    other => {
                        return Err(syn::Error::new(
                            ident.span(),
                            format!("unknown bind option: {other}"),
                        ))
                    }
                }
            }
            Meta::NameValue(nv) => {
                let ident = nv
                    .path
                    .get_ident()
                    .ok_or_else(|| syn::Error::new(nv.path.span(), "expected identifier"))?
                    .to_string();

                let value = match &nv.value {
                    Expr::Lit(ExprLit {
                        lit: Lit::Str(s), ..
                    }) => s.value(),
                    _ => {
                        return Err(syn::Error::new(
                            nv.value.span(),
                            "expected string literal",
                        ))
                    }
                };

                if value.is_empty() {
                    return Err(syn::Error::new(nv.value.span(), "name must not be empty"));
                }

                let slot = match ident.as_str() {
                    "query" => &mut self.query,
                    "path" => &mut self.path,
                    "rename" => &mut self.rename,
                    _ => {
                        return Err(syn::Error::new(
                            nv.path.span(),
                            format!("unknown bind option: {ident}"),
                        ))
                    }
                };
                if slot.replace(value).is_some() {
                    return Err(syn::Error::new(
                        nv.path.span(),
                        format!("duplicate bind option: {ident}"),
                    ));
                }
            }
            Meta::List(list) => {
                return Err(syn::Error::new(list.span(), "expected `name` or `name = \"...\"`"))
            }
        }
        Ok(())
    }
}

/// How a field's value is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueKind {
    /// A `String`, written in place.
    Text,
    /// Parsed from a string with `FromStr`.
    Scalar {
        /// The type handed to `FromStr`.
        target: Type,
        /// Whether the field is `Option<target>`.
        optional: bool,
    },
    /// A string-keyed map of JSON values.
    Map,
    /// Anything else; never written by the binder.
    Other,
}

/// A fully parsed field.
#[derive(Debug)]
pub struct BindField {
    /// The Rust identifier.
    pub ident: Ident,
    /// Name the resolver matches against.
    pub name: String,
    /// Parsed options.
    pub attrs: FieldAttrs,
    /// Value kind.
    pub kind: ValueKind,
    /// Whether this field is the Data Bag.
    pub is_data_bag: bool,
}

impl BindField {
    /// Parses a named struct field.
    pub fn parse(field: &Field) -> syn::Result<Self> {
        let ident = field
            .ident
            .clone()
            .ok_or_else(|| syn::Error::new(field.span(), "expected a named field"))?;
        let attrs = FieldAttrs::from_attrs(&field.attrs)?;
        let name = attrs.rename.clone().unwrap_or_else(|| ident.unraw().to_string());
        let kind = classify(&field.ty, attrs.query.is_some());

        if attrs.data && kind != ValueKind::Map {
            return Err(syn::Error::new(
                field.ty.span(),
                "`data` requires a map of JSON values, e.g. `serde_json::Map<String, Value>`",
            ));
        }
        if attrs.query.is_some() && attrs.readonly {
            return Err(syn::Error::new(
                field.span(),
                "a read-only field cannot take a query key",
            ));
        }
        if attrs.query.is_some() && !matches!(kind, ValueKind::Text | ValueKind::Scalar { .. }) {
            return Err(syn::Error::new(
                field.ty.span(),
                "query keys are only supported on text and `FromStr` fields",
            ));
        }

        let is_data_bag = kind == ValueKind::Map && (attrs.data || name == "data");

        Ok(Self {
            ident,
            name,
            attrs,
            kind,
            is_data_bag,
        })
    }
}

/// Classifies a field type.
///
/// `queried` widens `Scalar` to any path type, on the assumption it
/// implements `FromStr`.
pub fn classify(ty: &Type, queried: bool) -> ValueKind {
    let Type::Path(type_path) = ty else {
        return ValueKind::Other;
    };
    if type_path.qself.is_some() {
        return ValueKind::Other;
    }
    let Some(segment) = type_path.path.segments.last() else {
        return ValueKind::Other;
    };
    let name = segment.ident.to_string();

    if name == "String" {
        return ValueKind::Text;
    }
    if name.ends_with("Map") {
        return if holds_json_values(&segment.arguments) {
            ValueKind::Map
        } else {
            ValueKind::Other
        };
    }
    if name == "Option" {
        return match single_type_argument(&segment.arguments) {
            Some(inner) if is_parseable(inner, queried) => ValueKind::Scalar {
                target: inner.clone(),
                optional: true,
            },
            _ => ValueKind::Other,
        };
    }
    if is_parseable(ty, queried) {
        return ValueKind::Scalar {
            target: ty.clone(),
            optional: false,
        };
    }
    ValueKind::Other
}

fn is_parseable(ty: &Type, queried: bool) -> bool {
    let Type::Path(type_path) = ty else {
        return false;
    };
    let Some(segment) = type_path.path.segments.last() else {
        return false;
    };
    if !segment.arguments.is_none() {
        return false;
    }
    let name = segment.ident.to_string();
    name == "String" || SCALARS.contains(&name.as_str()) || (queried && !name.ends_with("Map"))
}

/// True for `Map` with no arguments (serde_json's alias) or a map whose last
/// type argument is `Value`.
fn holds_json_values(arguments: &PathArguments) -> bool {
    let PathArguments::AngleBracketed(args) = arguments else {
        return arguments.is_none();
    };
    match args.args.last() {
        Some(GenericArgument::Type(Type::Path(value))) => value
            .path
            .segments
            .last()
            .is_some_and(|segment| segment.ident == "Value" && segment.arguments.is_none()),
        _ => false,
    }
}

fn single_type_argument(arguments: &PathArguments) -> Option<&Type> {
    let PathArguments::AngleBracketed(args) = arguments else {
        return None;
    };
    match (args.args.len(), args.args.first()) {
        (1, Some(GenericArgument::Type(inner))) => Some(inner),
        _ => None,
    }
}
