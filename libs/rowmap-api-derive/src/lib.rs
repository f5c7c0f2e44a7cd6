use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Fields, GenericArgument, LitStr, PathArguments, Type, Visibility};

/// Derive macro for row-materializable entities.
///
/// Generates an `rowmap_api::Entity` impl on the annotated struct:
///
/// - `shape() -> &'static Shape`: one `Member` per field, in declaration order.
/// - `assign(&mut self, member, &Value, &CoerceOptions)`: coerces and stores
///   a raw value into the member at that index.
///
/// `pub` fields are public properties; all other fields are non-public
/// storage (backing fields). The struct must implement `Default`.
///
/// Field attributes, all optional:
///
/// - `#[member(name = "UserName")]`: member name used for column matching.
/// - `#[member(readonly)]`: public but not writable; never assigned.
/// - `#[member(skip)]`: not part of the shape.
/// - `#[member(coerce)]`: treat a user type implementing `Coerce` as scalar.
///
/// # Example
///
/// ```ignore
/// #[derive(Entity, Default)]
/// pub struct User {
///     pub id: i64,
///     #[member(name = "userName")]
///     pub user_name: Option<String>,
///     #[member(name = "_joined")]
///     joined: NaiveDate,
/// }
/// ```
///
/// Fields of any other type (nested structs, collections) become composite
/// members: they resolve like any other member but are never assigned.
#[proc_macro_derive(Entity, attributes(member))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match derive_impl(&input) {
        Ok(tokens) => tokens.into(),
        Err(e) => e.to_compile_error().into(),
    }
}

fn derive_impl(input: &DeriveInput) -> Result<TokenStream2, syn::Error> {
    let name = &input.ident;
    let name_str = name.to_string();

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Entity does not support generic structs",
        ));
    }

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    name,
                    "Entity only supports structs with named fields",
                ))
            }
        },
        _ => return Err(syn::Error::new_spanned(name, "Entity only supports structs")),
    };

    let mut member_tokens = Vec::new();
    let mut assign_arms = Vec::new();
    // (public, lower-cased name) of every member so far.
    let mut seen: Vec<(bool, String)> = Vec::new();

    for field in fields {
        let field_name = field.ident.as_ref().ok_or_else(|| {
            syn::Error::new_spanned(field, "expected named field")
        })?;
        let field_ty = &field.ty;

        // Parse #[member(...)] attribute.
        let mut rename: Option<String> = None;
        let mut readonly = false;
        let mut skip = false;
        let mut force_scalar = false;

        for attr in &field.attrs {
            if !attr.path().is_ident("member") {
                continue;
            }
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("name") {
                    let value: LitStr = meta.value()?.parse()?;
                    rename = Some(value.value());
                } else if meta.path.is_ident("readonly") {
                    readonly = true;
                } else if meta.path.is_ident("skip") {
                    skip = true;
                } else if meta.path.is_ident("coerce") {
                    force_scalar = true;
                } else {
                    return Err(meta.error("unknown member attribute (expected name, readonly, skip or coerce)"));
                }
                Ok(())
            })?;
        }

        if skip {
            continue;
        }

        let public = matches!(field.vis, Visibility::Public(_));
        if readonly && !public {
            return Err(syn::Error::new_spanned(
                field_name,
                "#[member(readonly)] only applies to pub fields",
            ));
        }

        let member_name = rename.unwrap_or_else(|| {
            let raw = field_name.to_string();
            raw.strip_prefix("r#").map(str::to_string).unwrap_or(raw)
        });

        let folded = member_name.to_lowercase();
        if seen.iter().any(|(p, n)| *p == public && *n == folded) {
            return Err(syn::Error::new_spanned(
                field_name,
                format!("duplicate member name '{member_name}' (names are case-insensitive)"),
            ));
        }
        seen.push((public, folded));

        let index = member_tokens.len();
        let scalar = force_scalar || is_scalar_type(field_ty);
        let writable = !readonly;
        let access = if public {
            quote! { rowmap_api::shape::Access::Public }
        } else {
            quote! { rowmap_api::shape::Access::NonPublic }
        };

        let (target, nullable) = if scalar {
            (
                quote! { <#field_ty as rowmap_api::coerce::Coerce>::TARGET },
                quote! { <#field_ty as rowmap_api::coerce::Coerce>::NULLABLE },
            )
        } else {
            let ty_str = quote!(#field_ty).to_string().replace(' ', "");
            let nullable = option_inner(field_ty).is_some();
            (
                quote! { rowmap_api::coerce::TargetType::Composite(#ty_str) },
                quote! { #nullable },
            )
        };

        member_tokens.push(quote! {
            rowmap_api::shape::Member {
                name: #member_name,
                access: #access,
                writable: #writable,
                target: #target,
                nullable: #nullable,
            }
        });

        if scalar && writable {
            assign_arms.push(quote! {
                #index => {
                    self.#field_name =
                        <#field_ty as rowmap_api::coerce::Coerce>::coerce(__value, __opts)?;
                }
            });
        }
    }

    let expanded = quote! {
        impl rowmap_api::entity::Entity for #name {
            fn shape() -> &'static rowmap_api::shape::Shape {
                static SHAPE: rowmap_api::shape::Shape = rowmap_api::shape::Shape {
                    name: #name_str,
                    members: &[
                        #(#member_tokens),*
                    ],
                };
                &SHAPE
            }

            fn assign(
                &mut self,
                __member: usize,
                __value: &rowmap_api::value::Value<'_>,
                __opts: &rowmap_api::coerce::CoerceOptions,
            ) -> Result<(), rowmap_api::error::CoercionError> {
                match __member {
                    #(#assign_arms)*
                    _ => {}
                }
                Ok(())
            }
        }
    };

    Ok(expanded)
}

/// Types with a built-in `Coerce` impl, by last path segment.
const SCALAR_TYPES: &[&str] = &[
    "bool", "i8", "i16", "i32", "i64", "isize", "u8", "u16", "u32", "u64", "usize", "f32",
    "f64", "char", "String", "NaiveDate", "NaiveTime", "NaiveDateTime",
];

fn is_scalar_type(ty: &Type) -> bool {
    if let Some(inner) = option_inner(ty) {
        return is_scalar_type(inner);
    }
    match last_segment(ty) {
        Some((ident, _)) if ident == "Vec" => has_type_arg(ty, "u8"),
        // Only `DateTime<Utc>` has a `Coerce` impl; other zones stay composite.
        Some((ident, _)) if ident == "DateTime" => has_type_arg(ty, "Utc"),
        Some((ident, _)) => SCALAR_TYPES.contains(&ident.as_str()),
        None => false,
    }
}

/// `T` for `Option<T>`.
fn option_inner(ty: &Type) -> Option<&Type> {
    match last_segment(ty) {
        Some((ident, _)) if ident == "Option" => single_type_arg(ty),
        _ => None,
    }
}

/// Extract the last path segment ident name from a type (e.g. `u64`, `String`).
fn last_segment(ty: &Type) -> Option<(String, &PathArguments)> {
    if let Type::Path(type_path) = ty {
        type_path
            .path
            .segments
            .last()
            .map(|seg| (seg.ident.to_string(), &seg.arguments))
    } else {
        None
    }
}

/// Whether the single type argument of `ty` ends in the segment `arg`.
fn has_type_arg(ty: &Type, arg: &str) -> bool {
    single_type_arg(ty)
        .and_then(last_segment)
        .is_some_and(|(inner, _)| inner == arg)
}

fn single_type_arg(ty: &Type) -> Option<&Type> {
    let (_, PathArguments::AngleBracketed(args)) = last_segment(ty)? else {
        return None;
    };
    match args.args.first()? {
        GenericArgument::Type(inner) => Some(inner),
        _ => None,
    }
}
