use proc_macro::TokenStream;
use quote::quote;
use syn::{DeriveInput, parse_macro_input};

#[proc_macro_derive(Document, attributes(document))]
pub fn document_derive(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let name = &input.ident;

    let collection_name = input
        .attrs
        .iter()
        .find(|attr| attr.path.is_ident("document"))
        .and_then(|attr| attr.parse_meta().ok())
        .and_then(|meta| {
            let syn::Meta::List(meta_list) = meta else {
                return None;
            };

            meta_list.nested.into_iter().find_map(|nested_meta| {
                let syn::NestedMeta::Meta(syn::Meta::NameValue(name_value)) =
                    nested_meta
                else {
                    return None;
                };

                if !name_value.path.is_ident("collection") {
                    return None;
                };

                let syn::Lit::Str(lit_str) = name_value.lit else {
                    return None;
                };

                Some(lit_str.value())
            })
        });

    let Some(collection_name) = collection_name else {
        return TokenStream::from(quote! {compile_error!(
                "The #[derive(Document)] macro requires a \
                #[document(collection = \"...\")] attribute."
        )});
    };

    TokenStream::from(quote! {
        impl #name {
            pub const COLLECTION: &'static str = #collection_name;

            pub fn collection() -> mongodb::Collection<#name> {
                crate::mongo().collection::<#name>(#collection_name)
            }

            pub async fn find_one(
                query: mongodb::bson::Document
            ) -> Result<Option<#name>, mongodb::error::Error> {
                Self::collection().find_one(query).await
            }

            // ? the builder can't be driven from here, so callers pass
            // ? sort / skip / limit through FindOptions instead
            pub async fn find(
                query: mongodb::bson::Document,
                options: impl Into<Option<mongodb::options::FindOptions>>
            ) -> Result<Vec<#name>, mongodb::error::Error> {
                use futures::TryStreamExt;

                Self::collection()
                    .find(query)
                    .with_options(options)
                    .await?
                    .try_collect()
                    .await
            }

            pub async fn count_documents(
                query: mongodb::bson::Document
            ) -> Result<u64, mongodb::error::Error> {
                Self::collection().count_documents(query).await
            }

            pub async fn insert(&self) -> Result<(), mongodb::error::Error> {
                Self::collection().insert_one(self).await.map(|_| ())
            }

            pub async fn update_one(
                query: mongodb::bson::Document,
                update: impl Into<mongodb::options::UpdateModifications>
            ) -> Result<mongodb::results::UpdateResult, mongodb::error::Error> {
                Self::collection().update_one(query, update).await
            }

            /// Applies `update` and returns the document as it is afterwards.
            pub async fn find_one_and_update(
                query: mongodb::bson::Document,
                update: impl Into<mongodb::options::UpdateModifications>
            ) -> Result<Option<#name>, mongodb::error::Error> {
                Self::collection()
                    .find_one_and_update(query, update)
                    .return_document(mongodb::options::ReturnDocument::After)
                    .await
            }

            pub async fn delete_one(
                query: mongodb::bson::Document
            ) -> Result<u64, mongodb::error::Error> {
                Self::collection()
                    .delete_one(query)
                    .await
                    .map(|result| result.deleted_count)
            }

            pub async fn delete_many(
                query: mongodb::bson::Document
            ) -> Result<u64, mongodb::error::Error> {
                Self::collection()
                    .delete_many(query)
                    .await
                    .map(|result| result.deleted_count)
            }
        }
    })
}
