/// Generates the lookup methods every resource-backed client exposes.
///
/// `get_<entity>` returns `None` for a missing id; `require_<entity>` turns
/// that into `CommerceError::NotFound`.
#[macro_export]
macro_rules! impl_client_methods {
    ($client_name:ident, $entity:ty, $entity_name_snake:ident) => {
        paste::paste! {
            impl $client_name {
                #[tracing::instrument(skip(self))]
                pub async fn [<get_ $entity_name_snake>](&self, id: String) -> Result<Option<$entity>, $crate::error::CommerceError> {
                    tracing::debug!("Sending request");
                    Ok(self.inner.get(id).await?)
                }

                pub async fn [<require_ $entity_name_snake>](&self, id: String) -> Result<$entity, $crate::error::CommerceError> {
                    self.[<get_ $entity_name_snake>](id.clone())
                        .await?
                        .ok_or_else(|| $crate::error::CommerceError::NotFound(
                            format!("{} {}", stringify!($entity_name_snake), id)
                        ))
                }
            }
        }
    };
}

#[macro_export]
macro_rules! impl_client_new {
    ($client_name:ident, $entity:ty) => {
        impl $client_name {
            pub fn new(inner: $crate::actor_framework::ResourceClient<$entity>) -> Self {
                Self { inner }
            }
        }
    };
}

#[macro_export]
macro_rules! impl_basic_client {
    ($client_name:ident, $entity:ty, $entity_name_snake:ident) => {
        $crate::impl_client_new!($client_name, $entity);
        $crate::impl_client_methods!($client_name, $entity, $entity_name_snake);
    };
}
