pub mod admin;
pub mod error;
pub mod normalize;
pub mod pagination;
pub(crate) mod retry;
pub mod storefront;
pub mod types;

pub use admin::{AdminClient, ArticleInput, Blog, CmsArticle, ShopifyArticle};
pub use error::ShopifyError;
pub use normalize::normalize_product;
pub use pagination::extract_next_cursor;
pub use storefront::{extract_store_origin, StorefrontCatalog, StorefrontClient};
pub use types::{ShopifyImage, ShopifyProduct, ShopifyProductsResponse, ShopifyVariant};
