//! GraphQL documents sent to the Admin API.

pub(super) const LIST_BLOGS: &str = r"
query ListBlogs($first: Int!) {
  blogs(first: $first) {
    nodes { id title handle }
  }
}";

pub(super) const ARTICLE_CREATE: &str = r"
mutation ArticleCreate($article: ArticleCreateInput!) {
  articleCreate(article: $article) {
    article { id handle blog { handle } }
    userErrors { field message }
  }
}";

pub(super) const ARTICLE_UPDATE: &str = r"
mutation ArticleUpdate($id: ID!, $article: ArticleUpdateInput!) {
  articleUpdate(id: $id, article: $article) {
    article { id handle blog { handle } }
    userErrors { field message }
  }
}";

pub(super) const SHOP_NAME: &str = r"
query ShopName {
  shop { name }
}";
