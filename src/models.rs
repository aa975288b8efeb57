use serde::{Deserialize, Deserializer, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Category {
  #[serde(deserialize_with = "string_or_number")]
  pub id: String,
  pub name: String,
  pub slug: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
  #[serde(deserialize_with = "string_or_number")]
  pub id: String,
  pub name: String,
  pub slug: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
  #[serde(deserialize_with = "string_or_number")]
  pub id: String,
  pub name: String,
  #[serde(default)]
  pub image: Option<String>,
  #[serde(default)]
  pub description: Option<String>,
  #[serde(default)]
  pub in_stock: bool,
  /// Category slug.
  #[serde(default)]
  pub category: Option<String>,
  /// Collection slug.
  #[serde(default)]
  pub collection: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
  pub items: Vec<T>,
  /// Size of the whole filtered set, not of `items`.
  pub total: u64,
}

impl<T> Page<T> {
  pub fn empty() -> Self {
    Page {
      items: Vec::new(),
      total: 0,
    }
  }
}

impl<T> Default for Page<T> {
  fn default() -> Self {
    Page::empty()
  }
}

/// Admin payload for creating or replacing a product.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProductDraft {
  pub name: String,
  pub description: Option<String>,
  pub image: Option<String>,
  pub in_stock: bool,
  pub category: Option<String>,
  pub collection: Option<String>,
}

impl ProductDraft {
  pub fn validate(&self) -> Result<(), String> {
    if self.name.trim().is_empty() {
      return Err("Product name is required.".to_string());
    }
    if self.category.is_some() && self.collection.is_none() {
      return Err("A product category requires a collection.".to_string());
    }
    Ok(())
  }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
  D: Deserializer<'de>,
{
  #[derive(Deserialize)]
  #[serde(untagged)]
  enum Id {
    Text(String),
    Number(i64),
  }

  Ok(match Id::deserialize(deserializer)? {
    Id::Text(text) => text,
    Id::Number(number) => number.to_string(),
  })
}
