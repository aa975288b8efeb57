use chrono::Utc;
use serde::Serialize;
use url::Url;
use uuid::Uuid;

use crate::cart::CartItem;
use crate::config::StorefrontConfig;
use crate::error::{StorefrontError, StorefrontResult};

/// A cart packaged for the messaging channel instead of a checkout.
#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ConsultationHandoff {
  pub reference: String,
  pub created_at: String,
  pub message: String,
  pub url: String,
}

pub fn compose_message(reference: &str, items: &[CartItem]) -> String {
  let mut message = String::from("Hello! I would like to ask about these products:\n");
  for (index, item) in items.iter().enumerate() {
    message.push_str(&format!("{}. {} (#{})\n", index + 1, item.name, item.product_id));
  }
  message.push_str(&format!("Reference: {}", reference));
  message
}

/// Builds `{consultation_url}/{contact}?text=...` for the current cart.
pub fn build_handoff(config: &StorefrontConfig, items: &[CartItem]) -> StorefrontResult<ConsultationHandoff> {
  if items.is_empty() {
    return Err(StorefrontError::InvalidInput(
      "Add at least one product before requesting a consultation.".to_string(),
    ));
  }

  let reference = Uuid::new_v4().to_string();
  let message = compose_message(&reference, items);

  let mut url = Url::parse(&config.consultation_url)
    .map_err(|e| StorefrontError::Config(format!("consultationUrl: {}", e)))?;
  let contact = config.consultation_contact.trim().trim_start_matches('+');
  if !contact.is_empty() {
    url
      .path_segments_mut()
      .map_err(|_| StorefrontError::Config("consultationUrl cannot carry a path.".to_string()))?
      .pop_if_empty()
      .push(contact);
  }
  url.query_pairs_mut().append_pair("text", &message);

  log::info!("Consultation hand-off {} with {} item(s).", reference, items.len());
  Ok(ConsultationHandoff {
    reference,
    created_at: Utc::now().to_rfc3339(),
    message,
    url: url.to_string(),
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  fn item(id: &str, name: &str) -> CartItem {
    CartItem {
      product_id: id.to_string(),
      name: name.to_string(),
      image: None,
      added_at: "2026-01-01T00:00:00+00:00".to_string(),
    }
  }

  #[test]
  fn message_lists_every_item() {
    let message = compose_message("ref-1", &[item("1", "X-Wing"), item("2", "Tie Fighter")]);
    assert!(message.contains("1. X-Wing (#1)"));
    assert!(message.contains("2. Tie Fighter (#2)"));
    assert!(message.ends_with("Reference: ref-1"));
  }

  #[test]
  fn handoff_link_targets_contact_and_encodes_text() {
    let config = StorefrontConfig {
      consultation_contact: "+5511999990000".to_string(),
      ..StorefrontConfig::default()
    };

    let handoff = build_handoff(&config, &[item("1", "R2 & D2")]).unwrap();
    let url = Url::parse(&handoff.url).unwrap();

    assert_eq!(url.host_str(), Some("wa.me"));
    assert_eq!(url.path(), "/5511999990000");
    let text = url
      .query_pairs()
      .find(|(key, _)| key == "text")
      .map(|(_, value)| value.into_owned())
      .unwrap();
    assert_eq!(text, handoff.message);
    assert!(text.contains("R2 & D2"));
  }

  #[test]
  fn empty_cart_cannot_be_handed_off() {
    assert!(matches!(
      build_handoff(&StorefrontConfig::default(), &[]),
      Err(StorefrontError::InvalidInput(_))
    ));
  }
}
