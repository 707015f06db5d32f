//! Entity Ingest Transformer
//!
//! Maps a raw holdings payload into typed entity descriptors. The natural
//! key, relationship and count attribute of each kind come from
//! [`HeldEntityKind`]; nothing here dispatches on type strings.

use crate::holdings::RawAddressPayload;
use crate::neo4j::models::{AddressIngest, EntityDescriptor, HeldEntityKind};
use serde_json::Value;
use tracing::warn;

fn entries(payload: &RawAddressPayload, kind: HeldEntityKind) -> Option<&Vec<Value>> {
    match kind {
        HeldEntityKind::Token => payload.tokens.as_ref(),
        HeldEntityKind::Nft => payload.nfts.as_ref(),
        HeldEntityKind::Event => payload.events.as_ref(),
        HeldEntityKind::PolygonNft => payload.polygon_nfts.as_ref(),
        HeldEntityKind::PolygonToken => payload.polygon_tokens.as_ref(),
    }
}

/// Scalar JSON value in string form; `None` for null, arrays and objects
fn scalar_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn describe(kind: HeldEntityKind, element: &Value) -> Option<EntityDescriptor> {
    let natural_key = scalar_string(element.get(kind.key_field()))
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())?;

    let name = scalar_string(element.get("name"))
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| natural_key.clone());

    let count = kind
        .payload_count_field()
        .and_then(|field| scalar_string(element.get(field)))
        .unwrap_or_default();

    Some(EntityDescriptor {
        kind,
        natural_key,
        name,
        count,
    })
}

/// Transform one address payload into an ordered ingest unit.
///
/// Absent sub-keys contribute nothing. Elements without a usable natural
/// key are skipped with a warning.
pub fn transform(payload: &RawAddressPayload) -> AddressIngest {
    let mut entities = Vec::new();

    for kind in HeldEntityKind::ALL {
        let Some(elements) = entries(payload, kind) else {
            continue;
        };
        for (index, element) in elements.iter().enumerate() {
            match describe(kind, element) {
                Some(descriptor) => entities.push(descriptor),
                None => warn!(
                    address = %payload.address,
                    kind = kind.label().as_str(),
                    index,
                    "Skipping held entity without {}",
                    kind.key_field()
                ),
            }
        }
    }

    AddressIngest {
        address: payload.address.trim().to_string(),
        ens: payload
            .ens
            .as_ref()
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty()),
        entities,
    }
}
