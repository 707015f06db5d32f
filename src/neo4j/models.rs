//! Graph models for actors, addresses, sessions and held entities

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ============================================================================
// Actors (label `Person`)
// ============================================================================

/// A hydrated profile record as returned by the social API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorProfile {
    pub id: String,
    pub screen_name: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub profile_image_url: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub followers_count: i64,
    #[serde(default)]
    pub friends_count: i64,
}

impl ActorProfile {
    /// Screen names are stored case-folded so lookups are case-insensitive
    pub fn normalized(mut self) -> Self {
        self.screen_name = self.screen_name.to_lowercase();
        self
    }
}

/// A stored `Person` node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorNode {
    #[serde(flatten)]
    pub profile: ActorProfile,
    /// Unix timestamp (seconds) of the last refresh; never moves backwards
    pub last_updated: i64,
    pub last_updated_local: String,
}

// ============================================================================
// Addresses and sessions
// ============================================================================

/// A wallet identity (label `Address`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressNode {
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ens: Option<String>,
    pub timestamp: i64,
    pub timestamp_local: String,
}

/// A named collaborative scope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionNode {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
}

// ============================================================================
// Relationship and label vocabulary
// ============================================================================

/// Relationship types stored in the graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationKind {
    Follows,
    HasParticipant,
    Holds,
    Attended,
    HoldsOnPolygon,
}

impl RelationKind {
    /// Relationships traversed when looking for shared neighbors
    pub const NEIGHBOR: [RelationKind; 4] = [
        RelationKind::Follows,
        RelationKind::Holds,
        RelationKind::Attended,
        RelationKind::HoldsOnPolygon,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            RelationKind::Follows => "FOLLOWS",
            RelationKind::HasParticipant => "HAS_PARTICIPANT",
            RelationKind::Holds => "HOLDS",
            RelationKind::Attended => "ATTENDED",
            RelationKind::HoldsOnPolygon => "HOLDS_ON_POLYGON",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "FOLLOWS" => Some(RelationKind::Follows),
            "HAS_PARTICIPANT" => Some(RelationKind::HasParticipant),
            "HOLDS" => Some(RelationKind::Holds),
            "ATTENDED" => Some(RelationKind::Attended),
            "HOLDS_ON_POLYGON" => Some(RelationKind::HoldsOnPolygon),
            _ => None,
        }
    }
}

/// Node labels that can appear in a session view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NodeLabel {
    Person,
    Address,
    Token,
    #[serde(rename = "NFT")]
    Nft,
    Event,
    #[serde(rename = "PolygonNFT")]
    PolygonNft,
    PolygonToken,
}

impl NodeLabel {
    pub const fn as_str(self) -> &'static str {
        match self {
            NodeLabel::Person => "Person",
            NodeLabel::Address => "Address",
            NodeLabel::Token => "Token",
            NodeLabel::Nft => "NFT",
            NodeLabel::Event => "Event",
            NodeLabel::PolygonNft => "PolygonNFT",
            NodeLabel::PolygonToken => "PolygonToken",
        }
    }

    /// Property holding the natural key for nodes of this label
    pub const fn key_field(self) -> &'static str {
        match self {
            NodeLabel::Person => "id",
            NodeLabel::Address => "address",
            NodeLabel::Token => HeldEntityKind::Token.key_field(),
            NodeLabel::Nft => HeldEntityKind::Nft.key_field(),
            NodeLabel::Event => HeldEntityKind::Event.key_field(),
            NodeLabel::PolygonNft => HeldEntityKind::PolygonNft.key_field(),
            NodeLabel::PolygonToken => HeldEntityKind::PolygonToken.key_field(),
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Person" => Some(NodeLabel::Person),
            "Address" => Some(NodeLabel::Address),
            "Token" => Some(NodeLabel::Token),
            "NFT" => Some(NodeLabel::Nft),
            "Event" => Some(NodeLabel::Event),
            "PolygonNFT" => Some(NodeLabel::PolygonNft),
            "PolygonToken" => Some(NodeLabel::PolygonToken),
            _ => None,
        }
    }
}

// ============================================================================
// Held entities
// ============================================================================

/// Closed set of entity kinds an address can hold or attend.
///
/// Every per-kind decision (label, natural key, relationship, count field,
/// payload sub-key) is an exhaustive match below.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeldEntityKind {
    Token,
    Nft,
    Event,
    PolygonNft,
    PolygonToken,
}

impl HeldEntityKind {
    /// Ingest order for a raw payload
    pub const ALL: [HeldEntityKind; 5] = [
        HeldEntityKind::Token,
        HeldEntityKind::Nft,
        HeldEntityKind::Event,
        HeldEntityKind::PolygonNft,
        HeldEntityKind::PolygonToken,
    ];

    pub const fn label(self) -> NodeLabel {
        match self {
            HeldEntityKind::Token => NodeLabel::Token,
            HeldEntityKind::Nft => NodeLabel::Nft,
            HeldEntityKind::Event => NodeLabel::Event,
            HeldEntityKind::PolygonNft => NodeLabel::PolygonNft,
            HeldEntityKind::PolygonToken => NodeLabel::PolygonToken,
        }
    }

    pub const fn key_field(self) -> &'static str {
        match self {
            HeldEntityKind::Token | HeldEntityKind::Nft => "symbol",
            HeldEntityKind::Event => "id",
            HeldEntityKind::PolygonNft | HeldEntityKind::PolygonToken => "contract",
        }
    }

    pub const fn relation(self) -> RelationKind {
        match self {
            HeldEntityKind::Token | HeldEntityKind::Nft => RelationKind::Holds,
            HeldEntityKind::Event => RelationKind::Attended,
            HeldEntityKind::PolygonNft | HeldEntityKind::PolygonToken => {
                RelationKind::HoldsOnPolygon
            }
        }
    }

    /// Stored property carrying the holding count, if the kind has one
    pub const fn count_field(self) -> Option<&'static str> {
        match self {
            HeldEntityKind::Token | HeldEntityKind::PolygonToken => Some("token_count"),
            HeldEntityKind::Nft | HeldEntityKind::PolygonNft => Some("nft_count"),
            HeldEntityKind::Event => None,
        }
    }

    /// Payload attribute carrying the holding count, if the kind has one
    pub const fn payload_count_field(self) -> Option<&'static str> {
        match self {
            HeldEntityKind::Token | HeldEntityKind::PolygonToken => Some("tokenCount"),
            HeldEntityKind::Nft | HeldEntityKind::PolygonNft => Some("nftCount"),
            HeldEntityKind::Event => None,
        }
    }

    /// Sub-key of the raw address payload holding this kind's array
    pub const fn payload_key(self) -> &'static str {
        match self {
            HeldEntityKind::Token => "tokens",
            HeldEntityKind::Nft => "nfts",
            HeldEntityKind::Event => "events",
            HeldEntityKind::PolygonNft => "polygonNfts",
            HeldEntityKind::PolygonToken => "polygonTokens",
        }
    }
}

/// A typed held entity ready for upsert
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityDescriptor {
    pub kind: HeldEntityKind,
    pub natural_key: String,
    pub name: String,
    /// Holding count as a string; empty means unknown, not zero
    #[serde(default)]
    pub count: String,
}

/// One address and every entity it holds or attended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressIngest {
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ens: Option<String>,
    pub entities: Vec<EntityDescriptor>,
}

/// A stored held-entity node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeldEntityNode {
    pub kind: HeldEntityKind,
    pub natural_key: String,
    pub name: String,
    #[serde(default)]
    pub count: String,
}

// ============================================================================
// View nodes
// ============================================================================

/// Identity of a node in a view: label plus natural key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeRef {
    pub label: NodeLabel,
    pub key: String,
}

/// A node tagged with its label and full property set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub label: NodeLabel,
    pub key: String,
    pub properties: Map<String, Value>,
}

impl GraphNode {
    pub fn node_ref(&self) -> NodeRef {
        NodeRef {
            label: self.label,
            key: self.key.clone(),
        }
    }
}

impl From<&ActorNode> for GraphNode {
    fn from(actor: &ActorNode) -> Self {
        GraphNode {
            label: NodeLabel::Person,
            key: actor.profile.id.clone(),
            properties: to_properties(actor),
        }
    }
}

impl From<&AddressNode> for GraphNode {
    fn from(address: &AddressNode) -> Self {
        GraphNode {
            label: NodeLabel::Address,
            key: address.address.clone(),
            properties: to_properties(address),
        }
    }
}

impl From<&HeldEntityNode> for GraphNode {
    fn from(entity: &HeldEntityNode) -> Self {
        let mut properties = Map::new();
        properties.insert(
            entity.kind.key_field().to_string(),
            Value::String(entity.natural_key.clone()),
        );
        properties.insert("name".to_string(), Value::String(entity.name.clone()));
        if let Some(field) = entity.kind.count_field() {
            properties.insert(field.to_string(), Value::String(entity.count.clone()));
        }
        GraphNode {
            label: entity.kind.label(),
            key: entity.natural_key.clone(),
            properties,
        }
    }
}

fn to_properties<T: Serialize>(value: &T) -> Map<String, Value> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

/// One outgoing neighbor relationship of a session participant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeighborLink {
    pub relation: RelationKind,
    pub node: GraphNode,
}

/// A session participant and all of its one-hop neighbors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantNeighborhood {
    pub participant: GraphNode,
    pub links: Vec<NeighborLink>,
}

/// A typed edge between two view nodes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewEdge {
    pub relation: RelationKind,
    pub from: NodeRef,
    pub to: NodeRef,
}

/// One (ordered participant pair, shared neighbor) row of a session view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewRow {
    pub participant: GraphNode,
    pub other_participant: GraphNode,
    /// `None` when the pair shares no neighbor
    pub common: Option<GraphNode>,
    pub participant_edges: Vec<ViewEdge>,
    pub other_participant_edges: Vec<ViewEdge>,
}

// ============================================================================
// Audit log entries
// ============================================================================

/// Append-only record written on every freshness check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQueryEntry {
    pub text: String,
    pub timestamp: i64,
    pub timestamp_local: String,
}

/// Append-only record of an address lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchAddressEntry {
    pub address: String,
    pub screen_name: String,
    pub timestamp: i64,
    pub timestamp_local: String,
}

// ============================================================================
// Timestamps
// ============================================================================

/// A write timestamp in both stored forms
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stamp {
    pub unix: i64,
    pub local: String,
}

impl Stamp {
    /// Stamp for actor refreshes (`MM/DD/YYYY, HH:MM:SS`, server local time)
    pub fn actor(now: DateTime<Utc>) -> Self {
        Self {
            unix: now.timestamp(),
            local: now
                .with_timezone(&Local)
                .format("%m/%d/%Y, %H:%M:%S")
                .to_string(),
        }
    }

    /// Stamp for audit entries and addresses (`YYYY-MM-DD HH:MM:SS`, UTC)
    pub fn audit(now: DateTime<Utc>) -> Self {
        Self {
            unix: now.timestamp(),
            local: now.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}
