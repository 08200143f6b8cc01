use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use uuid::Uuid;

/// Whether a listing reports something lost or something found.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    Lost,
    Found,
}

impl ItemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemType::Lost => "lost",
            ItemType::Found => "found",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "lost" => Some(ItemType::Lost),
            "found" => Some(ItemType::Found),
            _ => None,
        }
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fixed category set. Anything outside the known names collapses to `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Electronics,
    Bags,
    Keys,
    Wallets,
    Pets,
    Jewelry,
    Clothing,
    Accessories,
    Documents,
    Sports,
    Other,
}

impl Category {
    pub fn from_name(name: &str) -> Self {
        match name {
            "Electronics" => Category::Electronics,
            "Bags" => Category::Bags,
            "Keys" => Category::Keys,
            "Wallets" => Category::Wallets,
            "Pets" => Category::Pets,
            "Jewelry" => Category::Jewelry,
            "Clothing" => Category::Clothing,
            "Accessories" => Category::Accessories,
            "Documents" => Category::Documents,
            "Sports" => Category::Sports,
            _ => Category::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Electronics => "Electronics",
            Category::Bags => "Bags",
            Category::Keys => "Keys",
            Category::Wallets => "Wallets",
            Category::Pets => "Pets",
            Category::Jewelry => "Jewelry",
            Category::Clothing => "Clothing",
            Category::Accessories => "Accessories",
            Category::Documents => "Documents",
            Category::Sports => "Sports",
            Category::Other => "Other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Category {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(Category::from_name(&name))
    }
}

/// Listing status. Only one state exists today; deletion is a hard delete.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Active,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        "active"
    }
}

/// Details recorded alongside an uploaded image.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ImageUpload {
    pub url: String,
    pub name: String,
    pub size: u64,
    #[serde(rename = "type")]
    pub mime: String,
}

/// The image field as stored. Older documents carry a bare URL string,
/// newer ones an object with upload details; both must round-trip.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum ImageRef {
    Url(String),
    Upload(ImageUpload),
}

/// A lost/found listing.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub item_type: ItemType,
    pub title: String,
    pub category: Category,
    pub description: String,
    pub location: String,
    pub date: NaiveDate,
    pub contact: Option<String>,
    pub user_id: Uuid,
    pub user_email: String,
    pub user_name: String,
    pub user_photo: Option<String>,
    /// Legacy flat URL field. Takes precedence over `image` when both exist.
    #[serde(rename = "imageURL")]
    pub image_url: Option<String>,
    pub image: Option<ImageRef>,
    pub created_at: DateTime<Utc>,
    pub status: ItemStatus,
}

/// A feedback entry left by a signed-in user.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    pub id: Uuid,
    pub user_id: Uuid,
    pub user_email: String,
    pub user_name: String,
    pub user_photo: Option<String>,
    pub message: String,
    pub rating: i16,
    pub created_at: DateTime<Utc>,
}

/// A registered account, including its password hash. Never serialized
/// to clients as-is; see `SessionUser` in the auth module.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_ref_accepts_bare_string() {
        let parsed: ImageRef = serde_json::from_str("\"https://example.com/a.jpg\"").unwrap();
        assert_eq!(parsed, ImageRef::Url("https://example.com/a.jpg".into()));
    }

    #[test]
    fn image_ref_accepts_object_form() {
        let parsed: ImageRef = serde_json::from_str(
            r#"{"url":"https://example.com/b.png","name":"b.png","size":1234,"type":"image/png"}"#,
        )
        .unwrap();
        match parsed {
            ImageRef::Upload(upload) => {
                assert_eq!(upload.url, "https://example.com/b.png");
                assert_eq!(upload.mime, "image/png");
            }
            other => panic!("expected object form, got {:?}", other),
        }
    }

    #[test]
    fn unknown_category_falls_back_to_other() {
        assert_eq!(Category::from_name("Gadgets"), Category::Other);
        assert_eq!(Category::from_name("Bags"), Category::Bags);
    }

    #[test]
    fn item_type_round_trips_lowercase() {
        assert_eq!(serde_json::to_string(&ItemType::Lost).unwrap(), "\"lost\"");
        assert_eq!(ItemType::parse("found"), Some(ItemType::Found));
        assert_eq!(ItemType::parse("FOUND"), None);
    }

    #[test]
    fn item_wire_format_uses_the_original_field_names() {
        let item = Item {
            id: Uuid::nil(),
            item_type: ItemType::Lost,
            title: "Blue Backpack".into(),
            category: Category::Bags,
            description: "Navy blue backpack with laptop sleeve.".into(),
            location: "Central Park".into(),
            date: chrono::NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
            contact: None,
            user_id: Uuid::nil(),
            user_email: "alex@example.com".into(),
            user_name: "Alex".into(),
            user_photo: None,
            image_url: Some("https://legacy.example/a.jpg".into()),
            image: None,
            created_at: Utc::now(),
            status: ItemStatus::Active,
        };
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["type"], "lost");
        assert_eq!(value["imageURL"], "https://legacy.example/a.jpg");
        assert_eq!(value["userName"], "Alex");
        assert_eq!(value["date"], "2025-01-15");
        assert_eq!(value["status"], "active");
    }
}
