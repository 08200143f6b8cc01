use crate::models::{Category, ImageRef, Item, ItemType};
use url::form_urlencoded;
use uuid::Uuid;

/// Decorative icon for a category badge.
pub fn category_icon(category: Category) -> &'static str {
    match category {
        Category::Electronics => "📱",
        Category::Bags => "🎒",
        Category::Keys => "🔑",
        Category::Wallets => "👛",
        Category::Pets => "🐾",
        Category::Jewelry => "💍",
        Category::Clothing => "👕",
        Category::Accessories => "👓",
        Category::Documents => "📄",
        Category::Sports => "⚽",
        Category::Other => "📦",
    }
}

/// Resolve the display image URL. Handles every format the data may be
/// stored in, in fixed precedence order:
///   `imageURL`  — old flat-string field
///   `image`     — URL stored directly as a string
///   `image.url` — current object format
pub fn resolve_image_url(item: &Item) -> Option<&str> {
    if let Some(url) = item.image_url.as_deref() {
        if !url.is_empty() {
            return Some(url);
        }
    }
    match &item.image {
        Some(ImageRef::Url(url)) => Some(url),
        Some(ImageRef::Upload(upload)) => Some(&upload.url),
        None => None,
    }
}

/// Escape text for interpolation into HTML, covering attribute positions too.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn urlencode(text: &str) -> String {
    form_urlencoded::byte_serialize(text.as_bytes()).collect()
}

fn placeholder_image_url(item: &Item) -> String {
    format!(
        "https://placehold.co/400x240/1e293b/94a3b8?text={}",
        urlencode(&format!("{} {}", category_icon(item.category), item.title))
    )
}

fn avatar_url(user_name: &str) -> String {
    format!(
        "https://ui-avatars.com/api/?name={}&background=6366f1&color=fff&size=32",
        urlencode(user_name)
    )
}

/// Render one listing as an HTML card fragment.
///
/// Pure string construction: action buttons carry data-* attributes for the
/// page script to bind listeners to, never inline handlers. Edit/delete
/// affordances appear only for the listing's owner; the same check is
/// enforced again by the mutation handlers.
pub fn create_item_card(item: &Item, current_user_id: Option<Uuid>) -> String {
    let icon = category_icon(item.category);
    let type_color = match item.item_type {
        ItemType::Lost => "var(--lost-color)",
        ItemType::Found => "var(--found-color)",
    };
    let type_label = match item.item_type {
        ItemType::Lost => "LOST",
        ItemType::Found => "FOUND",
    };
    let img_src = resolve_image_url(item)
        .map(str::to_string)
        .unwrap_or_else(|| placeholder_image_url(item));
    let user_avatar = match item.user_photo.as_deref() {
        Some(photo) if !photo.is_empty() => photo.to_string(),
        _ => avatar_url(&item.user_name),
    };

    let is_owner = current_user_id == Some(item.user_id);
    let owner_actions = if is_owner {
        format!(
            r#"<button class="btn-edit" data-id="{id}" title="Edit post">✏️</button>
            <button class="btn-delete" data-id="{id}" title="Delete post">🗑️</button>"#,
            id = item.id
        )
    } else {
        String::new()
    };

    format!(
        r#"<div class="item-card"
         data-id="{id}"
         data-type="{item_type}"
         data-category="{category_lc}"
         data-title="{title_lc}"
         data-desc="{desc_lc}">
      <div class="card-image-wrap">
        <img src="{img_src}" alt="{title}" class="card-image" loading="lazy">
        <span class="type-badge" style="background:{type_color}">{type_label}</span>
        <span class="cat-badge">{icon} {category}</span>
      </div>
      <div class="card-body">
        <h3 class="card-title">{title}</h3>
        <p class="card-desc">{description}</p>
        <div class="card-meta">
          <span class="meta-item">📍 {location}</span>
          <span class="meta-item">📅 {date}</span>
        </div>
        <div class="card-footer">
          <div class="card-user">
            <img src="{user_avatar}" alt="{user_name}" class="user-micro-avatar">
            <span>{user_name}</span>
          </div>
          <div class="card-actions">
            <button class="btn-contact" data-email="{user_email}" data-title="{title}">Contact</button>
            {owner_actions}
          </div>
        </div>
      </div>
    </div>"#,
        id = item.id,
        item_type = item.item_type,
        category_lc = escape_html(&item.category.as_str().to_lowercase()),
        title_lc = escape_html(&item.title.to_lowercase()),
        desc_lc = escape_html(&item.description.to_lowercase()),
        img_src = escape_html(&img_src),
        title = escape_html(&item.title),
        type_color = type_color,
        type_label = type_label,
        icon = icon,
        category = item.category,
        description = escape_html(&item.description),
        location = escape_html(&item.location),
        date = item.date,
        user_avatar = escape_html(&user_avatar),
        user_name = escape_html(&item.user_name),
        user_email = escape_html(&item.user_email),
        owner_actions = owner_actions,
    )
}

/// Shown when a page has no listings at all (distinct from a filter
/// narrowing the visible set to zero).
pub fn empty_state(type_filter: Option<ItemType>) -> String {
    let what = match type_filter {
        Some(t) => t.as_str(),
        None => "lost or found",
    };
    format!(
        r#"<div class="empty-state" style="grid-column:1/-1">
    <span class="empty-icon">🔍</span>
    <h3>No items found</h3>
    <p>Be the first to post a {what} item!</p>
  </div>"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ImageUpload, ItemStatus};
    use chrono::{NaiveDate, Utc};

    fn sample_item() -> Item {
        Item {
            id: Uuid::new_v4(),
            item_type: ItemType::Lost,
            title: "Blue Backpack".into(),
            category: Category::Bags,
            description: "Navy blue backpack with laptop sleeve.".into(),
            location: "Central Park".into(),
            date: NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
            contact: None,
            user_id: Uuid::new_v4(),
            user_email: "alex@example.com".into(),
            user_name: "Alex Johnson".into(),
            user_photo: None,
            image_url: None,
            image: None,
            created_at: Utc::now(),
            status: ItemStatus::Active,
        }
    }

    #[test]
    fn legacy_flat_field_wins_over_object_form() {
        let mut item = sample_item();
        item.image_url = Some("https://legacy.example/a.jpg".into());
        item.image = Some(ImageRef::Upload(ImageUpload {
            url: "https://new.example/b.jpg".into(),
            name: "b.jpg".into(),
            size: 10,
            mime: "image/jpeg".into(),
        }));
        assert_eq!(resolve_image_url(&item), Some("https://legacy.example/a.jpg"));
    }

    #[test]
    fn string_form_wins_over_nothing_and_loses_to_legacy() {
        let mut item = sample_item();
        item.image = Some(ImageRef::Url("https://str.example/c.jpg".into()));
        assert_eq!(resolve_image_url(&item), Some("https://str.example/c.jpg"));

        item.image_url = Some("https://legacy.example/a.jpg".into());
        assert_eq!(resolve_image_url(&item), Some("https://legacy.example/a.jpg"));
    }

    #[test]
    fn missing_image_renders_placeholder_with_icon_and_title() {
        let item = sample_item();
        let html = create_item_card(&item, None);
        assert!(html.contains("placehold.co"));
        assert!(html.contains("Blue+Backpack"));
    }

    #[test]
    fn owner_sees_edit_and_delete_affordances() {
        let item = sample_item();
        let html = create_item_card(&item, Some(item.user_id));
        assert!(html.contains("btn-edit"));
        assert!(html.contains("btn-delete"));
    }

    #[test]
    fn non_owner_and_anonymous_never_see_affordances() {
        let item = sample_item();
        let html = create_item_card(&item, None);
        assert!(!html.contains("btn-edit"));
        assert!(!html.contains("btn-delete"));

        let html = create_item_card(&item, Some(Uuid::new_v4()));
        assert!(!html.contains("btn-edit"));
        assert!(!html.contains("btn-delete"));
    }

    #[test]
    fn markup_in_title_is_escaped() {
        let mut item = sample_item();
        item.title = "<script>alert('x')</script>".into();
        let html = create_item_card(&item, None);
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn quotes_in_title_cannot_break_attributes() {
        let mut item = sample_item();
        item.title = r#"Bag "deluxe" d'Or"#.into();
        let html = create_item_card(&item, None);
        assert!(html.contains("&quot;deluxe&quot;"));
        assert!(html.contains("d&#39;Or"));
    }

    #[test]
    fn unknown_category_uses_generic_icon() {
        assert_eq!(category_icon(Category::from_name("Spaceships")), "📦");
    }
}
