/// Raw listing form fields as collected from a multipart submission.
/// Everything is optional here; validation decides what is missing.
#[derive(Debug, Default, Clone)]
pub struct ItemForm {
    pub item_type: Option<String>,
    pub title: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub contact: Option<String>,
    pub date: Option<String>,
}

/// Validate a listing form. Returns one human-readable message per violated
/// constraint; an empty list means the form is valid.
pub fn validate_item_form(form: &ItemForm) -> Vec<String> {
    let mut errors = Vec::new();

    if form
        .title
        .as_deref()
        .map_or(true, |t| t.trim().chars().count() < 3)
    {
        errors.push("Title must be at least 3 characters".to_string());
    }
    if form.category.as_deref().map_or(true, |c| c.is_empty()) {
        errors.push("Please select a category".to_string());
    }
    if form
        .description
        .as_deref()
        .map_or(true, |d| d.trim().chars().count() < 10)
    {
        errors.push("Description must be at least 10 characters".to_string());
    }
    if form
        .location
        .as_deref()
        .map_or(true, |l| l.trim().chars().count() < 2)
    {
        errors.push("Location is required".to_string());
    }
    if form.date.as_deref().map_or(true, |d| d.is_empty()) {
        errors.push("Date is required".to_string());
    }

    errors
}
