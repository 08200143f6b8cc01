use sqlx::types::Json;
use sqlx::PgPool;

use crate::store::demo_items;

/// Seed the database with the built-in demo listings.
///
/// This function is idempotent – the demo items carry fixed IDs and are
/// inserted with `ON CONFLICT DO NOTHING`, so it can safely be run multiple
/// times.
pub async fn seed_demo_items(pool: &PgPool) -> Result<(), sqlx::Error> {
    println!("[Seeder] Seeding demo listings...");

    for item in demo_items() {
        sqlx::query(
            "INSERT INTO items (id, item_type, title, category, description, location, date, contact, \
                 user_id, user_email, user_name, user_photo, image, created_at, status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15) \
             ON CONFLICT (id) DO NOTHING",
        )
        .bind(item.id)
        .bind(item.item_type.as_str())
        .bind(&item.title)
        .bind(item.category.as_str())
        .bind(&item.description)
        .bind(&item.location)
        .bind(item.date)
        .bind(&item.contact)
        .bind(item.user_id)
        .bind(&item.user_email)
        .bind(&item.user_name)
        .bind(&item.user_photo)
        .bind(item.image.as_ref().map(Json))
        .bind(item.created_at)
        .bind(item.status.as_str())
        .execute(pool)
        .await?;
        println!("  - Ensured '{}'", item.title);
    }

    println!("[Seeder] Database seeding completed successfully.");
    Ok(())
}
