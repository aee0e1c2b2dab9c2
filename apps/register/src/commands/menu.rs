//! # Menu Commands

use tracing::debug;

use comanda_core::{MenuItem, OrderDraft, Shift};
use comanda_db::Database;

use crate::error::{ApiError, ApiResult};

/// The whole catalog.
pub async fn list_menu(db: &Database) -> ApiResult<Vec<MenuItem>> {
    Ok(db.menu().list_all().await?)
}

pub async fn list_categories(db: &Database) -> ApiResult<Vec<String>> {
    Ok(db.menu().categories().await?)
}

pub async fn menu_by_category(db: &Database, category: &str) -> ApiResult<Vec<MenuItem>> {
    Ok(db.menu().by_category(category).await?)
}

/// Adds one unit of a catalog item to `draft`.
///
/// Returns `false` when the draft is not editable (no open shift and not an
/// amendment); the draft is unchanged in that case.
pub async fn add_menu_item(
    db: &Database,
    draft: &mut OrderDraft,
    product_id: &str,
    active_shift: Option<&Shift>,
) -> ApiResult<bool> {
    let product = db
        .menu()
        .get_by_id(product_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Menu item", product_id))?;

    let added = draft.add_item(&product, active_shift);
    debug!(product_id = %product_id, added, "add_menu_item command");
    Ok(added)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use comanda_core::{Money, Operator, ShiftOpening};
    use comanda_db::DbConfig;

    async fn seeded() -> (Database, MenuItem) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let roll = db
            .menu()
            .insert(&MenuItem {
                id: String::new(),
                name: "Sake Roll".to_string(),
                category: "Rolls".to_string(),
                price: Money::from_minor(5990),
                description: Some("Salmón, queso crema".to_string()),
            })
            .await
            .unwrap();
        (db, roll)
    }

    #[tokio::test]
    async fn test_catalog_lookups() {
        let (db, roll) = seeded().await;

        assert_eq!(list_menu(&db).await.unwrap(), vec![roll.clone()]);
        assert_eq!(list_categories(&db).await.unwrap(), vec!["Rolls"]);
        assert_eq!(menu_by_category(&db, "Rolls").await.unwrap().len(), 1);
        assert!(menu_by_category(&db, "Postres").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_menu_item_follows_the_shift_guard() {
        let (db, roll) = seeded().await;
        let shift = db
            .shifts()
            .open(ShiftOpening::new(Money::zero(), Some(Operator::new("u-1", "a@b.cl"))).unwrap())
            .await
            .unwrap();

        let mut draft = OrderDraft::default();
        assert!(!add_menu_item(&db, &mut draft, &roll.id, None).await.unwrap());
        assert!(draft.line_items.is_empty());

        assert!(add_menu_item(&db, &mut draft, &roll.id, Some(&shift)).await.unwrap());
        assert!(add_menu_item(&db, &mut draft, &roll.id, Some(&shift)).await.unwrap());
        assert_eq!(draft.line_items.len(), 1);
        assert_eq!(draft.line_items[0].quantity, 2);
        assert_eq!(
            draft.line_items[0].product_description.as_deref(),
            Some("Salmón, queso crema")
        );

        let err = add_menu_item(&db, &mut draft, "missing", Some(&shift))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }
}
