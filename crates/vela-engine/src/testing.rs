//! Shared test fixtures for the service tests: an in-memory database
//! seeded with two products and a table.

use chrono::Utc;
use uuid::Uuid;

use crate::identity::{Role, StaffContext};
use vela_core::{
    InventoryTransaction, Product, RestaurantTable, StockMovementType, TableStatus, TaxType,
    DEFAULT_BUSINESS_ID,
};
use vela_db::{Database, DbConfig};

pub(crate) struct Fixture {
    pub db: Database,
    /// $8.50, untaxed.
    pub product: Product,
    /// $10.00 at 8% tax.
    pub taxed_product: Product,
    /// Table 7, available.
    pub table: RestaurantTable,
}

impl Fixture {
    /// Posts a receiving movement so the product starts with stock.
    pub async fn receive_stock(&self, product_id: &str, quantity: i64) {
        self.db
            .inventory()
            .record_movement(&InventoryTransaction {
                id: Uuid::new_v4().to_string(),
                business_id: DEFAULT_BUSINESS_ID.to_string(),
                product_id: product_id.to_string(),
                movement_type: StockMovementType::Receiving,
                quantity,
                created_by: "fixture".to_string(),
                notes: None,
                created_at: Utc::now(),
            })
            .await
            .unwrap();
    }
}

fn product(sku: &str, name: &str, price_cents: i64, tax_rate_bps: u32) -> Product {
    let now = Utc::now();
    Product {
        id: Uuid::new_v4().to_string(),
        business_id: DEFAULT_BUSINESS_ID.to_string(),
        sku: sku.to_string(),
        name: name.to_string(),
        description: None,
        price_cents,
        cost_cents: None,
        tax_rate_bps,
        tax_type: if tax_rate_bps == 0 {
            TaxType::None
        } else {
            TaxType::SalesTax
        },
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

pub(crate) async fn fixture() -> Fixture {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();

    let plain = product("BURGER-1", "Beef Burger", 850, 0);
    let taxed = product("PIZZA-1", "Margherita Pizza", 1000, 800);
    db.products().insert(&plain).await.unwrap();
    db.products().insert(&taxed).await.unwrap();

    let table = RestaurantTable {
        id: Uuid::new_v4().to_string(),
        business_id: DEFAULT_BUSINESS_ID.to_string(),
        number: 7,
        section: Some("main".to_string()),
        seat_capacity: 4,
        status: TableStatus::Available,
        updated_at: Utc::now(),
    };
    db.tables().insert(&table).await.unwrap();

    Fixture {
        db,
        product: plain,
        taxed_product: taxed,
        table,
    }
}

pub(crate) fn staff(role: Role) -> StaffContext {
    StaffContext::new(DEFAULT_BUSINESS_ID, "staff-1", role)
}
