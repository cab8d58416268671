use assetreg_core::ServiceError;
use assetreg_sql::SQLStore;

/// DDL for the register. Codes are UNIQUE at the store level; details
/// follow their voucher on delete, and a referenced asset cannot be deleted.
const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS departments (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        department_code TEXT NOT NULL UNIQUE,
        department_symbol TEXT NOT NULL,
        department_name TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS asset_types (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        type_code INTEGER NOT NULL UNIQUE CHECK (type_code BETWEEN 0 AND 255),
        type_symbol TEXT NOT NULL,
        type_name TEXT NOT NULL,
        years_of_use INTEGER NOT NULL,
        depreciation_rate REAL NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS assets (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        asset_code TEXT NOT NULL UNIQUE,
        asset_symbol TEXT NOT NULL,
        asset_name TEXT NOT NULL,
        department_id INTEGER NOT NULL REFERENCES departments(id),
        type_id INTEGER NOT NULL REFERENCES asset_types(id),
        purchase_date TEXT NOT NULL,
        purchase_year INTEGER NOT NULL,
        start_tracking_year INTEGER NOT NULL,
        years_of_use INTEGER NOT NULL,
        depreciation_rate REAL NOT NULL,
        quantity INTEGER NOT NULL CHECK (quantity >= 1),
        purchase_price REAL NOT NULL,
        annual_depreciation_value REAL NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS asset_increase_vouchers (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        voucher_no TEXT NOT NULL UNIQUE,
        voucher_date TEXT NOT NULL,
        increase_date TEXT NOT NULL,
        note TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS asset_increase_voucher_details (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        voucher_id INTEGER NOT NULL REFERENCES asset_increase_vouchers(id) ON DELETE CASCADE,
        asset_id INTEGER NOT NULL REFERENCES assets(id),
        created_at TEXT NOT NULL
    )",
    // Indexes
    "CREATE INDEX IF NOT EXISTS idx_asset_dept ON assets(department_id)",
    "CREATE INDEX IF NOT EXISTS idx_asset_type ON assets(type_id)",
    "CREATE INDEX IF NOT EXISTS idx_asset_created ON assets(created_at)",
    "CREATE INDEX IF NOT EXISTS idx_voucher_date ON asset_increase_vouchers(voucher_date)",
    "CREATE INDEX IF NOT EXISTS idx_voucher_created ON asset_increase_vouchers(created_at)",
    "CREATE INDEX IF NOT EXISTS idx_detail_voucher ON asset_increase_voucher_details(voucher_id)",
    "CREATE INDEX IF NOT EXISTS idx_detail_asset ON asset_increase_voucher_details(asset_id)",
];

/// Initialize the database schema.
pub fn init_schema(sql: &dyn SQLStore) -> Result<(), ServiceError> {
    for ddl in SCHEMA {
        sql.exec(ddl, &[])
            .map_err(|e| ServiceError::Storage(format!("schema init: {}", e)))?;
    }
    Ok(())
}
