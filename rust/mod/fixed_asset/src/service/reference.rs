use assetreg_core::ServiceError;
use assetreg_sql::Value;
use tracing::debug;

use super::FixedAssetService;
use crate::model::{AssetType, AssetTypeSeed, Department, DepartmentSeed};

const DEPARTMENT_COLUMNS: &str = "id, department_code, department_symbol, department_name";
const ASSET_TYPE_COLUMNS: &str =
    "id, type_code, type_symbol, type_name, years_of_use, depreciation_rate";

impl FixedAssetService {
    pub fn list_departments(&self) -> Result<Vec<Department>, ServiceError> {
        let sql = format!(
            "SELECT {} FROM departments ORDER BY department_code",
            DEPARTMENT_COLUMNS
        );
        self.query(&sql, &[])?.iter().map(Department::from_row).collect()
    }

    pub fn list_asset_types(&self) -> Result<Vec<AssetType>, ServiceError> {
        let sql = format!("SELECT {} FROM asset_types ORDER BY type_code", ASSET_TYPE_COLUMNS);
        self.query(&sql, &[])?.iter().map(AssetType::from_row).collect()
    }

    /// Insert a department, or update symbol and name if the code exists.
    pub fn upsert_department(&self, seed: &DepartmentSeed) -> Result<Department, ServiceError> {
        seed.validate()?;
        let code = seed.code.trim();
        self.exec(
            "INSERT INTO departments (department_code, department_symbol, department_name)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(department_code) DO UPDATE SET
                department_symbol = excluded.department_symbol,
                department_name = excluded.department_name",
            &[code.into(), seed.symbol.trim().into(), seed.name.trim().into()],
        )?;
        debug!(code, "department upserted");
        self.department_by_code(code)?
            .ok_or_else(|| ServiceError::Internal(format!("department '{}' vanished after upsert", code)))
    }

    /// Insert an asset type, or update it in place if the type code exists.
    pub fn upsert_asset_type(&self, seed: &AssetTypeSeed) -> Result<AssetType, ServiceError> {
        seed.validate()?;
        self.exec(
            "INSERT INTO asset_types (type_code, type_symbol, type_name, years_of_use, depreciation_rate)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(type_code) DO UPDATE SET
                type_symbol = excluded.type_symbol,
                type_name = excluded.type_name,
                years_of_use = excluded.years_of_use,
                depreciation_rate = excluded.depreciation_rate",
            &[
                seed.code.into(),
                seed.symbol.trim().into(),
                seed.name.trim().into(),
                seed.years_of_use.into(),
                seed.depreciation_rate.into(),
            ],
        )?;
        debug!(code = seed.code, "asset type upserted");
        self.asset_type_by_code(seed.code)?
            .ok_or_else(|| ServiceError::Internal(format!("asset type {} vanished after upsert", seed.code)))
    }

    pub fn department_by_code(&self, code: &str) -> Result<Option<Department>, ServiceError> {
        let sql = format!(
            "SELECT {} FROM departments WHERE department_code = ?1",
            DEPARTMENT_COLUMNS
        );
        self.query(&sql, &[Value::from(code)])?
            .first()
            .map(Department::from_row)
            .transpose()
    }

    pub fn asset_type_by_code(&self, code: i64) -> Result<Option<AssetType>, ServiceError> {
        let sql = format!("SELECT {} FROM asset_types WHERE type_code = ?1", ASSET_TYPE_COLUMNS);
        self.query(&sql, &[Value::from(code)])?
            .first()
            .map(AssetType::from_row)
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::super::testutil::service;
    use super::*;

    #[test]
    fn lists_are_ordered_by_code() {
        let svc = service();
        let depts: Vec<_> = svc
            .list_departments()
            .unwrap()
            .into_iter()
            .map(|d| d.department_code)
            .collect();
        assert_eq!(depts, vec!["HC", "KT"]);

        let types = svc.list_asset_types().unwrap();
        assert_eq!(types.len(), 2);
        assert_eq!(types[0].type_code, 1);
        assert_eq!(types[1].depreciation_rate, 10.0);
    }

    #[test]
    fn upsert_updates_in_place() {
        let svc = service();
        let before = svc.department_by_code("HC").unwrap().unwrap();
        let after = svc
            .upsert_department(&DepartmentSeed {
                code: "HC".into(),
                symbol: "HCNS".into(),
                name: "Administration and HR".into(),
            })
            .unwrap();
        assert_eq!(after.id, before.id);
        assert_eq!(after.department_name, "Administration and HR");
        assert_eq!(svc.list_departments().unwrap().len(), 2);

        let ty = svc
            .upsert_asset_type(&AssetTypeSeed {
                code: 1,
                symbol: "MT".into(),
                name: "Computers".into(),
                years_of_use: 4,
                depreciation_rate: 25.0,
            })
            .unwrap();
        assert_eq!(ty.years_of_use, 4);
        assert_eq!(svc.list_asset_types().unwrap().len(), 2);
    }

    #[test]
    fn unknown_codes_are_none() {
        let svc = service();
        assert!(svc.department_by_code("XX").unwrap().is_none());
        assert!(svc.asset_type_by_code(99).unwrap().is_none());
    }

    #[test]
    fn invalid_seed_is_rejected() {
        let svc = service();
        let err = svc
            .upsert_asset_type(&AssetTypeSeed {
                code: 300,
                symbol: "X".into(),
                name: "X".into(),
                years_of_use: 1,
                depreciation_rate: 1.0,
            })
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }
}
