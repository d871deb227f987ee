//! Role Budget
//!
//! Tip-share percentages per restaurant. The sum over all roles of a
//! restaurant never exceeds [`ROLE_BUDGET_TOTAL`]; the remainder is
//! unallocated headroom and is never redistributed.
//!
//! Mutations for one restaurant are serialized through a per-restaurant
//! mutex so the check-then-write of the budget is atomic. Different
//! restaurants never contend.
//!
//! Employees only point at a role through [`RoleBudget::register_employee`]
//! and [`RoleBudget::assign_employee_role`], which hold the same mutex as
//! [`RoleBudget::delete_role`]: a role is never deleted while an assignment
//! to it is in flight, and never assigned after it is gone.

mod error;

pub use error::{BudgetError, BudgetResult};

use std::collections::BTreeMap;
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use shared::models::{
    Employee, EmployeeCreate, ROLE_BUDGET_TOTAL, Role, RoleBudgetSummary, RoleCreate, RoleUpdate,
};
use shared::util::snowflake_id;

use crate::directory::{DirectoryError, EmployeeDirectory, InMemoryDirectory};
use crate::utils::validation::{
    MAX_NAME_LEN, MAX_SHORT_TEXT_LEN, validate_color, validate_required_text,
};

/// Roles of one restaurant
#[derive(Debug, Default)]
struct RoleSet {
    roles: BTreeMap<i64, Role>,
}

impl RoleSet {
    fn allocated(&self, excluding: Option<i64>) -> i32 {
        self.roles
            .values()
            .filter(|r| Some(r.id) != excluding)
            .map(|r| r.percentage)
            .sum()
    }

    fn remaining(&self, excluding: Option<i64>) -> i32 {
        ROLE_BUDGET_TOTAL - self.allocated(excluding)
    }

    fn name_taken(&self, name: &str, excluding: Option<i64>) -> bool {
        self.roles
            .values()
            .any(|r| Some(r.id) != excluding && r.name.eq_ignore_ascii_case(name))
    }

    /// Reject `requested` if it does not fit next to every role except `excluding`
    fn check_fits(&self, requested: i32, excluding: Option<i64>) -> BudgetResult<()> {
        let remaining = self.remaining(excluding);
        if requested > remaining {
            return Err(BudgetError::BudgetExceeded {
                remaining,
                requested,
            });
        }
        Ok(())
    }
}

fn validate_percentage(percentage: i32) -> BudgetResult<()> {
    if !(0..=ROLE_BUDGET_TOTAL).contains(&percentage) {
        return Err(BudgetError::InvalidPercentage(percentage));
    }
    Ok(())
}

fn validate_name(name: &str) -> BudgetResult<()> {
    validate_required_text(name, "name", MAX_NAME_LEN).map_err(|e| BudgetError::Validation(e.message))
}

fn validate_role_color(color: &str) -> BudgetResult<()> {
    validate_required_text(color, "color", MAX_SHORT_TEXT_LEN)
        .and_then(|_| validate_color(color))
        .map_err(|e| BudgetError::Validation(e.message))
}

/// Role budget for every restaurant
pub struct RoleBudget {
    restaurants: DashMap<i64, Arc<Mutex<RoleSet>>>,
    /// role id → restaurant id
    role_index: DashMap<i64, i64>,
    directory: InMemoryDirectory,
}

impl std::fmt::Debug for RoleBudget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoleBudget")
            .field("restaurants", &self.restaurants.len())
            .field("roles", &self.role_index.len())
            .finish()
    }
}

impl RoleBudget {
    pub fn new(directory: InMemoryDirectory) -> Self {
        Self {
            restaurants: DashMap::new(),
            role_index: DashMap::new(),
            directory,
        }
    }

    /// Lock handle for a restaurant (created on first use)
    ///
    /// The DashMap guard is dropped before the caller locks the mutex.
    fn restaurant(&self, restaurant_id: i64) -> Arc<Mutex<RoleSet>> {
        self.restaurants
            .entry(restaurant_id)
            .or_default()
            .value()
            .clone()
    }

    fn existing(&self, restaurant_id: i64) -> Option<Arc<Mutex<RoleSet>>> {
        self.restaurants.get(&restaurant_id).map(|h| h.value().clone())
    }

    fn restaurant_of(&self, role_id: i64) -> BudgetResult<i64> {
        self.role_index
            .get(&role_id)
            .map(|r| *r.value())
            .ok_or(BudgetError::NotFound(role_id))
    }

    /// Create a role; fails when `percentage + allocated > 100`
    pub fn create_role(&self, restaurant_id: i64, data: RoleCreate) -> BudgetResult<Role> {
        let name = data.name.trim().to_string();
        validate_name(&name)?;
        validate_role_color(&data.color)?;
        validate_percentage(data.percentage)?;

        let handle = self.restaurant(restaurant_id);
        let mut set = handle.lock();

        if set.name_taken(&name, None) {
            tracing::warn!(restaurant_id, name = %name, "Role name already exists");
            return Err(BudgetError::NameExists(name));
        }
        if let Err(e) = set.check_fits(data.percentage, None) {
            tracing::warn!(
                restaurant_id,
                requested = data.percentage,
                remaining = set.remaining(None),
                "Role budget exceeded"
            );
            return Err(e);
        }

        let role = Role {
            id: snowflake_id(),
            restaurant_id,
            name,
            color: data.color,
            percentage: data.percentage,
        };
        set.roles.insert(role.id, role.clone());
        self.role_index.insert(role.id, restaurant_id);

        tracing::info!(
            restaurant_id,
            role_id = role.id,
            percentage = role.percentage,
            allocated = set.allocated(None),
            "Role created"
        );
        Ok(role)
    }

    /// Update a role; a new percentage is checked against the total with the
    /// role's old value removed first
    pub fn update_role(&self, role_id: i64, data: RoleUpdate) -> BudgetResult<Role> {
        let name = data.name.as_deref().map(str::trim).map(str::to_string);
        if let Some(ref name) = name {
            validate_name(name)?;
        }
        if let Some(ref color) = data.color {
            validate_role_color(color)?;
        }
        if let Some(p) = data.percentage {
            validate_percentage(p)?;
        }

        let restaurant_id = self.restaurant_of(role_id)?;
        let handle = self.restaurant(restaurant_id);
        let mut set = handle.lock();

        // Deleted while we were waiting for the lock
        if !set.roles.contains_key(&role_id) {
            return Err(BudgetError::NotFound(role_id));
        }
        if let Some(ref name) = name
            && set.name_taken(name, Some(role_id))
        {
            tracing::warn!(restaurant_id, role_id, name = %name, "Role name already exists");
            return Err(BudgetError::NameExists(name.clone()));
        }
        if let Some(p) = data.percentage
            && let Err(e) = set.check_fits(p, Some(role_id))
        {
            tracing::warn!(
                restaurant_id,
                role_id,
                requested = p,
                remaining = set.remaining(Some(role_id)),
                "Role budget exceeded"
            );
            return Err(e);
        }

        let role = set
            .roles
            .get_mut(&role_id)
            .ok_or(BudgetError::NotFound(role_id))?;
        if let Some(name) = name {
            role.name = name;
        }
        if let Some(color) = data.color {
            role.color = color;
        }
        if let Some(p) = data.percentage {
            role.percentage = p;
        }
        let role = role.clone();

        tracing::info!(
            restaurant_id,
            role_id,
            percentage = role.percentage,
            allocated = set.allocated(None),
            "Role updated"
        );
        Ok(role)
    }

    /// Delete a role
    ///
    /// Rejected while any employee references it, and for the sole remaining
    /// role of the restaurant. No employee is reassigned here: callers run
    /// [`crate::directory::InMemoryDirectory::unassign_role`] first.
    pub fn delete_role(&self, role_id: i64) -> BudgetResult<Role> {
        let restaurant_id = self.restaurant_of(role_id)?;
        let handle = self.restaurant(restaurant_id);
        let mut set = handle.lock();

        if !set.roles.contains_key(&role_id) {
            return Err(BudgetError::NotFound(role_id));
        }

        let employee_count = self.directory.count_by_role(restaurant_id, role_id);
        if employee_count > 0 {
            tracing::warn!(restaurant_id, role_id, employee_count, "Role still has employees");
            return Err(BudgetError::HasEmployees {
                role_id,
                employee_count,
            });
        }
        if set.roles.len() == 1 {
            tracing::warn!(restaurant_id, role_id, "Refusing to delete the sole remaining role");
            return Err(BudgetError::SoleRemainingRole(role_id));
        }

        let role = set
            .roles
            .remove(&role_id)
            .ok_or(BudgetError::NotFound(role_id))?;
        self.role_index.remove(&role_id);

        tracing::info!(
            restaurant_id,
            role_id,
            allocated = set.allocated(None),
            "Role deleted"
        );
        Ok(role)
    }

    /// `100 - sum(percentage)`, optionally ignoring one role's own share
    pub fn remaining_budget(&self, restaurant_id: i64, excluding_role_id: Option<i64>) -> i32 {
        match self.existing(restaurant_id) {
            Some(handle) => handle.lock().remaining(excluding_role_id),
            None => ROLE_BUDGET_TOTAL,
        }
    }

    pub fn summary(&self, restaurant_id: i64) -> RoleBudgetSummary {
        let (allocated, role_count) = match self.existing(restaurant_id) {
            Some(handle) => {
                let set = handle.lock();
                (set.allocated(None), set.roles.len())
            }
            None => (0, 0),
        };
        RoleBudgetSummary {
            restaurant_id,
            allocated,
            remaining: ROLE_BUDGET_TOTAL - allocated,
            role_count,
        }
    }

    pub fn get_role(&self, role_id: i64) -> BudgetResult<Role> {
        let restaurant_id = self.restaurant_of(role_id)?;
        let handle = self.restaurant(restaurant_id);
        let set = handle.lock();
        set.roles
            .get(&role_id)
            .cloned()
            .ok_or(BudgetError::NotFound(role_id))
    }

    /// Run `f` under the restaurant's role lock once `role_id` is known to
    /// belong to it; `None` ("No role") needs no lock
    fn with_live_role<T>(
        &self,
        restaurant_id: i64,
        role_id: Option<i64>,
        f: impl FnOnce() -> BudgetResult<T>,
    ) -> BudgetResult<T> {
        let Some(role_id) = role_id else {
            return f();
        };
        let handle = self
            .existing(restaurant_id)
            .ok_or(BudgetError::NotFound(role_id))?;
        let set = handle.lock();
        if !set.roles.contains_key(&role_id) {
            tracing::warn!(restaurant_id, role_id, "Assignment to unknown role");
            return Err(BudgetError::NotFound(role_id));
        }
        let result = f();
        drop(set);
        result
    }

    /// Register an employee, optionally already holding a role of the restaurant
    pub fn register_employee(&self, restaurant_id: i64, data: EmployeeCreate) -> BudgetResult<Employee> {
        self.with_live_role(restaurant_id, data.role_id, || {
            Ok(self.directory.register(restaurant_id, data)?)
        })
    }

    /// Point an employee at a role of its restaurant, or clear it with `None`
    pub fn assign_employee_role(
        &self,
        restaurant_id: i64,
        employee_id: i64,
        role_id: Option<i64>,
    ) -> BudgetResult<Employee> {
        match self.directory.get(employee_id) {
            Some(e) if e.restaurant_id == restaurant_id => {}
            _ => return Err(DirectoryError::NotFound(employee_id).into()),
        }
        self.with_live_role(restaurant_id, role_id, || {
            Ok(self.directory.assign_role(employee_id, role_id)?)
        })
    }

    /// Roles of a restaurant ordered by name
    pub fn list_roles(&self, restaurant_id: i64) -> Vec<Role> {
        let mut roles: Vec<Role> = match self.existing(restaurant_id) {
            Some(handle) => handle.lock().roles.values().cloned().collect(),
            None => Vec::new(),
        };
        roles.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        roles
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::InMemoryDirectory;
    use shared::models::EmployeeCreate;

    const R: i64 = 1;

    fn setup() -> (RoleBudget, InMemoryDirectory) {
        let directory = InMemoryDirectory::new();
        let budget = RoleBudget::new(directory.clone());
        (budget, directory)
    }

    fn role(name: &str, percentage: i32) -> RoleCreate {
        RoleCreate {
            name: name.to_string(),
            color: "#3366FF".to_string(),
            percentage,
        }
    }

    fn employee(role_id: Option<i64>) -> EmployeeCreate {
        EmployeeCreate {
            name: "Ana".to_string(),
            email: None,
            phone: None,
            tax_id: None,
            role_id,
        }
    }

    fn hire(budget: &RoleBudget, role_id: i64) -> Employee {
        budget.register_employee(R, employee(Some(role_id))).unwrap()
    }

    // ========================================================================
    // Create / update
    // ========================================================================

    #[test]
    fn test_create_within_budget() {
        let (budget, _) = setup();
        budget.create_role(R, role("Mozo", 30)).unwrap();
        budget.create_role(R, role("Cocinero", 25)).unwrap();

        assert_eq!(budget.remaining_budget(R, None), 45);

        let err = budget.create_role(R, role("Bartender", 50)).unwrap_err();
        assert!(matches!(
            err,
            BudgetError::BudgetExceeded {
                remaining: 45,
                requested: 50
            }
        ));
        // Nothing was written
        assert_eq!(budget.list_roles(R).len(), 2);

        budget.create_role(R, role("Bartender", 40)).unwrap();
        assert_eq!(budget.summary(R).allocated, 95);
    }

    #[test]
    fn test_create_exactly_fills_budget() {
        let (budget, _) = setup();
        budget.create_role(R, role("Mozo", 60)).unwrap();
        budget.create_role(R, role("Cocinero", 40)).unwrap();
        assert_eq!(budget.remaining_budget(R, None), 0);

        // 0% still fits
        budget.create_role(R, role("Aprendiz", 0)).unwrap();
        assert!(budget.create_role(R, role("Extra", 1)).is_err());
    }

    #[test]
    fn test_update_excludes_own_share() {
        let (budget, _) = setup();
        let mozo = budget.create_role(R, role("Mozo", 30)).unwrap();
        budget.create_role(R, role("Cocinero", 25)).unwrap();

        assert_eq!(budget.remaining_budget(R, Some(mozo.id)), 75);

        let updated = budget
            .update_role(
                mozo.id,
                RoleUpdate {
                    percentage: Some(75),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.percentage, 75);
        assert_eq!(budget.remaining_budget(R, None), 0);

        let err = budget
            .update_role(
                mozo.id,
                RoleUpdate {
                    percentage: Some(76),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, BudgetError::BudgetExceeded { remaining: 75, .. }));
        assert_eq!(budget.get_role(mozo.id).unwrap().percentage, 75);
    }

    #[test]
    fn test_update_name_and_color_only() {
        let (budget, _) = setup();
        let mozo = budget.create_role(R, role("Mozo", 30)).unwrap();
        let updated = budget
            .update_role(
                mozo.id,
                RoleUpdate {
                    name: Some("Camarero".to_string()),
                    color: Some("#00AA00".to_string()),
                    percentage: None,
                },
            )
            .unwrap();
        assert_eq!(updated.name, "Camarero");
        assert_eq!(updated.percentage, 30);
    }

    #[test]
    fn test_update_unknown_role() {
        let (budget, _) = setup();
        let err = budget.update_role(42, RoleUpdate::default()).unwrap_err();
        assert!(matches!(err, BudgetError::NotFound(42)));
    }

    #[test]
    fn test_rejects_invalid_input() {
        let (budget, _) = setup();
        assert!(matches!(
            budget.create_role(R, role("Mozo", 101)),
            Err(BudgetError::InvalidPercentage(101))
        ));
        assert!(matches!(
            budget.create_role(R, role("Mozo", -1)),
            Err(BudgetError::InvalidPercentage(-1))
        ));
        assert!(matches!(
            budget.create_role(R, role(" ", 10)),
            Err(BudgetError::Validation(_))
        ));
        let mut bad_color = role("Mozo", 10);
        bad_color.color = "blue".to_string();
        assert!(matches!(
            budget.create_role(R, bad_color),
            Err(BudgetError::Validation(_))
        ));
    }

    #[test]
    fn test_name_unique_per_restaurant() {
        let (budget, _) = setup();
        budget.create_role(R, role("Mozo", 10)).unwrap();
        assert!(matches!(
            budget.create_role(R, role("mozo", 10)),
            Err(BudgetError::NameExists(_))
        ));
        assert!(budget.create_role(R + 1, role("Mozo", 10)).is_ok());
    }

    // ========================================================================
    // Delete guards
    // ========================================================================

    #[test]
    fn test_delete_sole_role_fails_even_if_empty() {
        let (budget, _) = setup();
        let mozo = budget.create_role(R, role("Mozo", 30)).unwrap();
        assert!(matches!(
            budget.delete_role(mozo.id),
            Err(BudgetError::SoleRemainingRole(_))
        ));
    }

    #[test]
    fn test_delete_role_with_employees_fails() {
        let (budget, directory) = setup();
        let mozo = budget.create_role(R, role("Mozo", 30)).unwrap();
        budget.create_role(R, role("Cocinero", 25)).unwrap();
        hire(&budget, mozo.id);
        hire(&budget, mozo.id);

        let err = budget.delete_role(mozo.id).unwrap_err();
        assert!(matches!(
            err,
            BudgetError::HasEmployees {
                employee_count: 2,
                ..
            }
        ));

        // Two-step workflow: unassign, then delete
        assert_eq!(directory.unassign_role(R, mozo.id), 2);
        budget.delete_role(mozo.id).unwrap();
        assert_eq!(budget.remaining_budget(R, None), 75);
        assert!(matches!(
            budget.get_role(mozo.id),
            Err(BudgetError::NotFound(_))
        ));
    }

    #[test]
    fn test_assignment_to_deleted_role_is_rejected() {
        let (budget, directory) = setup();
        let a = budget.create_role(R, role("A", 10)).unwrap();
        budget.create_role(R, role("B", 10)).unwrap();
        budget.delete_role(a.id).unwrap();

        assert!(matches!(
            budget.register_employee(R, employee(Some(a.id))),
            Err(BudgetError::NotFound(id)) if id == a.id
        ));
        assert!(directory.list(R).is_empty());

        let ana = budget.register_employee(R, employee(None)).unwrap();
        assert!(matches!(
            budget.assign_employee_role(R, ana.id, Some(a.id)),
            Err(BudgetError::NotFound(_))
        ));
        assert!(directory.get(ana.id).unwrap().has_no_role());
    }

    #[test]
    fn test_assignment_stays_inside_restaurant() {
        let (budget, _) = setup();
        let other = budget.create_role(R + 1, role("Mozo", 10)).unwrap();
        let mine = budget.create_role(R, role("Mozo", 10)).unwrap();
        let ana = budget.register_employee(R, employee(None)).unwrap();

        assert!(matches!(
            budget.assign_employee_role(R, ana.id, Some(other.id)),
            Err(BudgetError::NotFound(_))
        ));
        assert!(matches!(
            budget.assign_employee_role(R + 1, ana.id, Some(other.id)),
            Err(BudgetError::Directory(DirectoryError::NotFound(_)))
        ));
        let ana = budget.assign_employee_role(R, ana.id, Some(mine.id)).unwrap();
        assert_eq!(ana.role_id, Some(mine.id));
        let ana = budget.assign_employee_role(R, ana.id, None).unwrap();
        assert!(ana.has_no_role());
    }

    #[test]
    fn test_delete_races_assignment_without_orphans() {
        for _ in 0..50 {
            let (budget, directory) = setup();
            let budget = Arc::new(budget);
            let a = budget.create_role(R, role("A", 10)).unwrap();
            budget.create_role(R, role("B", 10)).unwrap();
            let ana = budget.register_employee(R, employee(None)).unwrap();
            let (role_id, ana_id) = (a.id, ana.id);

            let assign = {
                let budget = budget.clone();
                std::thread::spawn(move || budget.assign_employee_role(R, ana_id, Some(role_id)))
            };
            let delete = {
                let budget = budget.clone();
                std::thread::spawn(move || budget.delete_role(role_id))
            };
            let assigned = assign.join().unwrap().is_ok();
            let deleted = delete.join().unwrap().is_ok();

            // Exactly one side wins; the employee never points at a deleted role
            assert!(assigned != deleted);
            let current = directory.get(ana_id).unwrap().role_id;
            if deleted {
                assert_eq!(current, None);
            } else {
                assert_eq!(current, Some(role_id));
            }
        }
    }

    #[test]
    fn test_delete_unknown_role() {
        let (budget, _) = setup();
        assert!(matches!(budget.delete_role(7), Err(BudgetError::NotFound(7))));
    }

    // ========================================================================
    // Concurrency
    // ========================================================================

    #[test]
    fn test_concurrent_creates_never_overflow() {
        let (budget, _) = setup();
        let budget = Arc::new(budget);

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let budget = budget.clone();
                std::thread::spawn(move || budget.create_role(R, role(&format!("Role {i}"), 30)))
            })
            .collect();

        let created = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|r| r.is_ok())
            .count();

        assert_eq!(created, 3);
        assert_eq!(budget.summary(R).allocated, 90);
    }
}
