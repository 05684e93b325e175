//! Personnel directory records and salary resolution.
//!
//! The directory stores either a monthly salary or an hourly rate for
//! each person.  The PILA calculator only sees monthly salaries, so
//! hourly staff are converted at 192 hours per month.

use crate::models::Employee;
use crate::rates::MONTHLY_HOURS;
use serde::{Deserialize, Serialize};

/// A person as returned by the personnel directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonnelRecord {
    pub id: String,
    #[serde(default)]
    pub document_number: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub position: String,
    #[serde(default)]
    pub monthly_salary: Option<f64>,
    #[serde(default)]
    pub hourly_rate: Option<f64>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl PersonnelRecord {
    /// Monthly salary, falling back to `hourly_rate * 192`, else zero.
    pub fn resolved_salary(&self) -> f64 {
        match (self.monthly_salary, self.hourly_rate) {
            (Some(monthly), _) => monthly,
            (None, Some(hourly)) => hourly * MONTHLY_HOURS,
            (None, None) => 0.0,
        }
    }

    pub fn to_employee(&self) -> Employee {
        Employee {
            id: self.id.clone(),
            document_number: self.document_number.clone(),
            name: self.name.clone(),
            position: self.position.clone(),
            salary: self.resolved_salary(),
        }
    }
}

/// Active records converted to PILA employees, in input order.
pub fn active_employees(records: &[PersonnelRecord]) -> Vec<Employee> {
    records
        .iter()
        .filter(|r| r.active)
        .map(PersonnelRecord::to_employee)
        .collect()
}
