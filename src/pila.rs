//! PILA contribution calculator.
//!
//! Computes employer health, pension and ARL contributions for a
//! monthly filing period.  Aggregate totals are computed from the
//! summed salary and rounded per component, so `total_contributions`
//! is always the exact sum of the three rounded components.  The
//! per-employee lines are computed in parallel with [`rayon`] and are
//! informative; they are rounded independently and are not required to
//! add up to the aggregates.

use crate::error::{EngineError, Result};
use crate::models::{
    ArlRiskClass, Employee, PilaEmployeeLine, PilaSubmission, SubmissionStatus,
};
use crate::rates::{round_cop, HEALTH_RATE, PENSION_RATE};
use chrono::{DateTime, NaiveDate, Utc};
use rayon::prelude::*;
use tracing::debug;
use uuid::Uuid;

/// Generate a submission for `period` with the default ARL class.
pub fn generate_pila(period: &str, employees: &[Employee]) -> Result<PilaSubmission> {
    generate_pila_with_class(period, employees, ArlRiskClass::default())
}

/// Generate a submission for `period` using the given ARL risk class.
pub fn generate_pila_with_class(
    period: &str,
    employees: &[Employee],
    arl_class: ArlRiskClass,
) -> Result<PilaSubmission> {
    generate_pila_at(period, employees, arl_class, Utc::now())
}

/// Generate a submission stamped with `created_at`.
pub fn generate_pila_at(
    period: &str,
    employees: &[Employee],
    arl_class: ArlRiskClass,
    created_at: DateTime<Utc>,
) -> Result<PilaSubmission> {
    validate_period(period)?;
    if employees.is_empty() {
        return Err(EngineError::invalid(
            "a PILA submission needs at least one employee",
        ));
    }
    if let Some(bad) = employees
        .iter()
        .find(|e| !e.salary.is_finite() || e.salary < 0.0)
    {
        return Err(EngineError::invalid(format!(
            "employee {} has an invalid salary {}",
            bad.id, bad.salary
        )));
    }

    // Individually finite salaries can still overflow once summed.
    let total_salary: f64 = employees.iter().map(|e| e.salary).sum();
    if !total_salary.is_finite() {
        return Err(EngineError::invalid(
            "total salary is out of range; salaries are too large",
        ));
    }

    // Lines are informative; aggregates below are rounded on the total.
    let arl_rate = arl_class.rate();
    let lines: Vec<PilaEmployeeLine> = employees
        .par_iter()
        .map(|employee| employee_line(employee, arl_rate))
        .collect();

    let total_health = round_cop(total_salary * HEALTH_RATE);
    let total_pension = round_cop(total_salary * PENSION_RATE);
    let total_arl = round_cop(total_salary * arl_rate);

    debug!(
        period,
        employees = employees.len(),
        total_salary,
        ?arl_class,
        "PILA contributions computed"
    );

    Ok(PilaSubmission {
        id: Uuid::new_v4().to_string(),
        period: period.to_string(),
        employee_count: employees.len(),
        total_salary,
        total_health,
        total_pension,
        total_arl,
        total_contributions: total_health + total_pension + total_arl,
        arl_class,
        arl_rate,
        employees: lines,
        status: SubmissionStatus::Generado,
        created_at,
    })
}

fn employee_line(employee: &Employee, arl_rate: f64) -> PilaEmployeeLine {
    let health = round_cop(employee.salary * HEALTH_RATE);
    let pension = round_cop(employee.salary * PENSION_RATE);
    let arl = round_cop(employee.salary * arl_rate);
    PilaEmployeeLine {
        employee_id: employee.id.clone(),
        document_number: employee.document_number.clone(),
        name: employee.name.clone(),
        salary: employee.salary,
        health,
        pension,
        arl,
        total: health + pension + arl,
    }
}

/// Check that `period` is a `YYYY-MM` month.
pub fn validate_period(period: &str) -> Result<NaiveDate> {
    let bytes = period.as_bytes();
    let shaped = bytes.len() == 7
        && bytes[4] == b'-'
        && bytes[..4].iter().chain(&bytes[5..]).all(u8::is_ascii_digit);
    if !shaped {
        return Err(EngineError::invalid(format!(
            "period must have the form YYYY-MM, got {period:?}"
        )));
    }
    NaiveDate::parse_from_str(&format!("{period}-01"), "%Y-%m-%d")
        .map_err(|_| EngineError::invalid(format!("period {period:?} is not a valid month")))
}

impl SubmissionStatus {
    /// Whether the filing workflow may move from `self` to `next`.
    ///
    /// The workflow only moves forward: GENERADO, ENVIADO, then
    /// PROCESADO, optionally passing through PENDIENTE after sending.
    pub fn can_transition_to(&self, next: SubmissionStatus) -> bool {
        use SubmissionStatus::*;
        matches!(
            (self, next),
            (Generado, Enviado) | (Enviado, Pendiente) | (Enviado, Procesado) | (Pendiente, Procesado)
        )
    }

    pub fn transition_to(self, next: SubmissionStatus) -> Result<SubmissionStatus> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(EngineError::InvalidTransition {
                from: self,
                to: next,
            })
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SubmissionStatus::Procesado)
    }
}
