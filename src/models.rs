//! Data models for the Obra Engine.
//!
//! The `models` module defines the serialisable structs and enums
//! shared by the cost estimation engine and the PILA contribution
//! calculator.  Everything here derives `Serialize` and `Deserialize`
//! so that templates can be loaded from JSON files and results can be
//! returned over HTTP unchanged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Cost class of an estimation line item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CostCategory {
    Materials,
    Labor,
    Equipment,
}

impl CostCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Materials => "materials",
            Self::Labor => "labor",
            Self::Equipment => "equipment",
        }
    }
}

impl fmt::Display for CostCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single line item supplied by the caller of the estimator.
///
/// Only `category`, `subcategory` and `quantity` drive the
/// calculation.  The display fields are optional on input and are
/// filled from the active [`CostTemplate`] in the result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimationItem {
    /// Cost class the item is charged to.
    pub category: CostCategory,
    /// Key into the template's table for `category`.
    pub subcategory: String,
    /// Amount in the template's unit.  Must be non-negative; zero keeps
    /// the item in the result with no cost.
    pub quantity: f64,
    /// Display name.  Ignored on input when the template resolves it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Display unit, e.g. `"m3"` or `"día"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    /// Price echoed by clients.  The estimator always prices from the
    /// template, never from this field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_per_unit: Option<f64>,
}

impl EstimationItem {
    pub fn new(category: CostCategory, subcategory: impl Into<String>, quantity: f64) -> Self {
        Self {
            category,
            subcategory: subcategory.into(),
            quantity,
            name: None,
            unit: None,
            cost_per_unit: None,
        }
    }
}

/// Price entry for one subcategory of a template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitCost {
    /// Human-readable name, e.g. `"Cemento gris 50 kg"`.
    pub name: String,
    /// Unit the price refers to.
    pub unit: String,
    /// Price per unit in COP.  Templates with negative prices are
    /// rejected when loaded.
    pub cost_per_unit: f64,
}

/// Multipliers and percentages applied on top of direct costs.
///
/// `overhead_percentage`, `profit_margin` and `contingency` are
/// fractions in `0..=1`.  They cascade: each is charged on the running
/// subtotal that already includes the factors before it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalculationFactors {
    /// Loading for mandatory Colombian social benefits on raw labor.
    pub labor_benefit_factor: f64,
    /// Charged on direct cost.
    pub overhead_percentage: f64,
    /// Charged on direct cost plus overhead.
    pub profit_margin: f64,
    /// Charged on everything before it.
    pub contingency: f64,
}

impl Default for CalculationFactors {
    fn default() -> Self {
        Self {
            labor_benefit_factor: 1.58,
            overhead_percentage: 0.10,
            profit_margin: 0.15,
            contingency: 0.05,
        }
    }
}

/// A pricing template from the catalog.
///
/// Templates are immutable for the duration of a calculation.  The
/// nested maps are ordered so that serialised templates are stable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostTemplate {
    /// Catalog key, e.g. `"residencial-basico"`.
    pub id: String,
    /// Display name.
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Price table: category, then subcategory key, then price entry.
    pub categories: BTreeMap<CostCategory, BTreeMap<String, UnitCost>>,
    /// Factors used unless the caller overrides them.
    #[serde(default)]
    pub factors: CalculationFactors,
}

impl CostTemplate {
    /// Look up the price entry for a category/subcategory pair.
    pub fn unit_cost(&self, category: CostCategory, subcategory: &str) -> Option<&UnitCost> {
        self.categories.get(&category)?.get(subcategory)
    }

    pub fn summary(&self) -> TemplateSummary {
        TemplateSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            entry_count: self.categories.values().map(|c| c.len()).sum(),
        }
    }
}

/// Lightweight listing entry for a template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateSummary {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Number of priced subcategories across all categories.
    pub entry_count: usize,
}

/// A named, pre-filled set of items for a template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectPreset {
    /// Unique preset key.
    pub id: String,
    /// Display name.
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Template the items are priced against.
    pub template_id: String,
    /// Suggested project duration.
    pub duration_days: f64,
    /// Pre-filled line items.
    pub items: Vec<EstimationItem>,
}

/// An input item after template resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimatedLine {
    pub category: CostCategory,
    pub subcategory: String,
    /// Template name, or the caller's name (else the subcategory key)
    /// when unresolved.
    pub name: String,
    pub unit: String,
    pub quantity: f64,
    /// Template price; zero when unresolved.
    pub cost_per_unit: f64,
    /// `quantity * cost_per_unit`, before any benefit loading.
    pub raw_cost: f64,
    /// False when the template had no entry for the subcategory.
    pub resolved: bool,
}

/// An item whose subcategory could not be found in the template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnresolvedItem {
    /// Position of the item in the input list.
    pub index: usize,
    /// Category that was searched.
    pub category: CostCategory,
    /// Key that was missing.
    pub subcategory: String,
}

/// Categorised cost totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    /// Sum of raw material costs.
    pub materials: f64,
    /// Sum of raw labor costs.  Includes the benefit loading when it
    /// was applied.
    pub labor: f64,
    /// Sum of raw equipment costs.
    pub equipment: f64,
    /// `direct * overhead_percentage`.
    pub overhead: f64,
    /// `(direct + overhead) * profit_margin`.
    pub profit: f64,
    /// `(direct + overhead + profit) * contingency`.
    pub contingency: f64,
    /// Direct cost plus every markup.
    pub total: f64,
}

impl CostBreakdown {
    /// Materials plus labor plus equipment.
    pub fn direct_cost(&self) -> f64 {
        self.materials + self.labor + self.equipment
    }
}

/// Derived figures shown next to the breakdown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EstimationSummary {
    /// `total / duration_days`.
    pub cost_per_day: f64,
    /// Materials share of direct cost, in percent to one decimal place.
    /// Zero when there is no direct cost.
    pub materials_percentage: f64,
    /// Labor share of direct cost, same rounding.
    pub labor_percentage: f64,
    /// Equipment share of direct cost, same rounding.
    pub equipment_percentage: f64,
}

/// Result of a cost estimation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostEstimation {
    /// Template the items were priced against.
    pub template_id: String,
    pub duration_days: f64,
    /// Whether the labor benefit factor was applied.
    pub apply_benefits: bool,
    /// Factors actually used, after any override.
    pub factors: CalculationFactors,
    /// One line per input item, in input order.
    pub items: Vec<EstimatedLine>,
    pub breakdown: CostBreakdown,
    pub summary: EstimationSummary,
    /// Items that contributed zero because the template had no entry.
    pub unresolved: Vec<UnresolvedItem>,
}

impl CostEstimation {
    /// True when some items could not be priced.
    pub fn has_warnings(&self) -> bool {
        !self.unresolved.is_empty()
    }
}

/// An employee as seen by the PILA calculator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    /// Directory identifier.
    pub id: String,
    /// National identity document (cédula).
    #[serde(default)]
    pub document_number: String,
    /// Full name.
    #[serde(default)]
    pub name: String,
    /// Job title; informative only.
    #[serde(default)]
    pub position: String,
    /// Monthly base salary in COP.
    pub salary: f64,
}

/// ARL occupational-risk classification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArlRiskClass {
    I,
    II,
    III,
    IV,
    #[default]
    V,
}

/// Employer contributions for a single employee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PilaEmployeeLine {
    /// Id of the source [`Employee`].
    pub employee_id: String,
    pub document_number: String,
    pub name: String,
    /// Monthly base salary the contributions are charged on.
    pub salary: f64,
    /// Health contribution, rounded to whole pesos.
    pub health: f64,
    /// Pension contribution, rounded to whole pesos.
    pub pension: f64,
    /// ARL contribution at the submission's class, rounded.
    pub arl: f64,
    /// `health + pension + arl`.
    pub total: f64,
}

/// Filing status of a PILA submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SubmissionStatus {
    /// Created by the calculator, not yet filed.
    Generado,
    /// Sent to the operator.
    Enviado,
    /// Sent and awaiting acknowledgement.
    Pendiente,
    /// Acknowledged by the operator.  Terminal.
    Procesado,
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Generado => "GENERADO",
            Self::Enviado => "ENVIADO",
            Self::Pendiente => "PENDIENTE",
            Self::Procesado => "PROCESADO",
        };
        f.write_str(s)
    }
}

/// A generated PILA filing for one period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PilaSubmission {
    /// UUID assigned at generation.
    pub id: String,
    /// Filing month, `YYYY-MM`.
    pub period: String,
    /// Number of employees included.
    pub employee_count: usize,
    /// Sum of monthly salaries.
    pub total_salary: f64,
    /// `round(total_salary * 0.085)`.
    pub total_health: f64,
    /// `round(total_salary * 0.12)`.
    pub total_pension: f64,
    /// `round(total_salary * arl_rate)`.
    pub total_arl: f64,
    /// Exact sum of the three rounded totals.
    pub total_contributions: f64,
    /// Risk class the ARL rate was taken from.
    pub arl_class: ArlRiskClass,
    /// Rate of `arl_class` at generation time.
    pub arl_rate: f64,
    /// Per-employee contributions, in input order.
    pub employees: Vec<PilaEmployeeLine>,
    /// Filing status; created as [`SubmissionStatus::Generado`].
    pub status: SubmissionStatus,
    /// When the calculator produced the submission.
    pub created_at: DateTime<Utc>,
}
