//! Cost estimation engine.
//!
//! Turns a list of [`EstimationItem`]s priced against a
//! [`CostTemplate`] into a [`CostEstimation`].  Direct costs are summed
//! per category, labor is optionally loaded with the benefit factor,
//! and overhead, profit and contingency are then charged in that order,
//! each on the running subtotal including the factors before it.
//!
//! Items whose subcategory is missing from the template contribute
//! zero and are listed in [`CostEstimation::unresolved`].  Invalid
//! input (non-positive duration, negative quantities, out-of-range
//! factors) is rejected before anything is computed.

use crate::catalog::TemplateCatalog;
use crate::error::{EngineError, Result};
use crate::models::{
    CalculationFactors, CostBreakdown, CostCategory, CostEstimation, CostTemplate, EstimatedLine,
    EstimationItem, EstimationSummary, UnresolvedItem,
};
use tracing::{debug, warn};

/// Largest accepted labor benefit loading.
pub const MAX_LABOR_BENEFIT_FACTOR: f64 = 5.0;

/// Estimate `items` against `template` using the template's own factors.
pub fn calculate(
    template: &CostTemplate,
    items: &[EstimationItem],
    duration_days: f64,
    apply_benefits: bool,
) -> Result<CostEstimation> {
    calculate_with_factors(template, items, duration_days, apply_benefits, &template.factors)
}

/// Estimate `items` against `template` with explicit factors.
pub fn calculate_with_factors(
    template: &CostTemplate,
    items: &[EstimationItem],
    duration_days: f64,
    apply_benefits: bool,
    factors: &CalculationFactors,
) -> Result<CostEstimation> {
    // Reject bad input before producing any partial result.
    validate_duration(duration_days)?;
    validate_factors(factors)?;
    for (index, item) in items.iter().enumerate() {
        if !item.quantity.is_finite() || item.quantity < 0.0 {
            return Err(EngineError::invalid(format!(
                "item {index}: quantity must be a non-negative number, got {}",
                item.quantity
            )));
        }
    }

    let mut lines = Vec::with_capacity(items.len());
    let mut unresolved = Vec::new();
    let (mut materials, mut labor_raw, mut equipment) = (0.0, 0.0, 0.0);

    for (index, item) in items.iter().enumerate() {
        let line = match template.unit_cost(item.category, &item.subcategory) {
            Some(entry) => {
                if !entry.cost_per_unit.is_finite() || entry.cost_per_unit < 0.0 {
                    return Err(EngineError::Catalog(format!(
                        "template {} has an invalid unit cost for {}/{}",
                        template.id, item.category, item.subcategory
                    )));
                }
                EstimatedLine {
                    category: item.category,
                    subcategory: item.subcategory.clone(),
                    name: entry.name.clone(),
                    unit: entry.unit.clone(),
                    quantity: item.quantity,
                    cost_per_unit: entry.cost_per_unit,
                    raw_cost: raw_cost(item.quantity, entry.cost_per_unit),
                    resolved: true,
                }
            }
            None => {
                warn!(
                    template = %template.id,
                    index,
                    category = %item.category,
                    subcategory = %item.subcategory,
                    "subcategory not found in template; item contributes zero"
                );
                unresolved.push(UnresolvedItem {
                    index,
                    category: item.category,
                    subcategory: item.subcategory.clone(),
                });
                EstimatedLine {
                    category: item.category,
                    subcategory: item.subcategory.clone(),
                    name: item.name.clone().unwrap_or_else(|| item.subcategory.clone()),
                    unit: item.unit.clone().unwrap_or_default(),
                    quantity: item.quantity,
                    cost_per_unit: 0.0,
                    raw_cost: 0.0,
                    resolved: false,
                }
            }
        };
        match line.category {
            CostCategory::Materials => materials += line.raw_cost,
            CostCategory::Labor => labor_raw += line.raw_cost,
            CostCategory::Equipment => equipment += line.raw_cost,
        }
        lines.push(line);
    }

    // Benefit loading applies to the labor subtotal, not to each line.
    let labor = if apply_benefits {
        labor_raw * factors.labor_benefit_factor
    } else {
        labor_raw
    };
    let breakdown = cascade(materials, labor, equipment, factors);
    let summary = summarize(&breakdown, duration_days);
    ensure_finite(&breakdown, &summary)?;

    debug!(
        template = %template.id,
        items = lines.len(),
        unresolved = unresolved.len(),
        total = breakdown.total,
        "cost estimation computed"
    );

    Ok(CostEstimation {
        template_id: template.id.clone(),
        duration_days,
        apply_benefits,
        factors: *factors,
        items: lines,
        breakdown,
        summary,
        unresolved,
    })
}

/// Resolve `template_id` in `catalog` and estimate against it.
///
/// `factors` overrides the template's factors when given.
pub fn estimate_from_catalog(
    catalog: &dyn TemplateCatalog,
    template_id: &str,
    items: &[EstimationItem],
    duration_days: f64,
    apply_benefits: bool,
    factors: Option<CalculationFactors>,
) -> Result<CostEstimation> {
    let template = catalog
        .template(template_id)
        .ok_or_else(|| EngineError::TemplateNotFound(template_id.to_string()))?;
    let factors = factors.unwrap_or(template.factors);
    calculate_with_factors(template, items, duration_days, apply_benefits, &factors)
}

pub fn raw_cost(quantity: f64, cost_per_unit: f64) -> f64 {
    quantity * cost_per_unit
}

fn cascade(
    materials: f64,
    labor: f64,
    equipment: f64,
    factors: &CalculationFactors,
) -> CostBreakdown {
    let direct = materials + labor + equipment;
    // Each markup is charged on the subtotal that includes the previous ones.
    let overhead = direct * factors.overhead_percentage;
    let profit = (direct + overhead) * factors.profit_margin;
    let contingency = (direct + overhead + profit) * factors.contingency;
    CostBreakdown {
        materials,
        labor,
        equipment,
        overhead,
        profit,
        contingency,
        total: direct + overhead + profit + contingency,
    }
}

fn summarize(breakdown: &CostBreakdown, duration_days: f64) -> EstimationSummary {
    let direct = breakdown.direct_cost();
    let share = |part: f64| {
        if direct > 0.0 {
            round_one_decimal(part / direct * 100.0)
        } else {
            0.0
        }
    };
    EstimationSummary {
        cost_per_day: breakdown.total / duration_days,
        materials_percentage: share(breakdown.materials),
        labor_percentage: share(breakdown.labor),
        equipment_percentage: share(breakdown.equipment),
    }
}

/// Reject results that overflowed `f64`; they would serialise as `null`.
fn ensure_finite(breakdown: &CostBreakdown, summary: &EstimationSummary) -> Result<()> {
    let fields = [
        ("materials", breakdown.materials),
        ("labor", breakdown.labor),
        ("equipment", breakdown.equipment),
        ("overhead", breakdown.overhead),
        ("profit", breakdown.profit),
        ("contingency", breakdown.contingency),
        ("total", breakdown.total),
        ("cost_per_day", summary.cost_per_day),
        ("materials_percentage", summary.materials_percentage),
        ("labor_percentage", summary.labor_percentage),
        ("equipment_percentage", summary.equipment_percentage),
    ];
    match fields.iter().find(|(_, value)| !value.is_finite()) {
        Some((name, _)) => Err(EngineError::invalid(format!(
            "{name} is out of range; quantities or factors are too large"
        ))),
        None => Ok(()),
    }
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn validate_duration(duration_days: f64) -> Result<()> {
    if !duration_days.is_finite() || duration_days <= 0.0 {
        return Err(EngineError::invalid(format!(
            "duration must be a positive number of days, got {duration_days}"
        )));
    }
    Ok(())
}

pub(crate) fn validate_factors(factors: &CalculationFactors) -> Result<()> {
    if !(0.0..=MAX_LABOR_BENEFIT_FACTOR).contains(&factors.labor_benefit_factor) {
        return Err(EngineError::invalid(format!(
            "labor benefit factor must be between 0 and {MAX_LABOR_BENEFIT_FACTOR}, got {}",
            factors.labor_benefit_factor
        )));
    }
    let fractions = [
        ("overhead_percentage", factors.overhead_percentage),
        ("profit_margin", factors.profit_margin),
        ("contingency", factors.contingency),
    ];
    for (name, value) in fractions {
        if !(0.0..=1.0).contains(&value) {
            return Err(EngineError::invalid(format!(
                "{name} must be a fraction between 0 and 1, got {value}"
            )));
        }
    }
    Ok(())
}
