//! Template catalog.
//!
//! The estimator never fetches templates itself; callers resolve them
//! through a [`TemplateCatalog`].  Templates and their presets are kept
//! as JSON files, one template per file, and loaded once at start-up.
//! A built-in residential template is always available so the service
//! works without a template directory.

use crate::error::{EngineError, Result};
use crate::estimate::validate_factors;
use crate::models::{
    CalculationFactors, CostCategory, CostTemplate, EstimationItem, ProjectPreset, UnitCost,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::{info, warn};

/// Source of cost templates and project presets.
///
/// Catalogs must be thread-safe (`Send + Sync`) because the API shares
/// one instance across requests.
pub trait TemplateCatalog: Send + Sync {
    fn template(&self, id: &str) -> Option<&CostTemplate>;
    /// All templates, ordered by id.
    fn templates(&self) -> Vec<&CostTemplate>;
    fn presets(&self, template_id: &str) -> Vec<&ProjectPreset>;
}

/// On-disk layout of a template file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateFile {
    pub template: CostTemplate,
    #[serde(default)]
    pub presets: Vec<ProjectPreset>,
}

/// Catalog held entirely in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    templates: HashMap<String, CostTemplate>,
    presets: Vec<ProjectPreset>,
}

impl InMemoryCatalog {
    /// Build a catalog.  A later template with the same id replaces an
    /// earlier one, and its presets replace the earlier set rather than
    /// being appended.  Presets naming no known template are dropped.
    pub fn new(templates: Vec<CostTemplate>, presets: Vec<ProjectPreset>) -> Self {
        let mut catalog = Self::default();
        for template in templates {
            let own = presets
                .iter()
                .filter(|p| p.template_id == template.id)
                .cloned()
                .collect();
            catalog.insert(TemplateFile {
                template,
                presets: own,
            });
        }
        let orphans = presets
            .iter()
            .filter(|p| !catalog.templates.contains_key(&p.template_id));
        for orphan in orphans {
            warn!(
                preset = %orphan.id,
                template = %orphan.template_id,
                "preset for unknown template dropped"
            );
        }
        catalog
    }

    /// Catalog containing only the built-in template.
    pub fn builtin() -> Self {
        Self::new(vec![builtin_template()], builtin_presets())
    }

    pub fn insert(&mut self, file: TemplateFile) {
        self.presets.retain(|p| p.template_id != file.template.id);
        self.presets.extend(file.presets);
        self.templates.insert(file.template.id.clone(), file.template);
    }
}

impl TemplateCatalog for InMemoryCatalog {
    fn template(&self, id: &str) -> Option<&CostTemplate> {
        self.templates.get(id)
    }

    fn templates(&self) -> Vec<&CostTemplate> {
        let mut all: Vec<&CostTemplate> = self.templates.values().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all
    }

    fn presets(&self, template_id: &str) -> Vec<&ProjectPreset> {
        self.presets
            .iter()
            .filter(|p| p.template_id == template_id)
            .collect()
    }
}

/// Load all template files from a directory.
///
/// Every `.json` file is parsed as a [`TemplateFile`].  Files that fail
/// to parse or carry invalid factors or unit costs are logged and
/// skipped.  A missing
/// directory yields an empty list.
pub fn load_templates_from_dir(path: &Path) -> Result<Vec<TemplateFile>> {
    let mut files = Vec::new();
    if !path.is_dir() {
        warn!(path = %path.display(), "template directory not found");
        return Ok(files);
    }
    let entries = std::fs::read_dir(path).map_err(|e| catalog_io(path, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| catalog_io(path, e))?;
        let file_path = entry.path();
        if !file_path.is_file() || file_path.extension().map_or(true, |ext| ext != "json") {
            continue;
        }
        let data = std::fs::read_to_string(&file_path).map_err(|e| catalog_io(&file_path, e))?;
        match parse_template_file(&data) {
            Ok(file) => files.push(file),
            Err(err) => warn!(path = %file_path.display(), error = %err, "skipping template file"),
        }
    }
    files.sort_by(|a, b| a.template.id.cmp(&b.template.id));
    Ok(files)
}

/// Parse and validate a single template file.
pub fn parse_template_file(data: &str) -> Result<TemplateFile> {
    let file: TemplateFile =
        serde_json::from_str(data).map_err(|e| EngineError::Catalog(e.to_string()))?;
    validate_factors(&file.template.factors)?;
    for (category, entries) in &file.template.categories {
        for (key, entry) in entries {
            if !entry.cost_per_unit.is_finite() || entry.cost_per_unit < 0.0 {
                return Err(EngineError::Catalog(format!(
                    "template {} has an invalid unit cost {} for {category}/{key}",
                    file.template.id, entry.cost_per_unit
                )));
            }
        }
    }
    for preset in &file.presets {
        if preset.template_id != file.template.id {
            return Err(EngineError::Catalog(format!(
                "preset {} references template {} inside file for {}",
                preset.id, preset.template_id, file.template.id
            )));
        }
    }
    Ok(file)
}

/// Built-in catalog extended with the templates found in `dir`.
pub fn load_catalog(dir: &Path) -> Result<InMemoryCatalog> {
    let mut catalog = InMemoryCatalog::builtin();
    for file in load_templates_from_dir(dir)? {
        catalog.insert(file);
    }
    info!(templates = catalog.templates().len(), "template catalog loaded");
    Ok(catalog)
}

fn catalog_io(path: &Path, err: std::io::Error) -> EngineError {
    EngineError::Catalog(format!("{}: {err}", path.display()))
}

pub const BUILTIN_TEMPLATE_ID: &str = "residencial-basico";

fn unit(name: &str, unit: &str, cost_per_unit: f64) -> UnitCost {
    UnitCost {
        name: name.to_string(),
        unit: unit.to_string(),
        cost_per_unit,
    }
}

/// Residential construction template priced in COP.
pub fn builtin_template() -> CostTemplate {
    let materials = BTreeMap::from([
        ("cemento".to_string(), unit("Cemento gris 50 kg", "bulto", 32_000.0)),
        ("arena".to_string(), unit("Arena de río", "m3", 85_000.0)),
        ("grava".to_string(), unit("Grava triturada", "m3", 95_000.0)),
        ("ladrillo".to_string(), unit("Ladrillo tolete", "unidad", 1_200.0)),
        ("acero".to_string(), unit("Acero de refuerzo 60000 psi", "kg", 4_800.0)),
        ("bloque".to_string(), unit("Bloque de concreto", "unidad", 2_600.0)),
    ]);
    let labor = BTreeMap::from([
        ("oficial".to_string(), unit("Oficial de construcción", "día", 110_000.0)),
        ("ayudante".to_string(), unit("Ayudante de obra", "día", 75_000.0)),
        ("maestro".to_string(), unit("Maestro de obra", "día", 160_000.0)),
        ("electricista".to_string(), unit("Electricista", "día", 130_000.0)),
    ]);
    let equipment = BTreeMap::from([
        ("mezcladora".to_string(), unit("Mezcladora de concreto", "día", 60_000.0)),
        ("vibrador".to_string(), unit("Vibrador de concreto", "día", 45_000.0)),
        ("andamio".to_string(), unit("Andamio tubular", "sección/día", 3_500.0)),
        ("formaleta".to_string(), unit("Formaleta metálica", "m2/día", 2_200.0)),
    ]);
    CostTemplate {
        id: BUILTIN_TEMPLATE_ID.to_string(),
        name: "Vivienda residencial básica".to_string(),
        description: "Precios de referencia para obra residencial en Colombia".to_string(),
        categories: BTreeMap::from([
            (CostCategory::Materials, materials),
            (CostCategory::Labor, labor),
            (CostCategory::Equipment, equipment),
        ]),
        factors: CalculationFactors::default(),
    }
}

fn builtin_presets() -> Vec<ProjectPreset> {
    vec![ProjectPreset {
        id: "casa-un-piso".to_string(),
        name: "Casa de un piso 60 m2".to_string(),
        description: "Obra gris de vivienda unifamiliar".to_string(),
        template_id: BUILTIN_TEMPLATE_ID.to_string(),
        duration_days: 90.0,
        items: vec![
            EstimationItem::new(CostCategory::Materials, "cemento", 220.0),
            EstimationItem::new(CostCategory::Materials, "arena", 18.0),
            EstimationItem::new(CostCategory::Materials, "grava", 14.0),
            EstimationItem::new(CostCategory::Materials, "ladrillo", 6_500.0),
            EstimationItem::new(CostCategory::Materials, "acero", 1_900.0),
            EstimationItem::new(CostCategory::Labor, "maestro", 90.0),
            EstimationItem::new(CostCategory::Labor, "oficial", 180.0),
            EstimationItem::new(CostCategory::Labor, "ayudante", 270.0),
            EstimationItem::new(CostCategory::Equipment, "mezcladora", 40.0),
            EstimationItem::new(CostCategory::Equipment, "andamio", 600.0),
        ],
    }]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimate::calculate;

    #[test]
    fn builtin_preset_resolves_fully() {
        let catalog = InMemoryCatalog::builtin();
        let template = catalog.template(BUILTIN_TEMPLATE_ID).unwrap();
        let preset = catalog.presets(BUILTIN_TEMPLATE_ID)[0];
        let est = calculate(template, &preset.items, preset.duration_days, true).unwrap();
        assert!(est.unresolved.is_empty());
        assert!(est.breakdown.total > est.breakdown.direct_cost());
    }

    #[test]
    fn parses_template_file_with_category_keys() {
        let data = r#"{
            "template": {
                "id": "comercial",
                "name": "Local comercial",
                "categories": {
                    "materials": {
                        "porcelanato": {"name": "Porcelanato", "unit": "m2", "cost_per_unit": 65000}
                    }
                }
            },
            "presets": []
        }"#;
        let file = parse_template_file(data).unwrap();
        assert_eq!(file.template.factors, CalculationFactors::default());
        let entry = file
            .template
            .unit_cost(CostCategory::Materials, "porcelanato")
            .unwrap();
        assert_eq!(entry.cost_per_unit, 65_000.0);
    }

    #[test]
    fn rejects_file_with_invalid_factors() {
        let data = r#"{
            "template": {
                "id": "x", "name": "x", "categories": {},
                "factors": {"labor_benefit_factor": 1.58, "overhead_percentage": 2.0,
                            "profit_margin": 0.1, "contingency": 0.05}
            }
        }"#;
        assert!(parse_template_file(data).is_err());
    }

    #[test]
    fn rejects_file_with_negative_unit_cost() {
        let data = r#"{
            "template": {
                "id": "neg", "name": "neg",
                "categories": {
                    "materials": {"x": {"name": "x", "unit": "kg", "cost_per_unit": -5}}
                }
            }
        }"#;
        assert!(matches!(parse_template_file(data), Err(EngineError::Catalog(_))));
    }

    #[test]
    fn new_keeps_one_preset_set_per_template() {
        let presets = builtin_presets();
        let catalog = InMemoryCatalog::new(
            vec![builtin_template(), builtin_template()],
            presets.clone(),
        );
        assert_eq!(catalog.templates().len(), 1);
        assert_eq!(catalog.presets(BUILTIN_TEMPLATE_ID).len(), presets.len());
    }

    #[test]
    fn insert_replaces_template_and_presets() {
        let mut catalog = InMemoryCatalog::builtin();
        let mut template = builtin_template();
        template.name = "Actualizada".into();
        catalog.insert(TemplateFile {
            template,
            presets: Vec::new(),
        });
        assert_eq!(catalog.templates().len(), 1);
        assert_eq!(catalog.template(BUILTIN_TEMPLATE_ID).unwrap().name, "Actualizada");
        assert!(catalog.presets(BUILTIN_TEMPLATE_ID).is_empty());
    }

    #[test]
    fn loads_bundled_template_directory() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("templates");
        let catalog = load_catalog(&dir).unwrap();
        let template = catalog.template("local-comercial").unwrap();
        assert_eq!(template.factors.overhead_percentage, 0.12);
        let preset = catalog.presets("local-comercial")[0];
        let est = calculate(template, &preset.items, preset.duration_days, true).unwrap();
        assert!(est.unresolved.is_empty());
        assert!(catalog.template(BUILTIN_TEMPLATE_ID).is_some());
    }

    #[test]
    fn missing_directory_loads_builtin_only() {
        let catalog = load_catalog(Path::new("/nonexistent/obra/templates")).unwrap();
        assert_eq!(catalog.templates().len(), 1);
    }
}
